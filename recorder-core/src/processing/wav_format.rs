//! RIFF/WAVE header layout for 16-bit PCM output.
//!
//! ```text
//! [0-3]    "RIFF"
//! [4-7]    file size - 8
//! [8-11]   "WAVE"
//! [12-15]  "fmt "
//! [16-19]  16 (PCM format chunk size)
//! [20-21]  1 (PCM format code)
//! [22-23]  channels
//! [24-27]  sample_rate
//! [28-31]  byte_rate = sample_rate * channels * bit_depth / 8
//! [32-33]  block_align = channels * bit_depth / 8
//! [34-35]  bit_depth
//! [36-39]  "data"
//! [40-43]  data_size
//! ```

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Format of the PCM stream inside a WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
}

impl WavSpec {
    /// Saturates for formats no header field can describe.
    pub fn byte_rate(&self) -> u32 {
        let bytes = self.sample_rate as u64 * self.channels as u64 * self.bit_depth as u64 / 8;
        u32::try_from(bytes).unwrap_or(u32::MAX)
    }

    pub fn block_align(&self) -> u16 {
        let bytes = self.channels as u32 * self.bit_depth as u32 / 8;
        u16::try_from(bytes).unwrap_or(u16::MAX)
    }

    /// Header with `data_size` bytes of PCM following it.
    pub fn header(&self, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
        let mut header = [0u8; WAV_HEADER_SIZE];

        header[0..4].copy_from_slice(b"RIFF");
        header[8..12].copy_from_slice(b"WAVE");

        header[12..16].copy_from_slice(b"fmt ");
        header[16..20].copy_from_slice(&16u32.to_le_bytes());
        header[20..22].copy_from_slice(&1u16.to_le_bytes());
        header[22..24].copy_from_slice(&self.channels.to_le_bytes());
        header[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        header[28..32].copy_from_slice(&self.byte_rate().to_le_bytes());
        header[32..34].copy_from_slice(&self.block_align().to_le_bytes());
        header[34..36].copy_from_slice(&self.bit_depth.to_le_bytes());

        header[36..40].copy_from_slice(b"data");
        patch_sizes(&mut header, data_size as u64);

        header
    }
}

/// Patch the RIFF chunk size (offset 4) and data size (offset 40).
///
/// Sizes beyond 4 GiB saturate; the file is still playable up to that point.
pub fn patch_sizes(header: &mut [u8], data_size: u64) {
    let data = u32::try_from(data_size).unwrap_or(u32::MAX);
    let riff = data.saturating_add(36);
    header[4..8].copy_from_slice(&riff.to_le_bytes());
    header[40..44].copy_from_slice(&data.to_le_bytes());
}

/// Read back the format and data size of a header written by [`WavSpec::header`].
pub fn parse_header(bytes: &[u8]) -> Option<(WavSpec, u32)> {
    if bytes.len() < WAV_HEADER_SIZE || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return None;
    }
    let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
    let u32_at = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);

    if u16_at(20) != 1 {
        return None;
    }
    let spec = WavSpec {
        channels: u16_at(22),
        sample_rate: u32_at(24),
        bit_depth: u16_at(34),
    };
    Some((spec, u32_at(40)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CD_STEREO: WavSpec = WavSpec {
        sample_rate: 44_100,
        channels: 2,
        bit_depth: 16,
    };

    #[test]
    fn header_magic_and_format() {
        let header = CD_STEREO.header(0);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
        assert_eq!(u16::from_le_bytes([header[20], header[21]]), 1);
    }

    #[test]
    fn derived_fields() {
        assert_eq!(CD_STEREO.byte_rate(), 176_400);
        assert_eq!(CD_STEREO.block_align(), 4);

        let mono = WavSpec { channels: 1, ..CD_STEREO };
        assert_eq!(mono.byte_rate(), 88_200);
        assert_eq!(mono.block_align(), 2);
    }

    #[test]
    fn oversized_format_saturates_instead_of_overflowing() {
        let huge = WavSpec { sample_rate: u32::MAX, ..CD_STEREO };
        assert_eq!(huge.byte_rate(), u32::MAX);
        let header = huge.header(0);
        assert_eq!(u32::from_le_bytes([header[28], header[29], header[30], header[31]]), u32::MAX);
    }

    #[test]
    fn header_parses_back() {
        let header = CD_STEREO.header(4_000);
        let (spec, data_size) = parse_header(&header).unwrap();
        assert_eq!(spec, CD_STEREO);
        assert_eq!(data_size, 4_000);
        let riff = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        assert_eq!(riff, 4_036);
    }

    #[test]
    fn patch_updates_both_sizes() {
        let mut header = CD_STEREO.header(0);
        patch_sizes(&mut header, 19_200);
        let (_, data_size) = parse_header(&header).unwrap();
        assert_eq!(data_size, 19_200);
        let riff = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        assert_eq!(riff, 19_236);
    }

    #[test]
    fn oversized_data_saturates() {
        let mut header = CD_STEREO.header(0);
        patch_sizes(&mut header, u64::MAX);
        let (_, data_size) = parse_header(&header).unwrap();
        assert_eq!(data_size, u32::MAX);
    }

    #[test]
    fn parse_rejects_non_wav() {
        assert!(parse_header(b"not a wav file at all, definitely not 44 by").is_none());
        assert!(parse_header(&[0u8; 10]).is_none());
    }
}
