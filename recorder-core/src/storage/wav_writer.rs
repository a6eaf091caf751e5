use std::fs::{self, File};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::models::recording_result::MediaOutput;
use crate::processing::sample_convert;
use crate::processing::wav_format::{self, WavSpec, WAV_HEADER_SIZE};
use crate::storage::checksum::sha256_file;

/// Streaming 16-bit PCM WAV writer.
///
/// The header is written with a zero data size on `open` and patched on
/// `close`, so an interrupted recording still leaves a file with a valid
/// (if undersized) header.
///
/// ```text
/// [44-byte WAV header]
/// [raw 16-bit PCM data...]
/// ```
pub struct WavFileWriter {
    file_path: PathBuf,
    spec: WavSpec,
    file: Option<BufWriter<File>>,
    data_bytes: u64,
}

impl WavFileWriter {
    pub fn new(file_path: PathBuf, spec: WavSpec) -> Self {
        Self {
            file_path,
            spec,
            file: None,
            data_bytes: 0,
        }
    }

    /// Create the file and write the placeholder header.
    pub fn open(&mut self) -> Result<(), CaptureError> {
        if self.file.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).map_err(|e| CaptureError::storage("failed to create directory", e))?;
        }

        let file = File::create(&self.file_path).map_err(|e| CaptureError::storage("failed to create file", e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(&self.spec.header(0))
            .map_err(|e| CaptureError::storage("failed to write header", e))?;

        self.file = Some(writer);
        self.data_bytes = 0;
        Ok(())
    }

    /// Append already-encoded PCM bytes.
    pub fn write(&mut self, pcm: &[u8]) -> Result<(), CaptureError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::StorageError("file is not open for writing".into()))?;
        file.write_all(pcm).map_err(|e| CaptureError::storage("write failed", e))?;
        self.data_bytes += pcm.len() as u64;
        Ok(())
    }

    /// Encode interleaved f32 samples as 16-bit PCM and append them.
    pub fn write_samples(&mut self, samples: &[f32]) -> Result<usize, CaptureError> {
        let pcm = sample_convert::to_pcm16(samples);
        self.write(&pcm)?;
        Ok(pcm.len())
    }

    /// Patch the header sizes, flush, and checksum the finished file.
    pub fn close(&mut self) -> Result<MediaOutput, CaptureError> {
        let writer = self
            .file
            .take()
            .ok_or_else(|| CaptureError::StorageError("file is not open".into()))?;
        let mut file = writer
            .into_inner()
            .map_err(|e| CaptureError::storage("flush failed", e.error()))?;

        let mut header = self.spec.header(0);
        wav_format::patch_sizes(&mut header, self.data_bytes);

        file.seek(SeekFrom::Start(0))
            .map_err(|e| CaptureError::storage("seek failed", e))?;
        file.write_all(&header)
            .map_err(|e| CaptureError::storage("header patch failed", e))?;
        file.sync_all().map_err(|e| CaptureError::storage("sync failed", e))?;
        drop(file);

        let checksum = sha256_file(&self.file_path)?;
        Ok(MediaOutput {
            file_path: self.file_path.clone(),
            size_bytes: WAV_HEADER_SIZE as u64 + self.data_bytes,
            checksum,
        })
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// PCM bytes written so far (header excluded).
    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    /// Whole sample frames written so far.
    pub fn frames_written(&self) -> u64 {
        let align = self.spec.block_align().max(1) as u64;
        self.data_bytes / align
    }

    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}
