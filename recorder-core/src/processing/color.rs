//! Color-space conversion between screenshot pixels and encoder input.

use crate::models::media_models::{Resolution, VideoFrame};

/// Largest even size not exceeding the frame's dimensions.
///
/// Most encoders reject odd widths/heights for 4:2:0 output.
pub fn even_dimensions(width: u32, height: u32) -> Resolution {
    Resolution::new(width & !1, height & !1)
}

/// Convert an RGBA frame to packed BGR24 of exactly `target` size.
///
/// The frame is anchored at the top-left corner: extra rows/columns are
/// cropped, missing ones are filled with black. Alpha is discarded.
pub fn rgba_to_bgr24(frame: &VideoFrame, target: Resolution) -> Vec<u8> {
    let mut out = vec![0u8; target.width as usize * target.height as usize * 3];
    rgba_to_bgr24_into(frame, target, &mut out);
    out
}

/// Same as [`rgba_to_bgr24`], writing into a reused buffer.
///
/// `out` must hold `target.width * target.height * 3` bytes.
pub fn rgba_to_bgr24_into(frame: &VideoFrame, target: Resolution, out: &mut [u8]) {
    let dst_w = target.width as usize;
    let dst_h = target.height as usize;
    debug_assert_eq!(out.len(), dst_w * dst_h * 3);

    let src_w = frame.width as usize;
    // A short buffer limits the usable rows.
    let src_rows = if src_w == 0 {
        0
    } else {
        (frame.rgba.len() / (src_w * 4)).min(frame.height as usize)
    };
    let copy_w = src_w.min(dst_w);

    for (y, dst_row) in out.chunks_exact_mut(dst_w * 3).enumerate() {
        if y >= src_rows {
            dst_row.fill(0);
            continue;
        }
        let src_row = &frame.rgba[y * src_w * 4..(y * src_w + copy_w) * 4];
        for (dst_px, src_px) in dst_row.chunks_exact_mut(3).zip(src_row.chunks_exact(4)) {
            dst_px[0] = src_px[2];
            dst_px[1] = src_px[1];
            dst_px[2] = src_px[0];
        }
        dst_row[copy_w * 3..].fill(0);
    }
}
