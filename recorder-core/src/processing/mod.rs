pub mod color;
pub mod frame_pacer;
pub mod sample_buffer;
pub mod sample_convert;
pub mod wav_format;
