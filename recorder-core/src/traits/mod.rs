pub mod capture_delegate;
pub mod capture_provider;
pub mod capture_session;
pub mod clock;
pub mod frame_source;
pub mod video_encoder;
