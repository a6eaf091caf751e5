pub mod audio_loop;
pub mod control;
pub mod countdown;
pub mod recording;
pub mod video_loop;
