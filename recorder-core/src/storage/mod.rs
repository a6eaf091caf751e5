pub mod checksum;
pub mod metadata;
pub mod naming;
pub mod settings_store;
pub mod wav_writer;
