use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;

/// SHA-256 hex digest of a file, streamed in 64 KiB chunks.
pub fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let file = File::open(path).map_err(|e| CaptureError::storage("failed to open file for checksum", e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut chunk = vec![0u8; 64 * 1024];
    loop {
        let read = reader
            .read(&mut chunk)
            .map_err(|e| CaptureError::storage("failed to read file for checksum", e))?;
        if read == 0 {
            break;
        }
        hasher.update(&chunk[..read]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn missing_file_is_storage_error() {
        let err = sha256_file(Path::new("/definitely/not/here.wav")).unwrap_err();
        assert!(matches!(err, CaptureError::StorageError(_)));
    }
}
