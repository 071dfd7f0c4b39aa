//! SHA3-256 hashing helpers. Prefix derivation (see `prefix.rs`) truncates
//! the digest to its first 16 bytes (128 bits) before hex-encoding;
//! archive-integrity checks (`HashMismatch`) use the full 32-byte digest.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha3::{Digest, Sha3_256};

pub fn sha3_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

pub fn sha3_str(s: &str) -> [u8; 32] {
    sha3_bytes(s.as_bytes())
}

pub fn sha3_file(path: &Path) -> io::Result<[u8; 32]> {
    let mut file = File::open(path)?;
    let mut hasher = Sha3_256::new();
    let mut buf = [0u8; 65536];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().into())
}

/// Lower-case hex of the full 32-byte digest.
pub fn hex_full(digest: &[u8; 32]) -> String {
    hex::encode(digest)
}

/// Lower-case hex of the first 16 bytes of the digest (128 bits), the
/// install-prefix hash width.
pub fn hex_truncated_128(digest: &[u8; 32]) -> String {
    hex::encode(&digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_truncated_is_32_chars() {
        let digest = sha3_str("hello");
        assert_eq!(hex_truncated_128(&digest).len(), 32);
        assert_eq!(hex_full(&digest).len(), 64);
    }

    #[test]
    fn same_input_same_hash() {
        assert_eq!(sha3_str("abc"), sha3_str("abc"));
        assert_ne!(sha3_str("abc"), sha3_str("abd"));
    }

    #[test]
    fn file_hash_matches_string_hash() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), b"payload").unwrap();
        assert_eq!(sha3_file(tmp.path()).unwrap(), sha3_str("payload"));
    }
}
