//! Keccak-256, the content-addressing primitive for hash references.
//!
//! Kept as a thin wrapper over `tiny-keccak`, matching the teacher's
//! `hasher.rs`/`utils.rs::keccak256`.

use tiny_keccak::{Hasher as _, Keccak};

/// Computes the Keccak-256 digest of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_matches_known_constant() {
        // keccak256(b"") is a widely cited test vector.
        let digest = keccak256(&[]);
        assert_eq!(
            digest,
            [
                0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7,
                0x03, 0xc0, 0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04,
                0x5d, 0x85, 0xa4, 0x70,
            ]
        );
    }
}
