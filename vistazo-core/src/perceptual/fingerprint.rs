//! 64-bit perceptual fingerprints.
//!
//! Both hash families (aHash and pHash) produce exactly 64 bits. On disk and
//! on the wire a fingerprint is always 16 lowercase, zero-padded hex digits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, VistazoError};

/// Fixed fingerprint size in bytes (64 bits = 8 bytes).
pub const FINGERPRINT_SIZE: usize = 8;

/// Number of hex digits in a serialized fingerprint.
pub const FINGERPRINT_HEX_LEN: usize = FINGERPRINT_SIZE * 2;

/// A 64-bit perceptual fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    /// Pack a row-major bit sequence, first bit most significant.
    ///
    /// Only the first 64 bits are used; shorter sequences are padded with
    /// zeros on the right.
    pub fn from_bits<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        let mut value = 0u64;
        let mut count = 0;
        for bit in bits.into_iter().take(64) {
            value = (value << 1) | u64::from(bit);
            count += 1;
        }
        if count < 64 {
            value <<= 64 - count;
        }
        Self(value)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Number of differing bits, in `[0, 64]`.
    pub fn hamming_distance(self, other: Self) -> u32 {
        hamming_distance(self, other)
    }

    /// Get the fingerprint as a 16-digit lowercase hexadecimal string.
    pub fn to_hex(self) -> String {
        hex::encode(self.0.to_be_bytes())
    }

    /// Parse a fingerprint from exactly 16 hex digits (either case).
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.len() != FINGERPRINT_HEX_LEN {
            return Err(VistazoError::InvalidFingerprint(format!(
                "expected {FINGERPRINT_HEX_LEN} hex digits, got {}",
                hex_str.len()
            )));
        }

        let mut bytes = [0u8; FINGERPRINT_SIZE];
        hex::decode_to_slice(hex_str, &mut bytes)
            .map_err(|e| VistazoError::InvalidFingerprint(format!("{hex_str:?}: {e}")))?;
        Ok(Self(u64::from_be_bytes(bytes)))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = VistazoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Compute the Hamming distance between two fingerprints: XOR then popcount.
pub fn hamming_distance(a: Fingerprint, b: Fingerprint) -> u32 {
    (a.0 ^ b.0).count_ones()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_size() {
        assert_eq!(FINGERPRINT_SIZE, 8);
        assert_eq!(FINGERPRINT_HEX_LEN, 16);
    }

    #[test]
    fn test_hamming_distance_identical() {
        let a = Fingerprint::new(0x00FF_AA55_00FF_AA55);
        assert_eq!(hamming_distance(a, a), 0);
    }

    #[test]
    fn test_hamming_distance_opposite() {
        let a = Fingerprint::new(0);
        let b = Fingerprint::new(u64::MAX);
        assert_eq!(hamming_distance(a, b), 64);
    }

    #[test]
    fn test_hamming_distance_symmetric() {
        let a = Fingerprint::new(0xDEAD_BEEF_CAFE_BABE);
        let b = Fingerprint::new(0x0123_4567_89AB_CDEF);
        assert_eq!(a.hamming_distance(b), b.hamming_distance(a));
        assert!(a.hamming_distance(b) <= 64);
    }

    #[test]
    fn test_hamming_distance_single_bit() {
        let a = Fingerprint::new(0);
        let b = Fingerprint::new(1 << 63);
        assert_eq!(hamming_distance(a, b), 1);
    }

    #[test]
    fn test_hex_is_zero_padded_lowercase() {
        let fp = Fingerprint::new(0xAB);
        assert_eq!(fp.to_hex(), "00000000000000ab");
        assert_eq!(fp.to_string(), "00000000000000ab");
    }

    #[test]
    fn test_hex_roundtrip() {
        let original = Fingerprint::new(0xDEAD_BEEF_CAFE_BABE);
        let hex = original.to_hex();
        assert_eq!(hex, "deadbeefcafebabe");
        assert_eq!(Fingerprint::from_hex(&hex).unwrap(), original);
        assert_eq!(Fingerprint::from_hex("DEADBEEFCAFEBABE").unwrap(), original);
    }

    #[test]
    fn test_from_hex_rejects_wrong_length() {
        assert!(Fingerprint::from_hex("abc").is_err());
        assert!(Fingerprint::from_hex("00000000000000000").is_err());
    }

    #[test]
    fn test_from_hex_rejects_non_hex() {
        assert!(Fingerprint::from_hex("zzzzzzzzzzzzzzzz").is_err());
    }

    #[test]
    fn test_from_bits_is_big_endian() {
        let mut bits = vec![false; 64];
        bits[0] = true;
        bits[63] = true;
        let fp = Fingerprint::from_bits(bits);
        assert_eq!(fp.bits(), (1 << 63) | 1);
    }

    #[test]
    fn test_serde_uses_hex_string() {
        let fp = Fingerprint::new(0x0F);
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, "\"000000000000000f\"");
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
        assert!(serde_json::from_str::<Fingerprint>("\"xyz\"").is_err());
    }
}
