use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, VistazoError};

/// A 24-bit sRGB color, serialized as 6 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Round a floating-point triple to the nearest channel values.
    pub fn from_f64(r: f64, g: f64, b: f64) -> Self {
        let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        Self::new(channel(r), channel(g), channel(b))
    }

    pub fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Arithmetic mean of the three channels.
    pub fn mean(self) -> f64 {
        (f64::from(self.r) + f64::from(self.g) + f64::from(self.b)) / 3.0
    }

    /// Difference between the largest and smallest channel.
    pub fn spread(self) -> u8 {
        let [r, g, b] = self.channels();
        r.max(g).max(b) - r.min(g).min(b)
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.channels())
    }

    /// Parse 6 hex digits, with or without a leading `#`.
    pub fn from_hex(input: &str) -> Result<Self> {
        let digits = input.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return Err(VistazoError::InvalidColor(format!(
                "expected 6 hex digits, got {input:?}"
            )));
        }
        let mut bytes = [0u8; 3];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| VistazoError::InvalidColor(format!("{input:?}: {e}")))?;
        Ok(Self::new(bytes[0], bytes[1], bytes[2]))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = VistazoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
