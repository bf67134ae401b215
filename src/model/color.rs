//! Color values.

use crate::error::{Error, Result};
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A fully specified 24-bit RGB color.
///
/// Only `#RRGGBB` strings and three-element arrays are accepted; short
/// forms such as `#FFF` and packed integers are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Upper-case hex digits without a leading `#`, as stored in `a:srgbClr/@val`.
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Parse six hex digits, with or without a leading `#`.
    pub fn from_hex(value: &str) -> Result<Self> {
        let digits = value.strip_prefix('#').unwrap_or(value);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(format!(
                "expected six hex digits (#RRGGBB), got {:?}",
                value
            )));
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
        match (channel(0), channel(2), channel(4)) {
            (Ok(r), Ok(g), Ok(b)) => Ok(Self::new(r, g, b)),
            _ => Err(Error::InvalidColor(value.to_string())),
        }
    }
}

impl FromStr for RgbColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s.trim())
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.hex())
    }
}

impl Serialize for RgbColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RgbColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RgbVisitor;

        impl<'de> Visitor<'de> for RgbVisitor {
            type Value = RgbColor;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an [r, g, b] array or a \"#RRGGBB\" string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<RgbColor, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_seq<A: SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<RgbColor, A::Error> {
                let mut channels = [0u8; 3];
                for (i, channel) in channels.iter_mut().enumerate() {
                    *channel = seq
                        .next_element()?
                        .ok_or_else(|| de::Error::invalid_length(i, &self))?;
                }
                if seq.next_element::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(4, &self));
                }
                Ok(RgbColor::new(channels[0], channels[1], channels[2]))
            }
        }

        deserializer.deserialize_any(RgbVisitor)
    }
}

/// A DrawingML color reference as found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ColorValue {
    /// `a:srgbClr`
    Rgb(RgbColor),
    /// `a:schemeClr`, resolved by the theme
    Scheme(String),
    /// `a:prstClr`
    Preset(String),
    /// `a:sysClr`
    System(String),
}

impl ColorValue {
    /// The explicit RGB value, if this is one.
    pub fn rgb(&self) -> Option<RgbColor> {
        match self {
            ColorValue::Rgb(c) => Some(*c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let color = RgbColor::from_hex("#e8f4f8").unwrap();
        assert_eq!(color, RgbColor::new(232, 244, 248));
        assert_eq!(color.hex(), "E8F4F8");
        assert_eq!(color.to_string(), "#E8F4F8");
    }

    #[test]
    fn test_short_forms_rejected() {
        assert!(RgbColor::from_hex("#FFF").is_err());
        assert!(RgbColor::from_hex("0xFF0000").is_err());
        assert!(RgbColor::from_hex("GG0000").is_err());
    }

    #[test]
    fn test_deserialize_array_and_string() {
        let c: RgbColor = serde_json::from_str("[70, 70, 70]").unwrap();
        assert_eq!(c, RgbColor::new(70, 70, 70));

        let c: RgbColor = serde_json::from_str("\"#464646\"").unwrap();
        assert_eq!(c, RgbColor::new(70, 70, 70));

        assert!(serde_json::from_str::<RgbColor>("[70, 70]").is_err());
        assert!(serde_json::from_str::<RgbColor>("[70, 70, 70, 1]").is_err());
        assert!(serde_json::from_str::<RgbColor>("[300, 0, 0]").is_err());
        assert!(serde_json::from_str::<RgbColor>("16711680").is_err());
    }
}
