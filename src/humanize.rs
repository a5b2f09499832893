//! Human-readable byte sizes for configuration values ("256KB", "32MB")

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid size format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    #[error("Size overflows u64: {0}")]
    Overflow(String),
}

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;

// Largest first, so formatting picks the biggest exact unit.
const UNITS: &[(&str, u64)] = &[("GB", GIB), ("MB", MIB), ("KB", KIB)];

/// Byte count that deserializes from either an integer or a string with a
/// binary unit suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub const fn kib(n: u64) -> Self {
        ByteSize(n * KIB)
    }

    pub const fn mib(n: u64) -> Self {
        ByteSize(n * MIB)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Saturates on 32-bit targets
    pub fn as_usize(&self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }

    /// Shortest exact rendering; parses back to the same value.
    pub fn to_human_readable(&self) -> String {
        UNITS
            .iter()
            .find(|(_, size)| self.0 >= *size && self.0 % size == 0)
            .map(|(unit, size)| format!("{}{}", self.0 / size, unit))
            .unwrap_or_else(|| format!("{}B", self.0))
    }
}

impl FromStr for ByteSize {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);
        if digits.is_empty() {
            return Err(ParseError::InvalidFormat(s.to_string()));
        }

        let value: u64 = digits.parse()?;
        let multiplier = match unit.trim().to_ascii_uppercase().as_str() {
            "" | "B" => 1,
            "K" | "KB" | "KIB" => KIB,
            "M" | "MB" | "MIB" => MIB,
            "G" | "GB" | "GIB" => GIB,
            _ => return Err(ParseError::InvalidUnit(unit.trim().to_string())),
        };

        value
            .checked_mul(multiplier)
            .map(ByteSize)
            .ok_or_else(|| ParseError::Overflow(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ByteSizeVisitor;

        impl serde::de::Visitor<'_> for ByteSizeVisitor {
            type Value = ByteSize;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a byte size as string (e.g., \"256KB\") or integer")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ByteSize(v))
            }

            // TOML and environment sources hand integers over as i64
            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(v)
                    .map(ByteSize)
                    .map_err(|_| E::custom(format!("byte size must not be negative: {v}")))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse::<ByteSize>().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(ByteSizeVisitor)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_human_readable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_units() {
        assert_eq!("1000".parse::<ByteSize>().unwrap().as_u64(), 1000);
        assert_eq!("256KB".parse::<ByteSize>().unwrap(), ByteSize::kib(256));
        assert_eq!("256 kb".parse::<ByteSize>().unwrap(), ByteSize::kib(256));
        assert_eq!("32M".parse::<ByteSize>().unwrap(), ByteSize::mib(32));
        assert_eq!("1GiB".parse::<ByteSize>().unwrap().as_u64(), GIB);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("MB".parse::<ByteSize>(), Err(ParseError::InvalidFormat(_))));
        assert!(matches!("5XB".parse::<ByteSize>(), Err(ParseError::InvalidUnit(_))));
        assert!(matches!(
            "99999999999999GB".parse::<ByteSize>(),
            Err(ParseError::Overflow(_))
        ));
    }

    #[test]
    fn test_human_readable_is_exact() {
        assert_eq!(ByteSize::kib(256).to_human_readable(), "256KB");
        assert_eq!(ByteSize::mib(32).to_human_readable(), "32MB");
        assert_eq!(ByteSize(1536 * 1024).to_human_readable(), "1536KB");
        assert_eq!(ByteSize(1000).to_human_readable(), "1000B");
        assert_eq!(ByteSize(0).to_human_readable(), "0B");
    }

    #[test]
    fn test_display_parses_back() {
        for size in [ByteSize(1), ByteSize(1000), ByteSize::kib(3), ByteSize::mib(5)] {
            assert_eq!(size.to_string().parse::<ByteSize>().unwrap(), size);
        }
    }

    #[test]
    fn test_deserialize_string_and_number() {
        #[derive(Deserialize)]
        struct Limits {
            range: ByteSize,
            response: ByteSize,
        }
        let parsed: Limits = serde_json::from_str(r#"{"range": "256KB", "response": 1024}"#).unwrap();
        assert_eq!(parsed.range, ByteSize::kib(256));
        assert_eq!(parsed.response.as_u64(), 1024);
    }

    #[test]
    fn test_deserialize_negative_fails() {
        #[derive(Debug, Deserialize)]
        struct Limits {
            #[allow(dead_code)]
            range: ByteSize,
        }
        assert!(serde_json::from_str::<Limits>(r#"{"range": -5}"#).is_err());
    }
}
