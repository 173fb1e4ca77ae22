//! Byte sizes as users type and read them (`512K`, `10MB`, `1.5 GB`).
//!
//! Units are binary: 1 KB = 1024 bytes.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteUnit {
    B,
    KB,
    MB,
    GB,
    TB,
}

impl ByteUnit {
    pub const ALL: [ByteUnit; 5] = [
        ByteUnit::B,
        ByteUnit::KB,
        ByteUnit::MB,
        ByteUnit::GB,
        ByteUnit::TB,
    ];

    pub const fn bytes(self) -> u64 {
        match self {
            ByteUnit::B => 1,
            ByteUnit::KB => 1 << 10,
            ByteUnit::MB => 1 << 20,
            ByteUnit::GB => 1 << 30,
            ByteUnit::TB => 1 << 40,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            ByteUnit::B => "B",
            ByteUnit::KB => "KB",
            ByteUnit::MB => "MB",
            ByteUnit::GB => "GB",
            ByteUnit::TB => "TB",
        }
    }
}

impl fmt::Display for ByteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ByteSizeError {
    #[error("empty size")]
    Empty,
    #[error("invalid number in size {0:?}")]
    InvalidNumber(String),
    #[error("unknown unit {0:?} (expected B, KB, MB, GB or TB)")]
    UnknownUnit(String),
    #[error("size {0:?} does not fit in 64 bits")]
    Overflow(String),
}

impl FromStr for ByteUnit {
    type Err = ByteSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "" | "B" => Ok(ByteUnit::B),
            "K" | "KB" | "KIB" => Ok(ByteUnit::KB),
            "M" | "MB" | "MIB" => Ok(ByteUnit::MB),
            "G" | "GB" | "GIB" => Ok(ByteUnit::GB),
            "T" | "TB" | "TIB" => Ok(ByteUnit::TB),
            _ => Err(ByteSizeError::UnknownUnit(s.to_string())),
        }
    }
}

/// Parse `<number>[unit]`; fractional numbers are allowed with a unit
pub fn parse_byte_size(input: &str) -> Result<u64, ByteSizeError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ByteSizeError::Empty);
    }

    let split = input
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);
    let unit: ByteUnit = unit.trim().parse()?;

    if let Ok(whole) = number.parse::<u64>() {
        return whole
            .checked_mul(unit.bytes())
            .ok_or_else(|| ByteSizeError::Overflow(input.to_string()));
    }

    let value: f64 = number
        .parse()
        .map_err(|_| ByteSizeError::InvalidNumber(input.to_string()))?;
    let bytes = value * unit.bytes() as f64;
    if !bytes.is_finite() || bytes >= u64::MAX as f64 {
        return Err(ByteSizeError::Overflow(input.to_string()));
    }
    Ok(bytes as u64)
}

/// Format byte size to human readable
pub fn format_size(bytes: u64) -> String {
    let unit = ByteUnit::ALL
        .iter()
        .rev()
        .copied()
        .find(|unit| bytes >= unit.bytes())
        .unwrap_or(ByteUnit::B);

    match unit {
        ByteUnit::B => format!("{} bytes", bytes),
        unit => format!("{:.2} {}", bytes as f64 / unit.bytes() as f64, unit),
    }
}
