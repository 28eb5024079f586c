pub mod builtin;
pub mod config;
pub mod pattern;
pub mod prelude;
pub mod tables;
pub mod wmo;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

pub use crate::tables::{
    AEntry, BTableEntry, DTableEntry, Dependency, FTableEntry, TableA, TableDefinitions, TableF,
    Tables,
};

pub trait TableConverter {
    type OutputEntry;
    fn convert<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<Vec<Self::OutputEntry>>;
}

/// Packed descriptor key: F (2 bits) | X (6 bits) | Y (8 bits).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FXY(u16);

impl FXY {
    pub const fn new(f: u8, x: u8, y: u8) -> Self {
        FXY((((f & 0x03) as u16) << 14) | (((x & 0x3f) as u16) << 8) | y as u16)
    }

    pub const fn from_u16(packed: u16) -> Self {
        FXY(packed)
    }

    pub fn try_new(f: u8, x: u8, y: u8) -> anyhow::Result<Self> {
        if f > 3 {
            bail!("F out of range (0..=3): {}", f);
        }
        if x > 63 {
            bail!("X out of range (0..=63): {}", x);
        }
        Ok(Self::new(f, x, y))
    }

    #[inline]
    pub const fn f(&self) -> u8 {
        (self.0 >> 14) as u8
    }

    #[inline]
    pub const fn x(&self) -> u8 {
        ((self.0 >> 8) & 0x3f) as u8
    }

    #[inline]
    pub const fn y(&self) -> u8 {
        (self.0 & 0xff) as u8
    }

    #[inline]
    pub const fn to_u16(&self) -> u16 {
        self.0
    }

    pub fn is_element(&self) -> bool {
        self.f() == 0
    }

    /// `F-XX-YYY`, the form used in messages and logs.
    pub fn dashed(&self) -> String {
        format!("{}-{:02}-{:03}", self.f(), self.x(), self.y())
    }
}

impl Display for FXY {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:02}{:03}", self.f(), self.x(), self.y())
    }
}

impl FromStr for FXY {
    type Err = anyhow::Error;

    fn from_str(fxy_str: &str) -> anyhow::Result<Self> {
        let s = fxy_str.trim();
        if !s.is_ascii() {
            bail!("Invalid FXY string: {:?}", fxy_str);
        }

        let bytes = s.as_bytes();
        let (f, x, y) = match bytes.len() {
            6 => (&s[0..1], &s[1..3], &s[3..6]),
            8 if bytes[1] == b'-' && bytes[4] == b'-' => (&s[0..1], &s[2..4], &s[5..8]),
            _ => bail!("Invalid FXY string length: {:?}", fxy_str),
        };

        let digits = |part: &str, name: &str| -> anyhow::Result<u8> {
            if !part.bytes().all(|b| b.is_ascii_digit()) {
                bail!("Non-digit {} in FXY: {:?}", name, fxy_str);
            }
            part.parse::<u8>()
                .with_context(|| format!("Failed to parse {} from FXY: {:?}", name, fxy_str))
        };

        FXY::try_new(digits(f, "F")?, digits(x, "X")?, digits(y, "Y")?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableType {
    A,
    B,
    D,
    F,
}

impl Display for TableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match self {
            TableType::A => 'A',
            TableType::B => 'B',
            TableType::D => 'D',
            TableType::F => 'F',
        };
        write!(f, "{}", c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_fields() {
        let fxy = FXY::new(3, 1, 11);
        assert_eq!(fxy.to_u16(), (3 << 14) | (1 << 8) | 11);
        assert_eq!((fxy.f(), fxy.x(), fxy.y()), (3, 1, 11));
        assert_eq!(FXY::from_u16(fxy.to_u16()), fxy);
    }

    #[test]
    fn parses_both_text_forms() {
        let six: FXY = "012101".parse().unwrap();
        let eight: FXY = "0-12-101".parse().unwrap();
        assert_eq!(six, FXY::new(0, 12, 101));
        assert_eq!(six, eight);
        assert_eq!(six.to_string(), "012101");
        assert_eq!(six.dashed(), "0-12-101");
    }

    #[test]
    fn rejects_bad_text() {
        assert!("01210".parse::<FXY>().is_err());
        assert!("412101".parse::<FXY>().is_err());
        assert!("064000".parse::<FXY>().is_err());
        assert!("0-12-1x1".parse::<FXY>().is_err());
        assert!("0+1+101".parse::<FXY>().is_err());
        assert!("001256".parse::<FXY>().is_err());
    }

    #[test]
    fn orders_by_packed_value() {
        let mut v = vec![FXY::new(3, 0, 1), FXY::new(0, 63, 255), FXY::new(1, 0, 0)];
        v.sort();
        assert_eq!(
            v,
            vec![FXY::new(0, 63, 255), FXY::new(1, 0, 0), FXY::new(3, 0, 1)]
        );
    }
}
