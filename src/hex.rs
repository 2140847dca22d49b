//! Bytes in hex notation, as used on the command line and in YAML configuration.
//!
//! Single bytes can be written as `0A` or `0x0A`. Byte strings accept the same
//! notation for each token, separated by whitespace or commas, and tokens may
//! hold multiple bytes, so `B5 62`, `0xB5,0x62` and `b562` are all the same.

use serde::Deserialize;
use std::convert::TryFrom;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ByteRepr")]
pub struct Byte(u8);

impl Byte {
    pub fn get(self) -> u8 {
        self.0
    }
}

impl FromStr for Byte {
    type Err = ParseHexError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let digits = strip_hex_prefix(source.trim());
        if digits.is_empty() {
            return Err(ParseHexError::Blank);
        }

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseHexError::invalid_digit(source));
        }
        match digits.len() {
            2 => u8::from_str_radix(digits, 16)
                .map(Byte)
                .map_err(|_| ParseHexError::invalid_digit(source)),
            len if len % 2 != 0 => Err(ParseHexError::odd_digits(digits)),
            _ => Err(ParseHexError::not_a_byte(source)),
        }
    }
}

/// YAML gives us plain integers for `6` or `0x06`, and strings for `"06"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ByteRepr {
    Num(u8),
    Text(String),
}

impl TryFrom<ByteRepr> for Byte {
    type Error = ParseHexError;

    fn try_from(repr: ByteRepr) -> Result<Self, Self::Error> {
        match repr {
            ByteRepr::Num(num) => Ok(Byte(num)),
            ByteRepr::Text(text) => text.parse(),
        }
    }
}

/// A sequence of bytes, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "HexBytesRepr")]
pub struct HexBytes(Vec<u8>);

impl HexBytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0[..]
    }
}

impl FromStr for HexBytes {
    type Err = ParseHexError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let mut bytes = Vec::new();
        for token in source
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
        {
            let digits = strip_hex_prefix(token)
                .chars()
                .map(|c| c.to_digit(16).map(|digit| digit as u8))
                .collect::<Option<Vec<u8>>>()
                .ok_or_else(|| ParseHexError::invalid_digit(token))?;
            if digits.is_empty() || digits.len() % 2 != 0 {
                return Err(ParseHexError::odd_digits(token));
            }
            bytes.extend(digits.chunks(2).map(|pair| pair[0] << 4 | pair[1]));
        }
        Ok(HexBytes(bytes))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HexBytesRepr {
    Text(String),
    List(Vec<Byte>),
}

impl TryFrom<HexBytesRepr> for HexBytes {
    type Error = ParseHexError;

    fn try_from(repr: HexBytesRepr) -> Result<Self, Self::Error> {
        match repr {
            HexBytesRepr::Text(text) => text.parse(),
            HexBytesRepr::List(list) => Ok(HexBytes(list.into_iter().map(Byte::get).collect())),
        }
    }
}

fn strip_hex_prefix(token: &str) -> &str {
    token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseHexError {
    #[error("Could not parse blank string as a byte")]
    Blank,
    #[error("Expected a single byte in hex notation, e.g. 0A or 0x0A, but got: `{input}`")]
    NotAByte { input: String },
    #[error("Found invalid hex digit in: `{input}`")]
    InvalidDigit { input: String },
    #[error("Expected two hex digits per byte, but found an odd number in: `{input}`")]
    OddDigits { input: String },
}

impl ParseHexError {
    fn not_a_byte(input: &str) -> Self {
        ParseHexError::NotAByte {
            input: input.into(),
        }
    }

    fn invalid_digit(input: &str) -> Self {
        ParseHexError::InvalidDigit {
            input: input.into(),
        }
    }

    fn odd_digits(input: &str) -> Self {
        ParseHexError::OddDigits {
            input: input.into(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn byte_with_and_without_prefix() {
        assert_eq!("0A".parse::<Byte>().unwrap().get(), 0x0A);
        assert_eq!("0x0a".parse::<Byte>().unwrap().get(), 0x0A);
        assert_eq!("0XFF".parse::<Byte>().unwrap().get(), 0xFF);
        assert_eq!(" 62 ".parse::<Byte>().unwrap().get(), 0x62);
    }

    #[test]
    fn blank_byte() {
        assert_eq!("".parse::<Byte>().unwrap_err(), ParseHexError::Blank);
        assert_eq!("0x".parse::<Byte>().unwrap_err(), ParseHexError::Blank);
    }

    #[test]
    fn byte_out_of_range() {
        assert_eq!(
            "0x100".parse::<Byte>().unwrap_err(),
            ParseHexError::OddDigits {
                input: "100".into()
            }
        );
        assert_eq!(
            "B562".parse::<Byte>().unwrap_err(),
            ParseHexError::NotAByte {
                input: "B562".into()
            }
        );
    }

    #[test]
    fn byte_prefix_only_once() {
        assert_eq!(
            "0x0x12".parse::<Byte>().unwrap_err(),
            ParseHexError::InvalidDigit {
                input: "0x0x12".into()
            }
        );
        assert_eq!(
            "0x+1".parse::<Byte>().unwrap_err(),
            ParseHexError::InvalidDigit {
                input: "0x+1".into()
            }
        );
    }

    #[test]
    fn single_digit_is_odd() {
        assert_eq!(
            "6".parse::<Byte>().unwrap_err(),
            ParseHexError::OddDigits { input: "6".into() }
        );
    }

    #[test]
    fn bytes_spaced() {
        let bytes: HexBytes = "B5 62 0A 04 00 00 0E 34".parse().unwrap();
        assert_eq!(
            bytes.as_slice(),
            &[0xB5, 0x62, 0x0A, 0x04, 0x00, 0x00, 0x0E, 0x34]
        );
    }

    #[test]
    fn bytes_mixed_notation() {
        let bytes: HexBytes = "0xB5,0x62 0a04\t0000".parse().unwrap();
        assert_eq!(bytes.as_slice(), &[0xB5, 0x62, 0x0A, 0x04, 0x00, 0x00]);
    }

    #[test]
    fn bytes_blank_is_empty() {
        let bytes: HexBytes = "  ".parse().unwrap();
        assert!(bytes.as_slice().is_empty());
    }

    #[test]
    fn bytes_invalid_digit() {
        assert_eq!(
            "B5 6Z".parse::<HexBytes>().unwrap_err(),
            ParseHexError::InvalidDigit { input: "6Z".into() }
        );
        assert_eq!(
            "B5 ü".parse::<HexBytes>().unwrap_err(),
            ParseHexError::InvalidDigit { input: "ü".into() }
        );
    }

    #[test]
    fn bytes_odd_digits() {
        assert_eq!(
            "B56".parse::<HexBytes>().unwrap_err(),
            ParseHexError::OddDigits { input: "B56".into() }
        );
    }

    #[test]
    fn deserialize_byte_forms() {
        let bytes: Vec<Byte> = serde_yaml::from_str("[6, 0x0A, \"62\", \"0xB5\"]").unwrap();
        assert_eq!(
            bytes,
            vec![Byte(0x06), Byte(0x0A), Byte(0x62), Byte(0xB5)]
        );
    }

    #[test]
    fn deserialize_bytes_forms() {
        let text: HexBytes = serde_yaml::from_str("\"F0 00 00\"").unwrap();
        let list: HexBytes = serde_yaml::from_str("[0xF0, 0, 0]").unwrap();
        assert_eq!(text, list);
        assert_eq!(text.as_slice(), &[0xF0, 0x00, 0x00]);
    }
}
