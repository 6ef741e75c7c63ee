//! Text encodings usable for keyword replacement

use std::fmt;
use std::io;

/// Encoding named by an input config's `encoding` field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TextEncoding {
    Ascii,
    #[default]
    Utf8,
    Latin1,
    Utf16Le,
    /// Anything else; replacement is skipped for such outputs
    Unsupported(String),
}

impl TextEncoding {
    /// Parse an encoding name (case-insensitive)
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "ascii" => TextEncoding::Ascii,
            "utf8" | "utf-8" => TextEncoding::Utf8,
            "latin1" | "binary" => TextEncoding::Latin1,
            "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => TextEncoding::Utf16Le,
            _ => TextEncoding::Unsupported(name.to_string()),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, TextEncoding::Unsupported(_))
    }

    /// Decode file bytes into text
    ///
    /// ASCII drops the high bit of every byte and latin1 maps bytes 1:1 to
    /// code points, so neither can fail. UTF-8 and UTF-16LE reject invalid input.
    pub fn decode(&self, bytes: &[u8]) -> io::Result<String> {
        match self {
            TextEncoding::Ascii => Ok(bytes.iter().map(|b| (b & 0x7f) as char).collect()),
            TextEncoding::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            TextEncoding::Utf16Le => {
                // A trailing odd byte cannot form a code unit and is dropped
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            }
            TextEncoding::Unsupported(name) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported encoding \"{}\"", name),
            )),
        }
    }

    /// Encode text for writing back
    ///
    /// Single-byte encodings keep the low byte of each code point.
    pub fn encode(&self, text: &str) -> io::Result<Vec<u8>> {
        match self {
            TextEncoding::Ascii | TextEncoding::Latin1 => {
                Ok(text.chars().map(|c| c as u32 as u8).collect())
            }
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Utf16Le => Ok(text
                .encode_utf16()
                .flat_map(|unit| unit.to_le_bytes())
                .collect()),
            TextEncoding::Unsupported(name) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported encoding \"{}\"", name),
            )),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Ascii => write!(f, "ascii"),
            TextEncoding::Utf8 => write!(f, "utf8"),
            TextEncoding::Latin1 => write!(f, "latin1"),
            TextEncoding::Utf16Le => write!(f, "utf16le"),
            TextEncoding::Unsupported(name) => write!(f, "{}", name),
        }
    }
}
