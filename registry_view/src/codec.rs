//! Registry name encoding
//!
//! Registry names may contain characters a POSIX filename cannot, and a key
//! may hold a value with the same name as one of its sub-keys. This module
//! maps raw names to filenames and back:
//!
//! - `/`, `\`, `:` and `%` become `%` plus two lowercase hex digits
//! - a name that is exactly `.` or `..` has its first dot escaped
//! - the suffix `%val` marks a value whose name collides with a sub-key

use thiserror::Error;

/// Longest filename the codec will produce, in bytes
pub const NAME_MAX: usize = 255;

/// Marker appended to a value name that collides with a sub-key
pub const VALUE_SUFFIX: &str = "%val";

/// Errors produced by the name codec
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The encoded name would exceed [`NAME_MAX`]
    #[error("Name too long: {0}")]
    NameTooLong(String),

    /// The filename is not a valid encoding of any raw name
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
}

/// A decoded filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedName {
    /// The raw registry name
    pub raw: String,
    /// The name carried the value suffix and must resolve to a value
    pub value_only: bool,
}

/// Converts between raw registry names and filenames
pub struct NameCodec;

impl NameCodec {
    /// Returns true if `c` must always be escaped
    pub fn must_escape(c: u8) -> bool {
        matches!(c, b'/' | b'\\' | b':' | b'%')
    }

    /// Encodes a raw name as a filename
    ///
    /// With `value_suffix` set, [`VALUE_SUFFIX`] is appended.
    ///
    /// # Examples
    ///
    /// ```
    /// use registry_view::NameCodec;
    ///
    /// assert_eq!(NameCodec::encode("a/b", false).unwrap(), "a%2fb");
    /// assert_eq!(NameCodec::encode("..", false).unwrap(), "%2e.");
    /// assert_eq!(NameCodec::encode("Run", true).unwrap(), "Run%val");
    /// ```
    pub fn encode(raw: &str, value_suffix: bool) -> Result<String, CodecError> {
        let bytes = raw.as_bytes();
        let dot_name = raw == "." || raw == "..";
        let mut encoded = String::with_capacity(raw.len() + 4);

        for (index, ch) in raw.char_indices() {
            let escape = ch.is_ascii()
                && (Self::must_escape(bytes[index]) || (dot_name && index == 0));
            if escape {
                encoded.push_str(&format!("%{:02x}", bytes[index]));
            } else {
                encoded.push(ch);
            }
        }
        if value_suffix {
            encoded.push_str(VALUE_SUFFIX);
        }

        if encoded.len() > NAME_MAX {
            return Err(CodecError::NameTooLong(raw.to_string()));
        }
        Ok(encoded)
    }

    /// Decodes a filename back to its raw name
    ///
    /// # Errors
    ///
    /// Returns `CodecError::InvalidEncoding` if an escape is truncated or not
    /// hex, if it escapes a character that never needs escaping, or if an
    /// escaped leading dot does not form `.` or `..`.
    pub fn decode(name: &str) -> Result<DecodedName, CodecError> {
        let bytes = name.as_bytes();
        let len = bytes.len();
        let mut raw: Vec<u8> = Vec::with_capacity(len);
        let mut value_only = false;
        let invalid = || CodecError::InvalidEncoding(name.to_string());

        let mut index = 0;
        while index < len {
            let b = bytes[index];
            if b != b'%' {
                raw.push(b);
                index += 1;
                continue;
            }

            if index + VALUE_SUFFIX.len() == len && &name[index..] == VALUE_SUFFIX {
                value_only = true;
                break;
            }
            if index + 2 >= len {
                return Err(invalid());
            }

            let hex = std::str::from_utf8(&bytes[index + 1..index + 3]).map_err(|_| invalid())?;
            let c = u8::from_str_radix(hex, 16).map_err(|_| invalid())?;
            let dot_escape =
                c == b'.' && index == 0 && (len == 3 || (len == 4 && bytes[3] == b'.'));
            if !(Self::must_escape(c) || dot_escape) {
                return Err(invalid());
            }
            raw.push(c);
            index += 3;
        }

        let raw = String::from_utf8(raw).map_err(|_| invalid())?;
        Ok(DecodedName { raw, value_only })
    }
}
