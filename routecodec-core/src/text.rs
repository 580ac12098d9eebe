//! Text encodings for binary messages

use std::fmt;
use std::str::FromStr;

use base64::alphabet;
use base64::engine::general_purpose::{
    GeneralPurpose, GeneralPurposeConfig, STANDARD, URL_SAFE_NO_PAD,
};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// Accepts padded and unpadded input alike
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Byte-to-text encoding used by `encode_to_text` / `decode_from_text`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// Standard alphabet with padding; decoding also takes unpadded and
    /// URL-safe input
    #[default]
    Base64,
    /// URL-safe alphabet, no padding on output
    Base64Url,
    /// Lowercase on output, either case on input
    Hex,
    /// One character per byte, U+0000..=U+00FF
    #[serde(alias = "binary")]
    Latin1,
}

impl TextEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextEncoding::Base64 => "base64",
            TextEncoding::Base64Url => "base64url",
            TextEncoding::Hex => "hex",
            TextEncoding::Latin1 => "latin1",
        }
    }

    pub fn encode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Base64 => STANDARD.encode(bytes),
            TextEncoding::Base64Url => URL_SAFE_NO_PAD.encode(bytes),
            TextEncoding::Hex => hex::encode(bytes),
            TextEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }

    pub fn decode(&self, text: &str) -> CodecResult<Vec<u8>> {
        match self {
            TextEncoding::Base64 | TextEncoding::Base64Url => {
                LENIENT_BASE64.decode(to_standard_alphabet(text)).map_err(|e| self.invalid(e))
            }
            TextEncoding::Hex => hex::decode(text).map_err(|e| self.invalid(e)),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| {
                        self.invalid(format!("character {:?} is outside latin1", c))
                    })
                })
                .collect(),
        }
    }

    fn invalid(&self, reason: impl fmt::Display) -> CodecError {
        CodecError::TextDecodeInvalid {
            encoding: self.as_str().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Either base64 alphabet decodes under both names, as Node's `Buffer` does
fn to_standard_alphabet(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect()
}

impl FromStr for TextEncoding {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base64" => Ok(TextEncoding::Base64),
            "base64url" => Ok(TextEncoding::Base64Url),
            "hex" => Ok(TextEncoding::Hex),
            "latin1" | "binary" => Ok(TextEncoding::Latin1),
            _ => Err(CodecError::UnknownTextEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
