//! Response body decoding.

use crate::message::ErrorEnvelope;
use serde::de::DeserializeOwned;
use std::io::BufRead;
use thiserror::Error;

#[cfg(test)]
#[path = "decoder_tests.rs"]
mod tests;

/// Failure to parse a response document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("XML decoding failed: {message}")]
pub struct DecodeError {
    pub message: String,
}

/// Decodes XML response bodies into typed documents
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlDecoder;

impl XmlDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode a response document
    ///
    /// The root element name is not checked; children are matched by name and
    /// unknown elements are ignored.
    pub fn decode<T, R>(&self, reader: R) -> Result<T, DecodeError>
    where
        T: DeserializeOwned,
        R: BufRead,
    {
        quick_xml::de::from_reader(reader).map_err(|e| DecodeError {
            message: e.to_string(),
        })
    }

    /// Decode the error document that accompanies a failure status
    pub fn decode_error_envelope<R: BufRead>(&self, reader: R) -> Result<ErrorEnvelope, DecodeError> {
        self.decode(reader)
    }
}
