//! Request signing.
//!
//! The service authenticates each request with an HMAC-SHA1 over a canonical
//! string built from the request line:
//!
//! ```text
//! VERB
//! Content-MD5
//! Content-Type
//! Date
//! x-mns-<header>:<value>     (zero or more, lowercased and sorted)
//! /resource
//! ```
//!
//! The digest is base64 encoded and sent as `Authorization: MNS <key-id>:<signature>`.

use crate::error::MnsError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::collections::HashMap;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;

type HmacSha1 = Hmac<Sha1>;

pub const CONTENT_MD5: &str = "Content-MD5";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const DATE: &str = "Date";
pub const AUTHORIZATION: &str = "Authorization";
pub const MNS_VERSION: &str = "x-mns-version";

const SERVICE_HEADER_PREFIX: &str = "x-mns-";

/// Secret half of an access key pair
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    secret: Vec<u8>,
}

impl Credential {
    pub fn new(access_key_secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: access_key_secret.as_ref().to_vec(),
        }
    }

    /// Compute the request signature
    ///
    /// `resource` is the path the service sees, including the leading `/` and
    /// any query string.
    pub fn signature(
        &self,
        method: &str,
        headers: &HashMap<String, String>,
        resource: &str,
    ) -> Result<String, MnsError> {
        let string_to_sign = string_to_sign(method, headers, resource);

        let mut mac =
            HmacSha1::new_from_slice(&self.secret).map_err(|e| MnsError::SignatureFailed {
                message: e.to_string(),
            })?;
        mac.update(string_to_sign.as_bytes());

        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

pub(crate) fn string_to_sign(
    method: &str,
    headers: &HashMap<String, String>,
    resource: &str,
) -> String {
    let header = |name: &str| headers.get(name).map(String::as_str).unwrap_or("");

    let mut service_headers: Vec<(String, &str)> = headers
        .iter()
        .filter_map(|(name, value)| {
            let lowered = name.to_ascii_lowercase();
            lowered
                .starts_with(SERVICE_HEADER_PREFIX)
                .then(|| (lowered, value.trim()))
        })
        .collect();
    service_headers.sort();

    let mut canonical = format!(
        "{}\n{}\n{}\n{}\n",
        method,
        header(CONTENT_MD5),
        header(CONTENT_TYPE),
        header(DATE)
    );
    for (name, value) in service_headers {
        canonical.push_str(&name);
        canonical.push(':');
        canonical.push_str(value);
        canonical.push('\n');
    }
    canonical.push_str(resource);

    canonical
}
