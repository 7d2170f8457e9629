//! Derived identifiers
//!
//! The translation service and the viewer never see raw object ids. Both key
//! off the `urn`: the standard base64 encoding of the object id with trailing
//! `=` padding stripped. Every code path that produces a urn goes through
//! [`Urn::from_object_id`] so the upload, listing and status surfaces agree
//! byte for byte.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, Result};

/// Standard alphabet, no padding on encode, padding tolerated on decode.
const URN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Public handle for an uploaded object, used for translation and status queries
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Urn(String);

impl Urn {
    /// Derive the urn for a remote object id
    pub fn from_object_id(object_id: &str) -> Self {
        Self(URN_ENGINE.encode(object_id.as_bytes()))
    }

    /// Wrap a urn received from a client or the remote service without re-encoding it
    pub fn new(urn: impl Into<String>) -> Self {
        Self(urn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover the object id this urn was derived from
    pub fn decode_object_id(&self) -> Result<String> {
        let bytes = URN_ENGINE
            .decode(self.0.as_bytes())
            .map_err(|e| CommonError::InvalidUrn {
                urn: self.0.clone(),
                reason: e.to_string(),
            })?;

        String::from_utf8(bytes).map_err(|e| CommonError::InvalidUrn {
            urn: self.0.clone(),
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Display for Urn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Urn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
