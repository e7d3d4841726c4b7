use std::collections::BTreeMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Side-channel values attached to tickets, backfills, profiles and matches.
/// Keyed by name, ordered so that serialized output is stable.
pub type Extensions = BTreeMap<String, Extension>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("extension '{key}' holds {found}, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: String,
    },

    #[error("extension '{key}' is malformed: {reason}")]
    Malformed { key: String, reason: String },

    #[error("open slots must not be negative, got {0}")]
    NegativeOpenSlots(i32),
}

/// A payload type that can live inside an [`Extension`].
pub trait ExtensionPayload: Serialize + DeserializeOwned {
    const TYPE_URL: &'static str;
}

/// A typed, tagged blob. `type_url` names the payload type and `value` holds
/// its JSON encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub type_url: String,
    pub value: Vec<u8>,
}

impl Extension {
    pub fn pack<T: ExtensionPayload>(payload: &T) -> Result<Self, CodecError> {
        let value = serde_json::to_vec(payload).map_err(|e| CodecError::Malformed {
            key: T::TYPE_URL.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            type_url: T::TYPE_URL.to_string(),
            value,
        })
    }

    /// Decode the payload, checking the type tag first. `key` is only used to
    /// make errors point at the offending entry.
    pub fn unpack<T: ExtensionPayload>(&self, key: &str) -> Result<T, CodecError> {
        if self.type_url != T::TYPE_URL {
            return Err(CodecError::TypeMismatch {
                key: key.to_string(),
                expected: T::TYPE_URL,
                found: self.type_url.clone(),
            });
        }

        serde_json::from_slice(&self.value).map_err(|e| CodecError::Malformed {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Look up `key` and decode it. Absent keys are `Ok(None)`.
pub fn get_extension<T: ExtensionPayload>(
    extensions: &Extensions,
    key: &str,
) -> Result<Option<T>, CodecError> {
    match extensions.get(key) {
        Some(ext) => ext.unpack(key).map(Some),
        None => Ok(None),
    }
}
