use serde::{Deserialize, Serialize};

use crate::extensions::{CodecError, Extension, ExtensionPayload, Extensions};

/// Extension key under which a backfill carries its open slot counter.
pub const OPEN_SLOTS_KEY: &str = "open_slots";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenSlots(pub i32);

impl ExtensionPayload for OpenSlots {
    const TYPE_URL: &'static str = "type.googleapis.com/google.protobuf.Int32Value";
}

pub fn encode_open_slots(slots: i32) -> Result<Extension, CodecError> {
    Extension::pack(&OpenSlots(slots))
}

pub fn set_open_slots(extensions: &mut Extensions, slots: i32) -> Result<(), CodecError> {
    extensions.insert(OPEN_SLOTS_KEY.to_string(), encode_open_slots(slots)?);
    Ok(())
}

/// Read the open slot counter. A backfill that never had one stored, or
/// stored an empty value, is treated as fully open, i.e. `default`.
pub fn decode_open_slots(extensions: &Extensions, default: i32) -> Result<i32, CodecError> {
    let ext = match extensions.get(OPEN_SLOTS_KEY) {
        Some(ext) if !(ext.type_url == OpenSlots::TYPE_URL && ext.value.is_empty()) => ext,
        _ => {
            log::debug!("no open slots stored, using default of {}", default);
            return Ok(default);
        }
    };

    match ext.unpack::<OpenSlots>(OPEN_SLOTS_KEY)? {
        OpenSlots(slots) if slots < 0 => Err(CodecError::NegativeOpenSlots(slots)),
        OpenSlots(slots) => Ok(slots),
    }
}
