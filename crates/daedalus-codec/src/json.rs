//! JSON codec.

use std::io::{Read, Write};

use serde_json::Value;

use crate::error::CodecError;
use crate::registry::{Decoder, Encoder};

/// Codec for `application/json` bodies.
///
/// One instance can serve as both a [`Decoder`] and an [`Encoder`]; it is
/// stateless and freely shareable.
///
/// # Example
///
/// ```rust
/// use daedalus_codec::{Decoder, JsonCodec};
/// use serde_json::Value;
///
/// let codec = JsonCodec::new();
/// let mut payload = Value::Null;
/// codec
///     .decode(&mut br#"{"hello":"world"}"#.as_slice(), &mut payload)
///     .unwrap();
/// assert_eq!(payload["hello"], "world");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Creates the JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Decoder for JsonCodec {
    fn decode(&self, reader: &mut dyn Read, target: &mut Value) -> Result<(), CodecError> {
        *target =
            serde_json::from_reader(reader).map_err(|err| CodecError::decode(err.to_string()))?;
        Ok(())
    }
}

impl Encoder for JsonCodec {
    fn encode(&self, writer: &mut dyn Write, value: &Value) -> Result<(), CodecError> {
        serde_json::to_writer(writer, value).map_err(|err| CodecError::encode(err.to_string()))
    }
}
