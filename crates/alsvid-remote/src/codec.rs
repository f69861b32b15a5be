//! Payload codec boundary.

use serde_json::Value;

use crate::error::{AlsvidError, AlsvidResult};

/// Encode/decode boundary between an in-memory computation description and
/// its transport representation.
///
/// The client never inspects payloads itself: it uploads whatever `encode`
/// produces and hands downloaded payloads to `decode`. A decode failure is
/// terminal for the poll loop — malformed data does not become valid by
/// polling again.
pub trait PayloadCodec: Send + Sync {
    /// The in-memory computation description.
    type Computation;

    /// Serialize a computation for upload.
    fn encode(&self, computation: &Self::Computation) -> AlsvidResult<Value>;

    /// Decode a downloaded payload into one or more computations.
    ///
    /// Fails with [`AlsvidError::Decode`] on malformed input.
    fn decode(&self, payload: &Value) -> AlsvidResult<Vec<Self::Computation>>;
}

/// Pass-through codec for callers that work with raw JSON payloads.
///
/// A JSON object decodes to a single computation; an array decodes
/// element-wise. Anything else is malformed.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    type Computation = Value;

    fn encode(&self, computation: &Value) -> AlsvidResult<Value> {
        Ok(computation.clone())
    }

    fn decode(&self, payload: &Value) -> AlsvidResult<Vec<Value>> {
        match payload {
            Value::Object(_) => Ok(vec![payload.clone()]),
            Value::Array(items) => Ok(items.clone()),
            other => Err(AlsvidError::Decode(format!(
                "expected a JSON object or array payload, got {other}"
            ))),
        }
    }
}
