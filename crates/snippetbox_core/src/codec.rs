//! CBOR encoding of stored documents.

use crate::error::{CoreError, CoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes a document to CBOR bytes.
pub(crate) fn encode_document<T: Serialize>(document: &T) -> CoreResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(document, &mut buf).map_err(|e| CoreError::encode(e.to_string()))?;
    Ok(buf)
}

/// Decodes a document from CBOR bytes. `offset` locates the record in errors.
pub(crate) fn decode_document<T: DeserializeOwned>(bytes: &[u8], offset: u64) -> CoreResult<T> {
    ciborium::from_reader(bytes).map_err(|e| CoreError::decode(offset, e.to_string()))
}
