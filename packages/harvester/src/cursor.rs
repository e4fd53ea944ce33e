//! Opaque pagination cursors.
//!
//! A cursor is the store's native continuation token serialized as JSON and
//! encoded as URL-safe base64, so it can travel in a query string.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CursorError;

/// Encode a continuation token as an opaque cursor string.
pub fn encode_cursor<T: Serialize>(token: &T) -> Result<String, CursorError> {
    let json = serde_json::to_vec(token)?;
    Ok(URL_SAFE.encode(json))
}

/// Decode a cursor string back into a continuation token.
pub fn decode_cursor<T: DeserializeOwned>(cursor: &str) -> Result<T, CursorError> {
    let bytes = URL_SAFE.decode(cursor.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}
