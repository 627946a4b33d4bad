//! Session model wire format (spec §4.6): `"{schema_version}:{compression_flag}:{payload}"`.
//! Grounded in `SessionLockManager._serialize`/`_deserialize`
//! (`examples/original_source/genie_flow/session_lock.py`), including its
//! choice of Snappy compression — ported here via the `snap` crate, the Rust
//! binding for the same codec the Python original calls through
//! `python-snappy`.

use genie_core::CoreError;
use genie_domain::session::SESSION_MODEL_SCHEMA_VERSION;
use genie_domain::SessionModel;

const FLAG_COMPRESSED: u8 = b'1';
const FLAG_PLAIN: u8 = b'0';

pub fn serialize_model(model: &SessionModel, compress: bool) -> Result<Vec<u8>, CoreError> {
    let json = serde_json::to_vec(model).map_err(|e| CoreError::PersistenceError(e.to_string()))?;
    let (flag, payload) = if compress {
        let compressed = snap::raw::Encoder::new()
            .compress_vec(&json)
            .map_err(|e| CoreError::PersistenceError(format!("snappy compress failed: {e}")))?;
        (FLAG_COMPRESSED, compressed)
    } else {
        (FLAG_PLAIN, json)
    };

    let mut out = format!("{}:{}:", SESSION_MODEL_SCHEMA_VERSION, flag as char).into_bytes();
    out.extend_from_slice(&payload);
    Ok(out)
}

pub fn deserialize_model(bytes: &[u8]) -> Result<SessionModel, CoreError> {
    let first_colon = find(bytes, 0).ok_or_else(|| CoreError::PersistenceError("malformed payload: missing schema_version".into()))?;
    let version_str = std::str::from_utf8(&bytes[..first_colon]).map_err(|e| CoreError::PersistenceError(e.to_string()))?;
    let stored_version: u32 = version_str.parse().map_err(|_| CoreError::PersistenceError(format!("non-numeric schema_version {version_str:?}")))?;
    if stored_version != SESSION_MODEL_SCHEMA_VERSION {
        return Err(CoreError::SchemaMismatch { stored: stored_version, expected: SESSION_MODEL_SCHEMA_VERSION });
    }

    let rest = &bytes[first_colon + 1..];
    let second_colon = find(rest, 0).ok_or_else(|| CoreError::PersistenceError("malformed payload: missing compression flag".into()))?;
    let flag = rest[0];
    let payload = &rest[second_colon + 1..];

    let json_bytes = if flag == FLAG_COMPRESSED {
        snap::raw::Decoder::new()
            .decompress_vec(payload)
            .map_err(|e| CoreError::PersistenceError(format!("snappy decompress failed: {e}")))?
    } else {
        payload.to_vec()
    };

    serde_json::from_slice(&json_bytes).map_err(|e| CoreError::PersistenceError(e.to_string()))
}

fn find(bytes: &[u8], from: usize) -> Option<usize> {
    bytes[from..].iter().position(|&b| b == b':').map(|p| p + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_compressed_and_plain() {
        let model = SessionModel::new("s1", "qa", "intro");
        for compress in [true, false] {
            let bytes = serialize_model(&model, compress).unwrap();
            let back = deserialize_model(&bytes).unwrap();
            assert_eq!(back.session_id, model.session_id);
            assert_eq!(back.state, model.state);
        }
    }

    #[test]
    fn rejects_schema_mismatch() {
        let mut bytes = b"99:0:".to_vec();
        bytes.extend_from_slice(b"{}");
        let err = deserialize_model(&bytes).unwrap_err();
        assert!(matches!(err, CoreError::SchemaMismatch { stored: 99, .. }));
    }
}
