//! Opaque continuation tokens.
//!
//! A token is URL-safe base64 over a small JSON envelope naming the access
//! pattern that issued it and the position to resume after. Tokens only
//! resume the exact pattern (and filter) they came from.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum Position {
    /// Keyset over `(date DESC, id ASC)`; `key` is the stored date text of the
    /// last row, absent when that row had no date.
    After { key: Option<String>, id: String },
    /// Keyset over `(perspective, name, id)` ascending.
    AfterSource { rank: i64, name: String, id: String },
    /// Rows already returned by a ranked text search.
    Offset { offset: u64 },
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    pattern: String,
    position: Position,
}

pub fn encode(pattern: &str, position: Position) -> Result<String, DatabaseError> {
    let json = serde_json::to_vec(&Envelope {
        pattern: pattern.to_string(),
        position,
    })
    .map_err(|e| DatabaseError::Other(e.into()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a token, rejecting one issued by a different pattern.
pub fn decode(token: &str, pattern: &str) -> Result<Position, DatabaseError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| DatabaseError::InvalidQuery("malformed continuation token".into()))?;
    let envelope: Envelope = serde_json::from_slice(&bytes)
        .map_err(|_| DatabaseError::InvalidQuery("malformed continuation token".into()))?;
    if envelope.pattern != pattern {
        return Err(DatabaseError::InvalidQuery(format!(
            "continuation token belongs to '{}', not '{pattern}'",
            envelope.pattern
        )));
    }
    Ok(envelope.position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_resumes_its_own_pattern_only() {
        let position = Position::After {
            key: Some("2025-01-01T00:00:00.000000Z".into()),
            id: "iss-9".into(),
        };
        let token = encode("issues.recent:created", position.clone()).unwrap();
        assert!(!token.contains('='));
        assert_eq!(decode(&token, "issues.recent:created").unwrap(), position);
        assert!(matches!(
            decode(&token, "issues.recent:updated"),
            Err(DatabaseError::InvalidQuery(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        for bad in ["", "!!!", "bm90IGpzb24"] {
            assert!(
                matches!(decode(bad, "p"), Err(DatabaseError::InvalidQuery(_))),
                "{bad:?}"
            );
        }
    }
}
