use crate::{order::OrderSpec, value::Value};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

// Decode bound for untrusted cursor token input; encode is capped to match.
const MAX_CURSOR_TOKEN_CHARS: usize = 8 * 1024;

///
/// CursorError
///
/// Cursor token failures, surfaced as a distinct kind so callers can treat
/// them as "stale/invalid cursor" and re-issue a first page rather than
/// report a system fault.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CursorError {
    #[error("cursor token is empty")]
    Empty,

    #[error("cursor token exceeds max length: {len} chars (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("malformed cursor token: {reason}")]
    Malformed { reason: String },

    #[error("cursor field '{key}' carries a non-scalar value")]
    NonScalarValue { key: String },

    #[error(
        "cursor does not match the current order specification \
         (missing: [{}], unexpected: [{}])",
        missing.join(", "),
        unexpected.join(", ")
    )]
    OrderMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}

///
/// Cursor
///
/// Boundary-row position marker: stringified order token → the scalar value
/// observed at the boundary row. The key set is bound to exactly one order
/// specification; validation is set equality, not subset.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Cursor {
    fields: BTreeMap<String, Value>,
}

impl Cursor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            fields: entries.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Encode into the opaque wire token: base64url(JSON object), no
    /// padding, size-capped. The format is version-free; a field-set
    /// mismatch against the current order is the versioning mechanism.
    pub fn encode(&self) -> Result<String, CursorError> {
        let mut object = serde_json::Map::with_capacity(self.fields.len());
        for (key, value) in &self.fields {
            object.insert(key.clone(), value.to_json());
        }

        let json = serde_json::Value::Object(object).to_string();
        let token = URL_SAFE_NO_PAD.encode(json.as_bytes());

        if token.len() > MAX_CURSOR_TOKEN_CHARS {
            return Err(CursorError::TooLong {
                len: token.len(),
                max: MAX_CURSOR_TOKEN_CHARS,
            });
        }

        Ok(token)
    }

    /// Decode an untrusted wire token. Surrounding whitespace is trimmed;
    /// empty, oversized, and structurally malformed tokens are rejected.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let token = token.trim();

        if token.is_empty() {
            return Err(CursorError::Empty);
        }
        if token.len() > MAX_CURSOR_TOKEN_CHARS {
            return Err(CursorError::TooLong {
                len: token.len(),
                max: MAX_CURSOR_TOKEN_CHARS,
            });
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|err| CursorError::Malformed {
                reason: err.to_string(),
            })?;
        let json: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|err| CursorError::Malformed {
                reason: err.to_string(),
            })?;
        let serde_json::Value::Object(object) = json else {
            return Err(CursorError::Malformed {
                reason: "cursor payload must be a JSON object".to_string(),
            });
        };

        let mut fields = BTreeMap::new();
        for (key, value) in object {
            let value = Value::from_json(&value)
                .ok_or_else(|| CursorError::NonScalarValue { key: key.clone() })?;
            fields.insert(key, value);
        }

        Ok(Self { fields })
    }

    /// Validate that this cursor's key set equals the order specification's
    /// token set exactly. A cursor is bound to one order specification;
    /// any drift fails closed.
    pub fn validate_matches_order(&self, order: &OrderSpec) -> Result<(), CursorError> {
        let expected = order.token_set();

        let missing: Vec<String> = expected
            .iter()
            .filter(|token| !self.fields.contains_key(*token))
            .cloned()
            .collect();
        let unexpected: Vec<String> = self
            .fields
            .keys()
            .filter(|key| !expected.contains(*key))
            .cloned()
            .collect();

        if missing.is_empty() && unexpected.is_empty() {
            return Ok(());
        }

        Err(CursorError::OrderMismatch {
            missing,
            unexpected,
        })
    }
}

impl FromIterator<(String, Value)> for Cursor {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

///
/// TESTS
///
