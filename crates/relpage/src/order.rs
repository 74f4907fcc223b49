use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

///
/// FieldToken
///
/// Addresses either a root field (`name`) or a field on a to-one-joined
/// association (`name@author`). The stringified form is the cursor wire key.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct FieldToken {
    field: String,
    association: Option<String>,
}

impl FieldToken {
    /// Token for a field on the root schema.
    #[must_use]
    pub fn root(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            association: None,
        }
    }

    /// Token for a field on a joined association.
    #[must_use]
    pub fn on(association: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            association: Some(association.into()),
        }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn association(&self) -> Option<&str> {
        self.association.as_deref()
    }
}

impl fmt::Display for FieldToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.association {
            Some(association) => write!(f, "{}@{association}", self.field),
            None => f.write_str(&self.field),
        }
    }
}

///
/// NullPosition
/// Where a NULL group sits relative to non-null values under one direction.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NullPosition {
    First,
    Last,
}

///
/// OrderDirection
///
/// Ordering direction for one order field. The plain `Asc`/`Desc` variants
/// leave NULL placement to the adapter default; the `*Nulls*` variants pin
/// it explicitly.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum OrderDirection {
    Asc,
    Desc,
    AscNullsFirst,
    AscNullsLast,
    DescNullsFirst,
    DescNullsLast,
}

impl OrderDirection {
    /// Whether non-null values compare descending under this direction.
    #[must_use]
    pub const fn is_descending(self) -> bool {
        matches!(self, Self::Desc | Self::DescNullsFirst | Self::DescNullsLast)
    }

    /// Explicit NULL placement, when the direction pins one.
    #[must_use]
    pub const fn null_position(self) -> Option<NullPosition> {
        match self {
            Self::Asc | Self::Desc => None,
            Self::AscNullsFirst | Self::DescNullsFirst => Some(NullPosition::First),
            Self::AscNullsLast | Self::DescNullsLast => Some(NullPosition::Last),
        }
    }

    /// Component-wise inversion used for `before`-direction execution.
    ///
    /// Inversion is a total involution: it flips the comparison direction and
    /// the pinned NULL placement together, so re-reversing fetched rows
    /// restores the forward order exactly.
    #[must_use]
    pub const fn inverted(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
            Self::AscNullsFirst => Self::DescNullsLast,
            Self::AscNullsLast => Self::DescNullsFirst,
            Self::DescNullsFirst => Self::AscNullsLast,
            Self::DescNullsLast => Self::AscNullsFirst,
        }
    }
}

///
/// OrderSpec
///
/// Normalized, non-empty ordering specification with the primary-key
/// tie-break appended. The strict total order every pagination request
/// executes under.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderSpec {
    fields: Vec<(FieldToken, OrderDirection)>,
}

impl OrderSpec {
    #[must_use]
    pub fn fields(&self) -> &[(FieldToken, OrderDirection)] {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Stringified token set, the key set a matching cursor must carry.
    #[must_use]
    pub fn token_set(&self) -> BTreeSet<String> {
        self.fields
            .iter()
            .map(|(token, _)| token.to_string())
            .collect()
    }

    /// Component-wise inverted spec for `before`-direction execution.
    #[must_use]
    pub fn inverted(&self) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .map(|(token, direction)| (token.clone(), direction.inverted()))
                .collect(),
        }
    }
}

/// Normalize a requested order into a strict total order.
///
/// Appends any primary-key field not already present, ascending, after the
/// requested fields. Duplicate requested tokens collapse to their first
/// occurrence. A base query that already carries ordering is rejected so the
/// pagination request remains the single source of ordering truth.
pub fn normalize(
    requested: &[(FieldToken, OrderDirection)],
    primary_key: &[String],
    base_query_has_order: bool,
) -> Result<OrderSpec, ConfigError> {
    if primary_key.is_empty() {
        return Err(ConfigError::NoPrimaryKey);
    }
    if base_query_has_order {
        return Err(ConfigError::ConflictingBaseOrder);
    }

    let mut fields: Vec<(FieldToken, OrderDirection)> = Vec::with_capacity(
        requested.len() + primary_key.len(),
    );
    for (token, direction) in requested {
        if fields.iter().any(|(seen, _)| seen == token) {
            continue;
        }
        fields.push((token.clone(), *direction));
    }

    for key_field in primary_key {
        let token = FieldToken::root(key_field.clone());
        if fields.iter().any(|(seen, _)| *seen == token) {
            continue;
        }
        fields.push((token, OrderDirection::Asc));
    }

    Ok(OrderSpec { fields })
}

///
/// TESTS
///
