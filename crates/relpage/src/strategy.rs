use crate::shape::QueryShape;

///
/// Strategy
///
/// The three execution strategies. Decided exactly once per call by
/// `select`; executors dispatch on the variant and never re-decide.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Strategy {
    /// One query returns entities directly; cursor values read off the rows.
    SingleQuery,
    /// One projection query of (root key, cursor values) under the limit,
    /// entities re-hydrated by key afterwards.
    CursorProjection,
    /// Distinct-keys query over the full join graph, then a keyed re-fetch
    /// with the join graph stripped to eager-load needs.
    KeysFirst,
}

impl Strategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SingleQuery => "single_query",
            Self::CursorProjection => "cursor_projection",
            Self::KeysFirst => "keys_first",
        }
    }
}

/// Map classifier flags to an execution strategy.
///
/// Total and deterministic: identical shapes always select the same
/// strategy, which is what keeps a cursor produced by one call valid as
/// input to a later call against the same request shape.
#[must_use]
pub const fn select(shape: &QueryShape) -> Strategy {
    if shape.fields_extractable
        && shape.join_shape_safe
        && (!shape.has_eager_load || !shape.has_to_many_eager_load)
    {
        return Strategy::SingleQuery;
    }

    if shape.join_shape_safe && !shape.has_through_join_eager_load && !shape.fields_extractable {
        return Strategy::CursorProjection;
    }

    Strategy::KeysFirst
}

///
/// TESTS
///
