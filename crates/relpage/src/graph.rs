use crate::order::FieldToken;
use std::collections::HashMap;
use thiserror::Error as ThisError;

///
/// Cardinality
/// How many related rows an association can resolve to.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Cardinality {
    One,
    Many,
}

///
/// EagerLoadStrategy
///
/// How a requested eager-load materializes: a separate follow-up query per
/// association, or through the same join used for filtering/ordering.
/// Through-join loads cannot survive a strategy that strips the join graph.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EagerLoadStrategy {
    Separate,
    ThroughJoin,
}

///
/// EagerLoadSpec
/// One requested eager-load on the composed query.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EagerLoadSpec {
    pub association: String,
    pub cardinality: Cardinality,
    pub strategy: EagerLoadStrategy,
}

impl EagerLoadSpec {
    #[must_use]
    pub fn new(
        association: impl Into<String>,
        cardinality: Cardinality,
        strategy: EagerLoadStrategy,
    ) -> Self {
        Self {
            association: association.into(),
            cardinality,
            strategy,
        }
    }
}

/// Split eager-loads into those embeddable in a row-limited query and those
/// that must be deferred until root keys are known.
///
/// To-many loads multiply or truncate root rows under a row limit, so every
/// execution strategy applies them after keys are determined.
#[must_use]
pub fn split_deferred(loads: &[EagerLoadSpec]) -> (Vec<EagerLoadSpec>, Vec<EagerLoadSpec>) {
    let mut embeddable = Vec::new();
    let mut deferred = Vec::new();

    for load in loads {
        match load.cardinality {
            Cardinality::One => embeddable.push(load.clone()),
            Cardinality::Many => deferred.push(load.clone()),
        }
    }

    (embeddable, deferred)
}

///
/// Binding
/// Resolution result for one field token: where the field lives.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Binding {
    pub association: Option<String>,
    pub cardinality: Cardinality,
}

impl Binding {
    /// Binding for a field on the root schema.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            association: None,
            cardinality: Cardinality::One,
        }
    }
}

///
/// GraphError
/// Token or association the join-graph collaborator cannot resolve.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum GraphError {
    #[error("unknown field token: {token}")]
    UnknownToken { token: String },

    #[error("unknown association: {association}")]
    UnknownAssociation { association: String },
}

///
/// JoinGraph
///
/// Join-graph collaborator: node lookup by token, association cardinality,
/// requested eager-loads, and the root primary key. Construction and binding
/// resolution live outside this engine.
///

pub trait JoinGraph {
    /// Resolve a field token to its binding.
    fn resolve(&self, token: &FieldToken) -> Result<Binding, GraphError>;

    /// Cardinality of a named association, if known.
    fn cardinality(&self, association: &str) -> Option<Cardinality>;

    /// Eager-loads requested on the composed query.
    fn eager_loads(&self) -> &[EagerLoadSpec];

    /// Primary-key field names of the root schema. May be empty when the
    /// root schema has none; pagination rejects that case.
    fn root_primary_key(&self) -> &[String];
}

///
/// ResolveCache
///
/// Request-scoped memo for token resolution. Built once per pagination call
/// and discarded with it; never shared across calls.
///

#[derive(Debug, Default)]
pub struct ResolveCache {
    entries: HashMap<FieldToken, Binding>,
}

impl ResolveCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve through the cache, consulting the graph on a miss.
    pub fn resolve(
        &mut self,
        graph: &impl JoinGraph,
        token: &FieldToken,
    ) -> Result<Binding, GraphError> {
        if let Some(binding) = self.entries.get(token) {
            return Ok(binding.clone());
        }

        let binding = graph.resolve(token)?;
        self.entries.insert(token.clone(), binding.clone());

        Ok(binding)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::{
        Binding, Cardinality, EagerLoadSpec, EagerLoadStrategy, GraphError, JoinGraph,
        ResolveCache, split_deferred,
    };
    use crate::order::FieldToken;
    use std::cell::Cell;

    struct CountingGraph {
        resolves: Cell<u32>,
    }

    impl JoinGraph for CountingGraph {
        fn resolve(&self, token: &FieldToken) -> Result<Binding, GraphError> {
            self.resolves.set(self.resolves.get() + 1);
            match token.association() {
                None => Ok(Binding::root()),
                Some(_) => Err(GraphError::UnknownToken {
                    token: token.to_string(),
                }),
            }
        }

        fn cardinality(&self, _association: &str) -> Option<Cardinality> {
            None
        }

        fn eager_loads(&self) -> &[EagerLoadSpec] {
            &[]
        }

        fn root_primary_key(&self) -> &[String] {
            &[]
        }
    }

    #[test]
    fn resolve_cache_consults_graph_once_per_token() {
        let graph = CountingGraph {
            resolves: Cell::new(0),
        };
        let mut cache = ResolveCache::new();
        let token = FieldToken::root("name");

        let first = cache
            .resolve(&graph, &token)
            .expect("root token should resolve");
        let second = cache
            .resolve(&graph, &token)
            .expect("cached token should resolve");

        assert_eq!(first, second);
        assert_eq!(graph.resolves.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn resolve_cache_propagates_unknown_tokens() {
        let graph = CountingGraph {
            resolves: Cell::new(0),
        };
        let mut cache = ResolveCache::new();

        let err = cache
            .resolve(&graph, &FieldToken::on("tags", "name"))
            .expect_err("unknown association token must fail");
        assert_eq!(
            err,
            GraphError::UnknownToken {
                token: "name@tags".to_string()
            }
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn split_deferred_separates_to_many_loads() {
        let loads = [
            EagerLoadSpec::new("author", Cardinality::One, EagerLoadStrategy::Separate),
            EagerLoadSpec::new("tags", Cardinality::Many, EagerLoadStrategy::Separate),
        ];

        let (embeddable, deferred) = split_deferred(&loads);

        assert_eq!(embeddable.len(), 1);
        assert_eq!(embeddable[0].association, "author");
        assert_eq!(deferred.len(), 1);
        assert_eq!(deferred[0].association, "tags");
    }
}
