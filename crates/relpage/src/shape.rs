use crate::{
    graph::{Cardinality, EagerLoadStrategy, GraphError, JoinGraph, ResolveCache},
    order::OrderSpec,
    query::SelectQuery,
};

///
/// QueryShape
///
/// Classifier output for one composed query: the four independent flags the
/// strategy selector decides on. Computed once per call and carried on the
/// pagination plan.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct QueryShape {
    /// Every order/cursor field can be read off a directly-fetched entity.
    pub fields_extractable: bool,
    /// Every join on every root path is a known to-one association, so a row
    /// limit against the joined query cannot multiply or drop root rows.
    pub join_shape_safe: bool,
    /// At least one eager-load is requested.
    pub has_eager_load: bool,
    /// At least one requested eager-load is one-to-many.
    pub has_to_many_eager_load: bool,
    /// At least one requested eager-load materializes through the join graph.
    pub has_through_join_eager_load: bool,
}

/// Classify the composed query's join shape and eager-load profile.
pub fn classify(
    query: &SelectQuery,
    order: &OrderSpec,
    graph: &impl JoinGraph,
    cache: &mut ResolveCache,
) -> Result<QueryShape, GraphError> {
    let join_shape_safe = join_shape_is_safe(query, graph);
    let fields_extractable = order_fields_extractable(order, graph, cache)?;

    let loads = graph.eager_loads();
    let has_eager_load = !loads.is_empty();
    let has_to_many_eager_load = loads
        .iter()
        .any(|load| load.cardinality == Cardinality::Many);
    let has_through_join_eager_load = loads
        .iter()
        .any(|load| load.strategy == EagerLoadStrategy::ThroughJoin);

    Ok(QueryShape {
        fields_extractable,
        join_shape_safe,
        has_eager_load,
        has_to_many_eager_load,
        has_through_join_eager_load,
    })
}

// A join is safe only if every join on its path from the root is a declared
// to-one association. One unresolvable join poisons the whole query: a row
// limit can no longer be trusted to count distinct roots.
fn join_shape_is_safe(query: &SelectQuery, graph: &impl JoinGraph) -> bool {
    let joins = query.joins();
    let mut safe = vec![false; joins.len() + 1];
    safe[0] = true; // root

    for (idx, node) in joins.iter().enumerate() {
        let Some(association) = node.association.as_deref() else {
            return false; // raw join
        };
        if graph.cardinality(association) != Some(Cardinality::One) {
            return false;
        }
        if node.parent > idx || !safe[node.parent] {
            return false; // broken or forward-referencing parent chain
        }
        safe[idx + 1] = true;
    }

    true
}

// Order fields are extractable when each token reads off the final entity:
// root fields always do; association fields only when the association is
// to-one and eagerly loaded onto the entity.
fn order_fields_extractable(
    order: &OrderSpec,
    graph: &impl JoinGraph,
    cache: &mut ResolveCache,
) -> Result<bool, GraphError> {
    for (token, _) in order.fields() {
        let binding = cache.resolve(graph, token)?;

        let Some(association) = binding.association else {
            continue;
        };
        if binding.cardinality != Cardinality::One {
            return Ok(false);
        }

        let preloaded = graph.eager_loads().iter().any(|load| {
            load.association == association && load.cardinality == Cardinality::One
        });
        if !preloaded {
            return Ok(false);
        }
    }

    Ok(true)
}

///
/// TESTS
///
