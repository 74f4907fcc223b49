use crate::{
    order::{FieldToken, OrderDirection, OrderSpec},
    value::Value,
};
use std::collections::BTreeSet;

///
/// CompareOp
/// Scalar comparison operator usable in a filter expression.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
}

///
/// FilterExpr
///
/// Filter expression tree appended to a composed query. An empty `And` is
/// vacuously true and an empty `Or` is vacuously false; the keyset builder
/// relies on the latter for cursors with nothing strictly past them.
///

#[derive(Clone, Debug, PartialEq)]
pub enum FilterExpr {
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
    Compare {
        token: FieldToken,
        op: CompareOp,
        value: Value,
    },
    IsNull(FieldToken),
    IsNotNull(FieldToken),
}

impl FilterExpr {
    #[must_use]
    pub fn compare(token: FieldToken, op: CompareOp, value: Value) -> Self {
        Self::Compare { token, op, value }
    }
}

///
/// JoinNode
///
/// One join of the composed query. `parent` indexes into the join list where
/// 0 is the root and `i` is the i-th join (1-based). A join with no declared
/// association is an arbitrary/raw join and can never be proven safe.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinNode {
    pub parent: usize,
    pub association: Option<String>,
}

impl JoinNode {
    #[must_use]
    pub fn association(parent: usize, association: impl Into<String>) -> Self {
        Self {
            parent,
            association: Some(association.into()),
        }
    }

    #[must_use]
    pub const fn raw(parent: usize) -> Self {
        Self {
            parent,
            association: None,
        }
    }
}

///
/// ProjectionMap
///
/// Named value expressions fetched instead of full entities: the root key
/// tuple plus one column per order token, addressed by its wire string.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectionMap {
    pub key_fields: Vec<String>,
    pub columns: Vec<(String, FieldToken)>,
}

impl ProjectionMap {
    /// Projection covering the root key and every order token.
    #[must_use]
    pub fn for_order(key_fields: &[String], order: &OrderSpec) -> Self {
        Self {
            key_fields: key_fields.to_vec(),
            columns: order
                .fields()
                .iter()
                .map(|(token, _)| (token.to_string(), token.clone()))
                .collect(),
        }
    }

    /// Projection covering only the root key tuple.
    #[must_use]
    pub fn keys_only(key_fields: &[String]) -> Self {
        Self {
            key_fields: key_fields.to_vec(),
            columns: Vec::new(),
        }
    }
}

///
/// ProjectionRow
/// One fetched projection tuple: root key values plus named column values.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionRow {
    pub key: Vec<Value>,
    pub values: Vec<(String, Value)>,
}

impl ProjectionRow {
    #[must_use]
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

///
/// KeyFilter
/// Key-membership filter over root primary-key tuples.
///

#[derive(Clone, Debug, PartialEq)]
pub struct KeyFilter {
    pub fields: Vec<String>,
    pub keys: Vec<Vec<Value>>,
}

///
/// SelectQuery
///
/// The composed, not-yet-ordered query value this engine plans against.
/// Composition itself (expression DSL, join construction, SQL text) happens
/// outside; this surface is what pagination is allowed to append or strip.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectQuery {
    joins: Vec<JoinNode>,
    filter: Option<FilterExpr>,
    order: Vec<(FieldToken, OrderDirection)>,
    limit: Option<u32>,
    offset: u32,
    distinct: bool,
    key_filter: Option<KeyFilter>,
    custom_select: bool,
}

impl SelectQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn join(mut self, node: JoinNode) -> Self {
        self.joins.push(node);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => FilterExpr::And(vec![existing, filter]),
            None => filter,
        });
        self
    }

    /// Mark the query as carrying a caller-supplied order clause.
    ///
    /// Pagination rejects such queries; the marker exists so the planner can
    /// detect the mis-composition.
    #[must_use]
    pub fn order_by(mut self, token: FieldToken, direction: OrderDirection) -> Self {
        self.order.push((token, direction));
        self
    }

    /// Mark the query as carrying a caller-supplied select list.
    #[must_use]
    pub const fn custom_select(mut self) -> Self {
        self.custom_select = true;
        self
    }

    #[must_use]
    pub fn joins(&self) -> &[JoinNode] {
        &self.joins
    }

    #[must_use]
    pub fn base_filter(&self) -> Option<&FilterExpr> {
        self.filter.as_ref()
    }

    #[must_use]
    pub fn order(&self) -> &[(FieldToken, OrderDirection)] {
        &self.order
    }

    #[must_use]
    pub fn has_order(&self) -> bool {
        !self.order.is_empty()
    }

    #[must_use]
    pub const fn has_custom_select(&self) -> bool {
        self.custom_select
    }

    #[must_use]
    pub const fn limit(&self) -> Option<u32> {
        self.limit
    }

    #[must_use]
    pub const fn row_offset(&self) -> u32 {
        self.offset
    }

    #[must_use]
    pub const fn is_distinct(&self) -> bool {
        self.distinct
    }

    #[must_use]
    pub const fn key_filter(&self) -> Option<&KeyFilter> {
        self.key_filter.as_ref()
    }

    pub(crate) fn set_order(&mut self, order: &OrderSpec) {
        self.order = order.fields().to_vec();
    }

    pub(crate) const fn set_limit(&mut self, limit: u32) {
        self.limit = Some(limit);
    }

    pub(crate) const fn set_offset(&mut self, offset: u32) {
        self.offset = offset;
    }

    pub(crate) const fn set_distinct(&mut self) {
        self.distinct = true;
    }

    pub(crate) fn and_filter(&mut self, filter: FilterExpr) {
        self.filter = Some(match self.filter.take() {
            Some(existing) => FilterExpr::And(vec![existing, filter]),
            None => filter,
        });
    }

    /// Re-fetch query for phase two of a split strategy: the base filter,
    /// windowing, and ordering are dropped (the key set already encodes
    /// them) and the join graph is stripped to what eager-loading requires.
    #[must_use]
    pub(crate) fn stripped_for_refetch(
        &self,
        key_fields: &[String],
        keys: Vec<Vec<Value>>,
        keep_associations: &BTreeSet<String>,
    ) -> Self {
        Self {
            joins: retain_join_chains(&self.joins, keep_associations),
            filter: None,
            order: Vec::new(),
            limit: None,
            offset: 0,
            distinct: false,
            key_filter: Some(KeyFilter {
                fields: key_fields.to_vec(),
                keys,
            }),
            custom_select: false,
        }
    }
}

// Keep only joins whose association is required, plus every join on the
// parent path back to the root, remapping parent indices for the new list.
// Parent chains are untrusted input: an out-of-range parent ends the chain
// at the root and a cyclic chain stops at the first revisited join.
fn retain_join_chains(joins: &[JoinNode], keep_associations: &BTreeSet<String>) -> Vec<JoinNode> {
    let mut keep = vec![false; joins.len()];

    for (idx, node) in joins.iter().enumerate() {
        let required = node
            .association
            .as_ref()
            .is_some_and(|association| keep_associations.contains(association));
        if !required {
            continue;
        }

        // Walk the parent chain; parent 0 is the root.
        let mut cursor = idx;
        while !keep[cursor] {
            keep[cursor] = true;
            let parent = joins[cursor].parent;
            if parent == 0 || parent > joins.len() {
                break;
            }
            cursor = parent - 1;
        }
    }

    let mut remap = vec![0usize; joins.len()];
    let mut kept = Vec::new();
    for (idx, node) in joins.iter().enumerate() {
        if !keep[idx] {
            continue;
        }
        let parent = match node.parent {
            0 => 0,
            parent if parent > joins.len() => 0,
            parent => remap[parent - 1],
        };
        kept.push(JoinNode {
            parent,
            association: node.association.clone(),
        });
        remap[idx] = kept.len();
    }

    kept
}

///
/// TESTS
///
