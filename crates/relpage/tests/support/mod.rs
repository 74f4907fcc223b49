//! In-memory books/authors/tags fixture implementing the engine's
//! collaborator seams, with enough query interpretation (joins, filters,
//! ordering, distinct, windowing) to execute real pages.

use relpage::{
    prelude::*,
    query::{ProjectionMap, ProjectionRow},
};
use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BTreeMap;

///
/// Book
/// Root entity of the fixture schema.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Book {
    pub id: i64,
    pub title: Value,
    pub rating: Value,
    pub author_id: Option<i64>,
    pub author: Option<BTreeMap<String, Value>>,
    pub tags: Option<Vec<String>>,
}

impl Entity for Book {
    fn field_value(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(Value::Int(self.id)),
            "title" => Some(self.title.clone()),
            "rating" => Some(self.rating.clone()),
            "author_id" => Some(self.author_id.map_or(Value::Null, Value::Int)),
            _ => None,
        }
    }

    fn association_value(&self, association: &str, field: &str) -> Option<Value> {
        if association == "author" {
            self.author
                .as_ref()
                .and_then(|fields| fields.get(field).cloned())
        } else {
            None
        }
    }
}

/// Bare book row; associations start unloaded.
pub fn book(id: i64, title: Option<&str>, rating: Option<i64>) -> Book {
    Book {
        id,
        title: title.map_or(Value::Null, Value::from),
        rating: rating.map_or(Value::Null, Value::from),
        author_id: None,
        author: None,
        tags: None,
    }
}

///
/// Library
///
/// The fixture data store and its join graph in one place; passed to the
/// executors twice, once per seam. Queries are interpreted with left-join
/// semantics and PostgreSQL-style NULL defaults (largest: last under ASC,
/// first under DESC).
///

pub struct Library {
    books: Vec<Book>,
    authors: BTreeMap<i64, BTreeMap<String, Value>>,
    tags: BTreeMap<i64, Vec<String>>,
    eager_loads: Vec<EagerLoadSpec>,
    primary_key: Vec<String>,
    entity_queries: Cell<u32>,
    projection_queries: Cell<u32>,
}

// One interpreted result row: a book plus any join-introduced columns keyed
// by their wire token string.
struct JoinedRow {
    book: usize,
    joined: BTreeMap<String, Value>,
}

impl Library {
    pub fn new(books: Vec<Book>) -> Self {
        Self {
            books,
            authors: BTreeMap::new(),
            tags: BTreeMap::new(),
            eager_loads: Vec::new(),
            primary_key: vec!["id".to_string()],
            entity_queries: Cell::new(0),
            projection_queries: Cell::new(0),
        }
    }

    pub fn with_author(mut self, id: i64, name: &str) -> Self {
        self.authors
            .insert(id, BTreeMap::from([("name".to_string(), Value::from(name))]));
        self
    }

    pub fn with_tags(mut self, book_id: i64, tags: &[&str]) -> Self {
        self.tags
            .insert(book_id, tags.iter().map(ToString::to_string).collect());
        self
    }

    pub fn assign_authors(mut self, pairs: &[(i64, i64)]) -> Self {
        for (book_id, author_id) in pairs {
            if let Some(book) = self.books.iter_mut().find(|book| book.id == *book_id) {
                book.author_id = Some(*author_id);
            }
        }
        self
    }

    pub fn with_eager(mut self, load: EagerLoadSpec) -> Self {
        self.eager_loads.push(load);
        self
    }

    pub fn queries_issued(&self) -> u32 {
        self.entity_queries.get() + self.projection_queries.get()
    }

    fn author_fields(&self, book: &Book) -> Option<BTreeMap<String, Value>> {
        book.author_id
            .and_then(|id| self.authors.get(&id).cloned())
    }

    // Left-join expansion: to-one attaches columns or NULLs, to-many yields
    // one row per element (or a single NULL row when empty).
    fn joined_rows(&self, query: &SelectQuery) -> Vec<JoinedRow> {
        let mut rows: Vec<JoinedRow> = (0..self.books.len())
            .map(|book| JoinedRow {
                book,
                joined: BTreeMap::new(),
            })
            .collect();

        for node in query.joins() {
            if node.association.as_deref() != Some("tags") {
                continue;
            }
            rows = rows
                .into_iter()
                .flat_map(|row| {
                    let names = self
                        .tags
                        .get(&self.books[row.book].id)
                        .cloned()
                        .unwrap_or_default();
                    if names.is_empty() {
                        let mut joined = row.joined.clone();
                        joined.insert("name@tags".to_string(), Value::Null);
                        return vec![JoinedRow {
                            book: row.book,
                            joined,
                        }];
                    }
                    names
                        .into_iter()
                        .map(|name| {
                            let mut joined = row.joined.clone();
                            joined.insert("name@tags".to_string(), Value::from(name));
                            JoinedRow {
                                book: row.book,
                                joined,
                            }
                        })
                        .collect::<Vec<_>>()
                })
                .collect();
        }

        rows
    }

    fn row_value(&self, row: &JoinedRow, token: &FieldToken) -> Value {
        match token.association() {
            None => self.books[row.book]
                .field_value(token.field())
                .unwrap_or(Value::Null),
            Some("author") => self
                .author_fields(&self.books[row.book])
                .and_then(|fields| fields.get(token.field()).cloned())
                .unwrap_or(Value::Null),
            Some(_) => row
                .joined
                .get(&token.to_string())
                .cloned()
                .unwrap_or(Value::Null),
        }
    }

    // SQL three-valued comparison: anything compared against NULL is not true.
    fn eval(&self, row: &JoinedRow, filter: &FilterExpr) -> bool {
        match filter {
            FilterExpr::And(clauses) => clauses.iter().all(|clause| self.eval(row, clause)),
            FilterExpr::Or(clauses) => clauses.iter().any(|clause| self.eval(row, clause)),
            FilterExpr::Compare { token, op, value } => {
                let left = self.row_value(row, token);
                if left.is_null() || value.is_null() {
                    return false;
                }
                let ord = left.compare(value);
                match op {
                    CompareOp::Eq => ord == Ordering::Equal,
                    CompareOp::Gt => ord == Ordering::Greater,
                    CompareOp::Lt => ord == Ordering::Less,
                    CompareOp::Ge => ord != Ordering::Less,
                    CompareOp::Le => ord != Ordering::Greater,
                }
            }
            FilterExpr::IsNull(token) => self.row_value(row, token).is_null(),
            FilterExpr::IsNotNull(token) => !self.row_value(row, token).is_null(),
        }
    }

    fn compare_rows(
        &self,
        left: &JoinedRow,
        right: &JoinedRow,
        order: &[(FieldToken, OrderDirection)],
    ) -> Ordering {
        for (token, direction) in order {
            let a = self.row_value(left, token);
            let b = self.row_value(right, token);
            let nulls = direction
                .null_position()
                .unwrap_or_else(|| self.default_null_position(*direction));

            let ord = match (a.is_null(), b.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => match nulls {
                    NullPosition::First => Ordering::Less,
                    NullPosition::Last => Ordering::Greater,
                },
                (false, true) => match nulls {
                    NullPosition::First => Ordering::Greater,
                    NullPosition::Last => Ordering::Less,
                },
                (false, false) => {
                    let ord = a.compare(&b);
                    if direction.is_descending() {
                        ord.reverse()
                    } else {
                        ord
                    }
                }
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }

        Ordering::Equal
    }

    fn run(&self, query: &SelectQuery) -> Vec<JoinedRow> {
        let mut rows = self.joined_rows(query);

        if let Some(filter) = query.base_filter() {
            rows.retain(|row| self.eval(row, filter));
        }
        if let Some(key_filter) = query.key_filter() {
            rows.retain(|row| {
                let key = self.books[row.book].key_tuple(&key_filter.fields);
                key_filter.keys.contains(&key)
            });
        }

        rows.sort_by(|a, b| self.compare_rows(a, b, query.order()));

        rows
    }

    fn window<T>(query: &SelectQuery, mut rows: Vec<T>) -> Vec<T> {
        let offset = query.row_offset() as usize;
        if offset > 0 {
            rows = if offset < rows.len() {
                rows.split_off(offset)
            } else {
                Vec::new()
            };
        }
        if let Some(limit) = query.limit() {
            rows.truncate(limit as usize);
        }
        rows
    }
}

impl JoinGraph for Library {
    fn resolve(&self, token: &FieldToken) -> Result<Binding, GraphError> {
        match token.association() {
            None => Ok(Binding::root()),
            Some(association) => {
                let cardinality = self.cardinality(association).ok_or_else(|| {
                    GraphError::UnknownAssociation {
                        association: association.to_string(),
                    }
                })?;
                Ok(Binding {
                    association: Some(association.to_string()),
                    cardinality,
                })
            }
        }
    }

    fn cardinality(&self, association: &str) -> Option<Cardinality> {
        match association {
            "author" => Some(Cardinality::One),
            "tags" => Some(Cardinality::Many),
            _ => None,
        }
    }

    fn eager_loads(&self) -> &[EagerLoadSpec] {
        &self.eager_loads
    }

    fn root_primary_key(&self) -> &[String] {
        &self.primary_key
    }
}

impl RowSource<Book> for Library {
    fn fetch_entities(&self, query: &SelectQuery) -> Result<Vec<Book>, SourceError> {
        self.entity_queries.set(self.entity_queries.get() + 1);

        // A joined to-one author rides the fetch onto the entity, the way a
        // through-join eager-load materializes in one round trip.
        let author_joined = query
            .joins()
            .iter()
            .any(|node| node.association.as_deref() == Some("author"));

        let rows = Self::window(query, self.run(query));
        Ok(rows
            .into_iter()
            .map(|row| {
                let mut book = self.books[row.book].clone();
                if author_joined {
                    book.author = self.author_fields(&book);
                }
                book
            })
            .collect())
    }

    fn fetch_projection(
        &self,
        query: &SelectQuery,
        projection: &ProjectionMap,
    ) -> Result<Vec<ProjectionRow>, SourceError> {
        self.projection_queries
            .set(self.projection_queries.get() + 1);

        let mut out: Vec<ProjectionRow> = self
            .run(query)
            .into_iter()
            .map(|row| ProjectionRow {
                key: self.books[row.book].key_tuple(&projection.key_fields),
                values: projection
                    .columns
                    .iter()
                    .map(|(name, token)| (name.clone(), self.row_value(&row, token)))
                    .collect(),
            })
            .collect();

        if query.is_distinct() {
            let mut seen: Vec<ProjectionRow> = Vec::new();
            out.retain(|row| {
                if seen.contains(row) {
                    false
                } else {
                    seen.push(row.clone());
                    true
                }
            });
        }

        Ok(Self::window(query, out))
    }

    fn apply_eager_loads(
        &self,
        entities: &mut Vec<Book>,
        loads: &[EagerLoadSpec],
    ) -> Result<(), SourceError> {
        for load in loads {
            match load.association.as_str() {
                "author" => {
                    for entity in entities.iter_mut() {
                        entity.author = self.author_fields(entity);
                    }
                }
                "tags" => {
                    for entity in entities.iter_mut() {
                        entity.tags =
                            Some(self.tags.get(&entity.id).cloned().unwrap_or_default());
                    }
                }
                other => {
                    return Err(SourceError::new(format!("unknown association: {other}")));
                }
            }
        }

        Ok(())
    }

    fn default_null_position(&self, direction: OrderDirection) -> NullPosition {
        if direction.is_descending() {
            NullPosition::First
        } else {
            NullPosition::Last
        }
    }
}
