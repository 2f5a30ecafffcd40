//! Query model shared by every document store backend.
//!
//! Raw documents are kept as untyped JSON because the stored collection mixes
//! several historical shapes. Predicates address fields by dotted path; an
//! array met along the path fans out over its elements, and a numeric segment
//! indexes into an array.

use std::cmp::Ordering;

use serde_json::Value;

use crate::api::Position;

/// A document exactly as stored in the backing collection.
pub type RawDocument = Value;

/// Field holding the store's internal identifier.
pub const ID_FIELD: &str = "_id";

/// Composed query condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every document.
    All,
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    /// Field equals value. Arrays match when any element equals.
    Eq { field: String, value: Value },
    /// Field equals any of the values. Arrays match on intersection.
    In { field: String, values: Vec<Value> },
    /// String field equals any of the words, ignoring ASCII case and
    /// surrounding whitespace.
    InIgnoreCase { field: String, words: Vec<String> },
    /// Field is absent or null.
    Missing { field: String },
    /// Unanchored substring match on a string field.
    Contains {
        field: String,
        needle: String,
        case_insensitive: bool,
    },
    /// Numeric field within `[min, max]`, inclusive.
    Range { field: String, min: f64, max: f64 },
}

impl Predicate {
    /// AND-combine clauses. Nested `All` clauses are dropped; no clauses
    /// yields `All` and a single clause is returned unwrapped.
    pub fn and(clauses: Vec<Predicate>) -> Predicate {
        let mut clauses: Vec<Predicate> = clauses
            .into_iter()
            .filter(|c| !matches!(c, Predicate::All))
            .collect();
        match clauses.len() {
            0 => Predicate::All,
            1 => clauses.remove(0),
            _ => Predicate::And(clauses),
        }
    }

    /// OR-combine clauses. A single clause is returned unwrapped.
    pub fn or(mut clauses: Vec<Predicate>) -> Predicate {
        if clauses.len() == 1 {
            clauses.remove(0)
        } else {
            Predicate::Or(clauses)
        }
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, Predicate::All)
    }

    /// Evaluate the predicate against a raw document.
    pub fn matches(&self, doc: &RawDocument) -> bool {
        match self {
            Predicate::All => true,
            Predicate::And(clauses) => clauses.iter().all(|c| c.matches(doc)),
            Predicate::Or(clauses) => clauses.iter().any(|c| c.matches(doc)),
            Predicate::Eq { field, value } => {
                leaf_values(doc, field).any(|v| values_equal(v, value))
            }
            Predicate::In { field, values } => leaf_values(doc, field)
                .any(|v| values.iter().any(|candidate| values_equal(v, candidate))),
            Predicate::InIgnoreCase { field, words } => leaf_values(doc, field).any(|v| {
                v.as_str()
                    .is_some_and(|s| words.iter().any(|w| s.trim().eq_ignore_ascii_case(w)))
            }),
            Predicate::Missing { field } => lookup(doc, field).iter().all(|v| v.is_null()),
            Predicate::Contains {
                field,
                needle,
                case_insensitive,
            } => {
                let needle = if *case_insensitive {
                    needle.to_lowercase()
                } else {
                    needle.clone()
                };
                leaf_values(doc, field).any(|v| {
                    let text = match v {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        _ => return false,
                    };
                    if *case_insensitive {
                        text.to_lowercase().contains(&needle)
                    } else {
                        text.contains(&needle)
                    }
                })
            }
            Predicate::Range { field, min, max } => leaf_values(doc, field)
                .filter_map(as_number)
                .any(|n| n >= *min && n <= *max),
        }
    }
}

/// Resolve a dotted path to every value it reaches.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![doc];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            descend(value, segment, &mut next);
        }
        if next.is_empty() {
            return next;
        }
        current = next;
    }
    current
}

fn descend<'a>(value: &'a Value, segment: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            if let Some(child) = map.get(segment) {
                out.push(child);
            }
        }
        Value::Array(items) => {
            if let Ok(index) = segment.parse::<usize>() {
                if let Some(child) = items.get(index) {
                    out.push(child);
                }
            } else {
                for item in items {
                    if let Value::Object(map) = item {
                        if let Some(child) = map.get(segment) {
                            out.push(child);
                        }
                    }
                }
            }
        }
        _ => {}
    }
}

/// Values reached by a path, with arrays at the leaf flattened.
fn leaf_values<'a>(doc: &'a Value, path: &str) -> impl Iterator<Item = &'a Value> {
    lookup(doc, path).into_iter().flat_map(|v| match v {
        Value::Array(items) => items.iter().collect::<Vec<_>>(),
        other => vec![other],
    })
}

/// First string value found among the given paths.
pub fn first_str<'a>(doc: &'a Value, paths: &[&str]) -> Option<&'a str> {
    paths
        .iter()
        .find_map(|path| lookup(doc, path).into_iter().find_map(Value::as_str))
}

/// Numbers compare numerically, including numbers stored as strings (so
/// `1`, `1.0` and `"1"` are equal); everything else structurally.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_))
        | (Value::Number(_), Value::String(_))
        | (Value::String(_), Value::Number(_)) => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        _ => a == b,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Ordering requested from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum SortSpec {
    /// Ascending, case-sensitive byte order on the first string found among
    /// the listed field paths. Documents without a value sort first; ties
    /// keep insertion order.
    Ascending(Vec<String>),
    /// Text relevance, best first, ties broken ascending on the listed
    /// paths. Only meaningful for text search.
    TextScore(Vec<String>),
}

impl SortSpec {
    pub fn ascending<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SortSpec::Ascending(paths.into_iter().map(Into::into).collect())
    }

    pub fn relevance<I, S>(tie_break: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SortSpec::TextScore(tie_break.into_iter().map(Into::into).collect())
    }

    /// Compare two documents on the ascending key paths. For `TextScore`
    /// this is the tie-break order; the score itself lives outside the
    /// document.
    pub fn compare(&self, a: &RawDocument, b: &RawDocument) -> Ordering {
        let (SortSpec::Ascending(paths) | SortSpec::TextScore(paths)) = self;
        let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
        first_str(a, &paths).cmp(&first_str(b, &paths))
    }
}

/// Pagination and ordering for a find.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub skip: usize,
    /// `None` returns every remaining match.
    pub limit: Option<usize>,
    pub sort: Option<SortSpec>,
}

impl FindOptions {
    pub fn new(skip: usize, limit: usize) -> Self {
        FindOptions {
            skip,
            limit: Some(limit),
            sort: None,
        }
    }

    pub fn sorted(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }
}

/// Index kinds understood by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Ascending,
    Text,
    /// Spherical geospatial index over GeoJSON points or `{lat, lon}` objects.
    Geo2dSphere,
}

impl IndexKind {
    fn suffix(&self) -> &'static str {
        match self {
            IndexKind::Ascending => "1",
            IndexKind::Text => "text",
            IndexKind::Geo2dSphere => "2dsphere",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub fields: Vec<String>,
    pub kind: IndexKind,
}

impl IndexSpec {
    pub fn ascending(field: impl Into<String>) -> Self {
        IndexSpec {
            fields: vec![field.into()],
            kind: IndexKind::Ascending,
        }
    }

    pub fn text<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IndexSpec {
            fields: fields.into_iter().map(Into::into).collect(),
            kind: IndexKind::Text,
        }
    }

    pub fn geo(field: impl Into<String>) -> Self {
        IndexSpec {
            fields: vec![field.into()],
            kind: IndexKind::Geo2dSphere,
        }
    }

    /// Index name in the `field_kind[_field_kind...]` convention.
    pub fn name(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{}_{}", f, self.kind.suffix()))
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Nearest-first query against a geospatial index.
#[derive(Debug, Clone, PartialEq)]
pub struct NearQuery {
    pub field: String,
    pub center: Position,
    pub max_distance_m: f64,
    pub skip: usize,
    pub limit: Option<usize>,
}

/// Text search hit with its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: RawDocument,
    pub score: f64,
}

/// What the backing store can do, derived from its declared indexes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreCapabilities {
    /// Text search is available and returns relevance scores.
    pub text_score: bool,
    /// Field covered by a geospatial index, if any.
    pub geo_field: Option<String>,
}
