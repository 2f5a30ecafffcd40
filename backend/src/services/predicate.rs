//! Store predicates for the filter dimensions.
//!
//! Raw documents may carry several spellings of one attribute. Normalization
//! keeps the first non-null spelling in [`stored_paths`] order, so every
//! clause here tests a spelling only when all the spellings ahead of it are
//! absent or null. A filter then agrees with the record it returns.

use serde_json::{json, Value};

use crate::db::query::{Predicate, SortSpec};
use crate::services::geo::BoundingBox;
use crate::services::normalize::{stored_paths, FALSE_WORDS, POSITION_PATHS, REGION_KEYS, TRUE_WORDS};

/// Optional filter dimensions, combined with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub classes: Option<Vec<i64>>,
    pub free: Option<bool>,
    pub region: Option<String>,
}

impl FilterCriteria {
    pub fn by_class(class_id: i64) -> Self {
        FilterCriteria {
            classes: Some(vec![class_id]),
            ..Default::default()
        }
    }
}

/// Compose the predicate for `criteria`. No active dimension yields
/// [`Predicate::All`]. The same predicate is used for fetch and count.
pub fn build(criteria: &FilterCriteria) -> Predicate {
    let mut clauses = Vec::new();

    if let Some(classes) = criteria.classes.as_deref().filter(|c| !c.is_empty()) {
        let values: Vec<Value> = classes.iter().map(|c| json!(c)).collect();
        clauses.push(first_present(stored_paths("classes"), |field| Predicate::In {
            field,
            values: values.clone(),
        }));
    }

    if let Some(free) = criteria.free {
        clauses.push(first_present(stored_paths("isAccessibleForFree"), |field| {
            free_clause(field, free)
        }));
    }

    if let Some(region) = criteria.region.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        clauses.push(first_present(stored_paths("postalAddress"), |parent| {
            let keys = REGION_KEYS.iter().map(|k| format!("{}.{}", parent, k)).collect();
            first_present(keys, |field| Predicate::Contains {
                field,
                needle: region.to_string(),
                case_insensitive: true,
            })
        }));
    }

    Predicate::and(clauses)
}

/// Stored encodings of the free-admission flag that normalize to `free`:
/// the bool, the number (also as a numeric string) and the words.
fn free_clause(field: String, free: bool) -> Predicate {
    let (values, words) = if free {
        (vec![json!(true), json!(1)], TRUE_WORDS)
    } else {
        (vec![json!(false), json!(0)], FALSE_WORDS)
    };
    Predicate::or(vec![
        Predicate::In {
            field: field.clone(),
            values,
        },
        Predicate::InIgnoreCase {
            field,
            words: words.iter().map(|w| w.to_string()).collect(),
        },
    ])
}

/// `clause` on the first of `paths` that holds a non-null value:
/// `clause(p0) OR (p0 missing AND clause(p1)) OR ...`.
fn first_present(paths: Vec<String>, clause: impl Fn(String) -> Predicate) -> Predicate {
    let mut branches = Vec::with_capacity(paths.len());
    for (i, path) in paths.iter().enumerate() {
        let mut branch: Vec<Predicate> = paths[..i]
            .iter()
            .map(|ahead| Predicate::Missing { field: ahead.clone() })
            .collect();
        branch.push(clause(path.clone()));
        branches.push(Predicate::and(branch));
    }
    Predicate::or(branches)
}

/// Name ascending over every stored spelling of the name.
pub fn name_order() -> SortSpec {
    SortSpec::ascending(stored_paths("name"))
}

/// Relevance first, then name.
pub fn relevance_order() -> SortSpec {
    SortSpec::relevance(stored_paths("name"))
}

/// Case-insensitive substring match of `text` on name or description.
pub fn text_contains(text: &str) -> Predicate {
    let fields = stored_paths("name").into_iter().chain(stored_paths("description"));
    Predicate::or(
        fields
            .map(|field| Predicate::Contains {
                field,
                needle: text.to_string(),
                case_insensitive: true,
            })
            .collect(),
    )
}

/// Documents whose stored position, in any representation, lies in `bbox`.
pub fn within_box(bbox: &BoundingBox) -> Predicate {
    Predicate::or(
        POSITION_PATHS
            .iter()
            .map(|(lat, lon)| {
                let lat_clause = Predicate::Range {
                    field: lat.to_string(),
                    min: bbox.min_lat,
                    max: bbox.max_lat,
                };
                let lon_clause = Predicate::or(
                    bbox.lon_ranges
                        .iter()
                        .map(|(west, east)| Predicate::Range {
                            field: lon.to_string(),
                            min: *west,
                            max: *east,
                        })
                        .collect(),
                );
                Predicate::and(vec![lat_clause, lon_clause])
            })
            .collect(),
    )
}
