//! Source shape detection and per-shape rename tables.
//!
//! Two historical shapes live in the collection: the PascalCase export of the
//! upstream tourism feed and the camelCase API shape (which itself went
//! through a few spellings). Shape is decided by key presence, never by a
//! version tag.

use serde_json::{Map, Value};

/// Raw document layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceShape {
    /// Flat PascalCase export (`AttractionID`, `AttractionName`, `PositionLat`, ...).
    PascalExport,
    /// Canonical camelCase, possibly with legacy camelCase spellings.
    CamelCase,
}

/// PascalCase source key → canonical key.
const PASCAL_RENAMES: &[(&str, &str)] = &[
    ("AttractionID", "attractionId"),
    ("AttractionName", "name"),
    ("AlternateNames", "alternateNames"),
    ("Description", "description"),
    ("AttractionClasses", "classes"),
    ("PostalAddress", "postalAddress"),
    ("Telephones", "telephones"),
    ("Images", "images"),
    ("ServiceTimes", "serviceTimes"),
    ("Fees", "fees"),
    ("SocialMediaURLs", "socialMedia"),
    ("SocialMedias", "socialMedia"),
    ("TrafficInfo", "trafficInfo"),
    ("ParkingInfo", "parkingInfo"),
    ("IsPublicAccess", "isPublicAccess"),
    ("IsAccessibleForFree", "isAccessibleForFree"),
    ("WebsiteURL", "website"),
    ("UpdateTime", "updatedAt"),
];

/// Legacy camelCase key → canonical key.
const CAMEL_RENAMES: &[(&str, &str)] = &[
    ("attractionName", "name"),
    ("attractionClasses", "classes"),
    ("socialMediaURLs", "socialMedia"),
    ("websiteUrl", "website"),
    ("updateTime", "updatedAt"),
];

/// Keys that only the PascalCase export carries besides the rename sources.
const PASCAL_ONLY_KEYS: &[&str] = &["PositionLat", "PositionLon", "Position"];

/// Region spellings inside the postal address sub-object.
pub const REGION_KEYS: &[&str] = &["addressRegion", "city", "City"];

/// Parent spellings of the position sub-object.
pub const POSITION_PARENTS: &[&str] = &["position", "Position"];
pub const LAT_KEYS: &[&str] = &["lat", "PositionLat"];
pub const LON_KEYS: &[&str] = &["lon", "PositionLon"];

/// `(lat path, lon path)` for every stored position representation.
pub const POSITION_PATHS: &[(&str, &str)] = &[
    ("position.lat", "position.lon"),
    ("Position.PositionLat", "Position.PositionLon"),
    ("PositionLat", "PositionLon"),
    ("location.coordinates.1", "location.coordinates.0"),
];

impl SourceShape {
    /// Detect the shape from the keys present.
    pub fn detect(map: &Map<String, Value>) -> Self {
        let pascal = PASCAL_RENAMES
            .iter()
            .map(|(source, _)| *source)
            .chain(PASCAL_ONLY_KEYS.iter().copied())
            .any(|key| map.contains_key(key));
        if pascal {
            SourceShape::PascalExport
        } else {
            SourceShape::CamelCase
        }
    }

    fn renames(&self) -> Vec<(&'static str, &'static str)> {
        match self {
            // Mixed exports occasionally carry legacy camelCase keys as well.
            SourceShape::PascalExport => PASCAL_RENAMES.iter().chain(CAMEL_RENAMES).copied().collect(),
            SourceShape::CamelCase => CAMEL_RENAMES.to_vec(),
        }
    }

    /// Move every source key to its canonical name. A non-null value already
    /// under the canonical name wins and the alias is discarded.
    pub fn apply_renames(&self, mut map: Map<String, Value>) -> Map<String, Value> {
        for (source, target) in self.renames() {
            if let Some(value) = map.remove(source) {
                let canonical_present = map.get(target).is_some_and(|v| !v.is_null());
                if !canonical_present {
                    map.insert(target.to_string(), value);
                }
            }
        }
        map
    }
}

/// Every stored spelling of a top-level canonical attribute, in the order
/// [`SourceShape::apply_renames`] lets them win: canonical, PascalCase
/// sources, legacy camelCase sources. The first non-null one is the value a
/// normalized record carries.
pub fn stored_paths(canonical: &str) -> Vec<String> {
    let mut paths = vec![canonical.to_string()];
    for (source, target) in PASCAL_RENAMES.iter().chain(CAMEL_RENAMES) {
        if *target == canonical && !paths.iter().any(|p| p == source) {
            paths.push(source.to_string());
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_detects_shapes_by_key_presence() {
        assert_eq!(
            SourceShape::detect(&object(json!({"AttractionName": "x"}))),
            SourceShape::PascalExport
        );
        assert_eq!(
            SourceShape::detect(&object(json!({"PositionLat": 25.0}))),
            SourceShape::PascalExport
        );
        assert_eq!(
            SourceShape::detect(&object(json!({"name": "x", "attractionName": "y"}))),
            SourceShape::CamelCase
        );
    }

    #[test]
    fn test_canonical_value_wins_over_alias() {
        let map = object(json!({"name": "Canonical", "AttractionName": "Alias"}));
        let renamed = SourceShape::PascalExport.apply_renames(map);
        assert_eq!(renamed["name"], "Canonical");
        assert!(!renamed.contains_key("AttractionName"));
    }

    #[test]
    fn test_null_canonical_value_is_replaced() {
        let map = object(json!({"name": null, "attractionName": "Legacy"}));
        let renamed = SourceShape::CamelCase.apply_renames(map);
        assert_eq!(renamed["name"], "Legacy");
    }

    #[test]
    fn test_stored_paths_follow_rename_precedence() {
        assert_eq!(
            stored_paths("classes"),
            vec!["classes", "AttractionClasses", "attractionClasses"]
        );
        assert_eq!(stored_paths("postalAddress"), vec!["postalAddress", "PostalAddress"]);

        // The first non-null spelling is the one the renamed map keeps.
        let map = object(json!({
            "classes": null,
            "attractionClasses": [9],
            "AttractionClasses": [3]
        }));
        let renamed = SourceShape::PascalExport.apply_renames(map);
        assert_eq!(renamed["classes"], json!([3]));
    }
}
