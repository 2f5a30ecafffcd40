//! Normalization of raw stored documents into the canonical [`Attraction`].
//!
//! The pipeline runs in a fixed order: identity, shape detection and renames,
//! sub-record reshaping, scalar cleanup. It is total for everything but a
//! missing identity, and idempotent: feeding a serialized canonical record
//! back in yields the same record.

mod records;
mod shape;

use serde_json::{Map, Value};

use crate::api::{Attraction, Position};
use crate::db::query::{RawDocument, ID_FIELD};

pub use records::{FALSE_WORDS, TRUE_WORDS};
pub use shape::{stored_paths, SourceShape, POSITION_PATHS, REGION_KEYS};

/// Why a raw document could not become a canonical record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizationError {
    #[error("raw document is not a JSON object")]
    NotAnObject,

    #[error("raw document has no identity (`_id` or `id`)")]
    MissingIdentity,
}

/// Map a raw document in any supported shape to the canonical record.
pub fn normalize(raw: &RawDocument) -> Result<Attraction, NormalizationError> {
    let source = raw.as_object().ok_or(NormalizationError::NotAnObject)?;
    let id = identity(source).ok_or(NormalizationError::MissingIdentity)?;

    let shape = SourceShape::detect(source);
    let doc = shape.apply_renames(source.clone());

    Ok(Attraction {
        id,
        attraction_id: records::text(&doc, &["attractionId"]),
        name: records::text(&doc, &["name"]).unwrap_or_default(),
        alternate_names: records::text_list(doc.get("alternateNames")),
        description: records::text(&doc, &["description"]).unwrap_or_default(),
        position: records::position(&doc),
        classes: records::classes(records::field(&doc, &["classes"])),
        postal_address: records::postal_address(records::field(&doc, &["postalAddress"])),
        telephones: records::telephones(records::field(&doc, &["telephones"])),
        images: records::images(records::field(&doc, &["images"])),
        service_times: records::service_times(records::field(&doc, &["serviceTimes"])),
        fees: records::fees(records::field(&doc, &["fees"])),
        social_media: records::social_media(records::field(&doc, &["socialMedia"])),
        traffic_info: records::text(&doc, &["trafficInfo"]),
        parking_info: records::text(&doc, &["parkingInfo"]),
        website: records::text(&doc, &["website"]),
        is_public_access: records::flag(doc.get("isPublicAccess"), true),
        is_accessible_for_free: records::flag(doc.get("isAccessibleForFree"), false),
        updated_at: records::text(&doc, &["updatedAt"]).unwrap_or_default(),
        distance_km: records::field(&doc, &["distanceKm"])
            .and_then(records::number)
            .filter(|d| *d >= 0.0),
    })
}

/// Read just the position of a raw document, without a full normalization.
pub fn read_position(raw: &RawDocument) -> Option<Position> {
    raw.as_object().and_then(records::position)
}

/// Identity: the store's `_id` (string, number or `{"$oid": ...}`), else `id`.
fn identity(doc: &Map<String, Value>) -> Option<String> {
    let store_id = doc.get(ID_FIELD).and_then(|v| match v {
        Value::Object(oid) => oid.get("$oid").and_then(records::scalar_text),
        other => records::scalar_text(other),
    });
    store_id.or_else(|| doc.get("id").and_then(records::scalar_text))
}
