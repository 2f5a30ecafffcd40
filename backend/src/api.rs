//! Public API surface for the attractions backend.
//!
//! This file consolidates the canonical record and the response envelopes.
//! All types derive Serialize/Deserialize for JSON serialization and use the
//! camelCase field names of the API contract.

use serde::{Deserialize, Serialize};

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Position { lat, lon }
    }

    /// True when both coordinates are finite and inside their valid ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Postal address. Only the street address is always present (possibly empty).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    #[serde(default)]
    pub address_region: Option<String>,
    #[serde(default)]
    pub address_locality: Option<String>,
    #[serde(default)]
    pub street_address: String,
    #[serde(default)]
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telephone {
    pub tel: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SocialMedia {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Opening hours entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTime {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub days: Vec<String>,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub effective_date: Option<String>,
    #[serde(default)]
    pub expire_date: Option<String>,
}

/// Admission fee entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    #[serde(default)]
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Canonical attraction record served by every endpoint.
///
/// Every sub-record list is always present (empty when the source had none),
/// so consumers never have to distinguish `null` from a missing key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attraction {
    pub id: String,
    /// Source-system identity, kept when the raw document carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attraction_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub alternate_names: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub classes: Vec<i64>,
    #[serde(default)]
    pub postal_address: Option<PostalAddress>,
    #[serde(default)]
    pub telephones: Vec<Telephone>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub service_times: Vec<ServiceTime>,
    #[serde(default)]
    pub fees: Vec<Fee>,
    #[serde(default)]
    pub social_media: Vec<SocialMedia>,
    #[serde(default)]
    pub traffic_info: Option<String>,
    #[serde(default)]
    pub parking_info: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    pub is_public_access: bool,
    pub is_accessible_for_free: bool,
    #[serde(default)]
    pub updated_at: String,
    /// Distance from the query center; only set on nearby results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Paginated list envelope: `{total, page, limit, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub data: Vec<T>,
    /// Set when a nearby search hit the candidate ceiling.
    #[serde(default, skip_serializing_if = "is_false")]
    pub truncated: bool,
}

impl<T> Page<T> {
    pub fn new(total: u64, page: u32, limit: u32, data: Vec<T>) -> Self {
        Page {
            total,
            page,
            limit,
            data,
            truncated: false,
        }
    }
}

/// Single-item envelope: `{data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Single<T> {
    pub data: T,
}

fn is_false(value: &bool) -> bool {
    !*value
}
