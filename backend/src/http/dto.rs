//! Data Transfer Objects for the HTTP API.
//!
//! Query structs mirror the query string of each route. Values are kept
//! loosely typed where the route accepts several spellings (`classes=1,2`,
//! `free=1`) and parsed into façade types here.

use serde::{Deserialize, Serialize};

use crate::services::error::{QueryResult, Validator};
use crate::services::{FilterCriteria, NearbyParams, PageRequest};

/// `page`/`limit` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<&PageQuery> for PageRequest {
    fn from(query: &PageQuery) -> Self {
        PageRequest {
            page: query.page,
            limit: query.limit,
        }
    }
}

/// Query parameters for `GET /api/attractions/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Query parameters for `GET /api/attractions/filter`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    /// Comma separated class codes
    pub classes: Option<String>,
    pub free: Option<String>,
    pub region: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl FilterQuery {
    /// Parse the loosely typed parameters; every malformed one is reported.
    pub fn criteria(&self) -> QueryResult<FilterCriteria> {
        let mut validator = Validator::new();

        let classes = self
            .classes
            .as_deref()
            .map(|raw| parse_classes(raw, &mut validator))
            .filter(|c| !c.is_empty());

        let free = self.free.as_deref().map(str::trim).filter(|f| !f.is_empty()).and_then(|raw| {
            let parsed = parse_bool(raw);
            if parsed.is_none() {
                validator.reject("free", "must be one of true, false, 1, 0");
            }
            parsed
        });

        validator.finish()?;
        Ok(FilterCriteria {
            classes,
            free,
            region: self.region.clone(),
        })
    }
}

/// Query parameters for `GET /api/attractions/nearby`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NearbyQuery {
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    /// Kilometres
    pub radius: Option<f64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<&NearbyQuery> for NearbyParams {
    fn from(query: &NearbyQuery) -> Self {
        NearbyParams {
            lon: query.lon,
            lat: query.lat,
            radius: query.radius,
        }
    }
}

/// Response for `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub status: String,
    pub message: String,
}

/// Response for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

fn parse_classes(raw: &str, validator: &mut Validator) -> Vec<i64> {
    let mut classes = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<i64>() {
            Ok(code) if code >= 0 => classes.push(code),
            _ => validator.reject("classes", format!("invalid class code `{}`", part)),
        }
    }
    classes
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
