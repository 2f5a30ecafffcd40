//! Proximity search.
//!
//! Two strategies share one contract. When the store declares a geospatial
//! index the query goes to the store's nearest-first operator. Otherwise a
//! bounding box prefilter runs in the store and the exact Haversine filter
//! runs here. Both annotate every hit with its distance and rank nearest
//! first.

use std::cmp::Ordering;

use log::{debug, warn};

use crate::api::Position;
use crate::db::query::{FindOptions, NearQuery, RawDocument};
use crate::db::repository::FullRepository;
use crate::services::error::{QueryResult, Validator};
use crate::services::geo::{haversine_km, BoundingBox};
use crate::services::normalize::read_position;
use crate::services::predicate;

pub const DEFAULT_RADIUS_KM: f64 = 5.0;
/// Ceiling on documents the fallback prefilter materializes per request.
/// Past it the prefilter keeps the first candidates in store order, not the
/// nearest ones, so closer records may be missing from a result marked
/// `truncated`.
pub const DEFAULT_CANDIDATE_CAP: usize = 5000;

/// Raw nearby parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NearbyParams {
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    /// Kilometres; defaults to [`DEFAULT_RADIUS_KM`].
    pub radius: Option<f64>,
}

/// Validated circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Position,
    pub radius_km: f64,
}

impl NearbyParams {
    pub fn new(lon: f64, lat: f64, radius: f64) -> Self {
        NearbyParams {
            lon: Some(lon),
            lat: Some(lat),
            radius: Some(radius),
        }
    }

    pub fn validate_into(&self, validator: &mut Validator) -> Option<Circle> {
        let lon = self.lon.filter(|l| l.is_finite() && (-180.0..=180.0).contains(l));
        let lat = self.lat.filter(|l| l.is_finite() && (-90.0..=90.0).contains(l));
        let radius = self.radius.unwrap_or(DEFAULT_RADIUS_KM);

        match self.lon {
            None => validator.reject("lon", "is required"),
            Some(_) if lon.is_none() => validator.reject("lon", "must be within [-180, 180]"),
            _ => {}
        }
        match self.lat {
            None => validator.reject("lat", "is required"),
            Some(_) if lat.is_none() => validator.reject("lat", "must be within [-90, 90]"),
            _ => {}
        }
        validator.check(radius.is_finite(), "radius", "must be a finite number");

        Some(Circle {
            center: Position::new(lat?, lon?),
            radius_km: radius,
        })
        .filter(|c| c.radius_km.is_finite())
    }
}

/// Ranked hits for one page, plus the total for the whole circle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NearbyHits {
    /// Raw documents with their distance in kilometres, nearest first.
    pub hits: Vec<(RawDocument, f64)>,
    pub total: u64,
    /// The fallback prefilter hit the candidate cap.
    pub truncated: bool,
}

/// Proximity engine bound to a store.
pub struct ProximitySearch<'a> {
    repository: &'a dyn FullRepository,
    candidate_cap: usize,
}

impl<'a> ProximitySearch<'a> {
    pub fn new(repository: &'a dyn FullRepository, candidate_cap: usize) -> Self {
        ProximitySearch {
            repository,
            candidate_cap: candidate_cap.max(1),
        }
    }

    /// Documents within `circle`, nearest first, with `skip`/`limit` applied.
    pub async fn nearby(&self, circle: Circle, skip: usize, limit: usize) -> QueryResult<NearbyHits> {
        if circle.radius_km <= 0.0 {
            return Ok(NearbyHits::default());
        }
        if let Some(field) = self.repository.capabilities().await?.geo_field {
            return self.native(&field, circle, skip, limit).await;
        }

        let (ranked, truncated) = self.fallback_candidates(circle).await?;
        let total = ranked.len() as u64;
        Ok(NearbyHits {
            hits: ranked.into_iter().skip(skip).take(limit).collect(),
            total,
            truncated,
        })
    }

    /// Number of documents within `circle`; same filter as [`Self::nearby`].
    pub async fn count_nearby(&self, circle: Circle) -> QueryResult<(u64, bool)> {
        if circle.radius_km <= 0.0 {
            return Ok((0, false));
        }
        if let Some(field) = self.repository.capabilities().await?.geo_field {
            let query = near_query(&field, circle, 0, None);
            return Ok((self.repository.count_near(&query).await?, false));
        }
        let (ranked, truncated) = self.fallback_candidates(circle).await?;
        Ok((ranked.len() as u64, truncated))
    }

    async fn native(&self, field: &str, circle: Circle, skip: usize, limit: usize) -> QueryResult<NearbyHits> {
        debug!("nearby via native geo index on {}", field);
        let docs = self
            .repository
            .find_near(&near_query(field, circle, skip, Some(limit)))
            .await?;
        let total = self
            .repository
            .count_near(&near_query(field, circle, 0, None))
            .await?;
        let hits = docs
            .into_iter()
            .filter_map(|doc| {
                let distance = haversine_km(circle.center, read_position(&doc)?);
                Some((doc, distance))
            })
            .collect();
        Ok(NearbyHits {
            hits,
            total,
            truncated: false,
        })
    }

    /// Every document inside the circle, ranked, from a capped prefilter.
    /// Truncation happens before ranking, in store order.
    async fn fallback_candidates(&self, circle: Circle) -> QueryResult<(Vec<(RawDocument, f64)>, bool)> {
        let bbox = BoundingBox::around(circle.center, circle.radius_km);
        let options = FindOptions {
            skip: 0,
            limit: Some(self.candidate_cap + 1),
            sort: None,
        };
        let mut candidates = self
            .repository
            .find_many(&predicate::within_box(&bbox), &options)
            .await?;

        let truncated = candidates.len() > self.candidate_cap;
        if truncated {
            warn!(
                "nearby prefilter around ({}, {}) r={}km exceeded {} candidates; results truncated",
                circle.center.lat, circle.center.lon, circle.radius_km, self.candidate_cap
            );
            candidates.truncate(self.candidate_cap);
        }

        let order = predicate::name_order();
        let mut ranked: Vec<(RawDocument, f64)> = candidates
            .into_iter()
            .filter_map(|doc| {
                let distance = haversine_km(circle.center, read_position(&doc)?);
                (distance <= circle.radius_km).then_some((doc, distance))
            })
            .collect();
        ranked.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| order.compare(&a.0, &b.0))
        });
        debug!("nearby fallback kept {} documents", ranked.len());
        Ok((ranked, truncated))
    }
}

fn near_query(field: &str, circle: Circle, skip: usize, limit: Option<usize>) -> NearQuery {
    NearQuery {
        field: field.to_string(),
        center: circle.center,
        max_distance_m: circle.radius_km * 1000.0,
        skip,
        limit,
    }
}
