//! Attraction query façade.
//!
//! Every listing follows the same steps: validate, build the store query,
//! fetch one page plus the matching count, normalize, wrap in a [`Page`].

use std::sync::Arc;

use log::{debug, warn};

use crate::api::{Attraction, Page, Single};
use crate::db::query::{FindOptions, Predicate, RawDocument};
use crate::db::repository::FullRepository;
use crate::services::error::{QueryError, QueryResult, Validator};
use crate::services::normalize::normalize;
use crate::services::pagination::{PageRequest, Pagination, DEFAULT_LIMIT};
use crate::services::predicate::{self, FilterCriteria};
use crate::services::proximity::{NearbyParams, ProximitySearch, DEFAULT_CANDIDATE_CAP};

/// Tunables of the query façade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySettings {
    /// Ceiling on fallback nearby candidates materialized per request.
    pub nearby_candidate_cap: usize,
    /// Page size when the request names none.
    pub default_limit: u32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        QuerySettings {
            nearby_candidate_cap: DEFAULT_CANDIDATE_CAP,
            default_limit: DEFAULT_LIMIT,
        }
    }
}

/// Read-only query operations over the attraction collection.
#[derive(Clone)]
pub struct AttractionService {
    repository: Arc<dyn FullRepository>,
    settings: QuerySettings,
}

impl AttractionService {
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self::with_settings(repository, QuerySettings::default())
    }

    pub fn with_settings(repository: Arc<dyn FullRepository>, settings: QuerySettings) -> Self {
        AttractionService {
            repository,
            settings,
        }
    }

    pub fn repository(&self) -> &Arc<dyn FullRepository> {
        &self.repository
    }

    pub fn settings(&self) -> QuerySettings {
        self.settings
    }

    /// Every attraction, name ascending.
    pub async fn list(&self, page: PageRequest) -> QueryResult<Page<Attraction>> {
        let pagination = page.validate(self.settings.default_limit)?;
        self.fetch_page(&Predicate::All, pagination).await
    }

    /// Full-text search on name and description.
    ///
    /// Ordered by relevance when the store scores text matches, otherwise
    /// by name.
    pub async fn search(&self, q: Option<&str>, page: PageRequest) -> QueryResult<Page<Attraction>> {
        let mut validator = Validator::new();
        let pagination = page.validate_into(&mut validator, self.settings.default_limit);
        let query = search_text(q, &mut validator);
        validator.finish()?;
        let (Some(pagination), Some(query)) = (pagination, query) else {
            return Err(QueryError::validation("q", "must not be empty"));
        };

        if self.repository.capabilities().await?.text_score {
            let options = FindOptions::new(pagination.skip(), pagination.limit as usize)
                .sorted(predicate::relevance_order());
            let hits = self.repository.text_search(query, &options).await?;
            let total = self.repository.count_text(query).await?;
            let docs = hits.into_iter().map(|h| h.document).collect();
            Ok(page_of(total, pagination, normalize_listing(docs)))
        } else {
            debug!("store has no text index; searching by substring");
            self.fetch_page(&predicate::text_contains(query), pagination).await
        }
    }

    /// Number of search matches; the same total [`Self::search`] reports.
    pub async fn count_search(&self, q: Option<&str>) -> QueryResult<u64> {
        let mut validator = Validator::new();
        let query = search_text(q, &mut validator);
        validator.finish()?;
        let Some(query) = query else {
            return Err(QueryError::validation("q", "must not be empty"));
        };
        if self.repository.capabilities().await?.text_score {
            Ok(self.repository.count_text(query).await?)
        } else {
            Ok(self.repository.count(&predicate::text_contains(query)).await?)
        }
    }

    /// Attractions matching every given dimension.
    pub async fn filter(&self, criteria: &FilterCriteria, page: PageRequest) -> QueryResult<Page<Attraction>> {
        let pagination = page.validate(self.settings.default_limit)?;
        self.fetch_page(&predicate::build(criteria), pagination).await
    }

    pub async fn count_filtered(&self, criteria: &FilterCriteria) -> QueryResult<u64> {
        Ok(self.repository.count(&predicate::build(criteria)).await?)
    }

    /// Attractions within `radius` km of (`lon`, `lat`), nearest first, each
    /// annotated with `distanceKm`.
    pub async fn nearby(&self, params: NearbyParams, page: PageRequest) -> QueryResult<Page<Attraction>> {
        let mut validator = Validator::new();
        let pagination = page.validate_into(&mut validator, self.settings.default_limit);
        let circle = params.validate_into(&mut validator);
        validator.finish()?;
        let (Some(pagination), Some(circle)) = (pagination, circle) else {
            return Err(QueryError::validation("radius", "must be a finite number"));
        };

        let result = self
            .proximity()
            .nearby(circle, pagination.skip(), pagination.limit as usize)
            .await?;
        let data = result
            .hits
            .into_iter()
            .filter_map(|(doc, distance)| {
                let mut attraction = normalize_or_skip(&doc)?;
                attraction.distance_km = Some(distance);
                Some(attraction)
            })
            .collect();

        let mut envelope = page_of(result.total, pagination, data);
        envelope.truncated = result.truncated;
        Ok(envelope)
    }

    /// Number of attractions within the circle; the total [`Self::nearby`] reports.
    pub async fn count_nearby(&self, params: NearbyParams) -> QueryResult<u64> {
        let mut validator = Validator::new();
        let circle = params.validate_into(&mut validator);
        validator.finish()?;
        let Some(circle) = circle else {
            return Err(QueryError::validation("radius", "must be a finite number"));
        };
        Ok(self.proximity().count_nearby(circle).await?.0)
    }

    /// Attractions carrying class code `class_id`.
    pub async fn by_class(&self, class_id: i64, page: PageRequest) -> QueryResult<Page<Attraction>> {
        let mut validator = Validator::new();
        let pagination = page.validate_into(&mut validator, self.settings.default_limit);
        validator.check(class_id >= 0, "class_id", "must be a non-negative integer");
        validator.finish()?;
        let pagination = pagination.unwrap_or_default();
        self.fetch_page(&predicate::build(&FilterCriteria::by_class(class_id)), pagination)
            .await
    }

    /// One attraction by its identifier.
    pub async fn by_id(&self, id: &str) -> QueryResult<Single<Attraction>> {
        let id = id.trim();
        if id.is_empty() {
            return Err(QueryError::validation("attraction_id", "must not be empty"));
        }
        let doc = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| QueryError::attraction_not_found(id))?;
        match normalize(&doc) {
            Ok(data) => Ok(Single { data }),
            Err(err) => {
                warn!("attraction {} failed normalization: {}", id, err);
                Err(QueryError::attraction_not_found(id))
            }
        }
    }

    /// Whether the store answers.
    pub async fn health(&self) -> bool {
        self.repository.health_check().await.unwrap_or(false)
    }

    fn proximity(&self) -> ProximitySearch<'_> {
        ProximitySearch::new(self.repository.as_ref(), self.settings.nearby_candidate_cap)
    }

    async fn fetch_page(&self, predicate: &Predicate, pagination: Pagination) -> QueryResult<Page<Attraction>> {
        let options = FindOptions::new(pagination.skip(), pagination.limit as usize)
            .sorted(predicate::name_order());
        let docs = self.repository.find_many(predicate, &options).await?;
        let total = self.repository.count(predicate).await?;
        Ok(page_of(total, pagination, normalize_listing(docs)))
    }
}

fn search_text<'q>(q: Option<&'q str>, validator: &mut Validator) -> Option<&'q str> {
    let query = q.map(str::trim).filter(|q| !q.is_empty());
    validator.check(query.is_some(), "q", "must not be empty");
    query
}

fn page_of(total: u64, pagination: Pagination, data: Vec<Attraction>) -> Page<Attraction> {
    Page::new(total, pagination.page, pagination.limit, data)
}

fn normalize_or_skip(doc: &RawDocument) -> Option<Attraction> {
    match normalize(doc) {
        Ok(attraction) => Some(attraction),
        Err(err) => {
            warn!("skipping stored document: {}", err);
            None
        }
    }
}

fn normalize_listing(docs: Vec<RawDocument>) -> Vec<Attraction> {
    docs.iter().filter_map(normalize_or_skip).collect()
}
