//! Page/limit validation.

use crate::services::error::{QueryResult, Validator};

pub const MAX_LIMIT: u32 = 100;
pub const DEFAULT_LIMIT: u32 = 20;

/// Pagination parameters exactly as the client sent them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        PageRequest {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Check `page >= 1` and `1 <= limit <= 100` into `validator`, returning
    /// the resolved values when they hold.
    pub fn validate_into(&self, validator: &mut Validator, default_limit: u32) -> Option<Pagination> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(i64::from(default_limit));
        let page_ok = page >= 1 && page <= i64::from(u32::MAX);
        let limit_ok = (1..=i64::from(MAX_LIMIT)).contains(&limit);
        validator.check(page_ok, "page", "must be an integer >= 1");
        validator.check(limit_ok, "limit", "must be an integer between 1 and 100");
        (page_ok && limit_ok).then(|| Pagination {
            page: page as u32,
            limit: limit as u32,
        })
    }

    pub fn validate(&self, default_limit: u32) -> QueryResult<Pagination> {
        let mut validator = Validator::new();
        let pagination = self.validate_into(&mut validator, default_limit);
        validator.finish()?;
        // finish() succeeds only when both fields were accepted
        Ok(pagination.unwrap_or_default())
    }
}

/// Validated pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    pub fn skip(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::error::QueryError;

    #[test]
    fn test_defaults() {
        let p = PageRequest::default().validate(DEFAULT_LIMIT).unwrap();
        assert_eq!(p, Pagination { page: 1, limit: 20 });
        assert_eq!(p.skip(), 0);
    }

    #[test]
    fn test_skip() {
        let p = PageRequest::new(3, 10).validate(DEFAULT_LIMIT).unwrap();
        assert_eq!(p.skip(), 20);
    }

    #[test]
    fn test_bounds() {
        for (page, limit) in [(0, 20), (1, 0), (1, 101), (-4, 10)] {
            let err = PageRequest::new(page, limit).validate(DEFAULT_LIMIT).unwrap_err();
            assert!(matches!(err, QueryError::Validation(_)), "{} {}", page, limit);
        }
        assert!(PageRequest::new(1, 100).validate(DEFAULT_LIMIT).is_ok());
    }
}
