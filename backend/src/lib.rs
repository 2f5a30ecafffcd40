//! # Attractions Backend
//!
//! Read-only catalog of points of interest served over HTTP.
//!
//! The stored collection holds records in two historical shapes (a
//! PascalCase export and the camelCase API shape). This crate pages through,
//! filters, full-text searches and geographically queries that collection,
//! and normalizes every record into one canonical [`api::Attraction`].
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: canonical record and response envelopes
//! - [`db`]: query model, repository traits, the in-memory store and seed import
//! - [`services`]: predicate builder, proximity search, normalization and the query façade
//! - [`config`]: TOML configuration with environment overrides
//! - [`http`]: Axum-based HTTP server and request handlers
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use attractions_backend::db::{LocalRepository, MaintenanceRepository};
//! use attractions_backend::services::{AttractionService, PageRequest};
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! runtime.block_on(async {
//!     let repo = LocalRepository::connected();
//!     repo.replace_all(vec![serde_json::json!({"_id": "1", "AttractionName": "Longshan Temple"})])
//!         .await
//!         .unwrap();
//!     let service = AttractionService::new(Arc::new(repo));
//!     let page = service.list(PageRequest::default()).await.unwrap();
//!     assert_eq!(page.data[0].name, "Longshan Temple");
//! });
//! ```

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod config;

pub mod db;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
