//! Core library: vector store retrieval of news articles and the analytics
//! computed over them.

pub mod analytics;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod memory_store;
pub mod models;
pub mod search;
pub mod vectorstore;

pub use analytics::AnalyticsEngine;
pub use client::StoreClient;
pub use error::StoreError;
pub use models::{ArticleRecord, RecordSet};
