//! A client library for the [Altmetric](https://api.altmetric.com/) API, which tracks the
//! online attention scholarly articles receive: news coverage, blog posts, social media
//! mentions, reference manager readers, and more.
//!
//! Look an article up by DOI, PubMed ID, arXiv ID, ADS bibcode or Altmetric ID and get
//! back an immutable [`Article`], or page through every article mentioned within a
//! timeframe with [`AltmetricClient::search_by_timeframe`].
//!
//! # Example
//! ```rust,no_run
//! use altmetric::{AltmetricClient, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!   let client = AltmetricClient::with_config(ClientConfig::from_env())?;
//!
//!   match client.fetch_by_doi("10.1038/nature.2014.14583").await? {
//!     Some(article) => println!("{:?}: {:?}", article.title(), article.score()),
//!     None => println!("Not tracked by Altmetric"),
//!   }
//!
//!   Ok(())
//! }
//! ```

#![warn(missing_docs, clippy::missing_docs_in_private_items)]
use std::{collections::BTreeMap, str::FromStr};

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};
#[cfg(test)] use tracing_test::traced_test;
use url::Url;

pub mod article;
pub mod client;
pub mod config;
pub mod errors;
pub mod format;

pub use article::{Article, ContextStats, MentionCounts};
pub use client::{AltmetricClient, CitationQuery, Lookup, Timeframe};
use config::SUPPORTED_API_VERSION;
pub use config::{ClientConfig, VersionSupport};
pub use errors::AltmetricError;
