//! Error types for the altmetric library.
//!
//! This module provides a single error type that covers every way a lookup or an
//! article construction can fail, including:
//! - Transport failures and unexpected HTTP statuses
//! - Responses that are not the JSON the API promises
//! - Caller input rejected before any request is made
//! - Payloads that cannot be turned into an [`Article`](crate::Article)
//!
//! Note that an identifier the API does not know about is *not* an error: lookups
//! return `Ok(None)` for HTTP 400 and 404.
//!
//! # Examples
//!
//! ```no_run
//! use altmetric::{errors::AltmetricError, AltmetricClient};
//!
//! # async fn example() -> Result<(), AltmetricError> {
//! let client = AltmetricClient::new()?;
//! match client.fetch_by_doi("10.1038/nature.2014.14583").await {
//!   Ok(Some(article)) => println!("Score: {:?}", article.score()),
//!   Ok(None) => println!("Altmetric has no record of this DOI"),
//!   Err(AltmetricError::RateLimited) => println!("Slow down"),
//!   Err(e) => println!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

use reqwest::StatusCode;
use thiserror::Error;

/// The non-standard status the Altmetric API uses to signal rate limiting.
pub const RATE_LIMIT_STATUS: u16 = 420;

/// Errors that can occur when working with the altmetric library.
#[derive(Error, Debug)]
pub enum AltmetricError {
  /// Caller-supplied arguments were rejected before any request was made.
  ///
  /// This can occur when:
  /// - An identifier is empty
  /// - A timeframe token is not one the API understands
  /// - A page number or page size is out of range
  /// - The client configuration is unusable (empty API version, non-HTTP base URL)
  #[error("Invalid input: {0}")]
  InvalidInput(String),

  /// An [`Article`](crate::Article) was requested from an empty or absent payload.
  #[error("Cannot build an article from an empty payload")]
  EmptyPayload,

  /// The payload was JSON, but its structure is not what the API documents.
  ///
  /// Raised for score history keys with an unknown unit, score context entries that
  /// are not objects, or a top-level value that is not a JSON object.
  #[error("Malformed payload: {0}")]
  MalformedPayload(String),

  /// The response body (or a saved file) was not valid JSON.
  #[error("Failed to parse JSON: {0}")]
  JsonParse(#[from] serde_json::Error),

  /// HTTP 403: the API key is missing or not allowed to make this call.
  #[error("You are not authorized for this call")]
  NotAuthorized,

  /// HTTP 420: the API rate limit has been reached.
  #[error("Rate limit reached")]
  RateLimited,

  /// HTTP 502: the Altmetric API is down.
  #[error("Altmetric API is unavailable")]
  Unavailable,

  /// Any other status the API is not documented to return.
  #[error("Unexpected HTTP status: {0}")]
  Http(StatusCode),

  /// A network request failed before a status was received.
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// Failed to build a request URL.
  #[error(transparent)]
  InvalidUrl(#[from] url::ParseError),

  /// Reading a saved response from disk failed.
  #[error(transparent)]
  Path(#[from] std::io::Error),
}

impl AltmetricError {
  /// Classifies a non-success status that is not a "not found" outcome.
  pub fn from_status(status: StatusCode) -> Self {
    match status.as_u16() {
      403 => AltmetricError::NotAuthorized,
      RATE_LIMIT_STATUS => AltmetricError::RateLimited,
      502 => AltmetricError::Unavailable,
      _ => AltmetricError::Http(status),
    }
  }

  /// The HTTP status behind this error, for the variants that came from one.
  ///
  /// ```
  /// use altmetric::errors::AltmetricError;
  ///
  /// assert_eq!(AltmetricError::RateLimited.status().map(|s| s.as_u16()), Some(420));
  /// assert_eq!(AltmetricError::EmptyPayload.status(), None);
  /// ```
  pub fn status(&self) -> Option<StatusCode> {
    match self {
      AltmetricError::NotAuthorized => Some(StatusCode::FORBIDDEN),
      AltmetricError::RateLimited => StatusCode::from_u16(RATE_LIMIT_STATUS).ok(),
      AltmetricError::Unavailable => Some(StatusCode::BAD_GATEWAY),
      AltmetricError::Http(status) => Some(*status),
      AltmetricError::Network(e) => e.status(),
      _ => None,
    }
  }

  /// Whether issuing the same request later could succeed.
  ///
  /// The library never retries on its own; this is for callers that want to.
  pub fn is_transient(&self) -> bool {
    matches!(self, AltmetricError::RateLimited | AltmetricError::Unavailable)
      || matches!(self, AltmetricError::Network(e) if e.is_timeout() || e.is_connect())
  }
}
