//! Client configuration.
//!
//! A [`ClientConfig`] captures everything an [`AltmetricClient`] needs before it can
//! issue a request: where the API lives, which version to talk to, and the optional
//! API key. Validation is explicit: [`ClientConfig::validate`] either rejects the
//! configuration or reports whether the chosen API version is one this library
//! has been built against.
//!
//! # Examples
//!
//! ```
//! use altmetric::config::{ClientConfig, VersionSupport};
//!
//! let config = ClientConfig::default().with_api_key("my-key");
//! assert_eq!(config.validate().unwrap(), VersionSupport::Supported);
//!
//! let config = ClientConfig::default().with_api_version("v2");
//! assert_eq!(config.validate().unwrap(), VersionSupport::Untested("v2".into()));
//! ```

use lazy_static::lazy_static;

use super::*;

/// The API version used when none is given.
pub const DEFAULT_API_VERSION: &str = "v1";

/// The only API version this library has been tested with.
pub const SUPPORTED_API_VERSION: &str = "v1";

/// Public host of the Altmetric API.
pub const DEFAULT_BASE_URL: &str = "https://api.altmetric.com/";

/// Environment variable read by [`ClientConfig::from_env`] for the API key.
pub const API_KEY_ENV: &str = "ALTMETRIC_API_KEY";

/// Environment variable read by [`ClientConfig::from_env`] for the API version.
pub const API_VERSION_ENV: &str = "ALTMETRIC_API_VERSION";

lazy_static! {
  /// Parsed form of [`DEFAULT_BASE_URL`].
  static ref DEFAULT_BASE: Url = Url::parse(DEFAULT_BASE_URL).unwrap();
}

/// Outcome of validating a [`ClientConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VersionSupport {
  /// The configured version is [`SUPPORTED_API_VERSION`].
  Supported,
  /// The configuration is usable, but this library has never been run against
  /// the contained version and responses may not map cleanly.
  Untested(String),
}

/// Settings for an [`AltmetricClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
  /// Sent as the `key` query parameter on every request when present
  pub api_key:     Option<String>,
  /// Version path segment, e.g. `"v1"`
  pub api_version: String,
  /// Scheme and host the version path is appended to
  pub base_url:    Url,
  /// `User-Agent` header sent with each request
  pub user_agent:  String,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      api_key:     None,
      api_version: DEFAULT_API_VERSION.to_string(),
      base_url:    DEFAULT_BASE.clone(),
      user_agent:  format!("altmetric-rs/{}", env!("CARGO_PKG_VERSION")),
    }
  }
}

impl ClientConfig {
  /// Builds a configuration from `ALTMETRIC_API_KEY` and `ALTMETRIC_API_VERSION`,
  /// falling back to the defaults for anything unset.
  pub fn from_env() -> Self { Self::from_lookup(|name| std::env::var(name).ok()) }

  /// Same as [`ClientConfig::from_env`], reading variables through `lookup`.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
    let mut config = Self::default();
    if let Some(key) = lookup(API_KEY_ENV) {
      config = config.with_api_key(key);
    }
    if let Some(version) = lookup(API_VERSION_ENV).filter(|v| !v.trim().is_empty()) {
      config = config.with_api_version(version.trim());
    }
    config
  }

  /// Sets the API key. An empty key is the same as no key.
  pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
    let key = key.into();
    self.api_key = if key.is_empty() { None } else { Some(key) };
    self
  }

  /// Sets the API version path segment.
  pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
    self.api_version = version.into();
    self
  }

  /// Points the client at a different host, e.g. a local mock server.
  pub fn with_base_url(mut self, base_url: Url) -> Self {
    self.base_url = base_url;
    self
  }

  /// Checks that the configuration can be used to build request URLs.
  ///
  /// # Errors
  ///
  /// Returns [`AltmetricError::InvalidInput`] if:
  /// - The API version is empty or contains a `/`
  /// - The base URL is not `http` or `https`
  pub fn validate(&self) -> Result<VersionSupport, AltmetricError> {
    let version = self.api_version.trim();
    if version.is_empty() || version.contains('/') || version != self.api_version {
      return Err(AltmetricError::InvalidInput(format!(
        "API version must be a single path segment, got {:?}",
        self.api_version
      )));
    }

    if !matches!(self.base_url.scheme(), "http" | "https") || self.base_url.cannot_be_a_base() {
      return Err(AltmetricError::InvalidInput(format!(
        "Base URL must be an http(s) URL, got {}",
        self.base_url
      )));
    }

    if version == SUPPORTED_API_VERSION {
      Ok(VersionSupport::Supported)
    } else {
      Ok(VersionSupport::Untested(version.to_string()))
    }
  }

  /// The versioned API root every request path hangs off, e.g.
  /// `https://api.altmetric.com/v1/`.
  pub fn api_url(&self) -> Result<Url, AltmetricError> {
    let mut base = self.base_url.clone();
    if !base.path().ends_with('/') {
      base.set_path(&format!("{}/", base.path()));
    }
    Ok(base.join(&format!("{}/", self.api_version))?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_config() {
    let config = ClientConfig::default();
    assert_eq!(config.api_key, None);
    assert_eq!(config.api_version, "v1");
    assert_eq!(config.api_url().unwrap().as_str(), "https://api.altmetric.com/v1/");
    assert_eq!(config.validate().unwrap(), VersionSupport::Supported);
  }

  #[test]
  fn test_untested_version_is_accepted_with_caveat() {
    let config = ClientConfig::default().with_api_version("v2").with_api_key("1234");
    assert_eq!(config.validate().unwrap(), VersionSupport::Untested("v2".into()));
    assert_eq!(config.api_url().unwrap().as_str(), "https://api.altmetric.com/v2/");
    assert_eq!(config.api_key.as_deref(), Some("1234"));
  }

  #[test]
  fn test_rejected_configs() {
    for version in ["", " ", "v1/doi", " v1"] {
      let config = ClientConfig::default().with_api_version(version);
      assert!(matches!(config.validate(), Err(AltmetricError::InvalidInput(_))), "{version:?}");
    }

    let config = ClientConfig::default().with_base_url(Url::parse("ftp://example.com/").unwrap());
    assert!(matches!(config.validate(), Err(AltmetricError::InvalidInput(_))));
  }

  #[test]
  fn test_empty_key_means_no_key() {
    assert_eq!(ClientConfig::default().with_api_key("").api_key, None);
  }

  #[test]
  fn test_base_url_with_path() {
    let config = ClientConfig::default()
      .with_base_url(Url::parse("http://localhost:8080/proxy/altmetric").unwrap());
    assert_eq!(config.api_url().unwrap().as_str(), "http://localhost:8080/proxy/altmetric/v1/");
  }

  #[test]
  fn test_from_lookup() {
    let config = ClientConfig::from_lookup(|name| match name {
      API_KEY_ENV => Some("secret".to_string()),
      API_VERSION_ENV => Some(" v2 ".to_string()),
      _ => None,
    });
    assert_eq!(config.api_key.as_deref(), Some("secret"));
    assert_eq!(config.api_version, "v2");

    let config = ClientConfig::from_lookup(|_| None);
    assert_eq!(config, ClientConfig::default());
  }
}
