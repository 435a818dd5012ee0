//! Client for the Altmetric API.
//!
//! [`AltmetricClient`] turns lookups into `GET` requests against the versioned API
//! root and classifies the response:
//!
//! | status     | outcome                                      |
//! |------------|----------------------------------------------|
//! | 200        | body parsed as JSON                          |
//! | 400, 404   | `Ok(None)`, the identifier is unknown        |
//! | 403        | [`AltmetricError::NotAuthorized`]            |
//! | 420        | [`AltmetricError::RateLimited`]              |
//! | 502        | [`AltmetricError::Unavailable`]              |
//! | other      | [`AltmetricError::Http`] carrying the status |
//!
//! Single-article lookups live here; the paginated timeframe search lives in
//! [`citations`].
//!
//! # Examples
//!
//! ```no_run
//! use altmetric::{AltmetricClient, ClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AltmetricClient::with_config(ClientConfig::default().with_api_key("my-key"))?;
//!
//! let by_doi = client.fetch_by_doi("10.1038/nature.2014.14583").await?;
//! let by_pmid = client.fetch_by_pmid("21148220").await?;
//! let by_arxiv = client.fetch_by_arxiv_id("1108.2455").await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;

pub mod citations;

pub use citations::{CitationQuery, Timeframe};

use super::*;

/// The identifier kinds the API can look an article up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Lookup {
  /// Digital Object Identifier, e.g. `10.1038/nature.2014.14583`
  Doi,
  /// PubMed ID, e.g. `21148220`
  Pmid,
  /// Altmetric's internal ID, e.g. `241939`
  AltmetricId,
  /// ADS bibcode, e.g. `2012ApPhL.100y3104B`
  AdsBibcode,
  /// arXiv ID, e.g. `1108.2455`
  ArxivId,
}

impl Lookup {
  /// Path segment the API uses for this kind.
  pub fn segment(&self) -> &'static str {
    match self {
      Lookup::Doi => "doi",
      Lookup::Pmid => "pmid",
      Lookup::AltmetricId => "id",
      Lookup::AdsBibcode => "ads",
      Lookup::ArxivId => "arxiv",
    }
  }
}

impl fmt::Display for Lookup {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.segment()) }
}

/// Client for fetching attention metrics from the Altmetric API.
///
/// Holds an immutable [`ClientConfig`] and a reusable HTTP client. Every operation
/// awaits its single request before returning.
#[derive(Debug, Clone)]
pub struct AltmetricClient {
  /// Internal web client used to connect to the API.
  client:          reqwest::Client,
  /// Settings captured at construction.
  config:          ClientConfig,
  /// The versioned root every request path is appended to.
  api_url:         Url,
  /// Result of validating `config`.
  version_support: VersionSupport,
}

impl AltmetricClient {
  /// Creates a client for API v1 without a key.
  pub fn new() -> Result<Self, AltmetricError> { Self::with_config(ClientConfig::default()) }

  /// Creates a client from an explicit configuration.
  ///
  /// The configuration is validated first; an untested API version is accepted and
  /// reported through [`AltmetricClient::version_support`].
  ///
  /// # Errors
  ///
  /// Returns [`AltmetricError::InvalidInput`] for configurations
  /// [`ClientConfig::validate`] rejects, and [`AltmetricError::Network`] if the HTTP
  /// client cannot be built.
  pub fn with_config(config: ClientConfig) -> Result<Self, AltmetricError> {
    let version_support = config.validate()?;
    if let VersionSupport::Untested(version) = &version_support {
      warn!("Altmetric API {version} is untested, only {SUPPORTED_API_VERSION} is known to work");
    }

    let api_url = config.api_url()?;
    let client = reqwest::Client::builder().user_agent(config.user_agent.as_str()).build()?;
    debug!("Altmetric client using API root: {api_url}");

    Ok(Self { client, config, api_url, version_support })
  }

  /// Whether the configured API version is one this library is known to work with.
  pub fn version_support(&self) -> &VersionSupport { &self.version_support }

  /// The configuration this client was built from.
  pub fn config(&self) -> &ClientConfig { &self.config }

  /// The versioned API root, e.g. `https://api.altmetric.com/v1/`.
  pub fn api_url(&self) -> &Url { &self.api_url }

  /// Fetches an article by DOI.
  ///
  /// # Returns
  ///
  /// - `Ok(Some(article))` when Altmetric tracks the DOI
  /// - `Ok(None)` when it does not (HTTP 400 or 404)
  ///
  /// # Errors
  ///
  /// This function will return an error if:
  /// - The DOI is empty
  /// - The request fails or the API answers 403, 420, 502 or another unexpected status
  /// - The response is not valid JSON, or cannot be built into an [`Article`]
  pub async fn fetch_by_doi(&self, doi: &str) -> Result<Option<Article>, AltmetricError> {
    self.fetch(Lookup::Doi, doi).await
  }

  /// Fetches an article by PubMed ID. Same contract as [`AltmetricClient::fetch_by_doi`].
  pub async fn fetch_by_pmid(&self, pmid: &str) -> Result<Option<Article>, AltmetricError> {
    self.fetch(Lookup::Pmid, pmid).await
  }

  /// Fetches an article by Altmetric's internal ID.
  ///
  /// Altmetric IDs are subject to change; prefer a DOI or PubMed ID where one exists.
  pub async fn fetch_by_provider_id(&self, id: &str) -> Result<Option<Article>, AltmetricError> {
    warn!("Altmetric IDs are subject to change, {id} may not refer to the same article later");
    self.fetch(Lookup::AltmetricId, id).await
  }

  /// Fetches an article by ADS bibcode.
  pub async fn fetch_by_ads_bibcode(
    &self,
    bibcode: &str,
  ) -> Result<Option<Article>, AltmetricError> {
    self.fetch(Lookup::AdsBibcode, bibcode).await
  }

  /// Fetches an article by arXiv ID.
  pub async fn fetch_by_arxiv_id(&self, id: &str) -> Result<Option<Article>, AltmetricError> {
    self.fetch(Lookup::ArxivId, id).await
  }

  /// Fetches an article by any supported identifier kind.
  ///
  /// A `200` whose body is `null` or an empty object is treated like "not found".
  pub async fn fetch(
    &self,
    lookup: Lookup,
    identifier: &str,
  ) -> Result<Option<Article>, AltmetricError> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
      return Err(AltmetricError::InvalidInput(format!("{lookup} identifier must not be empty")));
    }

    let url = self.endpoint(lookup.segment(), identifier, &[])?;
    match self.get_json(url).await? {
      None => {
        debug!("Altmetric has no article for {lookup} {identifier}");
        Ok(None)
      },
      Some(Value::Null) => Ok(None),
      Some(Value::Object(raw)) if raw.is_empty() => Ok(None),
      Some(payload) => Article::from_value(payload).map(Some),
    }
  }

  /// Builds `{api_url}/{method}/{path}?{params}&key={api_key}`.
  ///
  /// `path` is split on `/` so identifiers such as DOIs keep their literal slashes;
  /// other reserved characters are percent-encoded.
  fn endpoint(
    &self,
    method: &str,
    path: &str,
    params: &[(&str, String)],
  ) -> Result<Url, AltmetricError> {
    let mut url = self.api_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| AltmetricError::InvalidInput(format!("{} cannot be a base URL", self.api_url)))?
      .pop_if_empty()
      .push(method)
      .extend(path.split('/'));

    let mut pairs: Vec<(&str, &str)> =
      params.iter().map(|(name, value)| (*name, value.as_str())).collect();
    if let Some(key) = &self.config.api_key {
      pairs.push(("key", key.as_str()));
    }
    if !pairs.is_empty() {
      url.query_pairs_mut().extend_pairs(pairs);
    }
    Ok(url)
  }

  /// Issues the request and classifies the response status.
  async fn get_json(&self, url: Url) -> Result<Option<Value>, AltmetricError> {
    // the query may carry the API key, so only the path is logged
    debug!("Fetching from Altmetric via: {}", url.path());

    let response = self.client.get(url).send().await?;
    let status = response.status();
    debug!("Altmetric response status: {status}");

    match status.as_u16() {
      200 => {
        let text = response.text().await?;
        trace!("Altmetric response: {text}");
        Ok(Some(serde_json::from_str(&text)?))
      },
      400 | 404 => Ok(None),
      _ => Err(AltmetricError::from_status(status)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(config: ClientConfig) -> AltmetricClient {
    AltmetricClient::with_config(config).unwrap()
  }

  #[test]
  fn test_lookup_segments() {
    assert_eq!(Lookup::Doi.to_string(), "doi");
    assert_eq!(Lookup::Pmid.to_string(), "pmid");
    assert_eq!(Lookup::AltmetricId.to_string(), "id");
    assert_eq!(Lookup::AdsBibcode.to_string(), "ads");
    assert_eq!(Lookup::ArxivId.to_string(), "arxiv");
  }

  #[test]
  fn test_endpoint_without_key() {
    let client = client(ClientConfig::default());
    let url = client.endpoint("doi", "10.1038/nature.2014.14583", &[]).unwrap();
    assert_eq!(url.as_str(), "https://api.altmetric.com/v1/doi/10.1038/nature.2014.14583");
  }

  #[test]
  fn test_endpoint_with_key_and_params() {
    let client = client(ClientConfig::default().with_api_key("secret"));
    let url = client.endpoint("citations", "1w", &[("page", "2".to_string())]).unwrap();
    assert_eq!(url.as_str(), "https://api.altmetric.com/v1/citations/1w?page=2&key=secret");
  }

  #[test]
  fn test_endpoint_encodes_reserved_characters() {
    let client = client(ClientConfig::default());
    let url = client.endpoint("doi", "10.1002/(SICI)1097 x?y", &[]).unwrap();
    assert_eq!(url.path(), "/v1/doi/10.1002/(SICI)1097%20x%3Fy");
    assert_eq!(url.query(), None);
  }

  #[traced_test]
  #[test]
  fn test_untested_version_is_reported() {
    let client = client(ClientConfig::default().with_api_version("v2"));
    assert_eq!(client.version_support(), &VersionSupport::Untested("v2".into()));
    assert_eq!(client.api_url().as_str(), "https://api.altmetric.com/v2/");
    assert!(logs_contain("untested"));
  }

  #[test]
  fn test_invalid_config_is_rejected() {
    let result = AltmetricClient::with_config(ClientConfig::default().with_api_version(""));
    assert!(matches!(result, Err(AltmetricError::InvalidInput(_))));
  }
}
