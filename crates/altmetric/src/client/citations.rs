//! Paginated search for articles mentioned within a timeframe.
//!
//! The `citations` endpoint lists every article that picked up mentions within a
//! relative window such as the past day or the past three months. Results come back a
//! page at a time; [`AltmetricClient::search_by_timeframe`] hides that behind a
//! [`Stream`] that only requests the next page once the current one has been consumed.
//!
//! # Examples
//!
//! ```no_run
//! use altmetric::{AltmetricClient, CitationQuery};
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AltmetricClient::new()?;
//! let query = CitationQuery::new("3 months")?.with_doi_prefix("10.1038").with_page_size(50);
//!
//! let mut articles = client.search_by_timeframe(query)?.take(10);
//! while let Some(article) = articles.next().await {
//!   println!("{:?}", article?.title());
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;

use futures::stream::{self, BoxStream, Stream, StreamExt};
use lazy_static::lazy_static;
use regex::Regex;

use super::*;

/// Every timeframe token the `citations` endpoint accepts.
pub const TIMEFRAMES: [&str; 12] =
  ["at", "1d", "2d", "3d", "4d", "5d", "6d", "1w", "1m", "3m", "6m", "1y"];

/// Results per page when none is given, which is also the most the API will return.
pub const MAX_PAGE_SIZE: u32 = 100;

lazy_static! {
  /// Spelled-out windows such as `3 months` or `past week`
  static ref SHORTHAND: Regex =
    Regex::new(r"^(?:past\s+)?(\d+)?\s*(day|week|month|year)s?$").unwrap();
}

/// A relative time window understood by the `citations` endpoint.
///
/// Parse one from either the canonical token or a spelled-out form:
///
/// ```
/// use altmetric::Timeframe;
///
/// assert_eq!("3m".parse::<Timeframe>().unwrap().as_str(), "3m");
/// assert_eq!("3 months".parse::<Timeframe>().unwrap().as_str(), "3m");
/// assert_eq!("past week".parse::<Timeframe>().unwrap().as_str(), "1w");
/// assert_eq!("all time".parse::<Timeframe>().unwrap(), Timeframe::ALL_TIME);
/// assert!("2 weeks".parse::<Timeframe>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Timeframe(&'static str);

impl Timeframe {
  /// Every mention ever recorded.
  pub const ALL_TIME: Timeframe = Timeframe("at");

  /// The canonical token, one of [`TIMEFRAMES`].
  pub fn as_str(&self) -> &'static str { self.0 }
}

impl fmt::Display for Timeframe {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl FromStr for Timeframe {
  type Err = AltmetricError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let input = s.trim().to_lowercase();
    let token = if input == "all time" {
      Timeframe::ALL_TIME.0.to_string()
    } else if let Some(captures) = SHORTHAND.captures(&input) {
      let count = captures.get(1).map_or("1", |m| m.as_str());
      format!("{count}{}", &captures[2][..1])
    } else {
      input
    };

    TIMEFRAMES
      .iter()
      .copied()
      .find(|canonical| *canonical == token)
      .map(Timeframe)
      .ok_or_else(|| AltmetricError::InvalidInput(format!("Invalid timeframe entered: {s:?}")))
  }
}

/// Parameters for [`AltmetricClient::search_by_timeframe`].
///
/// Filters left unset are not sent. List filters are sent comma-separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationQuery {
  /// Window to search
  timeframe:  Timeframe,
  /// First page to request, starting at 1
  page:       u32,
  /// Results per page, sent as `num_results`
  page_size:  u32,
  /// Only articles whose DOI starts with this
  doi_prefix: Option<String>,
  /// Only articles from these journals, by NLM id
  nlmid:      Vec<String>,
  /// Only articles tagged with these NLM subject ontology terms
  subjects:   Vec<String>,
  /// Only articles mentioned in these channels, e.g. `news`, `blogs`, `reddit`
  cited_in:   Vec<String>,
}

impl CitationQuery {
  /// A query for `timeframe` with default paging (page 1, 100 per page) and no filters.
  ///
  /// # Errors
  ///
  /// Returns [`AltmetricError::InvalidInput`] if `timeframe` is not a recognized window.
  pub fn new(timeframe: &str) -> Result<Self, AltmetricError> {
    Ok(Self::for_timeframe(timeframe.parse()?))
  }

  /// Same as [`CitationQuery::new`] for an already parsed [`Timeframe`].
  pub fn for_timeframe(timeframe: Timeframe) -> Self {
    Self {
      timeframe,
      page: 1,
      page_size: MAX_PAGE_SIZE,
      doi_prefix: None,
      nlmid: Vec::new(),
      subjects: Vec::new(),
      cited_in: Vec::new(),
    }
  }

  /// Starts from `page` instead of the first page.
  pub fn with_page(mut self, page: u32) -> Self {
    self.page = page;
    self
  }

  /// Requests `page_size` results per page, at most [`MAX_PAGE_SIZE`].
  pub fn with_page_size(mut self, page_size: u32) -> Self {
    self.page_size = page_size;
    self
  }

  /// Restricts results to DOIs beginning with `prefix`, e.g. `10.1038`.
  pub fn with_doi_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.doi_prefix = Some(prefix.into());
    self
  }

  /// Restricts results to journals with these NLM ids.
  pub fn with_nlmid<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
    self.nlmid = ids.into_iter().map(Into::into).collect();
    self
  }

  /// Restricts results to these slugified NLM subject terms.
  pub fn with_subjects<S: Into<String>>(mut self, subjects: impl IntoIterator<Item = S>) -> Self {
    self.subjects = subjects.into_iter().map(Into::into).collect();
    self
  }

  /// Restricts results to articles mentioned in these channels.
  pub fn with_cited_in<S: Into<String>>(mut self, channels: impl IntoIterator<Item = S>) -> Self {
    self.cited_in = channels.into_iter().map(Into::into).collect();
    self
  }

  /// The window being searched.
  pub fn timeframe(&self) -> Timeframe { self.timeframe }

  /// Checks paging bounds.
  pub fn validate(&self) -> Result<(), AltmetricError> {
    if self.page == 0 {
      return Err(AltmetricError::InvalidInput("Pages are numbered from 1".into()));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
      return Err(AltmetricError::InvalidInput(format!(
        "Page size must be between 1 and {MAX_PAGE_SIZE}, got {}",
        self.page_size
      )));
    }
    Ok(())
  }

  /// Query parameters for one page request.
  fn params(&self, page: u32) -> Vec<(&'static str, String)> {
    let mut params = vec![("page", page.to_string()), ("num_results", self.page_size.to_string())];
    if let Some(prefix) = self.doi_prefix.as_ref().filter(|p| !p.is_empty()) {
      params.push(("doi_prefix", prefix.clone()));
    }
    for (name, values) in
      [("nlmid", &self.nlmid), ("subjects", &self.subjects), ("cited_in", &self.cited_in)]
    {
      if !values.is_empty() {
        params.push((name, values.join(",")));
      }
    }
    params
  }
}

/// Paging state behind the stream returned by [`AltmetricClient::search_by_timeframe`].
struct Pages<'a> {
  /// Client issuing the requests
  client:    &'a AltmetricClient,
  /// What is being searched for
  query:     CitationQuery,
  /// Next page to request
  page:      u32,
  /// Results from the last page not yet handed out
  buffered:  VecDeque<Value>,
  /// Set once a page comes back empty, a request fails, or page numbers run out
  exhausted: bool,
}

impl Pages<'_> {
  /// Requests the next page into `buffered`, or marks the search exhausted if the page
  /// has no results.
  async fn fetch_next(&mut self) -> Result<(), AltmetricError> {
    let page = self.page;
    let params = self.query.params(page);
    let url = self.client.endpoint("citations", self.query.timeframe.as_str(), &params)?;
    let payload = self.client.get_json(url).await?;
    match page.checked_add(1) {
      Some(next) => self.page = next,
      // nothing can follow the last representable page
      None => self.exhausted = true,
    }

    let results = match payload {
      None | Some(Value::Null) => Vec::new(),
      Some(Value::Array(body)) if body.is_empty() => Vec::new(),
      Some(Value::Object(mut body)) => match body.remove("results") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(results)) => results,
        Some(other) =>
          return Err(AltmetricError::MalformedPayload(format!(
            "\"results\" should be a list, found {other}"
          ))),
      },
      Some(other) =>
        return Err(AltmetricError::MalformedPayload(format!(
          "expected a page object, found {other}"
        ))),
    };

    debug!("Page {page} of {} citations held {} results", self.query.timeframe, results.len());
    if results.is_empty() {
      self.exhausted = true;
    } else {
      self.buffered.extend(results);
    }
    Ok(())
  }
}

impl AltmetricClient {
  /// Lists every article mentioned within the query's timeframe.
  ///
  /// The returned stream requests one page at a time, starting from the query's page,
  /// and only asks for the next page once every result of the current one has been
  /// yielded. It ends at the first page with no results. Dropping the stream early
  /// issues no further requests.
  ///
  /// Each result is built into an [`Article`] as it is yielded; a result that fails to
  /// build, or a failed page request, is yielded as an `Err`. A failed page request
  /// also ends the stream.
  ///
  /// # Errors
  ///
  /// Returns [`AltmetricError::InvalidInput`] up front, before any request, if the page
  /// or page size is out of range.
  pub fn search_by_timeframe(
    &self,
    query: CitationQuery,
  ) -> Result<BoxStream<'_, Result<Article, AltmetricError>>, AltmetricError> {
    query.validate()?;
    debug!("Searching {} citations from page {}", query.timeframe, query.page);

    let pages =
      Pages { client: self, page: query.page, query, buffered: VecDeque::new(), exhausted: false };
    Ok(articles(pages).boxed())
  }
}

/// Drains `pages` one result at a time, fetching a new page only when the buffer is empty.
fn articles(pages: Pages<'_>) -> impl Stream<Item = Result<Article, AltmetricError>> + Send + '_ {
  stream::unfold(pages, |mut pages| async move {
    loop {
      if let Some(result) = pages.buffered.pop_front() {
        return Some((Article::from_value(result), pages));
      }
      if pages.exhausted {
        return None;
      }
      if let Err(e) = pages.fetch_next().await {
        pages.exhausted = true;
        return Some((Err(e), pages));
      }
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_canonical_tokens_parse() {
    for token in TIMEFRAMES {
      assert_eq!(token.parse::<Timeframe>().unwrap().as_str(), token);
    }
  }

  #[test]
  fn test_shorthand_normalizes() {
    let cases = [
      ("all time", "at"),
      ("All Time", "at"),
      ("1 day", "1d"),
      ("3 days", "3d"),
      ("6 days", "6d"),
      ("1 week", "1w"),
      ("past week", "1w"),
      ("1 month", "1m"),
      ("3 months", "3m"),
      ("past 6 months", "6m"),
      ("1 year", "1y"),
      ("year", "1y"),
      (" 1D ", "1d"),
    ];
    for (input, expected) in cases {
      assert_eq!(input.parse::<Timeframe>().unwrap().as_str(), expected, "{input:?}");
    }
  }

  #[test]
  fn test_unknown_timeframes_are_rejected() {
    for input in ["d", "", "7d", "2w", "2 weeks", "12 months", "10d", "2y", "forever", "1x"] {
      let parsed = input.parse::<Timeframe>();
      assert!(matches!(parsed, Err(AltmetricError::InvalidInput(_))), "{input:?}");
    }
  }

  #[test]
  fn test_default_query() {
    let query = CitationQuery::new("1d").unwrap();
    assert_eq!(query.timeframe().as_str(), "1d");
    assert!(query.validate().is_ok());
    assert_eq!(query.params(1), vec![
      ("page", "1".to_string()),
      ("num_results", "100".to_string())
    ]);
  }

  #[test]
  fn test_filters_become_params() {
    let query = CitationQuery::for_timeframe(Timeframe::ALL_TIME)
      .with_page_size(25)
      .with_doi_prefix("10.1038")
      .with_nlmid(["0410462", "0372516"])
      .with_subjects(Vec::<String>::new())
      .with_cited_in(["news", "blogs"]);

    assert_eq!(query.params(3), vec![
      ("page", "3".to_string()),
      ("num_results", "25".to_string()),
      ("doi_prefix", "10.1038".to_string()),
      ("nlmid", "0410462,0372516".to_string()),
      ("cited_in", "news,blogs".to_string()),
    ]);
  }

  #[test]
  fn test_paging_bounds() {
    let query = CitationQuery::new("1w").unwrap();
    for bad in [
      query.clone().with_page(0),
      query.clone().with_page_size(0),
      query.clone().with_page_size(101),
    ] {
      assert!(matches!(bad.validate(), Err(AltmetricError::InvalidInput(_))), "{bad:?}");
    }
    assert!(query.with_page(7).with_page_size(100).validate().is_ok());
  }
}
