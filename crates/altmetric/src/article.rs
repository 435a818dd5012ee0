//! Normalized attention metrics for a single article.
//!
//! An [`Article`] is built once from the JSON object the Altmetric API returns and is
//! never modified afterwards. Construction copies every documented field into a typed
//! value, relabels the score history and score context, flattens the publisher
//! subjects, and converts epoch timestamps into [`DateTime<Utc>`]. Fields the payload
//! omits take a default: `None` for optional values, `0` for mention counts, and an
//! empty collection for lists and maps. The original payload is kept alongside, see
//! [`Article::raw_dictionary`].
//!
//! # Examples
//!
//! ```
//! use altmetric::Article;
//! use serde_json::json;
//!
//! let article = Article::from_value(json!({
//!   "title": "T",
//!   "doi": "10.1/x",
//!   "history": { "at": 5, "1y": 2 }
//! }))
//! .unwrap();
//!
//! assert_eq!(article.title(), Some("T"));
//! assert_eq!(article.score_history()["all time"], 5.0);
//! assert_eq!(article.score_history()["past year"], 2.0);
//! assert_eq!(article.mentions().tweeters, 0);
//! assert!(article.issns().is_empty());
//! ```

use std::{
  io::Read,
  path::Path,
  str::FromStr,
};

use super::*;

/// How an article's score compares against one peer group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextStats {
  /// Number of articles in the group
  pub count:       u64,
  /// Mean score across the group
  pub mean:        f64,
  /// This article's rank within the group
  pub rank:        u64,
  /// Percentile this article falls in
  pub percentile:  f64,
  /// Number of articles in the group this one scored higher than
  pub higher_than: u64,
}

impl ContextStats {
  /// Reads one `context` entry. Missing members default to zero; present members
  /// must be numbers, and the counting members whole non-negative numbers.
  fn from_group(key: &str, group: &Map<String, Value>) -> Result<Self, AltmetricError> {
    let number = |name: &str| -> Result<f64, AltmetricError> {
      match group.get(name) {
        None | Some(Value::Null) => Ok(0.0),
        Some(value) => value.as_f64().ok_or_else(|| {
          AltmetricError::MalformedPayload(format!(
            "context {key:?} has non-numeric {name:?}: {value}"
          ))
        }),
      }
    };
    let whole = |name: &str| -> Result<u64, AltmetricError> {
      match group.get(name) {
        None | Some(Value::Null) => Ok(0),
        Some(value) => as_count(value).filter(|_| !value.is_string()).ok_or_else(|| {
          AltmetricError::MalformedPayload(format!(
            "context {key:?} has {name:?} that is not a whole count: {value}"
          ))
        }),
      }
    };

    Ok(Self {
      count:       whole("count")?,
      mean:        number("mean")?,
      rank:        whole("rank")?,
      percentile:  number("pct")?,
      higher_than: whole("higher_than")?,
    })
  }
}

/// Unique-author mention counts, one per channel Altmetric tracks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MentionCounts {
  /// Posts on public Facebook walls (`cited_by_fbwalls_count`)
  pub facebook_walls:    u64,
  /// Reddit posts (`cited_by_rdts_count`)
  pub reddit:            u64,
  /// Twitter accounts (`cited_by_tweeters_count`)
  pub tweeters:          u64,
  /// Google+ posts (`cited_by_gplus_count`)
  pub google_plus:       u64,
  /// Mainstream science news outlets (`cited_by_msm_count`)
  pub news_outlets:      u64,
  /// Delicious bookmarks (`cited_by_delicious_count`)
  pub delicious:         u64,
  /// Questions, answers or comments on Stack Exchange sites (`cited_by_qs_count`)
  pub questions:         u64,
  /// All posts across channels (`cited_by_posts_count`)
  pub posts:             u64,
  /// All accounts across channels (`cited_by_accounts_count`)
  pub accounts:          u64,
  /// Forum posts (`cited_by_forums_count`)
  pub forums:            u64,
  /// Peer review sites (`cited_by_peer_review_sites_count`)
  pub peer_review_sites: u64,
  /// Blogs and other feeds (`cited_by_feeds_count`)
  pub feeds:             u64,
  /// Video platforms (`cited_by_videos_count`)
  pub videos:            u64,
}

impl MentionCounts {
  /// Reads every counter, treating anything absent or non-numeric as zero.
  fn from_raw(raw: &Map<String, Value>) -> Self {
    let count = |key: &str| count_field(raw, key);
    Self {
      facebook_walls:    count("cited_by_fbwalls_count"),
      reddit:            count("cited_by_rdts_count"),
      tweeters:          count("cited_by_tweeters_count"),
      google_plus:       count("cited_by_gplus_count"),
      news_outlets:      count("cited_by_msm_count"),
      delicious:         count("cited_by_delicious_count"),
      questions:         count("cited_by_qs_count"),
      posts:             count("cited_by_posts_count"),
      // older payloads only carry the un-prefixed name
      accounts:          field(raw, "cited_by_accounts_count")
        .or_else(|| field(raw, "by_accounts_count"))
        .and_then(as_count)
        .unwrap_or(0),
      forums:            count("cited_by_forums_count"),
      peer_review_sites: count("cited_by_peer_review_sites_count"),
      feeds:             count("cited_by_feeds_count"),
      videos:            count("cited_by_videos_count"),
    }
  }
}

/// A normalized, read-only snapshot of one article's attention metrics.
///
/// Build one from a successful lookup through [`AltmetricClient`], or offline from a
/// saved response with [`Article::from_json_file`], [`Article::from_reader`], or
/// [`str::parse`]. To get fresher numbers, fetch again and build a new `Article`.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = altmetric::AltmetricClient::new()?;
/// if let Some(article) = client.fetch_by_arxiv_id("1108.2455").await? {
///   println!("{:?} scored {:?}", article.title(), article.score());
///   for (window, score) in article.score_history() {
///     println!("  {window}: {score}");
///   }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
  /// Article title
  title:              Option<String>,
  /// Abstract text
  #[serde(rename = "abstract")]
  abstract_text:      Option<String>,
  /// Where the abstract came from
  abstract_source:    Option<String>,
  /// Journal name
  journal:            Option<String>,
  /// Raw subject tags
  subjects:           Vec<String>,
  /// Scopus taxonomy subjects
  scopus_subjects:    Vec<String>,
  /// Publisher taxonomy subjects, flattened to names
  publisher_subjects: Vec<String>,
  /// Short phrases describing the article (`tq`)
  taglines:           Vec<String>,
  /// Canonical article URL
  url:                Option<String>,
  /// Open-access flag (`is_oa`)
  is_open_access:     bool,
  /// When Altmetric started tracking the article
  added_on:           Option<DateTime<Utc>>,
  /// Publication date
  published_on:       Option<DateTime<Utc>>,

  /// Digital Object Identifier
  doi:                Option<String>,
  /// NLM journal identifier
  nlmid:              Option<String>,
  /// PubMed ID
  pmid:               Option<String>,
  /// Altmetric's internal ID
  altmetric_id:       Option<String>,
  /// arXiv ID
  arxiv_id:           Option<String>,
  /// ADS bibcode
  ads_id:             Option<String>,
  /// Journal ISSNs
  issns:              Vec<String>,

  /// Attention score
  score:              Option<f64>,
  /// Score accumulated per time window, keyed by readable label
  score_history:      BTreeMap<String, f64>,
  /// Score compared against peer groups, keyed by readable label
  score_context:      BTreeMap<String, ContextStats>,
  /// When the metrics were last recomputed
  last_updated:       Option<DateTime<Utc>>,
  /// Payload schema tag
  schema:             Option<String>,

  /// Mention counts per channel
  mentions:           MentionCounts,
  /// Mentioning accounts by cohort (`pub`, `doc`, `sci`, `com`)
  cohorts:            BTreeMap<String, u64>,
  /// Total reader count across reference managers
  readers_count:      u64,
  /// Reader count per reference manager
  readers:            BTreeMap<String, u64>,

  /// Altmetric details page
  details_url:        Option<String>,
  /// Score badge image URL per size
  images:             BTreeMap<String, String>,

  /// The payload exactly as received
  raw:                Map<String, Value>,
}

impl Article {
  /// Builds an article from any JSON value.
  ///
  /// # Errors
  ///
  /// - [`AltmetricError::EmptyPayload`] for `null` or `{}`
  /// - [`AltmetricError::MalformedPayload`] for non-objects, a score history with an unknown
  ///   window key, a score context entry that is not an object or carries a fractional or
  ///   negative count, or a publisher subject without a name
  pub fn from_value(value: Value) -> Result<Self, AltmetricError> {
    match value {
      Value::Object(raw) => Self::from_map(raw),
      Value::Null => Err(AltmetricError::EmptyPayload),
      other =>
        Err(AltmetricError::MalformedPayload(format!("expected a JSON object, found {other}"))),
    }
  }

  /// Builds an article from a JSON object. See [`Article::from_value`] for errors.
  pub fn from_map(raw: Map<String, Value>) -> Result<Self, AltmetricError> {
    if raw.is_empty() {
      return Err(AltmetricError::EmptyPayload);
    }

    let score_history = match object_field(&raw, "history")? {
      Some(history) => format::format_score_history(history)?,
      None => BTreeMap::new(),
    };
    let score_context = score_context(&raw)?;
    let publisher_subjects = match field(&raw, "publisher_subjects").and_then(Value::as_array) {
      Some(subjects) => format::format_publisher_subjects(subjects)?,
      None => Vec::new(),
    };

    let article = Self {
      title: string_field(&raw, "title"),
      abstract_text: string_field(&raw, "abstract"),
      abstract_source: string_field(&raw, "abstract_source"),
      journal: string_field(&raw, "journal"),
      subjects: string_list(&raw, "subjects"),
      scopus_subjects: string_list(&raw, "scopus_subjects"),
      publisher_subjects,
      taglines: string_list(&raw, "tq"),
      url: string_field(&raw, "url"),
      is_open_access: field(&raw, "is_oa").and_then(Value::as_bool).unwrap_or(false),
      added_on: timestamp_field(&raw, "added_on"),
      published_on: timestamp_field(&raw, "published_on"),

      doi: string_field(&raw, "doi"),
      nlmid: string_field(&raw, "nlmid"),
      pmid: string_field(&raw, "pmid"),
      altmetric_id: string_field(&raw, "altmetric_id"),
      arxiv_id: string_field(&raw, "arxiv_id"),
      ads_id: string_field(&raw, "ads_id"),
      issns: string_list(&raw, "issns"),

      score: field(&raw, "score").and_then(Value::as_f64),
      score_history,
      score_context,
      last_updated: timestamp_field(&raw, "last_updated"),
      schema: string_field(&raw, "schema"),

      mentions: MentionCounts::from_raw(&raw),
      cohorts: count_map(&raw, "cohorts"),
      readers_count: count_field(&raw, "readers_count"),
      readers: count_map(&raw, "readers"),

      details_url: string_field(&raw, "details_url"),
      images: field(&raw, "images")
        .and_then(Value::as_object)
        .map(|images| {
          images
            .iter()
            .filter_map(|(size, url)| Some((size.clone(), url.as_str()?.to_string())))
            .collect()
        })
        .unwrap_or_default(),

      raw,
    };
    trace!("Built article: {article:?}");
    Ok(article)
  }

  /// Reads a saved API response from `path`.
  ///
  /// # Errors
  ///
  /// Fails with [`AltmetricError::Path`] if the file cannot be read,
  /// [`AltmetricError::JsonParse`] if it is not JSON, and otherwise as
  /// [`Article::from_value`] does.
  pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AltmetricError> {
    debug!("Reading article from: {:?}", path.as_ref());
    let text = tokio::fs::read_to_string(path).await?;
    text.parse()
  }

  /// Reads a saved API response from an open stream.
  pub fn from_reader(reader: impl Read) -> Result<Self, AltmetricError> {
    Self::from_value(serde_json::from_reader(reader)?)
  }

  /// The payload exactly as the API returned it, including fields without a typed
  /// accessor.
  pub fn raw_dictionary(&self) -> &Map<String, Value> { &self.raw }

  /// The first twelve characters of the title, handy in logs.
  pub fn short_title(&self) -> String {
    self.title.as_deref().unwrap_or_default().chars().take(12).collect()
  }

  /// Article title.
  pub fn title(&self) -> Option<&str> { self.title.as_deref() }

  /// The abstract, when Altmetric has one.
  pub fn abstract_text(&self) -> Option<&str> { self.abstract_text.as_deref() }

  /// Where the abstract was sourced from, e.g. `"pubmed"`.
  pub fn abstract_source(&self) -> Option<&str> { self.abstract_source.as_deref() }

  /// Journal the article appeared in.
  pub fn journal(&self) -> Option<&str> { self.journal.as_deref() }

  /// Related subject tags.
  pub fn subjects(&self) -> &[String] { &self.subjects }

  /// Subjects from the Scopus taxonomy.
  pub fn scopus_subjects(&self) -> &[String] { &self.scopus_subjects }

  /// Subjects from the publisher's own taxonomy.
  pub fn publisher_subjects(&self) -> &[String] { &self.publisher_subjects }

  /// Phrases Altmetric associates with the article.
  pub fn taglines(&self) -> &[String] { &self.taglines }

  /// Canonical URL of the article.
  pub fn url(&self) -> Option<&str> { self.url.as_deref() }

  /// `false` unless the payload says otherwise.
  pub fn is_open_access(&self) -> bool { self.is_open_access }

  /// When Altmetric first saw the article.
  pub fn added_on(&self) -> Option<DateTime<Utc>> { self.added_on }

  /// Publication date.
  pub fn published_on(&self) -> Option<DateTime<Utc>> { self.published_on }

  /// DOI.
  pub fn doi(&self) -> Option<&str> { self.doi.as_deref() }

  /// NLM id of the journal.
  pub fn nlmid(&self) -> Option<&str> { self.nlmid.as_deref() }

  /// PubMed ID.
  pub fn pmid(&self) -> Option<&str> { self.pmid.as_deref() }

  /// Altmetric's own identifier. These are subject to change on Altmetric's side.
  pub fn altmetric_id(&self) -> Option<&str> { self.altmetric_id.as_deref() }

  /// arXiv ID.
  pub fn arxiv_id(&self) -> Option<&str> { self.arxiv_id.as_deref() }

  /// ADS bibcode.
  pub fn ads_id(&self) -> Option<&str> { self.ads_id.as_deref() }

  /// ISSNs of the journal.
  pub fn issns(&self) -> &[String] { &self.issns }

  /// The Altmetric attention score.
  pub fn score(&self) -> Option<f64> { self.score }

  /// Score accumulated within each time window, keyed by labels such as
  /// `"past day"`, `"past 3 months"`, and `"all time"`.
  pub fn score_history(&self) -> &BTreeMap<String, f64> { &self.score_history }

  /// How the score compares to other articles: `"all"` tracked articles, the same
  /// `"journal"`, articles of a similar age (`"context age"`), and articles of a similar
  /// age in the same journal (`"journal age"`). Groups the payload omits are absent.
  pub fn score_context(&self) -> &BTreeMap<String, ContextStats> { &self.score_context }

  /// When Altmetric last recomputed these numbers.
  pub fn last_updated(&self) -> Option<DateTime<Utc>> { self.last_updated }

  /// Payload schema version.
  pub fn schema(&self) -> Option<&str> { self.schema.as_deref() }

  /// Mention counts per channel; channels the payload omits are zero.
  pub fn mentions(&self) -> &MentionCounts { &self.mentions }

  /// Mentioning accounts that are members of the public (`pub`), practitioners
  /// (`doc`), research scientists (`sci`), or science communicators (`com`).
  pub fn cohorts(&self) -> &BTreeMap<String, u64> { &self.cohorts }

  /// Total readers across reference managers.
  pub fn readers_count(&self) -> u64 { self.readers_count }

  /// Readers per reference manager, e.g. `{"mendeley": 11, "citeulike": 0}`.
  pub fn readers(&self) -> &BTreeMap<String, u64> { &self.readers }

  /// Link to the article's page on altmetric.com.
  pub fn details_url(&self) -> Option<&str> { self.details_url.as_deref() }

  /// Score badge images keyed by `"small"`, `"medium"`, and `"large"`.
  pub fn images(&self) -> &BTreeMap<String, String> { &self.images }
}

impl FromStr for Article {
  type Err = AltmetricError;

  fn from_str(s: &str) -> Result<Self, Self::Err> { Self::from_value(serde_json::from_str(s)?) }
}

impl std::fmt::Display for Article {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for (key, value) in &self.raw {
      writeln!(f, "{key}: {value}")?;
    }
    Ok(())
  }
}

/// Looks up `key`, treating JSON `null` the same as a missing key.
fn field<'a>(raw: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
  raw.get(key).filter(|value| !value.is_null())
}

/// Looks up an object-valued field that must be an object when present.
fn object_field<'a>(
  raw: &'a Map<String, Value>,
  key: &str,
) -> Result<Option<&'a Map<String, Value>>, AltmetricError> {
  match field(raw, key) {
    None => Ok(None),
    Some(Value::Object(object)) => Ok(Some(object)),
    Some(other) =>
      Err(AltmetricError::MalformedPayload(format!("{key:?} should be an object, found {other}"))),
  }
}

/// Strings are taken as-is, numbers are rendered (PMIDs and Altmetric IDs often arrive
/// as numbers), everything else is ignored.
fn as_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

/// Non-negative whole numbers, either as JSON numbers or numeric strings.
fn as_count(value: &Value) -> Option<u64> {
  match value {
    Value::Number(n) => n.as_u64().or_else(|| {
      n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)
    }),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

/// A text field, see [`as_text`].
fn string_field(raw: &Map<String, Value>, key: &str) -> Option<String> {
  field(raw, key).and_then(as_text)
}

/// A list of text values; entries that are not text are skipped.
fn string_list(raw: &Map<String, Value>, key: &str) -> Vec<String> {
  field(raw, key)
    .and_then(Value::as_array)
    .map(|items| items.iter().filter_map(as_text).collect())
    .unwrap_or_default()
}

/// A counter, `0` when absent or not a count.
fn count_field(raw: &Map<String, Value>, key: &str) -> u64 {
  field(raw, key).and_then(as_count).unwrap_or(0)
}

/// A map of counters; entries that are not counts are skipped.
fn count_map(raw: &Map<String, Value>, key: &str) -> BTreeMap<String, u64> {
  field(raw, key)
    .and_then(Value::as_object)
    .map(|counts| {
      counts.iter().filter_map(|(name, count)| Some((name.clone(), as_count(count)?))).collect()
    })
    .unwrap_or_default()
}

/// An epoch-seconds field as a UTC timestamp.
fn timestamp_field(raw: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
  field(raw, key).and_then(Value::as_i64).and_then(format::epoch_to_datetime)
}

/// Relabels the `context` groups; unknown groups are dropped.
fn score_context(
  raw: &Map<String, Value>,
) -> Result<BTreeMap<String, ContextStats>, AltmetricError> {
  let Some(context) = object_field(raw, "context")? else {
    return Ok(BTreeMap::new());
  };

  let mut formatted = BTreeMap::new();
  for (key, group) in context {
    let Some(label) = format::context_label(key) else {
      debug!("Ignoring unknown score context group: {key}");
      continue;
    };
    match group {
      Value::Null => continue,
      Value::Object(group) => {
        formatted.insert(label.to_string(), ContextStats::from_group(key, group)?);
      },
      other =>
        return Err(AltmetricError::MalformedPayload(format!(
          "score context {key:?} should be an object, found {other}"
        ))),
    }
  }
  Ok(formatted)
}
