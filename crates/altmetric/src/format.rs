//! Formatting utilities that turn Altmetric's terse field encodings into readable form.
//!
//! The API abbreviates several things that are awkward to consume directly:
//! score history windows are keyed by codes like `"3m"` and `"at"`, the score context
//! groups use internal names like `similar_age_3m`, publisher subjects arrive as
//! tagged objects, and timestamps are UNIX epoch seconds. Each function here
//! handles one of those conversions.
//!
//! # Examples
//!
//! ```
//! use altmetric::format;
//!
//! assert_eq!(format::history_label("at").unwrap(), "all time");
//! assert_eq!(format::history_label("1y").unwrap(), "past year");
//! assert_eq!(format::history_label("3m").unwrap(), "past 3 months");
//!
//! assert_eq!(format::context_label("similar_age_3m"), Some("context age"));
//! ```

use lazy_static::lazy_static;
use regex::Regex;

use super::*;

/// Key the API uses for the all-time score window.
pub const ALL_TIME_KEY: &str = "at";

/// Score context groups, as `(api key, readable label)`.
pub const CONTEXT_LABELS: [(&str, &str); 4] = [
  ("all", "all"),
  ("journal", "journal"),
  ("similar_age_3m", "context age"),
  ("similar_age_journal_3m", "journal age"),
];

lazy_static! {
  /// A count followed by a single unit letter, e.g. `3m`
  static ref WINDOW: Regex = Regex::new(r"^(\d+)([a-z])$").unwrap();
}

/// Expands a unit letter to its singular name.
pub fn unit_name(unit: char) -> Option<&'static str> {
  match unit {
    'd' => Some("day"),
    'w' => Some("week"),
    'm' => Some("month"),
    'y' => Some("year"),
    _ => None,
  }
}

/// Converts a score history key into a readable label.
///
/// - `"at"` becomes `"all time"`
/// - a count of one drops the number: `"1w"` becomes `"past week"`
/// - anything else is pluralized: `"6d"` becomes `"past 6 days"`
///
/// # Errors
///
/// Returns [`AltmetricError::MalformedPayload`] for keys that are not a count and a
/// unit, or whose unit is not one of `d`, `w`, `m`, `y`.
pub fn history_label(key: &str) -> Result<String, AltmetricError> {
  if key == ALL_TIME_KEY {
    return Ok("all time".to_string());
  }

  let captures = WINDOW.captures(key).ok_or_else(|| {
    AltmetricError::MalformedPayload(format!("unrecognized score history key {key:?}"))
  })?;
  let count = &captures[1];
  let unit = captures[2]
    .chars()
    .next()
    .and_then(unit_name)
    .ok_or_else(|| {
      AltmetricError::MalformedPayload(format!("unknown unit in score history key {key:?}"))
    })?;

  if count == "1" {
    Ok(format!("past {unit}"))
  } else {
    Ok(format!("past {count} {unit}s"))
  }
}

/// Relabels a score history object and coerces each score to a number.
pub fn format_score_history(
  history: &Map<String, Value>,
) -> Result<BTreeMap<String, f64>, AltmetricError> {
  history
    .iter()
    .map(|(key, value)| -> Result<(String, f64), AltmetricError> {
      let score = value.as_f64().ok_or_else(|| {
        AltmetricError::MalformedPayload(format!("score history {key:?} is not a number: {value}"))
      })?;
      Ok((history_label(key)?, score))
    })
    .collect()
}

/// The readable label for a score context group, if the key is one the API documents.
pub fn context_label(key: &str) -> Option<&'static str> {
  CONTEXT_LABELS.iter().find(|(api, _)| *api == key).map(|(_, label)| *label)
}

/// Flattens `[{"name": "..."}, ...]` into the list of names, keeping order.
///
/// # Errors
///
/// Returns [`AltmetricError::MalformedPayload`] for an entry without a string `name`.
pub fn format_publisher_subjects(subjects: &[Value]) -> Result<Vec<String>, AltmetricError> {
  subjects
    .iter()
    .map(|subject| {
      subject.get("name").and_then(Value::as_str).map(str::to_string).ok_or_else(|| {
        AltmetricError::MalformedPayload(format!("publisher subject has no name: {subject}"))
      })
    })
    .collect()
}

/// Converts UNIX epoch seconds to a UTC timestamp.
pub fn epoch_to_datetime(seconds: i64) -> Option<DateTime<Utc>> {
  Utc.timestamp_opt(seconds, 0).single()
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn test_history_label() {
    assert_eq!(history_label("at").unwrap(), "all time");
    assert_eq!(history_label("1d").unwrap(), "past day");
    assert_eq!(history_label("2d").unwrap(), "past 2 days");
    assert_eq!(history_label("6d").unwrap(), "past 6 days");
    assert_eq!(history_label("1w").unwrap(), "past week");
    assert_eq!(history_label("1m").unwrap(), "past month");
    assert_eq!(history_label("3m").unwrap(), "past 3 months");
    assert_eq!(history_label("6m").unwrap(), "past 6 months");
    assert_eq!(history_label("1y").unwrap(), "past year");
  }

  #[test]
  fn test_history_label_rejects_unknown_units() {
    for key in ["1x", "3q", "", "y1", "all", "1", "1dd"] {
      assert!(matches!(history_label(key), Err(AltmetricError::MalformedPayload(_))), "{key:?}");
    }
  }

  #[test]
  fn test_history_labels_never_collide() {
    let mut keys = vec![ALL_TIME_KEY.to_string()];
    for count in 0..=9 {
      for unit in ['d', 'w', 'm', 'y'] {
        keys.push(format!("{count}{unit}"));
      }
    }
    let labels: std::collections::BTreeSet<String> =
      keys.iter().map(|key| history_label(key).unwrap()).collect();
    assert_eq!(labels.len(), keys.len());
  }

  #[test]
  fn test_format_score_history() {
    let history = json!({
      "at": 164.966, "1d": 0, "2d": 0, "3d": 0, "4d": 0, "5d": 0, "6d": 0,
      "1w": 0, "1m": 0, "3m": 0, "6m": 0, "1y": 0.25
    });
    let formatted = format_score_history(history.as_object().unwrap()).unwrap();
    assert_eq!(formatted.len(), 12);
    assert_eq!(formatted["all time"], 164.966);
    assert_eq!(formatted["past 3 days"], 0.0);
    assert_eq!(formatted["past year"], 0.25);
    assert!(format_score_history(&Map::new()).unwrap().is_empty());
  }

  #[test]
  fn test_format_score_history_rejects_non_numbers() {
    let history = json!({ "at": "lots" });
    assert!(matches!(
      format_score_history(history.as_object().unwrap()),
      Err(AltmetricError::MalformedPayload(_))
    ));
  }

  #[test]
  fn test_context_label() {
    assert_eq!(context_label("all"), Some("all"));
    assert_eq!(context_label("journal"), Some("journal"));
    assert_eq!(context_label("similar_age_3m"), Some("context age"));
    assert_eq!(context_label("similar_age_journal_3m"), Some("journal age"));
    assert_eq!(context_label("similar_age_1y"), None);
  }

  #[test]
  fn test_format_publisher_subjects() {
    let subjects = json!([
      { "name": "Public Health And Health Services", "scheme": "era" },
      { "name": "Epidemiology", "scheme": "era" }
    ]);
    assert_eq!(format_publisher_subjects(subjects.as_array().unwrap()).unwrap(), vec![
      "Public Health And Health Services",
      "Epidemiology"
    ]);
    assert!(format_publisher_subjects(&[]).unwrap().is_empty());
  }

  #[test]
  fn test_nameless_publisher_subject_is_malformed() {
    for subjects in [
      json!([{ "name": "Epidemiology" }, { "scheme": "era" }]),
      json!([{ "name": 7 }]),
      json!(["Epidemiology"]),
    ] {
      assert!(
        matches!(
          format_publisher_subjects(subjects.as_array().unwrap()),
          Err(AltmetricError::MalformedPayload(_))
        ),
        "{subjects}"
      );
    }
  }

  #[test]
  fn test_epoch_to_datetime() {
    assert_eq!(epoch_to_datetime(0).unwrap().to_rfc3339(), "1970-01-01T00:00:00+00:00");
    assert_eq!(epoch_to_datetime(1_388_534_400).unwrap().to_rfc3339(), "2014-01-01T00:00:00+00:00");
  }
}
