// ranmix/src/generation/filename.rs

use crate::error::{RanmixError, RanmixResult};
use chrono::NaiveDate;
use url::Url;

pub const BRAND: &str = "RAN_MIXOLOGY";

/// `RAN_MIXOLOGY_<title>_<YYYY-MM-DD>.mp3`, keeping only ASCII letters and digits from the
/// title and joining words with `_`. Pure in `title` and `date`.
pub fn generate_download_filename(title: &str, date: NaiveDate) -> String {
  let kept: String = title
    .chars()
    .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
    .collect();
  let words: Vec<&str> = kept.split_whitespace().collect();
  let clean = if words.is_empty() { "track".to_string() } else { words.join("_") };
  format!("{}_{}_{}.mp3", BRAND, clean, date.format("%Y-%m-%d"))
}

/// `url` with `brand` and `filename` query parameters appended.
pub fn branded_download_url(url: &str, title: &str, date: NaiveDate) -> RanmixResult<String> {
  let mut parsed =
    Url::parse(url).map_err(|e| RanmixError::Validation(format!("invalid result url '{}': {}", url, e)))?;
  parsed
    .query_pairs_mut()
    .append_pair("brand", BRAND)
    .append_pair("filename", &generate_download_filename(title, date));
  Ok(parsed.into())
}
