// ranmix/src/generation/model.rs

use crate::error::{RanmixError, RanmixResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_STYLE: &str = "auto";
pub const DEFAULT_DURATION_SECS: u32 = 30;
pub const DEFAULT_MODEL: &str = "suno-v3.5";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
  Pending,
  Processing,
  #[serde(alias = "succeeded")]
  Completed,
  Failed,
}

impl JobStatus {
  /// Completed and failed jobs are never polled again.
  pub fn is_terminal(&self) -> bool {
    matches!(self, JobStatus::Completed | JobStatus::Failed)
  }
}

/// A provider-side generation job as last observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationJob {
  pub id: String,
  pub status: JobStatus,
  pub prompt: String,
  pub style: Option<String>,
  pub duration_seconds: Option<u32>,
  pub instrumental: bool,
  pub result_url: Option<String>,
  pub video_url: Option<String>,
  pub title: Option<String>,
  pub tags: Vec<String>,
  /// Provider-supplied reason when `status` is `Failed`.
  pub error: Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
  pub prompt: String,
  pub style: Option<String>,
  pub duration_seconds: Option<u32>,
  pub instrumental: bool,
  /// Drink the track should be inspired by.
  pub drink_name: Option<String>,
  pub mood: Option<String>,
}

impl GenerationRequest {
  pub fn new(prompt: impl Into<String>) -> Self {
    Self {
      prompt: prompt.into(),
      ..Self::default()
    }
  }

  pub fn style(mut self, style: impl Into<String>) -> Self {
    self.style = Some(style.into());
    self
  }

  pub fn duration_seconds(mut self, secs: u32) -> Self {
    self.duration_seconds = Some(secs);
    self
  }

  pub fn instrumental(mut self, instrumental: bool) -> Self {
    self.instrumental = instrumental;
    self
  }

  pub fn inspired_by(mut self, drink_name: impl Into<String>, mood: impl Into<String>) -> Self {
    self.drink_name = Some(drink_name.into());
    self.mood = Some(mood.into());
    self
  }

  /// Whitespace-only prompts are refused before any provider call.
  pub fn validate(&self) -> RanmixResult<()> {
    if self.prompt.trim().is_empty() {
      return Err(RanmixError::Validation("generation prompt must not be empty".into()));
    }
    Ok(())
  }

  /// The prompt sent on the wire, prefixed with drink and mood context when present.
  pub fn effective_prompt(&self) -> String {
    let prompt = self.prompt.trim();
    let mut parts = Vec::new();
    if let Some(drink) = self.drink_name.as_deref().filter(|d| !d.trim().is_empty()) {
      parts.push(format!("Create instrumental music inspired by {}.", drink.trim()));
    }
    if let Some(mood) = self.mood.as_deref().filter(|m| !m.trim().is_empty()) {
      parts.push(format!("The mood should be {}.", mood.trim()));
    }
    if parts.is_empty() {
      return prompt.to_string();
    }
    parts.push(prompt.to_string());
    parts.join(" ")
  }

  pub fn effective_style(&self) -> &str {
    self.style.as_deref().unwrap_or(DEFAULT_STYLE)
  }

  pub fn effective_duration(&self) -> u32 {
    self.duration_seconds.unwrap_or(DEFAULT_DURATION_SECS)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn drink_and_mood_prefix_the_prompt() {
    let req = GenerationRequest::new("soft saxophone").inspired_by("Lychee Mojito", "relaxed");
    assert_eq!(
      req.effective_prompt(),
      "Create instrumental music inspired by Lychee Mojito. The mood should be relaxed. soft saxophone"
    );
    assert_eq!(GenerationRequest::new(" jazz piano ").effective_prompt(), "jazz piano");
  }

  #[test]
  fn blank_prompts_are_invalid() {
    assert!(GenerationRequest::new("   \n").validate().is_err());
    assert!(GenerationRequest::new("jazz piano").validate().is_ok());
  }

  #[test]
  fn provider_success_alias_maps_to_completed() {
    let status: JobStatus = serde_json::from_str("\"succeeded\"").unwrap();
    assert_eq!(status, JobStatus::Completed);
    assert!(status.is_terminal());
  }
}
