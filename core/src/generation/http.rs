// ranmix/src/generation/http.rs

//! REST generation provider.

use super::model::{GenerationJob, GenerationRequest, JobStatus, DEFAULT_MODEL};
use super::GenerationProvider;
use crate::config::GenerationConfig;
use crate::error::{RanmixError, RanmixResult};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{event, instrument, Level};

const SERVICE: &str = "generation provider";

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
  prompt: &'a str,
  style: &'a str,
  duration: u32,
  instrumental: bool,
  model: &'a str,
  custom_mode: bool,
}

#[derive(Debug, Deserialize)]
struct WireJob {
  id: Option<String>,
  status: Option<JobStatus>,
  audio_url: Option<String>,
  video_url: Option<String>,
  title: Option<String>,
  #[serde(default)]
  tags: Vec<String>,
  duration: Option<u32>,
  #[serde(alias = "message")]
  error: Option<String>,
}

pub struct HttpGenerationProvider {
  http: reqwest::Client,
  base_url: String,
}

impl HttpGenerationProvider {
  pub fn new(config: &GenerationConfig) -> RanmixResult<Self> {
    let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
      .map_err(|e| RanmixError::Config(format!("generation API key is not a valid header: {}", e)))?;
    let key = HeaderValue::from_str(&config.api_key)
      .map_err(|e| RanmixError::Config(format!("generation API key is not a valid header: {}", e)))?;
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, bearer);
    headers.insert("X-API-Key", key);

    let http = reqwest::Client::builder()
      .default_headers(headers)
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(|e| RanmixError::Config(format!("HTTP client error: {}", e)))?;

    Ok(Self {
      http,
      base_url: config.api_base.trim_end_matches('/').to_string(),
    })
  }

  async fn read_job(&self, response: reqwest::Response) -> RanmixResult<WireJob> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
      return Err(RanmixError::NotFound("generation job".into()));
    }
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(RanmixError::transport(SERVICE, format!("{} - {}", status, body)));
    }
    response
      .json::<WireJob>()
      .await
      .map_err(|e| RanmixError::transport(SERVICE, format!("unreadable response: {}", e)))
  }
}

fn into_job(wire: WireJob, fallback_id: Option<&str>, request: Option<&GenerationRequest>) -> RanmixResult<GenerationJob> {
  let id = wire
    .id
    .or_else(|| fallback_id.map(str::to_string))
    .ok_or_else(|| RanmixError::transport(SERVICE, "response carried no job id"))?;
  Ok(GenerationJob {
    id,
    status: wire.status.unwrap_or(JobStatus::Pending),
    prompt: request.map(GenerationRequest::effective_prompt).unwrap_or_default(),
    style: request.map(|r| r.effective_style().to_string()),
    duration_seconds: wire.duration.or_else(|| request.map(GenerationRequest::effective_duration)),
    instrumental: request.is_some_and(|r| r.instrumental),
    result_url: wire.audio_url,
    video_url: wire.video_url,
    title: wire.title,
    tags: wire.tags,
    error: wire.error,
    created_at: Utc::now(),
  })
}

#[async_trait]
impl GenerationProvider for HttpGenerationProvider {
  fn name(&self) -> &'static str {
    "http"
  }

  #[instrument(name = "HttpGenerationProvider::submit", skip_all)]
  async fn submit(&self, request: &GenerationRequest) -> RanmixResult<GenerationJob> {
    let prompt = request.effective_prompt();
    let body = WireRequest {
      prompt: &prompt,
      style: request.effective_style(),
      duration: request.effective_duration(),
      instrumental: request.instrumental,
      model: DEFAULT_MODEL,
      custom_mode: false,
    };
    let response = self
      .http
      .post(format!("{}/generate", self.base_url))
      .json(&body)
      .send()
      .await
      .map_err(|e| RanmixError::transport(SERVICE, e))?;
    let wire = self.read_job(response).await?;
    let mut job = into_job(wire, None, Some(request))?;
    if job.title.is_none() {
      job.title = Some(prompt.chars().take(50).collect());
    }
    event!(Level::DEBUG, job_id = %job.id, "Provider accepted generation request.");
    Ok(job)
  }

  async fn status(&self, job_id: &str) -> RanmixResult<GenerationJob> {
    let response = self
      .http
      .get(format!("{}/status/{}", self.base_url, job_id))
      .send()
      .await
      .map_err(|e| RanmixError::transport(SERVICE, e))?;
    let wire = self.read_job(response).await?;
    into_job(wire, Some(job_id), None)
  }
}
