//! CI build-metadata adapter.
//!
//! Thin, time-bounded client over the CI server's Jenkins-style REST API.
//! Resolves the wall-clock start time of a build (seeds the date-folder
//! guess) and fetches console logs for the legacy scraping fallback.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, Result};

/// Source of CI build timestamps and console logs.
#[async_trait]
pub trait BuildClock: Send + Sync {
    /// Wall-clock time the build started. Any non-2xx response or timeout
    /// is an error; callers treat that as "hint unavailable", not fatal.
    async fn build_timestamp(&self, project: &str, build_number: i32) -> Result<DateTime<Utc>>;

    /// Raw console log of the build, for the legacy scraping fallback.
    async fn console_log(&self, project: &str, build_number: i32) -> Result<String>;
}

/// Build-metadata response; only the start timestamp is needed.
#[derive(Debug, Deserialize)]
struct BuildInfo {
    /// Epoch milliseconds
    timestamp: i64,
}

/// Jenkins REST API client
pub struct JenkinsBuildClock {
    client: Client,
    base_url: String,
    username: Option<String>,
    api_token: Option<String>,
}

impl JenkinsBuildClock {
    /// Create a client from application configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.ci_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.ci_base_url.trim_end_matches('/').to_string(),
            username: config.ci_username.clone(),
            api_token: config.ci_api_token.clone(),
        })
    }

    fn build_url(&self, project: &str, build_number: i32) -> String {
        build_url(&self.base_url, project, build_number)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.get(url);
        if let (Some(user), Some(token)) = (&self.username, &self.api_token) {
            builder = builder.basic_auth(user, Some(token));
        }
        builder
    }

    async fn fetch(&self, url: &str) -> Result<reqwest::Response> {
        let response = self.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("CI returned 404 for {}", url)));
        }
        if !status.is_success() {
            return Err(AppError::Transient(format!(
                "CI API returned {} for {}",
                status, url
            )));
        }
        Ok(response)
    }
}

/// Build the Jenkins build URL. Folder-style project names contain `/`;
/// each segment becomes a `job/` path element.
fn build_url(base_url: &str, project: &str, build_number: i32) -> String {
    let job_path: Vec<String> = project
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| format!("job/{s}"))
        .collect();
    format!("{}/{}/{}", base_url, job_path.join("/"), build_number)
}

#[async_trait]
impl BuildClock for JenkinsBuildClock {
    async fn build_timestamp(&self, project: &str, build_number: i32) -> Result<DateTime<Utc>> {
        let url = format!("{}/api/json", self.build_url(project, build_number));
        let info: BuildInfo = self.fetch(&url).await?.json().await?;

        Utc.timestamp_millis_opt(info.timestamp)
            .single()
            .ok_or_else(|| {
                AppError::Internal(format!("CI returned invalid timestamp {}", info.timestamp))
            })
    }

    async fn console_log(&self, project: &str, build_number: i32) -> Result<String> {
        let url = format!("{}/consoleText", self.build_url(project, build_number));
        Ok(self.fetch(&url).await?.text().await?)
    }
}
