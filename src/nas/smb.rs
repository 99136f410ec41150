//! SMB NAS transport driven by the smbclient CLI.
//!
//! Each operation shells out to `smbclient` against the configured share.
//! Connection-class failures (unreachable host, session setup errors) are
//! classified as transient so the shared retry policy re-attempts them;
//! missing paths are an ordinary not-found outcome.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};

use super::{NasEntry, NasTransport};
use crate::config::Config;
use crate::error::{AppError, Result};

/// NT status substrings meaning "the path does not exist"
const NOT_FOUND_MARKERS: &[&str] = &[
    "NT_STATUS_OBJECT_NAME_NOT_FOUND",
    "NT_STATUS_OBJECT_PATH_NOT_FOUND",
    "NT_STATUS_NO_SUCH_FILE",
];

/// NT status substrings meaning the session or connection failed
const TRANSIENT_MARKERS: &[&str] = &[
    "NT_STATUS_IO_TIMEOUT",
    "NT_STATUS_CONNECTION_REFUSED",
    "NT_STATUS_CONNECTION_RESET",
    "NT_STATUS_HOST_UNREACHABLE",
    "NT_STATUS_NETWORK_UNREACHABLE",
    "NT_STATUS_UNSUCCESSFUL",
    "Connection to",
];

/// smbclient-backed NAS transport
pub struct SmbCliTransport {
    host: String,
    share: String,
    username: String,
    password: String,
}

impl SmbCliTransport {
    /// Build the transport from application configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let host = config
            .smb_host
            .clone()
            .ok_or_else(|| AppError::Config("SMB_HOST not set".into()))?;
        let share = config
            .smb_share
            .clone()
            .ok_or_else(|| AppError::Config("SMB_SHARE not set".into()))?;
        let username = config
            .smb_username
            .clone()
            .ok_or_else(|| AppError::Config("SMB_USERNAME not set".into()))?;
        let password = config
            .smb_password
            .clone()
            .ok_or_else(|| AppError::Config("SMB_PASSWORD not set".into()))?;

        Ok(Self {
            host,
            share,
            username,
            password,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn share(&self) -> &str {
        &self.share
    }

    /// One-shot session probe run at startup
    pub async fn probe(&self) -> Result<()> {
        self.run_command("exit").await.map(|_| ())
    }

    /// Run one smbclient command against the share
    async fn run_command(&self, command: &str) -> Result<String> {
        let service = format!("//{}/{}", self.host, self.share);
        let auth = format!("{}%{}", self.username, self.password);

        let output = tokio::process::Command::new("smbclient")
            .arg(&service)
            .arg("-U")
            .arg(&auth)
            .arg("-c")
            .arg(command)
            // The caller's timeout may drop this future mid-flight; the
            // child must not outlive it.
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AppError::Transient(format!("Failed to execute smbclient: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let combined = format!("{}\n{}", stdout, stderr);

        if output.status.success() {
            return Ok(stdout);
        }

        if TRANSIENT_MARKERS.iter().any(|m| combined.contains(m)) {
            return Err(AppError::Transient(format!(
                "smbclient session failure: {}",
                stderr.trim()
            )));
        }

        // Path-level failures are reported through the NT status in output
        Ok(combined)
    }

    /// Convert a share path to smbclient's backslash form
    fn to_share_path(path: &str) -> String {
        path.trim_start_matches('/').replace('/', "\\")
    }
}

#[async_trait]
impl NasTransport for SmbCliTransport {
    async fn dir_exists(&self, path: &str) -> Result<bool> {
        let share_path = Self::to_share_path(path);
        let output = self.run_command(&format!("cd \"{}\"", share_path)).await?;

        if NOT_FOUND_MARKERS.iter().any(|m| output.contains(m)) {
            return Ok(false);
        }
        if output.contains("NT_STATUS") {
            return Err(AppError::Transient(format!(
                "smbclient cd failed for {}: {}",
                path,
                output.trim()
            )));
        }
        Ok(true)
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<NasEntry>> {
        let share_path = Self::to_share_path(path);
        let output = self
            .run_command(&format!("cd \"{}\"; ls", share_path))
            .await?;

        if NOT_FOUND_MARKERS.iter().any(|m| output.contains(m)) {
            return Err(AppError::NotFound(format!("Directory not found: {}", path)));
        }
        if output.contains("NT_STATUS") {
            return Err(AppError::Transient(format!(
                "smbclient ls failed for {}: {}",
                path,
                output.trim()
            )));
        }

        Ok(parse_listing(&output))
    }
}

/// Parse smbclient `ls` output into entries, skipping directories.
///
/// Lines look like:
/// `  V3.0.0_250310_0843.tar.gz      A  5242880  Mon Mar 10 18:02:11 2025`
fn parse_listing(output: &str) -> Vec<NasEntry> {
    let mut entries = Vec::new();

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("blocks of size") {
            continue;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        // name, attrs, size, then a 5-token ctime
        if tokens.len() < 8 {
            continue;
        }

        let name = tokens[0];
        let attrs = tokens[1];
        if name == "." || name == ".." || attrs.contains('D') {
            continue;
        }

        let Ok(size) = tokens[2].parse::<u64>() else {
            continue;
        };

        let modified = parse_smb_time(&tokens[3..8].join(" "));

        entries.push(NasEntry {
            name: name.to_string(),
            size,
            modified,
        });
    }

    entries
}

/// Parse smbclient's ctime format, e.g. "Mon Mar 10 18:02:11 2025"
fn parse_smb_time(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%a %b %e %H:%M:%S %Y")
        .ok()
        .map(|dt| dt.and_utc())
}
