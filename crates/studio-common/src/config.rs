//! ---
//! studio_section: "01-core-functionality"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Shared configuration and tracing primitives."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;
use url::Url;

use crate::logging::LogFormat;

fn default_request_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_profiles_table() -> String {
    "profiles".to_owned()
}

fn default_invite_function() -> String {
    "invite-user".to_owned()
}

fn default_delete_function() -> String {
    "delete-user".to_owned()
}

fn default_login_redirect() -> String {
    "/login.html".to_owned()
}

fn default_member_redirect() -> String {
    "/member-dashboard.html".to_owned()
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

/// Primary configuration object for the console.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    #[serde(default)]
    pub functions: FunctionsConfig,
    #[serde(default)]
    pub redirects: RedirectConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "STUDIO_CONFIG";

    /// Default lookup locations, relative to the working directory.
    pub const CANDIDATES: [&'static str; 2] = ["studio.toml", "configs/studio.toml"];

    /// Load configuration from disk, respecting the `STUDIO_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    /// Parse and validate a specific file.
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.backend.validate()?;
        self.functions.validate()?;
        self.redirects.validate()?;
        self.content.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Hosted backend endpoint and public key.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    #[serde(default = "default_request_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub request_timeout: Duration,
    #[serde(default = "default_profiles_table")]
    pub profiles_table: String,
}

impl BackendConfig {
    /// Parsed base URL. Always ends with a slash so relative joins keep any path prefix.
    pub fn base_url(&self) -> Result<Url> {
        let mut raw = self.url.trim().to_owned();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).with_context(|| format!("invalid backend url {}", self.url))
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "backend url must use http or https, got {}",
                url.scheme()
            ));
        }
        if self.anon_key.trim().is_empty() {
            return Err(anyhow!("backend anon_key cannot be empty"));
        }
        if self.profiles_table.trim().is_empty() {
            return Err(anyhow!("backend profiles_table cannot be empty"));
        }
        Ok(())
    }
}

/// Names of the privileged edge functions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionsConfig {
    #[serde(default = "default_invite_function")]
    pub invite_user: String,
    #[serde(default = "default_delete_function")]
    pub delete_user: String,
}

impl Default for FunctionsConfig {
    fn default() -> Self {
        Self {
            invite_user: default_invite_function(),
            delete_user: default_delete_function(),
        }
    }
}

impl FunctionsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.invite_user.trim().is_empty() || self.delete_user.trim().is_empty() {
            return Err(anyhow!("function names cannot be empty"));
        }
        Ok(())
    }
}

/// Destinations for sessions the console refuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectConfig {
    #[serde(default = "default_login_redirect")]
    pub login: String,
    #[serde(default = "default_member_redirect")]
    pub member_dashboard: String,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            login: default_login_redirect(),
            member_dashboard: default_member_redirect(),
        }
    }
}

impl RedirectConfig {
    pub fn validate(&self) -> Result<()> {
        if self.login.trim().is_empty() || self.member_dashboard.trim().is_empty() {
            return Err(anyhow!("redirect destinations cannot be empty"));
        }
        Ok(())
    }
}

/// Table and storage bucket backing one content section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentTarget {
    pub table: String,
    pub bucket: String,
}

impl ContentTarget {
    fn new(table: &str, bucket: &str) -> Self {
        Self {
            table: table.to_owned(),
            bucket: bucket.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "ContentConfig::default_gallery")]
    pub gallery: ContentTarget,
    #[serde(default = "ContentConfig::default_blog")]
    pub blog: ContentTarget,
    #[serde(default = "ContentConfig::default_members")]
    pub members: ContentTarget,
}

impl ContentConfig {
    fn default_gallery() -> ContentTarget {
        ContentTarget::new("galleryImages", "gallery-images")
    }

    fn default_blog() -> ContentTarget {
        ContentTarget::new("blogPosts", "blog-images")
    }

    fn default_members() -> ContentTarget {
        ContentTarget::new("members", "member-images")
    }

    pub fn validate(&self) -> Result<()> {
        for (name, target) in [
            ("gallery", &self.gallery),
            ("blog", &self.blog),
            ("members", &self.members),
        ] {
            if target.table.trim().is_empty() || target.bucket.trim().is_empty() {
                return Err(anyhow!(
                    "content section '{}' must name a table and a bucket",
                    name
                ));
            }
        }
        Ok(())
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            gallery: Self::default_gallery(),
            blog: Self::default_blog(),
            members: Self::default_members(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

/// Optional hash-chained audit trail of confirmed mutations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuditConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}
