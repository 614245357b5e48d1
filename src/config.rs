use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_REPO_LIMIT: usize = 200;
const DEFAULT_DELAY_MS: u64 = 500;
const DEFAULT_CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Environment variables that override secrets from the config file
pub const ENV_CF_API_TOKEN: &str = "CLOUDFLARE_API_TOKEN";
pub const ENV_CF_ACCOUNT_ID: &str = "CLOUDFLARE_ACCOUNT_ID";

/// Configuration problems detected before any remote call
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("{field} must be an https URL, got '{value}'")]
    InsecureUrl { field: &'static str, value: String },

    #[error("webhook.events must list at least one event")]
    NoEvents,

    #[error("access.policies: precedence {0} is used more than once")]
    DuplicatePrecedence(u32),

    #[error("access.policies: policy '{0}' is listed more than once")]
    DuplicatePolicy(String),

    #[error("access.service_tokens: project '{0}' is listed more than once")]
    DuplicateProject(String),
}

/// Default config file location: ~/.config/fleetconf/config.toml
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("fleetconf").join("config.toml"))
}

/// Expand a leading `~` in a configured path
pub fn expand_path(path: &str) -> PathBuf {
    let expanded = shellexpand::tilde(path);
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Main Config Schema
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default)]
    pub webhook: WebhookSpec,

    #[serde(default)]
    pub cloudflare: CloudflareConfig,

    #[serde(default)]
    pub access: AccessConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Config {
    /// Load config from a TOML file and apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override secrets from the environment
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_CF_API_TOKEN).filter(|v| !v.is_empty()) {
            self.cloudflare.api_token = token;
        }
        if let Some(account) = lookup(ENV_CF_ACCOUNT_ID).filter(|v| !v.is_empty()) {
            self.cloudflare.account_id = account;
        }
    }

    /// Validate settings used by the webhook run
    pub fn validate_webhooks(&self) -> Result<(), ConfigError> {
        if self.github.owner.trim().is_empty() {
            return Err(ConfigError::Missing("github.owner"));
        }
        if self.webhook.url.trim().is_empty() {
            return Err(ConfigError::Missing("webhook.url"));
        }
        require_https("webhook.url", &self.webhook.url)?;
        if self.webhook.events.is_empty() {
            return Err(ConfigError::NoEvents);
        }
        Ok(())
    }

    /// Validate settings used by the access run
    pub fn validate_access(&self) -> Result<(), ConfigError> {
        if self.cloudflare.account_id.trim().is_empty() {
            return Err(ConfigError::Missing("cloudflare.account_id"));
        }
        if self.cloudflare.api_token.trim().is_empty() {
            return Err(ConfigError::Missing("cloudflare.api_token"));
        }
        require_https("cloudflare.api_base", &self.cloudflare.api_base)?;
        if self.access.application.domain.trim().is_empty() {
            return Err(ConfigError::Missing("access.application.domain"));
        }
        if self.access.application.name.trim().is_empty() {
            return Err(ConfigError::Missing("access.application.name"));
        }

        // Policies are matched by name on the application
        let mut names = HashSet::new();
        let mut precedences = HashSet::new();
        for policy in &self.access.policies {
            if !names.insert(policy.name.as_str()) {
                return Err(ConfigError::DuplicatePolicy(policy.name.clone()));
            }
            if !precedences.insert(policy.precedence) {
                return Err(ConfigError::DuplicatePrecedence(policy.precedence));
            }
        }

        let mut projects = HashSet::new();
        for token in &self.access.service_tokens {
            if !projects.insert(token.project.as_str()) {
                return Err(ConfigError::DuplicateProject(token.project.clone()));
            }
        }

        Ok(())
    }
}

fn require_https(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InsecureUrl {
            field,
            value: value.to_string(),
        })
    }
}

// ============================================================================
// GitHub
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// User or organization whose repositories are reconciled
    #[serde(default)]
    pub owner: String,

    /// Single-page listing limit
    #[serde(default = "default_repo_limit")]
    pub repo_limit: usize,

    /// Include forked repositories
    #[serde(default)]
    pub include_forks: bool,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo_limit: DEFAULT_REPO_LIMIT,
            include_forks: false,
        }
    }
}

fn default_repo_limit() -> usize {
    DEFAULT_REPO_LIMIT
}

/// Desired webhook on every repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSpec {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_events")]
    pub events: Vec<String>,

    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Static lines printed after the run
    #[serde(default)]
    pub follow_up: Vec<String>,
}

impl Default for WebhookSpec {
    fn default() -> Self {
        Self {
            url: String::new(),
            events: default_events(),
            content_type: default_content_type(),
            follow_up: Vec::new(),
        }
    }
}

fn default_events() -> Vec<String> {
    ["push", "pull_request", "issues", "release", "create", "delete"]
        .iter()
        .map(|e| (*e).to_string())
        .collect()
}

fn default_content_type() -> String {
    "json".to_string()
}

// ============================================================================
// Cloudflare
// ============================================================================

#[derive(Clone, Serialize, Deserialize)]
pub struct CloudflareConfig {
    #[serde(default)]
    pub account_id: String,

    #[serde(default)]
    pub api_token: String,

    #[serde(default = "default_cf_api_base")]
    pub api_base: String,
}

impl CloudflareConfig {
    /// Account-scoped API base
    pub fn account_base(&self) -> String {
        format!(
            "{}/accounts/{}",
            self.api_base.trim_end_matches('/'),
            self.account_id
        )
    }
}

impl Default for CloudflareConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            api_token: String::new(),
            api_base: default_cf_api_base(),
        }
    }
}

impl std::fmt::Debug for CloudflareConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareConfig")
            .field("account_id", &self.account_id)
            .field("api_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

fn default_cf_api_base() -> String {
    DEFAULT_CF_API_BASE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub application: ApplicationSpec,

    /// Policies in precedence order
    #[serde(default)]
    pub policies: Vec<PolicySpec>,

    #[serde(default)]
    pub service_tokens: Vec<ServiceTokenSpec>,

    /// Where generated token credentials are written
    #[serde(default = "default_tokens_file")]
    pub tokens_file: String,

    /// Static lines printed after the run
    #[serde(default)]
    pub follow_up: Vec<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            application: ApplicationSpec::default(),
            policies: Vec::new(),
            service_tokens: Vec::new(),
            tokens_file: default_tokens_file(),
            follow_up: Vec::new(),
        }
    }
}

fn default_tokens_file() -> String {
    "service-tokens.json".to_string()
}

/// Desired Access application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSpec {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub domain: String,

    #[serde(default = "default_app_type", rename = "type")]
    pub app_type: String,

    #[serde(default = "default_session_duration")]
    pub session_duration: String,

    #[serde(default)]
    pub auto_redirect_to_identity: bool,

    #[serde(default)]
    pub cors_headers: CorsHeaders,
}

impl Default for ApplicationSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            domain: String::new(),
            app_type: default_app_type(),
            session_duration: default_session_duration(),
            auto_redirect_to_identity: false,
            cors_headers: CorsHeaders::default(),
        }
    }
}

fn default_app_type() -> String {
    "self_hosted".to_string()
}

fn default_session_duration() -> String {
    "24h".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorsHeaders {
    #[serde(default = "default_true")]
    pub allow_all_origins: bool,
    #[serde(default = "default_true")]
    pub allow_all_methods: bool,
    #[serde(default = "default_true")]
    pub allow_all_headers: bool,
    #[serde(default = "default_true")]
    pub allow_credentials: bool,
}

impl Default for CorsHeaders {
    fn default() -> Self {
        Self {
            allow_all_origins: true,
            allow_all_methods: true,
            allow_all_headers: true,
            allow_credentials: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Desired Access policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicySpec {
    pub name: String,

    /// allow, deny, bypass or non_identity
    pub decision: String,

    /// Include rules, passed through verbatim (e.g. `{ everyone = {} }`)
    #[serde(default)]
    pub include: Vec<Value>,

    pub precedence: u32,
}

/// Desired service token for one project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceTokenSpec {
    pub project: String,

    /// Token name; defaults to "<prefix><project>"
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "default_token_duration")]
    pub duration: String,
}

impl ServiceTokenSpec {
    pub fn token_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("substrate-{}", self.project))
    }
}

fn default_token_duration() -> String {
    "8760h".to_string()
}

// ============================================================================
// Rate limiting
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Fixed pause after each mutation call
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

impl RateLimitConfig {
    pub fn delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[github]
owner = "octo-org"

[webhook]
url = "https://hooks.example.com/api/github/webhook"
follow_up = ["Query the event store for new deliveries"]

[cloudflare]
account_id = "abc123"
api_token = "from-file"

[access.application]
name = "Substrate"
domain = "substrate.example.workers.dev"

[[access.policies]]
name = "Public Discovery"
decision = "bypass"
include = [{ everyone = {} }]
precedence = 1

[[access.policies]]
name = "Team"
decision = "allow"
include = [{ email_domain = { domain = "example.org" } }]
precedence = 2

[[access.service_tokens]]
project = "mipds"
"#;

    fn sample() -> Config {
        toml::from_str(SAMPLE).expect("sample config should parse")
    }

    #[test]
    fn test_parse_sample_with_defaults() {
        let config = sample();
        assert_eq!(config.github.owner, "octo-org");
        assert_eq!(config.github.repo_limit, 200);
        assert!(!config.github.include_forks);
        assert_eq!(config.webhook.events.len(), 6);
        assert_eq!(config.webhook.content_type, "json");
        assert_eq!(config.access.application.app_type, "self_hosted");
        assert_eq!(config.access.application.session_duration, "24h");
        assert_eq!(config.access.policies.len(), 2);
        assert_eq!(config.access.policies[0].include[0], serde_json::json!({"everyone": {}}));
        assert_eq!(config.access.service_tokens[0].token_name(), "substrate-mipds");
        assert_eq!(config.access.service_tokens[0].duration, "8760h");
        assert_eq!(config.access.tokens_file, "service-tokens.json");
        assert_eq!(config.rate_limit.delay_ms, 500);
    }

    #[test]
    fn test_sample_is_valid() {
        let config = sample();
        assert_eq!(config.validate_webhooks(), Ok(()));
        assert_eq!(config.validate_access(), Ok(()));
    }

    #[test]
    fn test_env_overrides_secrets() {
        let mut config = sample();
        config.apply_env(|key| match key {
            ENV_CF_API_TOKEN => Some("from-env".to_string()),
            ENV_CF_ACCOUNT_ID => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.cloudflare.api_token, "from-env");
        // Empty values do not clobber the file
        assert_eq!(config.cloudflare.account_id, "abc123");
    }

    #[test]
    fn test_missing_owner_fails_fast() {
        let mut config = sample();
        config.github.owner = String::new();
        assert_eq!(
            config.validate_webhooks(),
            Err(ConfigError::Missing("github.owner"))
        );
    }

    #[test]
    fn test_http_webhook_url_rejected() {
        let mut config = sample();
        config.webhook.url = "http://insecure.example.com".to_string();
        assert!(matches!(
            config.validate_webhooks(),
            Err(ConfigError::InsecureUrl { field: "webhook.url", .. })
        ));
    }

    #[test]
    fn test_empty_events_rejected() {
        let mut config = sample();
        config.webhook.events.clear();
        assert_eq!(config.validate_webhooks(), Err(ConfigError::NoEvents));
    }

    #[test]
    fn test_missing_token_rejected() {
        let mut config = sample();
        config.cloudflare.api_token = "  ".to_string();
        assert_eq!(
            config.validate_access(),
            Err(ConfigError::Missing("cloudflare.api_token"))
        );
    }

    #[test]
    fn test_duplicate_precedence_rejected() {
        let mut config = sample();
        config.access.policies[1].precedence = 1;
        assert_eq!(
            config.validate_access(),
            Err(ConfigError::DuplicatePrecedence(1))
        );
    }

    #[test]
    fn test_duplicate_policy_name_rejected() {
        let mut config = sample();
        let name = config.access.policies[0].name.clone();
        config.access.policies[1].name.clone_from(&name);
        assert_eq!(
            config.validate_access(),
            Err(ConfigError::DuplicatePolicy(name))
        );
    }

    #[test]
    fn test_default_access_config_names_tokens_file() {
        assert_eq!(AccessConfig::default().tokens_file, "service-tokens.json");
        assert_eq!(Config::default().access.tokens_file, "service-tokens.json");
    }

    #[test]
    fn test_duplicate_project_rejected() {
        let mut config = sample();
        let token = config.access.service_tokens[0].clone();
        config.access.service_tokens.push(token);
        assert_eq!(
            config.validate_access(),
            Err(ConfigError::DuplicateProject("mipds".to_string()))
        );
    }

    #[test]
    fn test_account_base() {
        let config = sample();
        assert_eq!(
            config.cloudflare.account_base(),
            "https://api.cloudflare.com/client/v4/accounts/abc123"
        );
    }

    #[test]
    fn test_debug_redacts_api_token() {
        let config = sample();
        assert!(!format!("{:?}", config.cloudflare).contains("from-file"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.github.owner, "octo-org");
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(&dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn test_expand_path_plain() {
        assert_eq!(expand_path("tokens.json"), PathBuf::from("tokens.json"));
    }
}
