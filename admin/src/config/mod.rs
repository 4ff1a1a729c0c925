//! Configuration management for the CKN admin tooling
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: CKN__)
//! 4. Variable names used by the web app's `.env` files (`SUPABASE_URL`,
//!    `NEXT_PUBLIC_SUPABASE_ANON_KEY`, ...), which only fill values that are
//!    still unset

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use ckn_admin_shared::COURSE_DAYS;
use secrecy::SecretString;
use serde::Deserialize;

/// Environment files read at startup, in priority order
const DOTENV_FILES: [&str; 3] = [".env", ".env.local", "frontend/.env.local"];

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub supabase: SupabaseConfig,
    pub ai: AiConfig,
    pub course: CourseConfig,
    pub generation: GenerationConfig,
    pub http: HttpConfig,
}

/// Hosted backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseConfig {
    #[serde(default)]
    pub url: String,
    /// Public (anon) key; row-level security applies
    #[serde(default)]
    pub anon_key: Option<SecretString>,
    /// Service-role key; bypasses row-level security
    #[serde(default)]
    pub service_role_key: Option<SecretString>,
}

/// Completion provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub provider: ProviderKind,
    pub gemini: GeminiConfig,
    pub deepseek: DeepSeekConfig,
}

/// Which completion provider generates quizzes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Deepseek,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Deepseek => "deepseek",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    /// Pause between days, in milliseconds
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeepSeekConfig {
    #[serde(default)]
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Pause between days, in milliseconds
    pub delay_ms: u64,
}

/// Course layout
#[derive(Debug, Clone, Deserialize)]
pub struct CourseConfig {
    pub total_days: u32,
    /// Directory holding the `第*天*.md` files
    pub content_dir: String,
    /// Invite code of the default test group
    pub default_invite_code: String,
}

/// Quiz generation retry policy
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    pub max_attempts: u32,
    pub min_questions: usize,
}

/// Outbound HTTP settings
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AiConfig {
    /// Pause between generated days for the given provider
    pub fn delay(&self, kind: ProviderKind) -> Duration {
        Duration::from_millis(match kind {
            ProviderKind::Gemini => self.gemini.delay_ms,
            ProviderKind::Deepseek => self.deepseek.delay_ms,
        })
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with CKN__ prefix
    /// 4. Legacy variable names, for values still unset
    pub fn load() -> Result<Self> {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let config_file = format!("config/{}.toml", env);

        let builder = Self::with_defaults(config::Config::builder())?
            // Load from environment-specific config file
            .add_source(config::File::with_name(&config_file).required(false))
            // Override with environment variables (CKN__ prefix)
            // e.g., CKN__AI__PROVIDER=deepseek sets ai.provider
            .add_source(config::Environment::with_prefix("CKN").separator("__"));

        let mut config: AppConfig = builder.build()?.try_deserialize()?;
        config.apply_legacy_env(|key| env::var(key).ok().filter(|v| !v.trim().is_empty()));
        Ok(config)
    }

    /// Configuration from defaults only
    pub fn defaults() -> Result<Self> {
        Ok(Self::with_defaults(config::Config::builder())?
            .build()?
            .try_deserialize()?)
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(builder
            .set_default("supabase.url", "")?
            .set_default("ai.provider", "gemini")?
            .set_default("ai.gemini.base_url", "https://generativelanguage.googleapis.com")?
            .set_default("ai.gemini.model", "gemini-2.0-flash-exp")?
            .set_default("ai.gemini.delay_ms", 2000)?
            .set_default("ai.deepseek.base_url", "https://api.deepseek.com/v1")?
            .set_default("ai.deepseek.model", "deepseek-chat")?
            .set_default("ai.deepseek.temperature", 0.7)?
            .set_default("ai.deepseek.max_tokens", 2000)?
            .set_default("ai.deepseek.delay_ms", 1000)?
            .set_default("course.total_days", i64::from(COURSE_DAYS))?
            .set_default("course.content_dir", "CKN book content")?
            .set_default("course.default_invite_code", "TEST001")?
            .set_default("generation.max_attempts", 3)?
            .set_default("generation.min_questions", 3)?
            .set_default("http.timeout_secs", 60)?)
    }

    /// Fill unset values from the variable names the scripts and web app use
    pub fn apply_legacy_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| keys.iter().find_map(|key| lookup(key));

        if self.supabase.url.trim().is_empty() {
            if let Some(url) = first(&["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"]) {
                self.supabase.url = url;
            }
        }
        if self.supabase.anon_key.is_none() {
            self.supabase.anon_key = first(&[
                "SUPABASE_KEY",
                "SUPABASE_ANON_KEY",
                "NEXT_PUBLIC_SUPABASE_ANON_KEY",
            ])
            .map(SecretString::new);
        }
        if self.supabase.service_role_key.is_none() {
            self.supabase.service_role_key =
                first(&["SUPABASE_SERVICE_ROLE_KEY"]).map(SecretString::new);
        }
        if self.ai.gemini.api_key.is_none() {
            self.ai.gemini.api_key = first(&["GEMINI_API_KEY"]).map(SecretString::new);
        }
        if self.ai.deepseek.api_key.is_none() {
            self.ai.deepseek.api_key = first(&["DEEPSEEK_API_KEY"]).map(SecretString::new);
        }
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }
}

/// Load `.env` files the way the web app lays them out
///
/// Earlier files win: values already present in the process environment are
/// never overwritten.
///
/// Returns the files that were read. Runs before logging is set up, so the
/// caller reports them.
pub fn load_dotenv_files() -> Vec<PathBuf> {
    load_dotenv_files_from(Path::new("."))
}

fn load_dotenv_files_from(dir: &Path) -> Vec<PathBuf> {
    DOTENV_FILES
        .iter()
        .map(|name| dir.join(name))
        .filter(|path| dotenvy::from_path(path).is_ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = AppConfig::defaults().unwrap();
        assert!(config.supabase.url.is_empty());
        assert_eq!(config.ai.provider, ProviderKind::Gemini);
        assert_eq!(config.ai.gemini.model, "gemini-2.0-flash-exp");
        assert_eq!(config.ai.deepseek.max_tokens, 2000);
        assert_eq!(config.course.total_days, 21);
        assert_eq!(config.course.default_invite_code, "TEST001");
        assert_eq!(config.generation.max_attempts, 3);
        assert_eq!(config.http.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_provider_delays() {
        let config = AppConfig::defaults().unwrap();
        assert_eq!(config.ai.delay(ProviderKind::Gemini), Duration::from_secs(2));
        assert_eq!(config.ai.delay(ProviderKind::Deepseek), Duration::from_secs(1));
    }

    #[test]
    fn test_legacy_env_fills_gaps() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("NEXT_PUBLIC_SUPABASE_URL", "https://abc.supabase.co"),
            ("NEXT_PUBLIC_SUPABASE_ANON_KEY", "anon"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service"),
            ("DEEPSEEK_API_KEY", "sk-deep"),
        ]);
        let mut config = AppConfig::defaults().unwrap();
        config.apply_legacy_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.supabase.url, "https://abc.supabase.co");
        assert_eq!(config.supabase.anon_key.unwrap().expose_secret(), "anon");
        assert_eq!(
            config.supabase.service_role_key.unwrap().expose_secret(),
            "service"
        );
        assert!(config.ai.gemini.api_key.is_none());
        assert_eq!(config.ai.deepseek.api_key.unwrap().expose_secret(), "sk-deep");
    }

    #[test]
    fn test_legacy_env_prefers_script_names() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SUPABASE_URL", "https://scripts.supabase.co"),
            ("NEXT_PUBLIC_SUPABASE_URL", "https://web.supabase.co"),
        ]);
        let mut config = AppConfig::defaults().unwrap();
        config.apply_legacy_env(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.supabase.url, "https://scripts.supabase.co");
    }

    #[test]
    fn test_legacy_env_does_not_override() {
        let mut config = AppConfig::defaults().unwrap();
        config.supabase.url = "https://configured.supabase.co".to_string();
        config.apply_legacy_env(|_| Some("https://other.supabase.co".to_string()));
        assert_eq!(config.supabase.url, "https://configured.supabase.co");
    }

    #[test]
    fn test_dotenv_files_reported_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("frontend")).unwrap();
        fs::write(
            dir.path().join("frontend/.env.local"),
            "CKN_TEST_DOTENV_MARKER=frontend\n",
        )
        .unwrap();
        fs::write(dir.path().join(".env"), "CKN_TEST_DOTENV_MARKER=root\n").unwrap();

        let loaded = load_dotenv_files_from(dir.path());
        assert_eq!(
            loaded,
            vec![dir.path().join(".env"), dir.path().join("frontend/.env.local")]
        );
        assert_eq!(env::var("CKN_TEST_DOTENV_MARKER").unwrap(), "root");
    }
}
