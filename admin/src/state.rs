//! Shared application state
//!
//! Holds the configuration and one HTTP client. Backend clients and
//! completion providers are built on demand from these.

use std::sync::Arc;

use secrecy::SecretString;

use crate::ai::{provider_from_config, CompletionProvider};
use crate::config::{AppConfig, ProviderKind};
use crate::error::{AdminError, AdminResult};
use crate::supabase::SupabaseClient;

/// Shared state passed to every command.
///
/// Cloning is cheap: the config is behind an `Arc` and `reqwest::Client`
/// is reference counted internally.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub http: reqwest::Client,
}

impl AppState {
    /// Build state with an HTTP client using the configured timeout
    pub fn new(config: AppConfig) -> AdminResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http.timeout())
            .user_agent(concat!("ckn-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Backend client using the public key; row-level security applies
    pub fn supabase_anon(&self) -> AdminResult<SupabaseClient> {
        let key = self.config.supabase.anon_key.clone().ok_or_else(|| {
            AdminError::Config(
                "Backend anon key is not set (SUPABASE_KEY, NEXT_PUBLIC_SUPABASE_ANON_KEY or CKN__SUPABASE__ANON_KEY)"
                    .to_string(),
            )
        })?;
        self.client_with(key)
    }

    /// Backend client using the service-role key; bypasses row-level security
    pub fn supabase_service(&self) -> AdminResult<SupabaseClient> {
        let key = self.config.supabase.service_role_key.clone().ok_or_else(|| {
            AdminError::Config(
                "Service-role key is not set (SUPABASE_SERVICE_ROLE_KEY or CKN__SUPABASE__SERVICE_ROLE_KEY)"
                    .to_string(),
            )
        })?;
        self.client_with(key)
    }

    /// Service-role client when its key is configured, otherwise the anon client
    pub fn supabase_preferred(&self) -> AdminResult<SupabaseClient> {
        if self.config.supabase.service_role_key.is_some() {
            self.supabase_service()
        } else {
            self.supabase_anon()
        }
    }

    /// Completion provider of the given kind, or the configured default
    pub fn provider(&self, kind: Option<ProviderKind>) -> AdminResult<Box<dyn CompletionProvider>> {
        let kind = kind.unwrap_or(self.config.ai.provider);
        provider_from_config(kind, &self.config.ai, self.http.clone())
    }

    fn client_with(&self, key: SecretString) -> AdminResult<SupabaseClient> {
        SupabaseClient::new(self.http.clone(), &self.config.supabase.url, key)
    }
}
