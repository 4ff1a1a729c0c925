//! Backend client handle

use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::auth::{AuthClient, Session};
use super::query::QueryBuilder;
use crate::error::{AdminError, AdminResult};

/// Backend client.
///
/// Every request carries the project API key in `apikey`. The bearer token
/// is the same key until [`SupabaseClient::with_session`] swaps in a user's
/// access token, after which row-level security evaluates as that user.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    bearer: SecretString,
}

impl SupabaseClient {
    /// Create a client for the project at `base_url`
    pub fn new(http: reqwest::Client, base_url: &str, api_key: SecretString) -> AdminResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(AdminError::Config(
                "Backend URL is not set (SUPABASE_URL or CKN__SUPABASE__URL)".to_string(),
            ));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AdminError::Config(format!(
                "Backend URL must start with http:// or https://, got '{base_url}'"
            )));
        }

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            bearer: api_key.clone(),
            api_key,
        })
    }

    /// Clone of this client that acts as the signed-in user
    pub fn with_session(&self, session: &Session) -> Self {
        Self {
            bearer: session.access_token.clone(),
            ..self.clone()
        }
    }

    /// Start a query against a table
    pub fn from(&self, table: &str) -> QueryBuilder<'_> {
        QueryBuilder::new(self, table)
    }

    /// Auth API
    pub fn auth(&self) -> AuthClient<'_> {
        AuthClient::new(self)
    }

    /// Call a stored procedure
    pub async fn rpc<A, T>(&self, function: &str, args: &A) -> AdminResult<T>
    where
        A: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(function, "Calling stored procedure");
        let url = self.rest_url(&format!("rpc/{function}"));
        let response = self.request(Method::POST, &url).json(args).send().await?;
        let response = check_response(response).await?;

        // Void functions answer 204 or an empty body
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(serde_json::from_str("null")?);
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Request with the project key and current bearer attached
    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(self.bearer.expose_secret())
    }

    /// Request carrying only the project key, for auth endpoints that take
    /// credentials in the body
    pub(crate) fn anonymous_request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", self.api_key.expose_secret())
    }
}

/// Error body shapes of the REST and auth APIs
#[derive(Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    error: Option<String>,
    hint: Option<String>,
}

/// Pull the most useful human-readable message out of an error body
pub(crate) fn error_message(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return body.trim().to_string();
    };
    let message = parsed
        .message
        .or(parsed.error_description)
        .or(parsed.msg)
        .or(parsed.error)
        .unwrap_or_else(|| body.trim().to_string());
    match parsed.hint {
        Some(hint) if !hint.is_empty() => format!("{message} (hint: {hint})"),
        _ => message,
    }
}

/// Check response status and return error if not successful.
pub(crate) async fn check_response(response: Response) -> AdminResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AdminError::from_status(status, error_message(&body)))
}

/// Check response and parse JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> AdminResult<T> {
    let response = check_response(response).await?;
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}
