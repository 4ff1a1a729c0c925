//! Password sign-in and admin user listing

use chrono::{DateTime, Utc};
use ckn_admin_shared::models::timestamp;
use ckn_admin_shared::validation::Credentials;
use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::client::{error_message, read_json, SupabaseClient};
use crate::error::{AdminError, AdminResult};

/// Users requested per admin listing page
const ADMIN_PAGE_SIZE: usize = 50;

/// Upper bound on admin listing pages (5000 users)
const MAX_ADMIN_PAGES: usize = 100;

/// Authenticated user as reported by the auth API
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl AuthUser {
    pub fn is_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

/// Session returned by a successful sign-in
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub access_token: SecretString,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

impl Session {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserPage {
    Wrapped { users: Vec<AuthUser> },
    Bare(Vec<AuthUser>),
}

impl UserPage {
    fn into_users(self) -> Vec<AuthUser> {
        match self {
            UserPage::Wrapped { users } | UserPage::Bare(users) => users,
        }
    }
}

/// Auth API bound to a backend client
pub struct AuthClient<'a> {
    client: &'a SupabaseClient,
}

impl<'a> AuthClient<'a> {
    pub(crate) fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Sign in with email and password
    pub async fn sign_in_with_password(&self, credentials: &Credentials) -> AdminResult<Session> {
        credentials.validate()?;
        debug!(email = %credentials.email, "Signing in");

        let url = self.client.auth_url("token");
        let response = self
            .client
            .anonymous_request(Method::POST, &url)
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({
                "email": credentials.email,
                "password": credentials.password,
            }))
            .send()
            .await?;

        // Bad credentials come back as 400 invalid_grant
        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(AdminError::Unauthorized(error_message(&body)));
        }

        let session: Session = read_json(response).await?;
        info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    /// List every user (requires the service-role key)
    pub async fn admin_list_users(&self) -> AdminResult<Vec<AuthUser>> {
        let url = self.client.auth_url("admin/users");
        let mut users = Vec::new();
        let mut previous_first = None;

        for page in 1..=MAX_ADMIN_PAGES {
            let response = self
                .client
                .request(Method::GET, &url)
                .query(&[
                    ("page", page.to_string()),
                    ("per_page", ADMIN_PAGE_SIZE.to_string()),
                ])
                .send()
                .await?;
            let batch = read_json::<UserPage>(response).await?.into_users();
            let fetched = batch.len();

            // A server that ignores paging hands back the same page again
            let first = batch.first().map(|user| user.id);
            if page > 1 && first == previous_first {
                warn!(page, "Auth server repeated a page, stopping");
                break;
            }
            previous_first = first;
            users.extend(batch);

            if fetched < ADMIN_PAGE_SIZE {
                break;
            }
            if page == MAX_ADMIN_PAGES {
                warn!(pages = MAX_ADMIN_PAGES, "Stopped listing users at the page limit");
            }
        }

        debug!(count = users.len(), "Listed auth users");
        Ok(users)
    }

    /// Find a user by email, ignoring case
    pub async fn admin_find_user_by_email(&self, email: &str) -> AdminResult<Option<AuthUser>> {
        let users = self.admin_list_users().await?;
        Ok(users.into_iter().find(|user| {
            user.email
                .as_deref()
                .is_some_and(|candidate| candidate.eq_ignore_ascii_case(email.trim()))
        }))
    }
}
