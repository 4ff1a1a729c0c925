//! Hosted backend client
//!
//! Thin typed wrapper over the backend's REST (PostgREST) and auth (GoTrue)
//! HTTP APIs: table queries with equality/null/membership filters, inserts,
//! upserts, updates, deletes, stored-procedure calls, password sign-in and
//! the admin user listing.

mod auth;
mod client;
mod query;

pub use auth::{AuthClient, AuthUser, Session};
pub use client::SupabaseClient;
pub use query::{format_in_list, QueryBuilder};
