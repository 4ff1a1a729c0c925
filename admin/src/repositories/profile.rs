//! User profile repository

use ckn_admin_shared::{NewProfile, UserProfile};

use crate::error::AdminResult;
use crate::supabase::SupabaseClient;

pub struct ProfileRepository;

impl ProfileRepository {
    /// Insert a row into `profiles`
    pub async fn create(db: &SupabaseClient, profile: &NewProfile) -> AdminResult<()> {
        let _: Vec<serde_json::Value> = db.from("profiles").insert(profile).await?;
        Ok(())
    }

    /// Rows of `user_profiles`
    pub async fn list_user_profiles(
        db: &SupabaseClient,
        limit: usize,
    ) -> AdminResult<Vec<UserProfile>> {
        db.from("user_profiles")
            .select("user_id, display_name")
            .limit(limit)
            .execute()
            .await
    }
}
