//! Share and food log repositories

use ckn_admin_shared::{
    FoodLog, NewFoodLog, NewFoodLogItem, NewTextShare, ShareComment, ShareReaction, TextShare,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::{AdminError, AdminResult};
use crate::supabase::SupabaseClient;

const TEXT_SHARES: &str = "text_shares";
const FOOD_LOGS: &str = "food_logs";
const FOOD_LOG_ITEMS: &str = "food_log_items";

const TEXT_SHARE_COLUMNS: &str = "id, user_id, group_id, day_number, content, created_at";
const FOOD_LOG_COLUMNS: &str = "id, user_id, group_id, food_name, image_url, user_input, created_at";

pub struct TextShareRepository;

impl TextShareRepository {
    pub async fn insert(db: &SupabaseClient, share: &NewTextShare) -> AdminResult<TextShare> {
        let rows: Vec<TextShare> = db
            .from(TEXT_SHARES)
            .select(TEXT_SHARE_COLUMNS)
            .insert(share)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AdminError::Backend {
                status: 200,
                message: "insert into text_shares returned no row".to_string(),
            })
    }

    /// Shares authored by any of `user_ids`, newest first
    pub async fn list_for_users(
        db: &SupabaseClient,
        user_ids: &[Uuid],
        limit: usize,
    ) -> AdminResult<Vec<TextShare>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        db.from(TEXT_SHARES)
            .select(TEXT_SHARE_COLUMNS)
            .in_("user_id", user_ids)
            .order("created_at", false)
            .limit(limit)
            .execute()
            .await
    }

    pub async fn list_for_user(db: &SupabaseClient, user_id: Uuid) -> AdminResult<Vec<TextShare>> {
        db.from(TEXT_SHARES)
            .select(TEXT_SHARE_COLUMNS)
            .eq("user_id", user_id)
            .order("created_at", false)
            .execute()
            .await
    }

    /// Set `group_id` on the user's ungrouped shares; returns the count updated
    pub async fn assign_group(
        db: &SupabaseClient,
        user_id: Uuid,
        group_id: Uuid,
    ) -> AdminResult<usize> {
        let rows: Vec<serde_json::Value> = db
            .from(TEXT_SHARES)
            .select("id")
            .eq("user_id", user_id)
            .is_null("group_id")
            .update(&json!({ "group_id": group_id }))
            .await?;
        Ok(rows.len())
    }

    pub async fn list(db: &SupabaseClient, limit: usize) -> AdminResult<Vec<TextShare>> {
        db.from(TEXT_SHARES)
            .select(TEXT_SHARE_COLUMNS)
            .order("created_at", false)
            .limit(limit)
            .execute()
            .await
    }
}

pub struct FoodLogRepository;

impl FoodLogRepository {
    pub async fn insert(db: &SupabaseClient, log: &NewFoodLog) -> AdminResult<FoodLog> {
        let rows: Vec<FoodLog> = db
            .from(FOOD_LOGS)
            .select(FOOD_LOG_COLUMNS)
            .insert(log)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AdminError::Backend {
                status: 200,
                message: "insert into food_logs returned no row".to_string(),
            })
    }

    pub async fn insert_items(db: &SupabaseClient, items: &[NewFoodLogItem]) -> AdminResult<()> {
        if items.is_empty() {
            return Ok(());
        }
        let _: Vec<serde_json::Value> = db.from(FOOD_LOG_ITEMS).insert(items).await?;
        Ok(())
    }

    pub async fn list_for_users(
        db: &SupabaseClient,
        user_ids: &[Uuid],
        limit: usize,
    ) -> AdminResult<Vec<FoodLog>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        db.from(FOOD_LOGS)
            .select(FOOD_LOG_COLUMNS)
            .in_("user_id", user_ids)
            .order("created_at", false)
            .limit(limit)
            .execute()
            .await
    }

    pub async fn list_for_user(db: &SupabaseClient, user_id: Uuid) -> AdminResult<Vec<FoodLog>> {
        db.from(FOOD_LOGS)
            .select(FOOD_LOG_COLUMNS)
            .eq("user_id", user_id)
            .order("created_at", true)
            .execute()
            .await
    }

    /// Set `group_id` on the user's ungrouped logs; returns the count updated
    pub async fn assign_group(
        db: &SupabaseClient,
        user_id: Uuid,
        group_id: Uuid,
    ) -> AdminResult<usize> {
        let rows: Vec<serde_json::Value> = db
            .from(FOOD_LOGS)
            .select("id")
            .eq("user_id", user_id)
            .is_null("group_id")
            .update(&json!({ "group_id": group_id }))
            .await?;
        Ok(rows.len())
    }

    pub async fn list(db: &SupabaseClient, limit: usize) -> AdminResult<Vec<FoodLog>> {
        db.from(FOOD_LOGS)
            .select(FOOD_LOG_COLUMNS)
            .order("created_at", false)
            .limit(limit)
            .execute()
            .await
    }
}

/// Comments and reactions on shares
pub struct ShareActivityRepository;

impl ShareActivityRepository {
    pub async fn list_comments(db: &SupabaseClient, limit: usize) -> AdminResult<Vec<ShareComment>> {
        db.from("share_comments")
            .select("id, share_id, share_type, content")
            .limit(limit)
            .execute()
            .await
    }

    pub async fn list_reactions(
        db: &SupabaseClient,
        limit: usize,
    ) -> AdminResult<Vec<ShareReaction>> {
        db.from("share_reactions")
            .select("id, share_id, share_type, user_id")
            .limit(limit)
            .execute()
            .await
    }
}
