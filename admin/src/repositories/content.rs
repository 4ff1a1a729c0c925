//! Daily content repository

use ckn_admin_shared::DailyContent;
use serde::Deserialize;

use crate::error::AdminResult;
use crate::supabase::SupabaseClient;

const TABLE: &str = "daily_content";

/// Day number and title only
#[derive(Debug, Clone, Deserialize)]
pub struct DailyContentSummary {
    pub day_number: i32,
    #[serde(default)]
    pub title: String,
}

pub struct DailyContentRepository;

impl DailyContentRepository {
    /// All days with full text, in day order
    pub async fn list_all(db: &SupabaseClient) -> AdminResult<Vec<DailyContent>> {
        db.from(TABLE).order("day_number", true).execute().await
    }

    /// Day numbers and titles, in day order
    pub async fn list_summaries(db: &SupabaseClient) -> AdminResult<Vec<DailyContentSummary>> {
        db.from(TABLE)
            .select("day_number, title")
            .order("day_number", true)
            .execute()
            .await
    }

    /// One day's content; `NotFound` when the day was never imported
    pub async fn get_by_day(db: &SupabaseClient, day_number: i32) -> AdminResult<DailyContent> {
        db.from(TABLE).eq("day_number", day_number).single().await
    }

    /// Insert or replace a day's content
    pub async fn upsert(db: &SupabaseClient, content: &DailyContent) -> AdminResult<()> {
        let _: Vec<serde_json::Value> = db
            .from(TABLE)
            .on_conflict("day_number")
            .select("day_number")
            .upsert(content)
            .await?;
        Ok(())
    }
}
