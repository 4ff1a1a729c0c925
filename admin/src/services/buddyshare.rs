//! Buddy-share diagnostics and repair
//!
//! The group feed shows text shares and food logs whose author is a member
//! of the viewer's group. Rows written without a `group_id` are invisible
//! to group-scoped policies; `fix_group_ids` backfills them.

use ckn_admin_shared::content::{preview, short_id};
use ckn_admin_shared::validation::Credentials;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{AdminError, AdminResult};
use crate::report;
use crate::repositories::{
    FoodLogRepository, GroupMemberRepository, GroupRepository, ProfileRepository,
    ShareActivityRepository, TextShareRepository,
};
use crate::supabase::SupabaseClient;

/// Rows fetched per table when counting records
const RECORD_LIMIT: usize = 1000;
const SAMPLE_SIZE: usize = 3;

#[derive(Debug, Default)]
pub struct GroupFixSummary {
    pub group_id: Uuid,
    pub text_shares_updated: usize,
    pub food_logs_updated: usize,
    /// `(with correct group, total)` after the update
    pub text_shares_verified: (usize, usize),
    pub food_logs_verified: (usize, usize),
}

/// Per-table row counts; `Err` holds the failure message
#[derive(Debug, Default)]
pub struct RecordCounts {
    pub tables: Vec<(&'static str, Result<usize, String>)>,
    pub shares_missing_group: usize,
}

impl RecordCounts {
    pub fn count(&self, table: &str) -> Option<usize> {
        self.tables
            .iter()
            .find(|(name, _)| *name == table)
            .and_then(|(_, result)| result.as_ref().ok().copied())
    }
}

#[derive(Debug, Default)]
pub struct GroupFeed {
    pub group_id: Uuid,
    pub member_ids: Vec<Uuid>,
    pub own_text_shares: usize,
    pub own_food_logs: usize,
    pub feed_text_shares: usize,
    pub feed_food_logs: usize,
}

pub struct BuddyshareService;

impl BuddyshareService {
    /// Backfill `group_id` on the signed-in user's shares and food logs
    pub async fn fix_group_ids(
        db: &SupabaseClient,
        credentials: &Credentials,
    ) -> AdminResult<GroupFixSummary> {
        report::banner("Fixing buddy-share group ids");

        let (user_db, user_id) = sign_in(db, credentials).await?;
        let group_id = resolve_group(&user_db, user_id).await?;
        report::ok(format!("User's group ID: {group_id}"));

        let mut summary = GroupFixSummary {
            group_id,
            ..Default::default()
        };

        report::section("text_shares");
        match TextShareRepository::assign_group(&user_db, user_id, group_id).await {
            Ok(count) => {
                summary.text_shares_updated = count;
                report::ok(format!("Updated {count} text_shares records"));
            }
            Err(e) => {
                error!(error = %e, "Updating text_shares failed");
                report::fail(format!("Error updating text_shares: {e}"));
            }
        }

        report::section("food_logs");
        match FoodLogRepository::assign_group(&user_db, user_id, group_id).await {
            Ok(count) => {
                summary.food_logs_updated = count;
                report::ok(format!("Updated {count} food_logs records"));
            }
            Err(e) => {
                error!(error = %e, "Updating food_logs failed");
                report::fail(format!("Error updating food_logs: {e}"));
            }
        }

        report::section("Verification");
        let shares = TextShareRepository::list_for_user(&user_db, user_id).await?;
        let logs = FoodLogRepository::list_for_user(&user_db, user_id).await?;
        summary.text_shares_verified = (
            shares.iter().filter(|s| s.group_id == Some(group_id)).count(),
            shares.len(),
        );
        summary.food_logs_verified = (
            logs.iter().filter(|l| l.group_id == Some(group_id)).count(),
            logs.len(),
        );
        println!(
            "  Text shares with correct group_id: {}",
            report::ratio(summary.text_shares_verified.0, summary.text_shares_verified.1)
        );
        println!(
            "  Food logs with correct group_id: {}",
            report::ratio(summary.food_logs_verified.0, summary.food_logs_verified.1)
        );

        info!(
            text_shares = summary.text_shares_updated,
            food_logs = summary.food_logs_updated,
            "Group ids backfilled"
        );
        Ok(summary)
    }

    /// Count and sample the buddy-share tables
    pub async fn check_records(db: &SupabaseClient) -> AdminResult<RecordCounts> {
        report::banner("Checking buddy-share records");
        let mut counts = RecordCounts::default();

        let profiles = ProfileRepository::list_user_profiles(db, RECORD_LIMIT).await;
        counts.tables.push(print_table("user_profiles", profiles, |p| {
            format!(
                "{}: {}",
                short_id(&p.user_id),
                p.display_name.as_deref().unwrap_or("-")
            )
        }));

        let groups = GroupRepository::list(db, RECORD_LIMIT).await;
        counts.tables.push(print_table("groups", groups, |g| {
            format!(
                "{}: {} ({})",
                short_id(&g.id),
                g.name,
                g.invite_code.as_deref().unwrap_or("-")
            )
        }));

        let members = GroupMemberRepository::list(db, RECORD_LIMIT).await;
        counts.tables.push(print_table("group_members", members, |m| {
            format!(
                "group {} user {} ({})",
                short_id(&m.group_id),
                m.user_id.map(|id| short_id(&id)).unwrap_or_else(|| "-".to_string()),
                m.role.as_deref().unwrap_or("-")
            )
        }));

        let shares = TextShareRepository::list(db, RECORD_LIMIT).await;
        counts.tables.push(print_table("text_shares", shares, |s| {
            format!(
                "{} day {}: {}",
                short_id(&s.id),
                s.day_number.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
                preview(&s.content, 30)
            )
        }));

        let logs = FoodLogRepository::list(db, RECORD_LIMIT).await;
        counts.tables.push(print_table("food_logs", logs, |l| {
            format!(
                "{}: {}",
                short_id(&l.id),
                preview(l.user_input.as_deref().unwrap_or("No input"), 30)
            )
        }));

        let comments = ShareActivityRepository::list_comments(db, RECORD_LIMIT).await;
        counts.tables.push(print_table("share_comments", comments, |c| {
            format!("{} on {}: {}", short_id(&c.id), c.share_type, preview(&c.content, 30))
        }));

        let reactions = ShareActivityRepository::list_reactions(db, RECORD_LIMIT).await;
        counts.tables.push(print_table("share_reactions", reactions, |r| {
            format!(
                "{} on {} by {}",
                short_id(&r.id),
                r.share_type,
                r.user_id.map(|id| short_id(&id)).unwrap_or_else(|| "-".to_string())
            )
        }));

        report::section("text_shares missing group_id");
        match TextShareRepository::list(db, RECORD_LIMIT).await {
            Ok(shares) => {
                let missing: Vec<_> = shares.iter().filter(|s| s.group_id.is_none()).collect();
                counts.shares_missing_group = missing.len();
                if missing.is_empty() {
                    report::ok("Every text share has a group_id");
                } else {
                    report::warn(format!("{} text shares have no group_id", missing.len()));
                    for share in missing {
                        report::item(format!(
                            "{} by {}",
                            short_id(&share.id),
                            share
                                .user_id
                                .map(|id| short_id(&id))
                                .unwrap_or_else(|| "-".to_string())
                        ));
                    }
                }
            }
            Err(e) => report::fail(format!("Error: {e}")),
        }

        Ok(counts)
    }

    /// Show what the group feed query returns for the signed-in user
    pub async fn debug_group_feed(
        db: &SupabaseClient,
        credentials: &Credentials,
    ) -> AdminResult<GroupFeed> {
        report::banner(&format!("Group feed for {}", credentials.email));

        let (user_db, user_id) = sign_in(db, credentials).await?;
        let group_id = resolve_group(&user_db, user_id).await?;
        report::ok(format!("Group ID: {group_id}"));

        let member_ids: Vec<Uuid> = GroupMemberRepository::members_of_group(&user_db, group_id)
            .await?
            .into_iter()
            .filter_map(|m| m.user_id)
            .collect();
        println!("  Members: {}", member_ids.len());
        for id in &member_ids {
            report::item(id.to_string());
        }

        report::section("Own content");
        let own_shares = TextShareRepository::list_for_user(&user_db, user_id).await?;
        println!("  Text shares: {}", own_shares.len());
        for share in &own_shares {
            report::item(format!(
                "{} group {}: {}",
                short_id(&share.id),
                share.group_id.map(|g| short_id(&g)).unwrap_or_else(|| "none".to_string()),
                preview(&share.content, 30)
            ));
        }
        let own_logs = FoodLogRepository::list_for_user(&user_db, user_id).await?;
        println!("  Food logs: {}", own_logs.len());
        for log in &own_logs {
            report::item(format!(
                "{} group {}: {}",
                short_id(&log.id),
                log.group_id.map(|g| short_id(&g)).unwrap_or_else(|| "none".to_string()),
                preview(log.user_input.as_deref().unwrap_or("No input"), 30)
            ));
        }

        report::section("Group feed");
        let feed_shares =
            TextShareRepository::list_for_users(&user_db, &member_ids, RECORD_LIMIT).await?;
        let feed_logs =
            FoodLogRepository::list_for_users(&user_db, &member_ids, RECORD_LIMIT).await?;
        println!("  Text shares from group members: {}", feed_shares.len());
        println!("  Food logs from group members: {}", feed_logs.len());
        if feed_shares.is_empty() && feed_logs.is_empty() {
            report::fail("The feed will be empty for this user");
        } else {
            report::ok("The feed has content for this user");
        }

        Ok(GroupFeed {
            group_id,
            member_ids,
            own_text_shares: own_shares.len(),
            own_food_logs: own_logs.len(),
            feed_text_shares: feed_shares.len(),
            feed_food_logs: feed_logs.len(),
        })
    }
}

/// Sign in and return a client acting as the user
pub(crate) async fn sign_in(
    db: &SupabaseClient,
    credentials: &Credentials,
) -> AdminResult<(SupabaseClient, Uuid)> {
    let session = db.auth().sign_in_with_password(credentials).await?;
    report::ok(format!("Signed in as {} ({})", credentials.email, session.user_id()));
    Ok((db.with_session(&session), session.user_id()))
}

/// First group the user joined
pub(crate) async fn resolve_group(db: &SupabaseClient, user_id: Uuid) -> AdminResult<Uuid> {
    GroupMemberRepository::first_group_for_user(db, user_id)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("user {user_id} is not in any group")))
}

fn print_table<T>(
    table: &'static str,
    rows: AdminResult<Vec<T>>,
    describe: impl Fn(&T) -> String,
) -> (&'static str, Result<usize, String>) {
    report::section(table);
    match rows {
        Ok(rows) => {
            println!("  Count: {}", rows.len());
            for row in rows.iter().take(SAMPLE_SIZE) {
                report::item(describe(row));
            }
            (table, Ok(rows.len()))
        }
        Err(e) => {
            warn!(table, error = %e, "Table check failed");
            report::fail(format!("Error: {e}"));
            (table, Err(e.to_string()))
        }
    }
}
