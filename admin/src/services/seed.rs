//! Test data seeding and ad-hoc maintenance

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use ckn_admin_shared::content::{preview, program_day, split_sql_statements};
use ckn_admin_shared::quiz::{manual_template_questions, QUESTIONS_PER_DAY};
use ckn_admin_shared::validation::{validate_score, Credentials};
use ckn_admin_shared::{
    DetectedFood, FoodLog, NewFoodLog, NewFoodLogItem, NewTextShare, Quiz, QuizResponse, TextShare,
};
use serde_json::json;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::buddyshare::{resolve_group, sign_in};
use crate::error::{AdminError, AdminResult};
use crate::report;
use crate::repositories::{
    FoodLogRepository, GroupMemberRepository, QuizRepository, QuizResponseRepository,
    TextShareRepository,
};
use crate::supabase::SupabaseClient;

/// Days of activity written by [`SeedService::seed_user_activity`]
pub const SEED_DAYS: i32 = 6;

const SEED_SHARES: [&str; SEED_DAYS as usize] = [
    "今天學習了營養學的基礎概念，了解到營養素與人體健康的密切關係。營養學真的是一門令人著迷的科學！",
    "早餐增加蛋白質的建議很實用！今天試了雞蛋配牛奶，確實更有飽足感，到中午都不會餓。",
    "保持年輕的竅門原來和營養息息相關。抗氧化物質真的很重要，要多吃彩色蔬果！",
    "常見營養素的價值被低估了。維生素C不只是預防感冒，對膠原蛋白合成也很重要。",
    "糖的泛濫問題真的很嚴重。現在開始注意隱藏糖分，連調味料都要小心選擇。",
    "杏子的營養價值很高，特別是維生素A含量豐富。不同品種的杏子各有特色，很有趣！",
];

const DEMO_IMAGES: [&str; SEED_DAYS as usize] = [
    "/demo-images/breakfast-1.jpg",
    "/demo-images/breakfast-2.jpg",
    "/demo-images/lunch-1.jpg",
    "/demo-images/lunch-2.jpg",
    "/demo-images/dinner-1.jpg",
    "/demo-images/dinner-2.jpg",
];

/// Whose activity to seed
#[derive(Debug, Clone)]
pub enum SeedTarget {
    /// Known ids, written with the caller's client
    Ids { user_id: Uuid, group_id: Option<Uuid> },
    /// Sign in and write as the user, in the user's first group
    Credentials(Credentials),
}

#[derive(Debug, Default)]
pub struct SeedSummary {
    pub text_shares: usize,
    pub food_logs: usize,
    pub quiz_responses: usize,
}

impl SeedSummary {
    pub fn is_complete(&self) -> bool {
        let days = SEED_DAYS as usize;
        self.text_shares == days && self.food_logs == days && self.quiz_responses == days
    }
}

/// Seeded quiz score for a day: alternates between 3/3 and 2/3
pub fn seeded_score(day: i32) -> i32 {
    2 + (day % 2)
}

/// Food detected in the seeded log for a day
pub fn seeded_food(day: i32) -> DetectedFood {
    DetectedFood {
        name: format!("食物{day}"),
        description: format!("第{day}天的食物"),
        portion: format!("{}g", day * 100),
    }
}

/// Logs whose program day is `day`
pub fn logs_on_program_day(logs: &[FoodLog], day: u32, max_day: u32) -> Vec<&FoodLog> {
    logs.iter()
        .filter(|log| log.created_at.map(|ts| program_day(ts, max_day)) == Some(day))
        .collect()
}

/// What a user recorded on one program day
#[derive(Debug, Default)]
pub struct DayActivity {
    pub food_logs: Vec<FoodLog>,
    pub text_shares: Vec<TextShare>,
    pub quiz_responses: Vec<QuizResponse>,
}

fn date_label(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|ts| ts.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn read_failed(table: &str, e: &AdminError) {
    warn!(table, error = %e, "Read failed");
    report::fail(format!("Could not read {table}: {e}"));
}

pub struct SeedService;

impl SeedService {
    /// Store the fixed template quiz for every course day
    pub async fn seed_manual_quizzes(db: &SupabaseClient, total_days: u32) -> AdminResult<usize> {
        report::banner("Creating manual quiz data");
        let quiz = Quiz::new(manual_template_questions());

        let mut stored = 0;
        for day in 1..=total_days as i32 {
            match QuizRepository::upsert(db, day, &quiz).await {
                Ok(()) => {
                    report::ok(format!("Day {day}: {} questions", quiz.len()));
                    stored += 1;
                }
                Err(e) => {
                    error!(day, error = %e, "Manual quiz upsert failed");
                    report::fail(format!("Day {day}: {e}"));
                }
            }
        }

        println!();
        println!("Stored {stored}/{total_days} quizzes");
        Ok(stored)
    }

    /// Write six days of shares, food logs and quiz responses for a user
    #[instrument(skip(db, target))]
    pub async fn seed_user_activity(
        db: &SupabaseClient,
        target: &SeedTarget,
    ) -> AdminResult<SeedSummary> {
        report::banner("Creating test activity");

        let (writer, user_id, group_id) = match target {
            SeedTarget::Ids { user_id, group_id } => (db.clone(), *user_id, *group_id),
            SeedTarget::Credentials(credentials) => {
                let (user_db, user_id) = sign_in(db, credentials).await?;
                let group_id = resolve_group(&user_db, user_id).await?;
                (user_db, user_id, Some(group_id))
            }
        };
        println!("  User ID: {user_id}");
        match group_id {
            Some(id) => println!("  Group ID: {id}"),
            None => println!("  Group ID: none"),
        }

        let now = Utc::now();
        let created_at = |day: i32| now - Duration::days(i64::from(SEED_DAYS - day));
        let mut summary = SeedSummary::default();

        report::section("Text shares");
        for day in 1..=SEED_DAYS {
            let share = NewTextShare {
                user_id,
                group_id,
                day_number: day,
                content: SEED_SHARES[(day - 1) as usize].to_string(),
                created_at: created_at(day),
            };
            match TextShareRepository::insert(&writer, &share).await {
                Ok(_) => {
                    report::ok(format!("Day {day} text share created"));
                    summary.text_shares += 1;
                }
                Err(e) => {
                    warn!(day, error = %e, "Text share insert failed");
                    report::fail(format!("Day {day} text share failed: {e}"));
                }
            }
        }

        report::section("Food logs");
        for day in 1..=SEED_DAYS {
            match Self::seed_food_log(&writer, user_id, group_id, day, created_at(day)).await {
                Ok(()) => {
                    report::ok(format!("Day {day} food log created"));
                    summary.food_logs += 1;
                }
                Err(e) => {
                    warn!(day, error = %e, "Food log insert failed");
                    report::fail(format!("Day {day} food log failed: {e}"));
                }
            }
        }

        report::section("Quiz responses");
        let total = QUESTIONS_PER_DAY as i32;
        for day in 1..=SEED_DAYS {
            let score = seeded_score(day);
            let result = match validate_score(score, total) {
                Ok(()) => QuizResponseRepository::save(&writer, user_id, day, score, total).await,
                Err(e) => Err(AdminError::Validation(e)),
            };
            match result {
                Ok(_) => {
                    report::ok(format!("Day {day} quiz response created (score {score}/{total})"));
                    summary.quiz_responses += 1;
                }
                Err(e) => {
                    warn!(day, error = %e, "Quiz response failed");
                    report::fail(format!("Day {day} quiz response failed: {e}"));
                }
            }
        }

        println!();
        report::rule();
        let days = SEED_DAYS as usize;
        println!("  Text shares:    {}", report::ratio(summary.text_shares, days));
        println!("  Food logs:      {}", report::ratio(summary.food_logs, days));
        println!("  Quiz responses: {}", report::ratio(summary.quiz_responses, days));
        report::rule();
        if !summary.is_complete() {
            report::warn("Some records could not be created");
        }
        info!(
            text_shares = summary.text_shares,
            food_logs = summary.food_logs,
            quiz_responses = summary.quiz_responses,
            "Seeding finished"
        );
        Ok(summary)
    }

    async fn seed_food_log(
        db: &SupabaseClient,
        user_id: Uuid,
        group_id: Option<Uuid>,
        day: i32,
        created_at: chrono::DateTime<Utc>,
    ) -> AdminResult<()> {
        let food = seeded_food(day);
        let log = NewFoodLog {
            user_id,
            group_id,
            image_url: DEMO_IMAGES[(day - 1) as usize].to_string(),
            detected_foods: vec![food.clone()],
            user_input: format!("第{day}天的食物記錄"),
            created_at,
        };
        let stored = FoodLogRepository::insert(db, &log).await?;
        FoodLogRepository::insert_items(db, &[NewFoodLogItem::from_detected(stored.id, user_id, &food)])
            .await
    }

    /// List the user's food logs by program day, then everything the user
    /// recorded on `day`: food logs, text shares and quiz responses.
    ///
    /// Each table is read on its own; a failed read is reported and skipped.
    pub async fn inspect_day_activity(
        db: &SupabaseClient,
        credentials: &Credentials,
        day: u32,
        max_day: u32,
    ) -> AdminResult<DayActivity> {
        report::banner(&format!("Activity on program day {day}"));

        let (user_db, user_id) = sign_in(db, credentials).await?;
        let mut activity = DayActivity::default();

        match FoodLogRepository::list_for_user(&user_db, user_id).await {
            Ok(logs) => {
                report::section(&format!("All food logs ({})", logs.len()));
                for log in &logs {
                    let day_label = log
                        .created_at
                        .map(|ts| program_day(ts, max_day).to_string())
                        .unwrap_or_else(|| "?".to_string());
                    report::item(format!(
                        "{} day {day_label}: {}",
                        date_label(log.created_at),
                        preview(log.user_input.as_deref().unwrap_or("No input"), 50)
                    ));
                }
                activity.food_logs = logs_on_program_day(&logs, day, max_day)
                    .into_iter()
                    .cloned()
                    .collect();
            }
            Err(e) => read_failed("food_logs", &e),
        }

        report::section(&format!("Text shares for day {day}"));
        match TextShareRepository::list_for_user(&user_db, user_id).await {
            Ok(shares) => {
                activity.text_shares = shares
                    .into_iter()
                    .filter(|share| share.day_number == Some(day as i32))
                    .collect();
                for share in &activity.text_shares {
                    report::item(format!(
                        "{}: {}",
                        date_label(share.created_at),
                        preview(&share.content, 50)
                    ));
                }
            }
            Err(e) => read_failed("text_shares", &e),
        }

        report::section(&format!("Quiz responses for day {day}"));
        match QuizResponseRepository::list_for_user(&user_db, user_id).await {
            Ok(responses) => {
                activity.quiz_responses = responses
                    .into_iter()
                    .filter(|response| response.day_number == day as i32)
                    .collect();
                for response in &activity.quiz_responses {
                    report::item(format!(
                        "{}: {}/{}",
                        date_label(response.answered_at),
                        response.score,
                        response.total_questions
                    ));
                }
            }
            Err(e) => read_failed("quiz_responses", &e),
        }

        report::section(&format!("Program day {day}"));
        for (kind, count) in [
            ("food log", activity.food_logs.len()),
            ("text share", activity.text_shares.len()),
            ("quiz response", activity.quiz_responses.len()),
        ] {
            if count == 0 {
                report::fail(format!("No {kind}"));
            } else {
                report::ok(format!("{count} {kind}(s)"));
            }
        }
        Ok(activity)
    }

    /// Run a SQL script through the `exec_sql` procedure.
    ///
    /// Stops at the first failing statement. With `verify`, signs in and
    /// runs the membership queries the group feed depends on.
    pub async fn exec_sql(
        db: &SupabaseClient,
        path: &Path,
        verify: Option<&Credentials>,
    ) -> AdminResult<usize> {
        report::banner(&format!("Executing {}", path.display()));

        let sql = std::fs::read_to_string(path)?;
        let statements = split_sql_statements(&sql);
        println!("  {} statements", statements.len());

        for (i, statement) in statements.iter().enumerate() {
            let _: serde_json::Value = db
                .rpc("exec_sql", &json!({ "sql": statement }))
                .await
                .map_err(|e| {
                    error!(statement = i + 1, error = %e, "SQL statement failed");
                    e
                })?;
            report::ok(format!("Statement {} executed", i + 1));
        }

        if let Some(credentials) = verify {
            report::section("Membership smoke test");
            let (user_db, user_id) = sign_in(db, credentials).await?;
            let memberships = GroupMemberRepository::memberships_for_user(&user_db, user_id).await?;
            report::ok(format!("Found {} group memberships", memberships.len()));
            if let Some(first) = memberships.first() {
                let members = GroupMemberRepository::members_of_group(&user_db, first.group_id).await?;
                report::ok(format!("Group {} has {} members", first.group_id, members.len()));
            }
        }

        Ok(statements.len())
    }
}
