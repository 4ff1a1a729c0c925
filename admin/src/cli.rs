//! Command-line interface for ckn-admin.

use std::path::PathBuf;

use ckn_admin_shared::validation::{validate_day_number, Credentials};
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use crate::config::ProviderKind;
use crate::error::{AdminError, AdminResult};
use crate::services::seed::SeedTarget;
use crate::services::{
    groups, BuddyshareService, GroupService, ImportService, QuizGenerationService, SeedService,
    VerifyService,
};
use crate::state::AppState;

/// CKN admin - content, quiz and group tooling for the 21-day course
#[derive(Parser, Debug)]
#[command(name = "ckn-admin")]
#[command(about = "Maintenance tooling for the CKN course backend", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Account to sign in as
#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    /// Account email
    #[arg(long, env = "CKN_EMAIL", default_value = "test55@andywong.me")]
    pub email: String,

    /// Account password
    #[arg(long, env = "CKN_PASSWORD", default_value = "123456", hide_env_values = true)]
    pub password: String,
}

impl LoginArgs {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.email.clone(), self.password.clone())
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import the `第*天*.md` course files into daily_content
    Import {
        /// Content directory (defaults to course.content_dir)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Generate quizzes for every day, or regenerate one day
    Generate {
        /// Completion provider (defaults to ai.provider)
        #[arg(long, value_enum)]
        provider: Option<ProviderKind>,

        /// Regenerate only this day
        #[arg(long)]
        day: Option<i32>,
    },

    /// Check content and quizzes for missing days
    Verify,

    /// Add a user to a group by invite code
    AddToGroup {
        /// User id
        user_id: Uuid,

        /// Group invite code (defaults to course.default_invite_code)
        invite_code: Option<String>,
    },

    /// Put a list of users into the signed-in anchor user's group
    AddAllToGroup {
        /// The anchor account whose group everyone joins
        #[command(flatten)]
        anchor: LoginArgs,

        /// CSV file with `email,password` columns (defaults to the test accounts)
        #[arg(long)]
        users: Option<PathBuf>,
    },

    /// Show a user's group memberships
    CheckUserGroup {
        /// User email
        email: String,

        /// Add the user to this group if they have none
        #[arg(long, value_name = "INVITE_CODE")]
        add_to: Option<String>,
    },

    /// Backfill group_id on the user's shares and food logs
    FixGroupIds {
        #[command(flatten)]
        login: LoginArgs,
    },

    /// Count and sample the buddy-share tables
    CheckRecords,

    /// Show what the group feed returns for a user
    DebugGroupFeed {
        #[command(flatten)]
        login: LoginArgs,
    },

    /// Store the fixed template quiz for every day
    SeedQuizzes,

    /// Create six days of test activity for a user
    SeedActivity {
        /// Write for this user id instead of signing in
        #[arg(long)]
        user_id: Option<Uuid>,

        /// Group id for the rows written with --user-id
        #[arg(long, requires = "user_id")]
        group_id: Option<Uuid>,

        #[command(flatten)]
        login: LoginArgs,
    },

    /// Show a user's food logs, text shares and quiz responses on one program day
    #[command(alias = "inspect-food-logs")]
    InspectDay {
        #[command(flatten)]
        login: LoginArgs,

        /// Program day to look for
        #[arg(long, default_value = "15")]
        day: u32,
    },

    /// Show how one day's quiz is stored and whether it decodes
    InspectQuiz {
        /// Course day
        #[arg(long, default_value = "6")]
        day: i32,
    },

    /// Run a SQL script through the exec_sql procedure
    ExecSql {
        /// SQL file
        file: PathBuf,

        /// Sign in afterwards and run the membership queries
        #[arg(long)]
        verify: bool,

        #[command(flatten)]
        login: LoginArgs,
    },
}

/// Run one command
pub async fn run(command: Command, state: &AppState) -> AdminResult<()> {
    let config = state.config();
    let total_days = config.course.total_days;

    match command {
        Command::Import { dir } => {
            let dir = dir.unwrap_or_else(|| PathBuf::from(&config.course.content_dir));
            let db = state.supabase_preferred()?;
            ImportService::import_content(&db, &dir, total_days).await?;
        }
        Command::Generate { provider, day } => {
            let kind = provider.unwrap_or(config.ai.provider);
            let provider = state.provider(Some(kind))?;
            let db = state.supabase_preferred()?;
            match day {
                Some(day) => {
                    validate_day_number(day, total_days).map_err(AdminError::Validation)?;
                    QuizGenerationService::regenerate_day(
                        &db,
                        provider.as_ref(),
                        &config.generation,
                        day,
                    )
                    .await?;
                }
                None => {
                    let summary = QuizGenerationService::generate_all(
                        &db,
                        provider.as_ref(),
                        &config.generation,
                        config.ai.delay(kind),
                    )
                    .await?;
                    if summary.succeeded.is_empty() {
                        return Err(AdminError::Provider(
                            "no quiz could be generated".to_string(),
                        ));
                    }
                }
            }
        }
        Command::Verify => {
            let db = state.supabase_preferred()?;
            VerifyService::verify(&db, total_days).await?;
        }
        Command::AddToGroup {
            user_id,
            invite_code,
        } => {
            let code = invite_code.unwrap_or_else(|| config.course.default_invite_code.clone());
            let db = state.supabase_service()?;
            GroupService::add_user_to_group(&db, user_id, &code).await?;
        }
        Command::AddAllToGroup { anchor, users } => {
            let users = match users {
                Some(path) => groups::load_users_csv(&path)?,
                None => groups::default_test_users(),
            };
            let db = state.supabase_anon()?;
            GroupService::add_all_users_to_group(&db, &anchor.credentials(), &users).await?;
        }
        Command::CheckUserGroup { email, add_to } => {
            let db = state.supabase_service()?;
            GroupService::check_user_group(&db, &email, add_to.as_deref()).await?;
        }
        Command::FixGroupIds { login } => {
            let db = state.supabase_anon()?;
            BuddyshareService::fix_group_ids(&db, &login.credentials()).await?;
        }
        Command::CheckRecords => {
            let db = state.supabase_service()?;
            BuddyshareService::check_records(&db).await?;
        }
        Command::DebugGroupFeed { login } => {
            let db = state.supabase_anon()?;
            BuddyshareService::debug_group_feed(&db, &login.credentials()).await?;
        }
        Command::SeedQuizzes => {
            let db = state.supabase_preferred()?;
            SeedService::seed_manual_quizzes(&db, total_days).await?;
        }
        Command::SeedActivity {
            user_id,
            group_id,
            login,
        } => {
            let (db, target) = match user_id {
                Some(user_id) => (
                    state.supabase_preferred()?,
                    SeedTarget::Ids { user_id, group_id },
                ),
                None => (
                    state.supabase_anon()?,
                    SeedTarget::Credentials(login.credentials()),
                ),
            };
            SeedService::seed_user_activity(&db, &target).await?;
        }
        Command::InspectDay { login, day } => {
            validate_day_number(day as i32, total_days).map_err(AdminError::Validation)?;
            let db = state.supabase_anon()?;
            SeedService::inspect_day_activity(&db, &login.credentials(), day, total_days).await?;
        }
        Command::InspectQuiz { day } => {
            validate_day_number(day, total_days).map_err(AdminError::Validation)?;
            let db = state.supabase_preferred()?;
            VerifyService::inspect_quiz(&db, day).await?;
        }
        Command::ExecSql {
            file,
            verify,
            login,
        } => {
            let db = state.supabase_preferred()?;
            let credentials = verify.then(|| login.credentials());
            SeedService::exec_sql(&db, &file, credentials.as_ref()).await?;
        }
    }
    Ok(())
}
