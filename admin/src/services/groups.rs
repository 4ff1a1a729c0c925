//! Group membership management

use std::path::Path;

use ckn_admin_shared::content::display_name_from_email;
use ckn_admin_shared::validation::{validate_email, validate_invite_code, Credentials};
use ckn_admin_shared::{Group, NewGroupMember, NewProfile};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AdminError, AdminResult};
use crate::report;
use crate::repositories::{GroupMemberRepository, GroupRepository, ProfileRepository};
use crate::supabase::SupabaseClient;

/// Password shared by the built-in test accounts
const TEST_PASSWORD: &str = "123456";

/// Built-in test accounts used when no user list is supplied
pub fn default_test_users() -> Vec<Credentials> {
    [
        "test55@andywong.me",
        "test77@andywong.me",
        "test63@andywong.me",
        "test44@andywong.me",
        "test88@andywong.me",
        "test99@andywong.me",
        "test5@andywong.me",
        "info8connect2@gmail.com",
        "test234@andywong.me",
        "info@andywong.me",
    ]
    .into_iter()
    .map(|email| Credentials::new(email, TEST_PASSWORD))
    .collect()
}

/// Read an `email,password` CSV user list
pub fn load_users_csv(path: &Path) -> AdminResult<Vec<Credentials>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let mut users = Vec::new();
    for (i, record) in reader.deserialize::<Credentials>().enumerate() {
        let credentials = record?;
        credentials.validate().map_err(|e| {
            // Row 1 is the header
            AdminError::Validation(format!("row {}: {e}", i + 2))
        })?;
        users.push(credentials);
    }
    if users.is_empty() {
        return Err(AdminError::Validation(format!(
            "{} has no users",
            path.display()
        )));
    }
    Ok(users)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipOutcome {
    Added,
    AlreadyMember,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Membership state of one user
#[derive(Debug)]
pub struct UserGroupStatus {
    pub user_id: Uuid,
    pub confirmed: bool,
    pub groups: Vec<Group>,
    /// Set when the user had no group and was added to one
    pub fixed: Option<Group>,
}

pub struct GroupService;

impl GroupService {
    /// Add a user to the group with `invite_code`
    #[instrument(skip(db))]
    pub async fn add_user_to_group(
        db: &SupabaseClient,
        user_id: Uuid,
        invite_code: &str,
    ) -> AdminResult<MembershipOutcome> {
        validate_invite_code(invite_code).map_err(AdminError::Validation)?;

        let group = GroupRepository::find_by_invite_code(db, invite_code)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    AdminError::NotFound(format!("no group with invite code {invite_code}"))
                } else {
                    e
                }
            })?;
        report::ok(format!("Found group: {} ({})", group.name, group.id));

        let outcome = Self::ensure_member(db, &group, user_id).await?;
        match outcome {
            MembershipOutcome::AlreadyMember => {
                report::warn("User is already a member of this group")
            }
            MembershipOutcome::Added => {
                report::ok(format!("Added user {user_id} to group: {}", group.name))
            }
        }
        Ok(outcome)
    }

    /// Put every user in the anchor user's group
    pub async fn add_all_users_to_group(
        db: &SupabaseClient,
        anchor: &Credentials,
        users: &[Credentials],
    ) -> AdminResult<BatchSummary> {
        report::banner("Adding users to the shared group");

        println!("1. Resolving the group of {}", anchor.email);
        let session = db.auth().sign_in_with_password(anchor).await?;
        let anchor_db = db.with_session(&session);
        let group_id = GroupMemberRepository::first_group_for_user(&anchor_db, session.user_id())
            .await?
            .ok_or_else(|| AdminError::NotFound(format!("{} is not in any group", anchor.email)))?;
        report::ok(format!("Group ID: {group_id}"));

        println!();
        println!("2. Processing {} users", users.len());
        let mut summary = BatchSummary::default();
        for user in users {
            println!();
            println!("   {}", user.email);
            match Self::join_as_user(db, user, group_id).await {
                Ok(_) => summary.succeeded.push(user.email.clone()),
                Err(e) => {
                    warn!(email = %user.email, error = %e, "Could not add user to group");
                    report::fail(format!("Failed: {e}"));
                    summary.failed.push((user.email.clone(), e.to_string()));
                }
            }
        }

        println!();
        println!("3. Summary");
        report::ok(format!("Succeeded: {} users", summary.succeeded.len()));
        for email in &summary.succeeded {
            report::item(email);
        }
        if !summary.failed.is_empty() {
            report::fail(format!("Failed: {} users", summary.failed.len()));
            for (email, reason) in &summary.failed {
                report::item(format!("{email}: {reason}"));
            }
        }
        info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "Group batch finished"
        );
        Ok(summary)
    }

    /// Sign in as `user`, join the group and create a profile
    async fn join_as_user(
        db: &SupabaseClient,
        user: &Credentials,
        group_id: Uuid,
    ) -> AdminResult<MembershipOutcome> {
        let session = db.auth().sign_in_with_password(user).await?;
        let user_db = db.with_session(&session);
        let user_id = session.user_id();
        report::ok(format!("Signed in, user ID {user_id}"));

        if GroupMemberRepository::is_member(&user_db, group_id, user_id).await? {
            report::ok("Already in group");
            return Ok(MembershipOutcome::AlreadyMember);
        }

        GroupMemberRepository::add_member(&user_db, &NewGroupMember::member(group_id, user_id))
            .await?;
        report::ok("Added to group");

        let profile = NewProfile {
            user_id,
            email: user.email.clone(),
            display_name: display_name_from_email(&user.email),
        };
        match ProfileRepository::create(&user_db, &profile).await {
            Ok(()) => report::ok(format!("Profile created ({})", profile.display_name)),
            Err(e) => {
                warn!(email = %user.email, error = %e, "Profile creation failed");
                report::warn(format!("Profile creation failed (may already exist): {e}"));
            }
        }
        Ok(MembershipOutcome::Added)
    }

    /// Report a user's memberships; optionally add a group-less user to
    /// the group with `fix_invite_code`
    pub async fn check_user_group(
        db: &SupabaseClient,
        email: &str,
        fix_invite_code: Option<&str>,
    ) -> AdminResult<UserGroupStatus> {
        validate_email(email).map_err(AdminError::Validation)?;
        report::banner(&format!("Group membership of {email}"));

        let user = db
            .auth()
            .admin_find_user_by_email(email)
            .await?
            .ok_or_else(|| AdminError::NotFound(format!("no user with email {email}")))?;

        report::ok(format!("Found user: {}", user.id));
        println!("     Email confirmed: {}", user.is_confirmed());
        if let Some(created_at) = user.created_at {
            println!("     Created at: {created_at}");
        }

        let memberships = GroupMemberRepository::memberships_for_user(db, user.id).await?;
        let mut status = UserGroupStatus {
            user_id: user.id,
            confirmed: user.is_confirmed(),
            groups: Vec::new(),
            fixed: None,
        };

        if !memberships.is_empty() {
            println!();
            report::ok(format!("User is in {} group(s)", memberships.len()));
            for membership in &memberships {
                let group = GroupRepository::find_by_id(db, membership.group_id).await?;
                let name = group
                    .as_ref()
                    .map(|g| g.name.clone())
                    .unwrap_or_else(|| membership.group_id.to_string());
                report::item(format!(
                    "Group: {name}, role: {}, joined: {}",
                    membership.role.as_deref().unwrap_or("-"),
                    membership
                        .joined_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "-".to_string())
                ));
                status.groups.extend(group);
            }
            return Ok(status);
        }

        report::fail("User is NOT in any group");
        match fix_invite_code {
            Some(code) => {
                let group = GroupRepository::find_by_invite_code(db, code).await?;
                Self::ensure_member(db, &group, user.id).await?;
                report::ok(format!("Added user to group: {}", group.name));
                status.fixed = Some(group);
            }
            None => println!("     Re-run with --add-to <INVITE_CODE> to add them"),
        }
        Ok(status)
    }

    async fn ensure_member(
        db: &SupabaseClient,
        group: &Group,
        user_id: Uuid,
    ) -> AdminResult<MembershipOutcome> {
        if GroupMemberRepository::is_member(db, group.id, user_id).await? {
            return Ok(MembershipOutcome::AlreadyMember);
        }
        GroupMemberRepository::add_member(db, &NewGroupMember::member(group.id, user_id)).await?;
        info!(group_id = %group.id, user_id = %user_id, "Membership added");
        Ok(MembershipOutcome::Added)
    }
}
