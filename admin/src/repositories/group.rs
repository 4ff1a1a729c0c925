//! Group and membership repositories

use ckn_admin_shared::{Group, GroupMember, NewGroupMember};
use uuid::Uuid;

use crate::error::AdminResult;
use crate::supabase::SupabaseClient;

const GROUPS: &str = "groups";
const MEMBERS: &str = "group_members";

pub struct GroupRepository;

impl GroupRepository {
    /// Group by invite code; `NotFound` when no group uses the code
    pub async fn find_by_invite_code(db: &SupabaseClient, invite_code: &str) -> AdminResult<Group> {
        db.from(GROUPS)
            .select("id, name, invite_code")
            .eq("invite_code", invite_code)
            .single()
            .await
    }

    pub async fn find_by_id(db: &SupabaseClient, group_id: Uuid) -> AdminResult<Option<Group>> {
        db.from(GROUPS)
            .select("id, name, invite_code")
            .eq("id", group_id)
            .maybe_first()
            .await
    }

    pub async fn list(db: &SupabaseClient, limit: usize) -> AdminResult<Vec<Group>> {
        db.from(GROUPS)
            .select("id, name, invite_code")
            .limit(limit)
            .execute()
            .await
    }
}

pub struct GroupMemberRepository;

impl GroupMemberRepository {
    /// Every membership of a user, oldest first
    pub async fn memberships_for_user(
        db: &SupabaseClient,
        user_id: Uuid,
    ) -> AdminResult<Vec<GroupMember>> {
        db.from(MEMBERS)
            .select("group_id, user_id, role, joined_at")
            .eq("user_id", user_id)
            .order("joined_at", true)
            .execute()
            .await
    }

    /// The group the user joined first, if any
    pub async fn first_group_for_user(
        db: &SupabaseClient,
        user_id: Uuid,
    ) -> AdminResult<Option<Uuid>> {
        let membership: Option<GroupMember> = db
            .from(MEMBERS)
            .select("group_id, user_id, role, joined_at")
            .eq("user_id", user_id)
            .order("joined_at", true)
            .maybe_first()
            .await?;
        Ok(membership.map(|m| m.group_id))
    }

    pub async fn is_member(db: &SupabaseClient, group_id: Uuid, user_id: Uuid) -> AdminResult<bool> {
        let existing: Option<GroupMember> = db
            .from(MEMBERS)
            .select("group_id, user_id, role, joined_at")
            .eq("group_id", group_id)
            .eq("user_id", user_id)
            .maybe_first()
            .await?;
        Ok(existing.is_some())
    }

    pub async fn add_member(db: &SupabaseClient, member: &NewGroupMember) -> AdminResult<()> {
        let _: Vec<serde_json::Value> = db.from(MEMBERS).insert(member).await?;
        Ok(())
    }

    pub async fn members_of_group(
        db: &SupabaseClient,
        group_id: Uuid,
    ) -> AdminResult<Vec<GroupMember>> {
        db.from(MEMBERS)
            .select("group_id, user_id, role, joined_at")
            .eq("group_id", group_id)
            .order("joined_at", true)
            .execute()
            .await
    }

    pub async fn list(db: &SupabaseClient, limit: usize) -> AdminResult<Vec<GroupMember>> {
        db.from(MEMBERS)
            .select("group_id, user_id, role, joined_at")
            .limit(limit)
            .execute()
            .await
    }
}
