//! Quiz and quiz response repositories

use ckn_admin_shared::{Quiz, QuizRecord, QuizResponse, StoredQuiz};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AdminResult;
use crate::supabase::SupabaseClient;

const QUIZZES: &str = "quizzes";
const RESPONSES: &str = "quiz_responses";

/// Stored procedure that records a quiz attempt
const SAVE_RESPONSE_FN: &str = "save_quiz_response";

pub struct QuizRepository;

impl QuizRepository {
    /// Insert or replace the quiz for a day
    pub async fn upsert(db: &SupabaseClient, day_number: i32, quiz: &Quiz) -> AdminResult<()> {
        let record = QuizRecord {
            day_number,
            questions: quiz.clone(),
        };
        let _: Vec<serde_json::Value> = db
            .from(QUIZZES)
            .on_conflict("day_number")
            .select("day_number")
            .upsert(&record)
            .await?;
        Ok(())
    }

    /// Every stored quiz, in day order, payloads undecoded
    pub async fn list_all(db: &SupabaseClient) -> AdminResult<Vec<StoredQuiz>> {
        db.from(QUIZZES)
            .select("day_number, questions")
            .order("day_number", true)
            .execute()
            .await
    }

    pub async fn get_by_day(db: &SupabaseClient, day_number: i32) -> AdminResult<Option<StoredQuiz>> {
        db.from(QUIZZES)
            .select("*")
            .eq("day_number", day_number)
            .maybe_first()
            .await
    }
}

#[derive(Serialize)]
struct SaveResponseArgs {
    p_user_id: Uuid,
    p_day_number: i32,
    p_score: i32,
    p_total_questions: i32,
}

pub struct QuizResponseRepository;

impl QuizResponseRepository {
    /// Record an attempt through the `save_quiz_response` procedure
    pub async fn save(
        db: &SupabaseClient,
        user_id: Uuid,
        day_number: i32,
        score: i32,
        total_questions: i32,
    ) -> AdminResult<serde_json::Value> {
        let args = SaveResponseArgs {
            p_user_id: user_id,
            p_day_number: day_number,
            p_score: score,
            p_total_questions: total_questions,
        };
        db.rpc(SAVE_RESPONSE_FN, &args).await
    }

    /// The user's attempts, in day order
    pub async fn list_for_user(db: &SupabaseClient, user_id: Uuid) -> AdminResult<Vec<QuizResponse>> {
        db.from(RESPONSES)
            .select("id, user_id, day_number, score, total_questions, answered_at")
            .eq("user_id", user_id)
            .order("day_number", true)
            .execute()
            .await
    }
}
