//! Post-import verification of content and quizzes

use ckn_admin_shared::content::preview;
use ckn_admin_shared::quiz::QUESTIONS_PER_DAY;
use ckn_admin_shared::{Quiz, QuizError, StoredQuiz};
use tracing::{info, warn};

use crate::error::{AdminError, AdminResult};
use crate::report;
use crate::repositories::{DailyContentRepository, QuizRepository};
use crate::supabase::SupabaseClient;

/// Day preferred for the sample quiz printout
const SAMPLE_DAY: i32 = 3;

#[derive(Debug, Default)]
pub struct VerificationReport {
    pub content_days: Vec<i32>,
    pub quiz_days: Vec<i32>,
    pub missing_content: Vec<i32>,
    pub missing_quizzes: Vec<i32>,
    /// Days whose stored payload does not decode
    pub unreadable_quizzes: Vec<i32>,
    pub total_questions: usize,
    /// Tables that could not be read, with the error
    pub failed_sections: Vec<(&'static str, String)>,
}

impl VerificationReport {
    pub fn is_ready(&self) -> bool {
        self.missing_content.is_empty()
            && self.missing_quizzes.is_empty()
            && self.unreadable_quizzes.is_empty()
            && self.failed_sections.is_empty()
    }
}

/// Days in `1..=total_days` that are not in `present`
pub fn missing_days(present: &[i32], total_days: u32) -> Vec<i32> {
    (1..=total_days as i32)
        .filter(|day| !present.contains(day))
        .collect()
}

/// Stored quizzes split into decoded ones and failures, both in row order
fn decode_rows(rows: &[StoredQuiz]) -> (Vec<(i32, Quiz)>, Vec<(i32, QuizError)>) {
    let mut parsed = Vec::new();
    let mut failed = Vec::new();
    for row in rows {
        match row.parse() {
            Ok(quiz) => parsed.push((row.day_number, quiz)),
            Err(e) => failed.push((row.day_number, e)),
        }
    }
    (parsed, failed)
}

pub struct VerifyService;

impl VerifyService {
    /// Check both tables. A table that cannot be read is reported and the
    /// other is still checked.
    pub async fn verify(db: &SupabaseClient, total_days: u32) -> AdminResult<VerificationReport> {
        report::banner("Verifying course data");
        let mut result = VerificationReport::default();

        report::section("daily_content");
        match DailyContentRepository::list_summaries(db).await {
            Ok(summaries) => {
                result.content_days = summaries.iter().map(|s| s.day_number).collect();
                result.missing_content = missing_days(&result.content_days, total_days);
                println!("  Days stored: {}/{}", summaries.len(), total_days);
                if result.missing_content.is_empty() {
                    report::ok("No missing days");
                } else {
                    report::warn(format!("Missing days: {:?}", result.missing_content));
                }
                for summary in summaries.iter().take(5) {
                    report::item(format!("Day {}: {}", summary.day_number, summary.title));
                }
            }
            Err(e) => {
                warn!(error = %e, "Could not read daily_content");
                report::fail(format!("Could not read daily_content: {e}"));
                result.failed_sections.push(("daily_content", e.to_string()));
            }
        }

        report::section("quizzes");
        match QuizRepository::list_all(db).await {
            Ok(rows) => {
                let (parsed, failed) = decode_rows(&rows);
                result.quiz_days = rows.iter().map(|row| row.day_number).collect();
                result.missing_quizzes = missing_days(&result.quiz_days, total_days);
                result.unreadable_quizzes = failed.iter().map(|(day, _)| *day).collect();
                result.total_questions = parsed.iter().map(|(_, quiz)| quiz.len()).sum();

                println!("  Quizzes stored: {}/{}", rows.len(), total_days);
                println!("  Readable: {}/{}", parsed.len(), rows.len());
                println!(
                    "  Total questions: {} (expected about {})",
                    result.total_questions,
                    total_days as usize * QUESTIONS_PER_DAY
                );
                if result.missing_quizzes.is_empty() {
                    report::ok("No missing quizzes");
                } else {
                    report::warn(format!("Missing quizzes: {:?}", result.missing_quizzes));
                }
                if !failed.is_empty() {
                    report::warn(format!("Unreadable quizzes: {:?}", result.unreadable_quizzes));
                    for (day, e) in &failed {
                        warn!(day, error = %e, "Stored quiz does not decode");
                        report::item(format!("Day {day}: {e}"));
                    }
                }

                if let Some((day, quiz)) = sample_quiz(&parsed) {
                    report::section(&format!("Sample quiz (day {day})"));
                    print_questions(quiz);
                }
            }
            Err(e) => {
                warn!(error = %e, "Could not read quizzes");
                report::fail(format!("Could not read quizzes: {e}"));
                result.failed_sections.push(("quizzes", e.to_string()));
            }
        }

        println!();
        report::rule();
        if result.is_ready() {
            println!("✅ Course data is complete and ready");
        } else {
            println!("⚠️  Course data is incomplete");
        }
        info!(
            content_days = result.content_days.len(),
            quiz_days = result.quiz_days.len(),
            unreadable = result.unreadable_quizzes.len(),
            ready = result.is_ready(),
            "Verification finished"
        );
        Ok(result)
    }

    /// Show how one day's quiz is stored and whether it decodes
    pub async fn inspect_quiz(db: &SupabaseClient, day_number: i32) -> AdminResult<StoredQuiz> {
        report::banner(&format!("Stored quiz for day {day_number}"));

        let row = QuizRepository::get_by_day(db, day_number)
            .await?
            .ok_or_else(|| AdminError::NotFound(format!("no quiz stored for day {day_number}")))?;

        println!("  Quiz ID: {}", row.id_label());
        println!("  Day number: {}", row.day_number);
        println!("  Payload shape: {}", row.shape());
        println!(
            "  Letter-keyed options: {}",
            if row.has_keyed_options() { "yes" } else { "no" }
        );

        match row.parse() {
            Ok(quiz) => {
                report::ok(format!("Decodes to {} questions", quiz.len()));
                print_questions(&quiz);
            }
            Err(e) => {
                warn!(day = day_number, error = %e, "Stored quiz does not decode");
                report::fail(format!("Does not decode: {e}"));
                let raw = serde_json::to_string_pretty(&row.questions)
                    .unwrap_or_else(|_| row.questions.to_string());
                println!("{raw}");
            }
        }
        Ok(row)
    }
}

fn sample_quiz(quizzes: &[(i32, Quiz)]) -> Option<&(i32, Quiz)> {
    quizzes
        .iter()
        .find(|(day, _)| *day == SAMPLE_DAY)
        .or_else(|| quizzes.first())
}

fn print_questions(quiz: &Quiz) {
    for (i, question) in quiz.questions.iter().enumerate() {
        println!("  Q{}: {}", i + 1, preview(&question.question, 60));
        for option in &question.options {
            println!("      {option}");
        }
        println!("      Answer: {}", question.correct_answer);
    }
}
