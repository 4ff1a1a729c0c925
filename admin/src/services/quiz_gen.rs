//! Quiz generation from course content

use std::time::Duration;

use ckn_admin_shared::quiz::{build_quiz_prompt, parse_quiz_response};
use ckn_admin_shared::{DailyContent, Quiz};
use tracing::{debug, error, info, instrument, warn};

use crate::ai::CompletionProvider;
use crate::config::GenerationConfig;
use crate::error::{AdminError, AdminResult};
use crate::report;
use crate::repositories::{DailyContentRepository, QuizRepository};
use crate::supabase::SupabaseClient;

/// Outcome of a full generation run
#[derive(Debug, Default)]
pub struct GenerationSummary {
    pub total: usize,
    pub succeeded: Vec<i32>,
    pub failed: Vec<i32>,
}

pub struct QuizGenerationService;

impl QuizGenerationService {
    /// Generate a validated quiz for one day.
    ///
    /// Unparseable or structurally invalid completions are retried up to
    /// `policy.max_attempts` times; the last quiz error is returned when
    /// every attempt fails. Provider and transport errors are returned
    /// immediately.
    #[instrument(skip(provider, policy, title, content), fields(provider = provider.name()))]
    pub async fn generate_for_day(
        provider: &dyn CompletionProvider,
        policy: &GenerationConfig,
        day_number: i32,
        title: &str,
        content: &str,
    ) -> AdminResult<Quiz> {
        let prompt = build_quiz_prompt(day_number, title, content);
        let attempts = policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            debug!(attempt, "Requesting quiz");
            let text = provider.complete(&prompt).await?;

            let parsed = parse_quiz_response(&text)
                .and_then(|quiz| quiz.validate(policy.min_questions).map(|_| quiz));

            match parsed {
                Ok(quiz) => {
                    info!(attempt, questions = quiz.len(), "Quiz generated");
                    return Ok(quiz);
                }
                Err(e) => {
                    warn!(attempt, max_attempts = attempts, error = %e, "Rejected completion");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(AdminError::Quiz(e)),
            None => Err(AdminError::Provider("no generation attempts were made".to_string())),
        }
    }

    /// Generate and store quizzes for every imported day
    pub async fn generate_all(
        db: &SupabaseClient,
        provider: &dyn CompletionProvider,
        policy: &GenerationConfig,
        delay: Duration,
    ) -> AdminResult<GenerationSummary> {
        report::banner(&format!("Generating quizzes with {}", provider.name()));

        let days = DailyContentRepository::list_all(db).await?;
        if days.is_empty() {
            return Err(AdminError::NotFound(
                "no daily_content rows; import the course content first".to_string(),
            ));
        }
        println!("Found {} days of content", days.len());

        let mut summary = GenerationSummary {
            total: days.len(),
            ..Default::default()
        };

        for (index, day) in days.iter().enumerate() {
            println!();
            println!("Day {}: {}", day.day_number, day.title);

            match Self::generate_and_store(db, provider, policy, day).await {
                Ok(quiz) => {
                    report::ok(format!("Saved {} questions", quiz.len()));
                    summary.succeeded.push(day.day_number);
                }
                Err(e) => {
                    error!(day = day.day_number, error = %e, "Quiz generation failed");
                    report::fail(format!("Day {} failed: {e}", day.day_number));
                    summary.failed.push(day.day_number);
                }
            }

            if index + 1 < days.len() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        println!();
        report::rule();
        println!(
            "Generated {}/{} quizzes",
            summary.succeeded.len(),
            summary.total
        );
        if !summary.failed.is_empty() {
            println!("Failed days: {:?}", summary.failed);
        }
        info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "Quiz generation finished"
        );
        Ok(summary)
    }

    /// Regenerate and store the quiz for a single day
    pub async fn regenerate_day(
        db: &SupabaseClient,
        provider: &dyn CompletionProvider,
        policy: &GenerationConfig,
        day_number: i32,
    ) -> AdminResult<Quiz> {
        report::banner(&format!(
            "Regenerating day {day_number} with {}",
            provider.name()
        ));

        let day = DailyContentRepository::get_by_day(db, day_number).await?;
        println!("Title: {}", day.title);

        let quiz = Self::generate_and_store(db, provider, policy, &day).await?;
        report::ok(format!("Saved {} questions for day {day_number}", quiz.len()));

        if let Some(sample) = quiz.questions.first() {
            println!();
            println!("Sample question: {}", sample.question);
            for option in &sample.options {
                println!("  {option}");
            }
            match sample.correct_option() {
                Some(option) => println!("Answer: {option}"),
                None => println!("Answer: {}", sample.correct_answer),
            }
        }
        Ok(quiz)
    }

    async fn generate_and_store(
        db: &SupabaseClient,
        provider: &dyn CompletionProvider,
        policy: &GenerationConfig,
        day: &DailyContent,
    ) -> AdminResult<Quiz> {
        let quiz =
            Self::generate_for_day(provider, policy, day.day_number, &day.title, &day.content)
                .await?;
        QuizRepository::upsert(db, day.day_number, &quiz).await?;
        Ok(quiz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ckn_admin_shared::QuizError;
    use std::sync::Mutex;

    /// Provider that replays canned results in order
    struct ScriptedProvider {
        replies: Mutex<Vec<AdminResult<String>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedProvider {
        fn new(mut replies: Vec<AdminResult<String>>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _prompt: &str) -> AdminResult<String> {
            *self.calls.lock().unwrap() += 1;
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(AdminError::Provider("script exhausted".to_string())))
        }
    }

    fn valid_quiz_text() -> String {
        let question = r#"{"question":"Q?","options":["A. 1","B. 2","C. 3","D. 4"],"correct_answer":"B","explanation":"because"}"#;
        format!("```json\n{{\"questions\":[{question},{question},{question}]}}\n```")
    }

    fn policy() -> GenerationConfig {
        GenerationConfig {
            max_attempts: 3,
            min_questions: 3,
        }
    }

    #[tokio::test]
    async fn test_retries_until_valid() {
        let provider = ScriptedProvider::new(vec![Ok("not json".to_string()), Ok(valid_quiz_text())]);
        let quiz = QuizGenerationService::generate_for_day(&provider, &policy(), 1, "t", "c")
            .await
            .unwrap();
        assert_eq!(quiz.len(), 3);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let provider = ScriptedProvider::new(vec![
            Ok("nope".to_string()),
            Ok(r#"{"quiz": []}"#.to_string()),
            Ok(r#"{"questions": []}"#.to_string()),
        ]);
        let result =
            QuizGenerationService::generate_for_day(&provider, &policy(), 1, "t", "c").await;
        assert!(matches!(
            result,
            Err(AdminError::Quiz(QuizError::TooFewQuestions { .. }))
        ));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_provider_error_is_not_retried() {
        let provider = ScriptedProvider::new(vec![
            Err(AdminError::Provider("HTTP 500".to_string())),
            Ok(valid_quiz_text()),
        ]);
        let result =
            QuizGenerationService::generate_for_day(&provider, &policy(), 1, "t", "c").await;
        assert!(matches!(result, Err(AdminError::Provider(_))));
        assert_eq!(provider.calls(), 1);
    }
}
