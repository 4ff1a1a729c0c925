//! Error types for the CKN admin tooling

use thiserror::Error;

/// Errors raised while parsing or checking a generated quiz
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("Response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Response has no 'questions' field")]
    MissingQuestions,

    #[error("Malformed quiz payload: {0}")]
    Malformed(String),

    #[error("Expected at least {expected} questions, got {actual}")]
    TooFewQuestions { expected: usize, actual: usize },

    #[error("Question {index} has {count} options, expected 4")]
    WrongOptionCount { index: usize, count: usize },

    #[error("Question {index} has no text")]
    EmptyQuestion { index: usize },
}

/// Errors raised while mapping course content files to days
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("Day {day} is claimed by both '{first}' and '{second}'")]
    DuplicateDay {
        day: u32,
        first: String,
        second: String,
    },

    #[error("Day {day} is outside the course (1-{max})")]
    DayOutOfRange { day: u32, max: u32 },
}
