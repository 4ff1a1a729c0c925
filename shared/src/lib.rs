//! CKN Admin Shared Library
//!
//! This crate contains the table row types, quiz parsing, course content
//! helpers and validation used by the `ckn-admin` tooling. Nothing in here
//! performs I/O.

pub mod content;
pub mod errors;
pub mod models;
pub mod quiz;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use models::*;
pub use quiz::{AnswerLetter, Quiz, QuizQuestion};

/// Number of days in the CKN course
pub const COURSE_DAYS: u32 = 21;
