//! Table repositories
//!
//! Provides typed access to the backend tables the admin tooling touches.

pub mod content;
pub mod group;
pub mod profile;
pub mod quiz;
pub mod share;

pub use content::DailyContentRepository;
pub use group::{GroupMemberRepository, GroupRepository};
pub use profile::ProfileRepository;
pub use quiz::{QuizRepository, QuizResponseRepository};
pub use share::{FoodLogRepository, ShareActivityRepository, TextShareRepository};
