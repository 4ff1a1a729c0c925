//! Services layer
//!
//! Each service is a unit struct with async associated functions that take
//! the backend client (and provider, where needed) explicitly.

pub mod buddyshare;
pub mod groups;
pub mod import;
pub mod quiz_gen;
pub mod seed;
pub mod verify;

pub use buddyshare::BuddyshareService;
pub use groups::GroupService;
pub use import::ImportService;
pub use quiz_gen::QuizGenerationService;
pub use seed::SeedService;
pub use verify::VerifyService;
