//! Checks on operator input: credentials, day numbers, invite codes, scores

use std::fmt;

use serde::Deserialize;
use validator::Validate;

/// Email/password pair used to sign in as a course user
#[derive(Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Check an email address typed on the command line
pub fn validate_email(email: &str) -> Result<(), String> {
    let pattern = regex_lite::Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$")
        .map_err(|e| format!("email pattern: {e}"))?;
    match email {
        "" => Err("Email is required".to_string()),
        e if e.len() > 254 => Err("Email is longer than 254 characters".to_string()),
        e if pattern.is_match(e) => Ok(()),
        e => Err(format!("{e:?} is not an email address")),
    }
}

/// Validate a course day number (1..=total_days)
pub fn validate_day_number(day: i32, total_days: u32) -> Result<(), String> {
    if day < 1 {
        return Err("Day number must be at least 1".to_string());
    }
    if day as u32 > total_days {
        return Err(format!("Day number must be at most {total_days}"));
    }
    Ok(())
}

/// Validate a group invite code
pub fn validate_invite_code(code: &str) -> Result<(), String> {
    if code.trim().is_empty() {
        return Err("Invite code cannot be empty".to_string());
    }
    if code.len() > 32 {
        return Err("Invite code too long".to_string());
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err("Invite code may only contain letters, digits, '-' and '_'".to_string());
    }
    Ok(())
}

/// Validate a quiz score against its question count
pub fn validate_score(score: i32, total_questions: i32) -> Result<(), String> {
    if total_questions < 1 {
        return Err("Quiz must have at least one question".to_string());
    }
    if score < 0 || score > total_questions {
        return Err(format!("Score must be between 0 and {total_questions}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[rstest::rstest]
    #[case("test55@andywong.me", true)]
    #[case("ckn.user@mail.example.com.tw", true)]
    #[case("", false)]
    #[case("test55", false)]
    #[case("test55@localhost", false)]
    #[case("two words@andywong.me", false)]
    #[case("a@b@andywong.me", false)]
    fn test_validate_email(#[case] email: &str, #[case] valid: bool) {
        assert_eq!(validate_email(email).is_ok(), valid);
    }

    #[test]
    fn test_credentials_validate() {
        assert!(Credentials::new("test77@andywong.me", "123456").validate().is_ok());
        assert!(Credentials::new("not-an-email", "123456").validate().is_err());
        assert!(Credentials::new("test77@andywong.me", "123").validate().is_err());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("test77@andywong.me", "hunter22");
        let out = format!("{creds:?}");
        assert!(out.contains("test77@andywong.me"));
        assert!(!out.contains("hunter22"));
    }

    #[test]
    fn test_validate_day_number() {
        assert!(validate_day_number(1, 21).is_ok());
        assert!(validate_day_number(21, 21).is_ok());
        assert!(validate_day_number(0, 21).is_err());
        assert!(validate_day_number(-3, 21).is_err());
        assert!(validate_day_number(22, 21).is_err());
    }

    #[test]
    fn test_validate_invite_code() {
        assert!(validate_invite_code("TEST001").is_ok());
        assert!(validate_invite_code("ckn_2025-oct").is_ok());
        assert!(validate_invite_code("").is_err());
        assert!(validate_invite_code("has space").is_err());
        assert!(validate_invite_code(&"A".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_score() {
        assert!(validate_score(2, 3).is_ok());
        assert!(validate_score(0, 3).is_ok());
        assert!(validate_score(4, 3).is_err());
        assert!(validate_score(-1, 3).is_err());
        assert!(validate_score(0, 0).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_valid_day_range(day in 1i32..=21) {
            prop_assert!(validate_day_number(day, 21).is_ok());
        }

        #[test]
        fn prop_invalid_day_above_max(day in 22i32..1000) {
            prop_assert!(validate_day_number(day, 21).is_err());
        }
    }
}
