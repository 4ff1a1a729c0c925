//! Row types for the hosted backend's tables
//!
//! Read types tolerate partial `select` lists: columns a query did not ask
//! for deserialize to their defaults. Write types (`New*`) carry exactly
//! the columns the tooling inserts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::QuizError;
use crate::quiz::Quiz;

/// One day of course text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyContent {
    pub day_number: i32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Stored quiz for a course day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizRecord {
    pub day_number: i32,
    pub questions: Quiz,
}

/// Quiz row as read back, with `questions` left undecoded.
///
/// Rows written over time hold the payload as a wrapper object, a bare
/// list, a JSON-encoded string, or nothing at all. Decoding happens per row
/// through [`StoredQuiz::parse`] so one bad row cannot sink a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredQuiz {
    #[serde(default)]
    pub id: Value,
    pub day_number: i32,
    #[serde(default)]
    pub questions: Value,
}

/// JSON shape of a stored `questions` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    Missing,
    Encoded,
    List,
    Object,
    Other,
}

impl fmt::Display for PayloadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Missing => "missing",
            Self::Encoded => "JSON string",
            Self::List => "list",
            Self::Object => "object",
            Self::Other => "unexpected scalar",
        })
    }
}

impl StoredQuiz {
    pub fn shape(&self) -> PayloadShape {
        match &self.questions {
            Value::Null => PayloadShape::Missing,
            Value::String(_) => PayloadShape::Encoded,
            Value::Array(_) => PayloadShape::List,
            Value::Object(_) => PayloadShape::Object,
            _ => PayloadShape::Other,
        }
    }

    /// Decode the payload into a [`Quiz`]
    pub fn parse(&self) -> Result<Quiz, QuizError> {
        if self.questions.is_null() {
            return Err(QuizError::MissingQuestions);
        }
        Quiz::deserialize(&self.questions).map_err(|e| QuizError::Malformed(e.to_string()))
    }

    /// Whether any question stores its options as a letter-keyed object
    pub fn has_keyed_options(&self) -> bool {
        let decoded;
        let payload = match &self.questions {
            Value::String(text) => {
                decoded = serde_json::from_str::<Value>(text).unwrap_or(Value::Null);
                &decoded
            }
            other => other,
        };
        let items = match payload {
            Value::Array(items) => items,
            Value::Object(map) => match map.get("questions") {
                Some(Value::Array(items)) => items,
                _ => return false,
            },
            _ => return false,
        };
        items
            .iter()
            .any(|item| item.get("options").is_some_and(Value::is_object))
    }

    /// Printable row id (the column type differs between deployments)
    pub fn id_label(&self) -> String {
        match &self.id {
            Value::Null => "-".to_string(),
            Value::String(id) => id.clone(),
            other => other.to_string(),
        }
    }
}

/// Recorded quiz attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub day_number: i32,
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub total_questions: i32,
    #[serde(default, with = "timestamp::option")]
    pub answered_at: Option<DateTime<Utc>>,
}

/// Study group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    pub invite_code: Option<String>,
}

/// Group membership row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub group_id: Uuid,
    pub user_id: Option<Uuid>,
    pub role: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub joined_at: Option<DateTime<Utc>>,
}

/// Membership insert payload
#[derive(Debug, Clone, Serialize)]
pub struct NewGroupMember {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
}

impl NewGroupMember {
    /// Plain `member` role membership
    pub fn member(group_id: Uuid, user_id: Uuid) -> Self {
        Self {
            group_id,
            user_id,
            role: "member".to_string(),
        }
    }
}

/// Profile insert payload for the `profiles` table
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
}

/// Row of the `user_profiles` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub display_name: Option<String>,
}

/// Free-text learning share
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextShare {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub day_number: Option<i32>,
    #[serde(default)]
    pub content: String,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Text share insert payload
#[derive(Debug, Clone, Serialize)]
pub struct NewTextShare {
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<Uuid>,
    pub day_number: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Food photo log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub food_name: Option<String>,
    pub image_url: Option<String>,
    pub user_input: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Food detected in a photo, as stored in `food_logs.detected_foods`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectedFood {
    pub name: String,
    pub description: String,
    pub portion: String,
}

/// Food log insert payload
#[derive(Debug, Clone, Serialize)]
pub struct NewFoodLog {
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<Uuid>,
    pub image_url: String,
    pub detected_foods: Vec<DetectedFood>,
    pub user_input: String,
    pub created_at: DateTime<Utc>,
}

/// Line item of a food log
#[derive(Debug, Clone, Serialize)]
pub struct NewFoodLogItem {
    pub food_log_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub portion: String,
}

impl NewFoodLogItem {
    pub fn from_detected(food_log_id: Uuid, user_id: Uuid, food: &DetectedFood) -> Self {
        Self {
            food_log_id,
            user_id,
            name: food.name.clone(),
            description: food.description.clone(),
            portion: food.portion.clone(),
        }
    }
}

/// Comment on a share
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareComment {
    pub id: Uuid,
    pub share_id: Option<Uuid>,
    #[serde(default)]
    pub share_type: String,
    #[serde(default)]
    pub content: String,
}

/// Reaction on a share
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareReaction {
    pub id: Uuid,
    pub share_id: Option<Uuid>,
    #[serde(default)]
    pub share_type: String,
    pub user_id: Option<Uuid>,
}

/// Lenient timestamp handling.
///
/// `timestamptz` columns arrive as RFC 3339; plain `timestamp` columns
/// arrive without an offset and are taken as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};

    /// Parse a backend timestamp string
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(ts) => serializer.serialize_some(&ts.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}"))),
            }
        }
    }
}
