//! Quiz types and parsing of model-generated quiz payloads
//!
//! Completion endpoints are asked for strict JSON but routinely wrap it in a
//! markdown fence, label answers as `"B. ..."`, or return options keyed by
//! letter. Stored rows written by older tooling come in several shapes too.
//! Everything here funnels those variants into one typed [`Quiz`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::errors::QuizError;

/// Options every question must carry
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Questions requested per day
pub const QUESTIONS_PER_DAY: usize = 3;

/// Correct-answer letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnswerLetter {
    A,
    B,
    C,
    D,
}

impl AnswerLetter {
    pub const ALL: [AnswerLetter; 4] = [Self::A, Self::B, Self::C, Self::D];

    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }

    /// Zero-based option index
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }

    /// Parse an answer the way models tend to write it.
    ///
    /// Accepts `"B"`, `"b"`, `"B. 選項"`, `"(B)"` and `"B）"`. Rejects
    /// anything where the letter runs into another ASCII letter or digit.
    pub fn parse_loose(raw: &str) -> Option<Self> {
        let trimmed = raw
            .trim()
            .trim_start_matches(['(', '（', '['])
            .trim_start();
        let mut chars = trimmed.chars();
        let letter = match chars.next()?.to_ascii_uppercase() {
            'A' => Self::A,
            'B' => Self::B,
            'C' => Self::C,
            'D' => Self::D,
            _ => return None,
        };
        match chars.next() {
            Some(next) if next.is_ascii_alphanumeric() => None,
            _ => Some(letter),
        }
    }
}

impl fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl Serialize for AnswerLetter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.as_char())
    }
}

impl<'de> Deserialize<'de> for AnswerLetter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse_loose(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid correct_answer: {raw:?}")))
    }
}

/// One multiple-choice question
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizQuestion {
    pub question: String,
    #[serde(deserialize_with = "deserialize_options")]
    pub options: Vec<String>,
    pub correct_answer: AnswerLetter,
    #[serde(default)]
    pub explanation: String,
}

impl QuizQuestion {
    /// Text of the option the answer letter points at
    pub fn correct_option(&self) -> Option<&str> {
        self.options
            .get(self.correct_answer.index())
            .map(String::as_str)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOptions {
    List(Vec<String>),
    Keyed(BTreeMap<String, String>),
}

/// Options arrive either as a list or as an object keyed by letter.
/// Keyed options are rendered as `"A. text"` in letter order.
fn deserialize_options<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawOptions::deserialize(deserializer)? {
        RawOptions::List(list) => list,
        RawOptions::Keyed(map) => map
            .into_iter()
            .map(|(key, text)| {
                let key = key.trim().to_uppercase();
                if text.trim_start().starts_with(&format!("{key}.")) {
                    text
                } else {
                    format!("{key}. {text}")
                }
            })
            .collect(),
    })
}

/// A day's quiz
///
/// Serializes as the `{"questions": [...]}` wrapper stored in
/// `quizzes.questions`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuiz {
    Wrapped { questions: Vec<QuizQuestion> },
    Bare(Vec<QuizQuestion>),
    Encoded(String),
}

impl<'de> Deserialize<'de> for Quiz {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawQuiz::deserialize(deserializer)? {
            RawQuiz::Wrapped { questions } | RawQuiz::Bare(questions) => Ok(Self { questions }),
            RawQuiz::Encoded(text) => serde_json::from_str(&text).map_err(de::Error::custom),
        }
    }
}

impl Quiz {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Structural check applied before a generated quiz is saved
    pub fn validate(&self, min_questions: usize) -> Result<(), QuizError> {
        if self.questions.len() < min_questions {
            return Err(QuizError::TooFewQuestions {
                expected: min_questions,
                actual: self.questions.len(),
            });
        }
        for (i, question) in self.questions.iter().enumerate() {
            let index = i + 1;
            if question.question.trim().is_empty() {
                return Err(QuizError::EmptyQuestion { index });
            }
            if question.options.len() != OPTIONS_PER_QUESTION {
                return Err(QuizError::WrongOptionCount {
                    index,
                    count: question.options.len(),
                });
            }
        }
        Ok(())
    }
}

/// Strip a markdown code fence from a completion.
///
/// Returns the body of the first fenced block with any language tag
/// (` ```json `) removed. Text that already starts with a JSON value is
/// returned trimmed, even if a fence appears later inside a string.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after = &trimmed[start + 3..];
    let body = match after.find("```") {
        Some(end) => &after[..end],
        None => after,
    };

    // Language tag sits on the fence line
    let body = match body.split_once('\n') {
        Some((tag, rest)) if is_language_tag(tag) => rest,
        _ => body
            .strip_prefix("json")
            .or_else(|| body.strip_prefix("JSON"))
            .unwrap_or(body),
    };
    body.trim()
}

fn is_language_tag(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Parse a completion into a quiz.
///
/// Fails with [`QuizError::InvalidJson`] when the text is not JSON,
/// [`QuizError::MissingQuestions`] when an object lacks `questions`, and
/// [`QuizError::Malformed`] when questions do not have the expected shape.
/// Question and option counts are checked separately by [`Quiz::validate`].
pub fn parse_quiz_response(text: &str) -> Result<Quiz, QuizError> {
    let body = strip_code_fence(text);
    let value: Value =
        serde_json::from_str(body).map_err(|e| QuizError::InvalidJson(e.to_string()))?;

    if let Value::Object(map) = &value {
        if !map.contains_key("questions") {
            return Err(QuizError::MissingQuestions);
        }
    }

    serde_json::from_value(value).map_err(|e| QuizError::Malformed(e.to_string()))
}

/// Build the Traditional-Chinese generation prompt for one course day
pub fn build_quiz_prompt(day_number: i32, title: &str, content: &str) -> String {
    format!(
        r#"根據以下營養書籍的第{day_number}天內容，生成{count}道繁體中文的多項選擇題。

標題：{title}

書籍內容：
{content}

要求：
1. 每題有4個選項（A、B、C、D）
2. 清楚標註正確答案
3. 題目要測試對核心概念的理解，不只是文字記憶
4. 難度適中，適合一般讀者
5. 提供簡短的答案解釋，說明為什麼這個答案是正確的
6. 嚴格返回JSON格式，不要有markdown代碼塊或其他文字

JSON格式範例：
{{
  "questions": [
    {{
      "question": "問題內容？",
      "options": ["A. 選項1", "B. 選項2", "C. 選項3", "D. 選項4"],
      "correct_answer": "A",
      "explanation": "為什麼這個答案正確的簡短解釋"
    }}
  ]
}}

確保options是一個陣列，每個元素是完整的字串。
"#,
        count = QUESTIONS_PER_DAY,
    )
}

/// Fixed fallback questions used when generation is unavailable
pub fn manual_template_questions() -> Vec<QuizQuestion> {
    fn question(text: &str, options: [&str; 4], answer: AnswerLetter, why: &str) -> QuizQuestion {
        QuizQuestion {
            question: text.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: answer,
            explanation: why.to_string(),
        }
    }

    vec![
        question(
            "營養學的主要目的是什麼？",
            ["A. 研究食物成分", "B. 促進健康", "C. 治療疾病", "D. 減肥"],
            AnswerLetter::B,
            "營養學的主要目的是通過科學研究來促進人類健康。",
        ),
        question(
            "哪種營養素對身體最重要？",
            ["A. 蛋白質", "B. 碳水化合物", "C. 維生素", "D. 所有營養素都重要"],
            AnswerLetter::D,
            "所有營養素都有其獨特的功能，缺一不可。",
        ),
        question(
            "健康飲食的關鍵是什麼？",
            ["A. 只吃蔬菜", "B. 均衡攝取", "C. 少吃肉類", "D. 多喝水"],
            AnswerLetter::B,
            "均衡攝取各種營養素是健康飲食的關鍵。",
        ),
    ]
}
