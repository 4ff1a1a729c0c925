//! Course content helpers
//!
//! Course days live in markdown files named like `第3天 保持年輕的竅門.md`.
//! These helpers map files to day numbers, pull titles out of the markdown
//! and format values for console reports.

use chrono::{DateTime, Datelike, Utc};

use crate::errors::ContentError;

/// Title used when a content file has no `###` heading
pub const UNTITLED: &str = "未命名";

/// Extract the title from a day's markdown.
///
/// The title is the first line whose trimmed form starts with `###`, with
/// every `###` removed.
pub fn extract_title(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("###"))
        .map(|line| line.replace("###", "").trim().to_string())
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Whether a filename looks like a course day file (`第*天*.md`)
pub fn is_day_file(file_name: &str) -> bool {
    file_name.starts_with('第')
        && file_name.ends_with(".md")
        && file_name
            .strip_prefix('第')
            .is_some_and(|rest| rest.contains('天'))
}

/// Day number written between `第` and `天` in a filename.
///
/// Both ASCII digits (`第12天`) and Chinese numerals (`第十二天`) are read.
pub fn day_number_from_filename(file_name: &str) -> Option<u32> {
    let after = file_name.split_once('第')?.1;
    let (number, _) = after.split_once('天')?;
    let number = number.trim();
    if number.is_empty() {
        return None;
    }
    if number.chars().all(|c| c.is_ascii_digit()) {
        return number.parse().ok();
    }
    parse_chinese_numeral(number)
}

/// Parse a Chinese numeral from 1 to 99
pub fn parse_chinese_numeral(text: &str) -> Option<u32> {
    fn digit(c: char) -> Option<u32> {
        Some(match c {
            '一' => 1,
            '二' | '兩' => 2,
            '三' => 3,
            '四' => 4,
            '五' => 5,
            '六' => 6,
            '七' => 7,
            '八' => 8,
            '九' => 9,
            _ => return None,
        })
    }

    let chars: Vec<char> = text.chars().collect();
    match chars.as_slice() {
        [d] if *d == '十' => Some(10),
        [d] => digit(*d),
        ['十', ones] => Some(10 + digit(*ones)?),
        [tens, '十'] => Some(digit(*tens)? * 10),
        [tens, '十', ones] => Some(digit(*tens)? * 10 + digit(*ones)?),
        _ => None,
    }
}

/// Assign day numbers to a sorted list of day files.
///
/// A file whose name carries a day number gets that day; any other file
/// falls back to its 1-based position in the list. The result is ordered by
/// day. Two files claiming the same day, or a day past `max_day`, is an
/// error.
pub fn number_day_files(
    file_names: &[String],
    max_day: u32,
) -> Result<Vec<(u32, String)>, ContentError> {
    let mut numbered: Vec<(u32, String)> = file_names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let day = day_number_from_filename(name).unwrap_or(i as u32 + 1);
            (day, name.clone())
        })
        .collect();
    numbered.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    for pair in numbered.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(ContentError::DuplicateDay {
                day: pair[0].0,
                first: pair[0].1.clone(),
                second: pair[1].1.clone(),
            });
        }
    }
    if let Some((day, _)) = numbered.iter().find(|(day, _)| *day == 0 || *day > max_day) {
        return Err(ContentError::DayOutOfRange { day: *day, max: max_day });
    }

    Ok(numbered)
}

/// Course day a timestamp falls on: its day of the month, capped at
/// `max_day`.
pub fn program_day(timestamp: DateTime<Utc>, max_day: u32) -> u32 {
    timestamp.day().min(max_day)
}

/// Split a SQL script into statements for the `exec_sql` RPC.
///
/// Statements are separated by `;`. Empty statements and statements that
/// begin with a `--` comment are dropped.
pub fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !stmt.starts_with("--"))
        .collect()
}

/// Display name derived from an email's local part, title-cased.
///
/// Every alphabetic run starts upper-case, so `info8connect2@...` becomes
/// `Info8Connect2`.
pub fn display_name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    let mut out = String::with_capacity(local.len());
    let mut in_word = false;
    for c in local.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Character-aware preview: the first `max_chars` characters, with `...`
/// appended when the text was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// First eight characters of an id, for compact report lines
pub fn short_id(id: &impl ToString) -> String {
    id.to_string().chars().take(8).collect()
}
