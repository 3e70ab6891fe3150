//! Turning a free-form image identification reply into a title.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Shown instead of a first line too long to be a title.
const GENERIC_TITLE: &str = "アニメ作品";

const MAX_PLAIN_TITLE_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyResult {
    pub title: String,
    pub confidence_percent: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Likely,
    Guess,
}

impl Confidence {
    #[must_use]
    pub const fn from_percent(percent: u8) -> Self {
        match percent {
            90.. => Self::High,
            70..=89 => Self::Likely,
            _ => Self::Guess,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::High => "かなり確信",
            Self::Likely => "たぶん",
            Self::Guess => "推測",
        };
        f.write_str(label)
    }
}

impl IdentifyResult {
    #[must_use]
    pub const fn confidence(&self) -> Confidence {
        Confidence::from_percent(self.confidence_percent)
    }

    /// Reads a reply that is either a `{"title", "confidencePercent"}` JSON
    /// object (possibly wrapped in prose or a code fence) or plain text.
    ///
    /// Returns `None` when no title can be recovered.
    #[must_use]
    pub fn parse(reply: &str) -> Option<Self> {
        let result = parse_json_block(reply).unwrap_or_else(|| Self {
            title: extract_title(reply),
            confidence_percent: 100,
        });

        if result.title.trim().is_empty() {
            None
        } else {
            Some(result)
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    confidence_percent: f64,
}

fn parse_json_block(reply: &str) -> Option<IdentifyResult> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }

    let raw: RawResult = serde_json::from_str(&reply[start..=end]).ok()?;
    // Clamped, so the cast cannot truncate.
    let confidence_percent = raw.confidence_percent.round().clamp(0.0, 100.0) as u8;

    Some(IdentifyResult {
        title: raw.title.trim().to_string(),
        confidence_percent,
    })
}

/// The text inside the first 「」 pair, else the first line.
#[must_use]
pub fn extract_title(text: &str) -> String {
    let stripped = strip_html_tags(text);

    static BRACKETED: OnceLock<Regex> = OnceLock::new();
    let bracketed = BRACKETED.get_or_init(|| Regex::new(r"「([^」]+)」").expect("Invalid regex"));

    if let Some(caps) = bracketed.captures(&stripped)
        && let Some(title) = caps.get(1)
    {
        return title.as_str().to_string();
    }

    let first_line = stripped.lines().next().unwrap_or_default();
    if first_line.chars().count() > MAX_PLAIN_TITLE_CHARS {
        GENERIC_TITLE.to_string()
    } else {
        first_line.to_string()
    }
}

#[must_use]
pub fn strip_html_tags(text: &str) -> String {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    let tags = TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));
    tags.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_reply() {
        let reply = "```json\n{\"title\": \"鬼滅の刃\", \"confidencePercent\": 92}\n```";
        let result = IdentifyResult::parse(reply).unwrap();
        assert_eq!(result.title, "鬼滅の刃");
        assert_eq!(result.confidence_percent, 92);
        assert_eq!(result.confidence(), Confidence::High);
    }

    #[test]
    fn test_parse_plain_reply_with_brackets() {
        let result = IdentifyResult::parse("<p>これは「よつばと！」だと思います。</p>").unwrap();
        assert_eq!(result.title, "よつばと！");
        assert_eq!(result.confidence_percent, 100);
    }

    #[test]
    fn test_long_first_line_becomes_generic() {
        let reply = "あ".repeat(51);
        assert_eq!(extract_title(&reply), GENERIC_TITLE);
        assert_eq!(extract_title("進撃の巨人\n説明"), "進撃の巨人");
    }

    #[test]
    fn test_empty_title_is_none() {
        assert_eq!(IdentifyResult::parse(r#"{"title": "", "confidencePercent": 50}"#), None);
        assert_eq!(IdentifyResult::parse("   "), None);
    }

    #[test]
    fn test_confidence_buckets() {
        assert_eq!(Confidence::from_percent(90), Confidence::High);
        assert_eq!(Confidence::from_percent(89), Confidence::Likely);
        assert_eq!(Confidence::from_percent(70), Confidence::Likely);
        assert_eq!(Confidence::from_percent(69), Confidence::Guess);
    }
}
