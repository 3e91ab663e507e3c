use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::date_key::generate_id;

/// One day's journal text. `id`, `date` and `created_at` never change once
/// the entry exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub date: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn new(date: String, content: String, now: DateTime<Utc>) -> Self {
        JournalEntry {
            id: generate_id(),
            date,
            content,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.content)
    }
}

/// Whitespace-delimited tokens of the trimmed text.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_entry_has_matching_timestamps() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let entry = JournalEntry::new("2024-05-01".into(), "hi".into(), now);
        assert_eq!(entry.created_at, entry.updated_at);
        assert!(!entry.id.is_empty());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let entry = JournalEntry::new("2024-05-01".into(), "hi".into(), now);
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert_eq!(json["date"], "2024-05-01");
    }

    #[test]
    fn word_count_ignores_surrounding_and_repeated_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count("  Hello   world \n again "), 3);
    }
}
