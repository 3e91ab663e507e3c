use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::date_key::parse_key;
use crate::journal_entry::JournalEntry;

/// Date key (`YYYY-MM-DD`) to the single entry for that day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JournalStore {
    entries: BTreeMap<String, JournalEntry>,
}

impl JournalStore {
    pub fn new() -> Self {
        JournalStore::default()
    }

    /// Creates the entry for `date` or updates it in place, keeping its
    /// `id` and `created_at`.
    pub fn upsert(&mut self, date: &str, content: &str, now: DateTime<Utc>) -> &JournalEntry {
        self.entries
            .entry(date.to_string())
            .and_modify(|existing| {
                existing.content = content.to_string();
                existing.updated_at = now;
            })
            .or_insert_with(|| {
                debug!(date, "creating journal entry");
                JournalEntry::new(date.to_string(), content.to_string(), now)
            })
    }

    pub fn delete(&mut self, date: &str) -> Option<JournalEntry> {
        self.entries.remove(date)
    }

    pub fn get(&self, date: &str) -> Option<&JournalEntry> {
        self.entries.get(date)
    }

    pub fn entries(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest-first entries other than `exclude`, at most `limit` of them.
    /// Keys that do not parse as dates sort last.
    pub fn recent_excluding(&self, exclude: &str, limit: usize) -> Vec<&JournalEntry> {
        let mut entries: Vec<(Option<NaiveDate>, &JournalEntry)> = self
            .entries
            .iter()
            .filter(|(key, _)| key.as_str() != exclude)
            .map(|(key, entry)| (parse_key(key), entry))
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        entries.into_iter().take(limit).map(|(_, e)| e).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn upsert_creates_then_updates_in_place() {
        let mut store = JournalStore::new();
        let first = store.upsert("2024-06-01", "first", at(8)).clone();
        let second = store.upsert("2024-06-01", "second", at(9)).clone();

        assert_eq!(store.len(), 1);
        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.content, "second");
        assert_eq!(second.updated_at, at(9));
    }

    #[test]
    fn saving_one_date_leaves_others_untouched() {
        let mut store = JournalStore::new();
        store.upsert("2024-06-01", "one", at(8));
        let other = store.upsert("2024-06-02", "two", at(8)).clone();
        store.upsert("2024-06-01", "one again", at(10));

        assert_eq!(store.get("2024-06-02"), Some(&other));
    }

    #[test]
    fn delete_missing_key_is_a_no_op() {
        let mut store = JournalStore::new();
        store.upsert("2024-06-01", "one", at(8));
        assert!(store.delete("1999-01-01").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_removes_key() {
        let mut store = JournalStore::new();
        store.upsert("2024-06-01", "one", at(8));
        assert!(store.delete("2024-06-01").is_some());
        assert!(store.get("2024-06-01").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn recent_excluding_orders_newest_first_and_limits() {
        let mut store = JournalStore::new();
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        for offset in 0..15 {
            let key = (base + Duration::days(offset)).format("%Y-%m-%d").to_string();
            store.upsert(&key, "text", at(8));
        }

        let recent = store.recent_excluding("2024-01-15", 10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].date, "2024-01-14");
        assert_eq!(recent[9].date, "2024-01-05");
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut store = JournalStore::new();
        store.upsert("2024-06-01", "one", at(8));
        let json = serde_json::to_value(&store).unwrap();
        assert!(json.get("2024-06-01").is_some());
    }
}
