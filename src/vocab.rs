//! Saved vocabulary.
//!
//! The whole list lives under a single key as a JSON array of
//! `{ "word", "addedAt", "id" }` objects and is rewritten on every change.
//! A missing or unreadable value is treated as an empty list.

use anyhow::{anyhow, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStore;

pub const VOCABULARY_KEY: &str = "english-vocabulary";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    pub word: String,
    /// RFC 3339 timestamp, millisecond precision.
    pub added_at: String,
    /// Millisecond timestamp at creation, bumped if needed to stay unique.
    pub id: i64,
}

pub struct Vocabulary<S: KeyValueStore> {
    store: S,
    entries: Vec<VocabularyEntry>,
}

impl<S: KeyValueStore> Vocabulary<S> {
    pub fn load(store: S) -> Result<Self> {
        let entries = match store.load(VOCABULARY_KEY)? {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<VocabularyEntry>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("stored vocabulary is unreadable, starting empty: {}", e);
                    Vec::new()
                }
            },
        };
        log::debug!("loaded {} vocabulary entries", entries.len());
        Ok(Self { store, entries })
    }

    /// Add a word. Returns `None` if the (trimmed) word is already saved.
    pub fn add(&mut self, word: &str) -> Result<Option<VocabularyEntry>> {
        self.add_at(word, Utc::now())
    }

    pub fn add_at(&mut self, word: &str, now: DateTime<Utc>) -> Result<Option<VocabularyEntry>> {
        let word = word.trim();
        if word.is_empty() {
            return Err(anyhow!("cannot save an empty word"));
        }
        if self.contains(word) {
            return Ok(None);
        }

        let mut id = now.timestamp_millis();
        if let Some(last) = self.entries.iter().map(|e| e.id).max() {
            id = id.max(last + 1);
        }
        let entry = VocabularyEntry {
            word: word.to_string(),
            added_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            id,
        };
        self.entries.push(entry.clone());
        if let Err(e) = self.persist() {
            self.entries.pop();
            return Err(e);
        }
        log::info!("saved '{}' to vocabulary", entry.word);
        Ok(Some(entry))
    }

    /// Remove by id. Returns false if no entry had that id.
    pub fn remove(&mut self, id: i64) -> Result<bool> {
        let Some(index) = self.entries.iter().position(|e| e.id == id) else {
            return Ok(false);
        };
        let removed = self.entries.remove(index);
        if let Err(e) = self.persist() {
            self.entries.insert(index, removed);
            return Err(e);
        }
        log::info!("removed '{}' from vocabulary", removed.word);
        Ok(true)
    }

    pub fn contains(&self, word: &str) -> bool {
        let word = word.trim();
        self.entries.iter().any(|e| e.word == word)
    }

    pub fn entries(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&mut self) -> Result<()> {
        let raw = serde_json::to_string(&self.entries)?;
        self.store.save(VOCABULARY_KEY, &raw)
    }
}
