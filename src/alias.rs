//! Category alias table.
//!
//! Maps canonical detector categories to learner-facing labels
//! (`"tv" -> "television"`). Annotation is non-destructive: it attaches a
//! display label and leaves `Detection::category` untouched, so suppression
//! and per-category capping behave the same with or without aliases.
//!
//! Duplicate keys resolve deterministically: the last write wins, both for
//! programmatic inserts and for duplicate keys inside one JSON file.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::detect::Detection;

const DEFAULT_EXPANSIONS: &[(&str, &str)] = &[
    ("tv", "television"),
    ("couch", "sofa"),
    ("cell phone", "mobile phone"),
    ("hair drier", "hair dryer"),
    ("sports ball", "ball"),
    ("dining table", "table"),
    ("potted plant", "plant"),
    ("remote", "remote control"),
    ("mouse", "computer mouse"),
];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in learner-friendly expansions for a few COCO categories.
    pub fn default_expansions() -> Self {
        Self::from_pairs(DEFAULT_EXPANSIONS.iter().copied())
    }

    /// Build from ordered pairs; later pairs replace earlier ones.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self::new();
        for (category, alias) in pairs {
            table.insert(category, alias);
        }
        table
    }

    /// Insert an alias, returning the alias it replaced.
    pub fn insert(&mut self, category: impl Into<String>, alias: impl Into<String>) -> Option<String> {
        let category = category.into();
        let alias = alias.into();
        let previous = self.aliases.insert(category.clone(), alias.clone());
        if let Some(prev) = &previous {
            if prev != &alias {
                log::debug!(
                    "alias for '{}' redefined: '{}' -> '{}' (last write wins)",
                    category,
                    prev,
                    alias
                );
            }
        }
        previous
    }

    /// Parse a JSON object of `category -> alias`.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let pairs: OrderedPairs =
            serde_json::from_str(raw).map_err(|e| anyhow!("invalid alias table: {}", e))?;
        Ok(Self::from_pairs(pairs.0))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read alias table {}: {}", path.display(), e))?;
        let table = Self::from_json_str(&raw)
            .map_err(|e| anyhow!("{}: {}", path.display(), e))?;
        log::info!("loaded {} category aliases from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn resolve(&self, category: &str) -> Option<&str> {
        self.aliases.get(category).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Attach display labels to every detection that has an alias.
    pub fn annotate(&self, detections: Vec<Detection>) -> Vec<Detection> {
        detections
            .into_iter()
            .map(|det| match self.resolve(det.category()) {
                Some(alias) => det.with_label(alias),
                None => det,
            })
            .collect()
    }
}

/// JSON object read as ordered pairs, duplicates included.
struct OrderedPairs(Vec<(String, String)>);

impl<'de> Deserialize<'de> for OrderedPairs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = OrderedPairs;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping category names to aliases")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, String>()? {
                    pairs.push((key, value));
                }
                Ok(OrderedPairs(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}
