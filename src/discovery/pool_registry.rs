use crate::core::{Currency, SwapError, SwapResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const BUNDLED_POOL_IDS: &str = include_str!("../../config/pool_ids.json");

/// One registered Infinity pool: `{"type": "CL", "id": "0x…"}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PoolIdEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

/// Infinity pools cannot be found from a factory, so their ids are listed per
/// symbol pair (`"bnb/kgen"`).
#[derive(Debug, Clone, Default)]
pub struct PoolIdRegistry {
    entries: HashMap<String, Vec<PoolIdEntry>>,
}

impl PoolIdRegistry {
    pub fn from_json(json: &str) -> SwapResult<Self> {
        let raw: HashMap<String, Vec<PoolIdEntry>> = serde_json::from_str(json)?;
        let entries = raw
            .into_iter()
            .map(|(pair, entries)| (pair.to_lowercase(), entries))
            .collect();
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> SwapResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            SwapError::ConfigError(format!("Cannot read pool ids from {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Pool ids shipped with the binary.
    pub fn bundled() -> SwapResult<Self> {
        Self::from_json(BUNDLED_POOL_IDS)
    }

    pub fn with_entry(mut self, symbol_a: &str, symbol_b: &str, entry: PoolIdEntry) -> Self {
        self.entries
            .entry(format!("{}/{}", symbol_a.to_lowercase(), symbol_b.to_lowercase()))
            .or_default()
            .push(entry);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries for a symbol pair in either order.
    pub fn lookup(&self, symbol_a: &str, symbol_b: &str) -> Vec<PoolIdEntry> {
        let a = symbol_a.to_lowercase();
        let b = symbol_b.to_lowercase();
        let mut found = Vec::new();
        for key in [format!("{}/{}", a, b), format!("{}/{}", b, a)] {
            if let Some(entries) = self.entries.get(&key) {
                found.extend(entries.iter().cloned());
            }
        }
        found
    }

    /// Entries for a currency pair; the native asset and its wrapped token share entries.
    pub fn lookup_currencies(&self, a: &Currency, b: &Currency) -> Vec<PoolIdEntry> {
        let mut found: Vec<PoolIdEntry> = Vec::new();
        for symbol_a in symbol_aliases(a) {
            for symbol_b in symbol_aliases(b) {
                for entry in self.lookup(&symbol_a, &symbol_b) {
                    if !found.contains(&entry) {
                        found.push(entry);
                    }
                }
            }
        }
        found
    }
}

fn symbol_aliases(currency: &Currency) -> Vec<String> {
    if currency.is_native() || currency.is_wrapped_native() {
        vec!["bnb".to_string(), "wbnb".to_string()]
    } else {
        vec![currency.symbol().to_lowercase()]
    }
}
