//! Display-mode translation catalogs for the two teaching audiences.

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Session-level display audience. Selected once per session by an explicit
/// user action; read by the presentation layer only, never by the engine.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Professional,
    Kids,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Kids => "kids",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        let norm = text.trim().to_ascii_lowercase();
        match norm.as_str() {
            "professional" | "pro" => Some(Self::Professional),
            "kids" | "kid" => Some(Self::Kids),
            _ => None,
        }
    }
}

pub struct Translations {
    values: HashMap<String, String>,
}

impl Translations {
    fn from_text(csv_text: &str) -> Self {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(csv_text.as_bytes());

        let headers = rdr
            .headers()
            .expect("Could not read translations.csv headers");
        let mut modes = Self::to_vec(headers);
        let _ = modes.remove(0); // Remove the key column

        // Iterate over the records
        let mut values = HashMap::new();
        for record in rdr.records().flatten() {
            let mut record = Self::to_vec(&record);
            let key = record.remove(0);
            for (mnum, t) in record.iter().enumerate() {
                let mode_key = format!("{}:{key}", modes[mnum]);
                values.insert(mode_key, t.to_owned());
            }
        }

        Self { values }
    }

    pub fn get(&self, mode: Mode, key: &str) -> Option<&str> {
        let key = format!("{}:{key}", mode.as_str());
        self.values.get(&key).map(|s| s.as_str())
    }

    /// Resolves a canonical key for the given display mode. Keys without an
    /// entry for the mode fall back to the professional entry, then to the
    /// canonical text itself, so the catalog only needs to carry overrides.
    pub fn label(&self, mode: Mode, key: &str, canonical: &str) -> String {
        match self.get(mode, key) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => match self.get(Mode::Professional, key) {
                Some(text) if !text.is_empty() => text.to_string(),
                _ => canonical.to_string(),
            },
        }
    }

    fn to_vec(record: &csv::StringRecord) -> Vec<String> {
        record.iter().map(|s| s.to_string()).collect()
    }
}

impl Default for Translations {
    fn default() -> Self {
        let text = include_str!("../assets/translations.csv");
        Self::from_text(text)
    }
}
