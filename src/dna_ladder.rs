//! DNA ladder catalog used by gel rendering.

use serde_json::Value;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct LadderBand {
    length: f64,
    pub relative_strength: Option<f64>,
}

impl LadderBand {
    pub fn length_bp(&self) -> f64 {
        self.length
    }
}

#[derive(Clone, Debug, Default)]
pub struct Ladder {
    name: String,
    bands: Vec<LadderBand>,
}

impl Ladder {
    pub fn new(name: &str, parts: &Value) -> Self {
        let bands: Vec<LadderBand> = parts
            .as_array()
            .expect("DNA ladder part is not an array")
            .iter()
            .map(|p| p.as_array().expect("DNA ladder subpart is not an array"))
            .filter_map(|p| {
                let length = p.first()?.as_f64()?;
                if !length.is_finite() || length <= 0.0 {
                    return None;
                }
                Some(LadderBand {
                    length,
                    relative_strength: p.get(1).and_then(|s| s.as_f64()),
                })
            })
            .collect();

        Self {
            name: name.to_owned(),
            bands,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bands(&self) -> &Vec<LadderBand> {
        &self.bands
    }
}

#[derive(Clone, Debug)]
pub struct LadderCatalog {
    ladders: HashMap<String, Ladder>,
}

impl LadderCatalog {
    pub fn from_json_str(json: &str) -> Self {
        let res: Value = serde_json::from_str(json).expect("Invalid DNA ladders JSON");
        let map = res.as_object().expect("DNA ladders JSON is not an object");
        let mut ladders = HashMap::new();
        for (name, parts) in map.iter() {
            ladders.insert(name.to_owned(), Ladder::new(name, parts));
        }
        Self { ladders }
    }

    pub fn get(&self, name: &str) -> Option<&Ladder> {
        self.ladders.get(name)
    }

    pub fn names_sorted(&self) -> Vec<String> {
        let mut names: Vec<String> = self.ladders.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for LadderCatalog {
    fn default() -> Self {
        Self::from_json_str(include_str!("../assets/dna_ladders.json"))
    }
}
