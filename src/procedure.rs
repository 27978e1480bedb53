//! Procedure catalog: step scripts, environment side effects and declared
//! metric distributions for every simulated laboratory protocol.

use crate::engine::{EngineError, EnvironmentField, ErrorCode};
use crate::sampler::MetricSpec;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub key: String,
    pub label: String,
}

/// Declares that advancing into step `step` (1-based) writes `value` into
/// the named environment field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepEffect {
    pub step: usize,
    pub field: EnvironmentField,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub id: String,
    pub name: String,
    pub name_key: String,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub side_effects: Vec<StepEffect>,
    #[serde(default)]
    pub metrics: Vec<MetricSpec>,
}

impl Procedure {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// 1-based step label lookup.
    pub fn step_label(&self, index: usize) -> Result<&str, EngineError> {
        self.step(index).map(|step| step.label.as_str())
    }

    /// 1-based step lookup.
    pub fn step(&self, index: usize) -> Result<&Step, EngineError> {
        if index == 0 || index > self.steps.len() {
            return Err(EngineError {
                code: ErrorCode::IndexOutOfRange,
                message: format!(
                    "Step {index} is out of range for '{}' (valid range 1..={})",
                    self.id,
                    self.steps.len()
                ),
            });
        }
        Ok(&self.steps[index - 1])
    }

    pub fn effects_for_step(&self, index: usize) -> impl Iterator<Item = &StepEffect> {
        self.side_effects
            .iter()
            .filter(move |effect| effect.step == index)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcedureCatalog {
    procedures: Vec<Procedure>,
}

impl ProcedureCatalog {
    pub fn from_json_str(json: &str) -> Self {
        let catalog: Self = serde_json::from_str(json).expect("Invalid procedures JSON");
        for procedure in &catalog.procedures {
            assert!(
                !procedure.steps.is_empty(),
                "Procedure '{}' declares no steps",
                procedure.id
            );
            for effect in &procedure.side_effects {
                assert!(
                    effect.step >= 1 && effect.step <= procedure.steps.len(),
                    "Procedure '{}' declares a side effect for step {} outside 1..={}",
                    procedure.id,
                    effect.step,
                    procedure.steps.len()
                );
            }
            for metric in &procedure.metrics {
                assert!(
                    metric.distribution.is_valid(),
                    "Procedure '{}' metric '{}' has invalid distribution parameters",
                    procedure.id,
                    metric.name
                );
            }
        }
        catalog
    }

    pub fn get(&self, id: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|p| p.id == id)
    }

    pub fn procedures(&self) -> &[Procedure] {
        &self.procedures
    }

    pub fn ids_sorted(&self) -> Vec<String> {
        self.procedures
            .iter()
            .map(|p| p.id.clone())
            .sorted()
            .collect()
    }
}

impl Default for ProcedureCatalog {
    fn default() -> Self {
        Self::from_json_str(include_str!("../assets/procedures.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PROCEDURES;

    #[test]
    fn catalog_loads_all_procedures() {
        assert_eq!(PROCEDURES.procedures().len(), 10);
        let ids = PROCEDURES.ids_sorted();
        assert!(ids.contains(&"lb_preparation".to_string()));
        assert!(ids.contains(&"heat_shock".to_string()));
        assert!(ids.contains(&"plasmid_construction".to_string()));
    }

    #[test]
    fn step_lookup_is_one_based() {
        let heat_shock = PROCEDURES.get("heat_shock").unwrap();
        assert_eq!(heat_shock.step_count(), 8);
        assert_eq!(
            heat_shock.step_label(5).unwrap(),
            "Heat shock at 42°C for 90 seconds"
        );
        assert_eq!(
            heat_shock.step_label(0).unwrap_err().code,
            ErrorCode::IndexOutOfRange
        );
        assert_eq!(
            heat_shock.step_label(9).unwrap_err().code,
            ErrorCode::IndexOutOfRange
        );
    }

    #[test]
    fn heat_shock_effect_table() {
        let heat_shock = PROCEDURES.get("heat_shock").unwrap();
        let effects: Vec<_> = heat_shock.side_effects.iter().collect();
        assert_eq!(effects.len(), 3);
        assert!(heat_shock.effects_for_step(5).any(|e| {
            e.field == EnvironmentField::Temperature && e.value == 42.0
        }));
        assert!(heat_shock.effects_for_step(6).any(|e| {
            e.field == EnvironmentField::Temperature && e.value == 0.0
        }));
        assert_eq!(heat_shock.effects_for_step(1).count(), 0);
    }

    #[test]
    fn declared_metrics_match_original_protocols() {
        let extraction = PROCEDURES.get("plasmid_extraction").unwrap();
        let names: Vec<_> = extraction.metrics.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["plasmid_yield", "a260_a280"]);

        let electro = PROCEDURES.get("electroporation").unwrap();
        assert_eq!(electro.metrics.len(), 1);
        assert_eq!(electro.metrics[0].name, "transformant_count");
    }
}
