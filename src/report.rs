//! Text rendering of checklists, metric reports and environment readouts.
//!
//! Everything here is read-only over state snapshots. Labels resolve
//! through the translation catalog for the session's display mode; numbers
//! and units pass through unaltered.

use crate::engine::{EngineError, ErrorCode, ExperimentState};
use crate::sampler::MetricSpec;
use crate::translations::Mode;
use crate::{PROCEDURES, TRANSLATIONS};

/// DNA input assumed by the transformation-efficiency figure, in µg.
pub const HEAT_SHOCK_DNA_UG: f64 = 0.1;
pub const ELECTROPORATION_DNA_UG: f64 = 0.01;

pub fn transformation_efficiency(transformant_count: f64, dna_ug: f64) -> f64 {
    transformant_count / dna_ug
}

pub fn procedure_title(procedure: &str, mode: Mode) -> Result<String, EngineError> {
    let script = PROCEDURES.get(procedure).ok_or_else(|| EngineError {
        code: ErrorCode::NotFound,
        message: format!("Unknown procedure '{procedure}'"),
    })?;
    Ok(TRANSLATIONS.label(mode, &script.name_key, &script.name))
}

/// Step list with completed steps checked off, the original walkthrough
/// rendering.
pub fn checklist(
    state: &ExperimentState,
    procedure: &str,
    mode: Mode,
) -> Result<Vec<String>, EngineError> {
    let script = PROCEDURES.get(procedure).ok_or_else(|| EngineError {
        code: ErrorCode::NotFound,
        message: format!("Unknown procedure '{procedure}'"),
    })?;
    let cursor = state.progress.get(procedure).copied().unwrap_or(0);
    Ok(script
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let label = TRANSLATIONS.label(mode, &step.key, &step.label);
            if i < cursor {
                format!("✓ {label}")
            } else {
                format!("{}. {label}", i + 1)
            }
        })
        .collect())
}

/// Metric report for a completed procedure, one line per declared metric in
/// declaration order, plus the derived transformation-efficiency figure for
/// the transformation protocols.
pub fn metrics_report(
    state: &ExperimentState,
    procedure: &str,
    mode: Mode,
) -> Result<Vec<String>, EngineError> {
    let script = PROCEDURES.get(procedure).ok_or_else(|| EngineError {
        code: ErrorCode::NotFound,
        message: format!("Unknown procedure '{procedure}'"),
    })?;
    let cursor = state.progress.get(procedure).copied().unwrap_or(0);
    if cursor < script.step_count() {
        return Err(EngineError {
            code: ErrorCode::PreconditionFailed,
            message: format!(
                "Procedure '{procedure}' is at step {cursor}/{}; no results to report yet",
                script.step_count()
            ),
        });
    }

    let stored = state
        .derived_metrics
        .get(procedure)
        .ok_or_else(|| EngineError {
            code: ErrorCode::Internal,
            message: format!("Completed procedure '{procedure}' has no stored metrics"),
        })?;

    let mut lines: Vec<String> = vec![];
    for spec in &script.metrics {
        let value = *stored.get(&spec.name).ok_or_else(|| EngineError {
            code: ErrorCode::Internal,
            message: format!("Metric '{}' missing for '{procedure}'", spec.name),
        })?;
        let label = TRANSLATIONS.label(mode, &format!("metric_{}", spec.name), &spec.name);
        lines.push(format!("{label}: {}", format_metric(spec, value)));
    }

    let dna_ug = match procedure {
        "heat_shock" => Some(HEAT_SHOCK_DNA_UG),
        "electroporation" => Some(ELECTROPORATION_DNA_UG),
        _ => None,
    };
    if let (Some(dna_ug), Some(count)) = (dna_ug, stored.get("transformant_count")) {
        let label = TRANSLATIONS.label(
            mode,
            "metric_transformation_efficiency",
            "Transformation Efficiency",
        );
        lines.push(format!(
            "{label}: {:.0} CFU/ug",
            transformation_efficiency(*count, dna_ug)
        ));
    }

    Ok(lines)
}

/// Sidebar-style environment readout.
pub fn environment_summary(state: &ExperimentState, mode: Mode) -> Vec<String> {
    let env = &state.environment;
    vec![
        format!(
            "{}: {:.0}°C",
            TRANSLATIONS.label(mode, "env_temperature", "Temperature"),
            env.temperature
        ),
        format!(
            "{}: {:.1}",
            TRANSLATIONS.label(mode, "env_ph", "pH Level"),
            env.ph
        ),
        format!(
            "{}: {:.3}",
            TRANSLATIONS.label(mode, "env_od600", "Bacterial OD600"),
            env.od600
        ),
    ]
}

fn format_metric(spec: &MetricSpec, value: f64) -> String {
    match spec.unit.as_str() {
        "CFU" | "clones" => format!("{value:.0} {}", spec.unit),
        "%" => format!("{value:.1}%"),
        "" => format!("{value:.2}"),
        unit => format!("{value:.1} {unit}"),
    }
}
