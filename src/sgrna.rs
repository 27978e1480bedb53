//! sgRNA design checks for the CRISPR-Cas9 integration module.

use crate::engine::{EngineError, ErrorCode};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

pub const SGRNA_LENGTH: usize = 20;
pub const GC_IDEAL_MIN: f64 = 40.0;
pub const GC_IDEAL_MAX: f64 = 60.0;

const OFF_TARGET_MEAN: f64 = 0.85;
const OFF_TARGET_STD_DEV: f64 = 0.05;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SgRnaReport {
    pub sequence: String,
    /// GC share of the spacer, in percent.
    pub gc_content: f64,
    pub off_target_score: f64,
    pub gc_in_ideal_range: bool,
}

pub fn gc_content_percent(sequence: &[u8]) -> f64 {
    if sequence.is_empty() {
        return 0.0;
    }
    let gc = sequence
        .iter()
        .map(|c| c.to_ascii_uppercase())
        .filter(|&c| c == b'G' || c == b'C')
        .count() as f64;
    gc / sequence.len() as f64 * 100.0
}

/// Validates a 20 bp spacer sequence, computes its GC content and draws a
/// synthetic off-target prediction score.
pub fn validate_sgrna(sequence: &str, rng: &mut impl Rng) -> Result<SgRnaReport, EngineError> {
    let trimmed = sequence.trim();
    let seq = trimmed.as_bytes();
    if seq.len() != SGRNA_LENGTH {
        return Err(EngineError {
            code: ErrorCode::InvalidInput,
            message: format!("sgRNA length must be {SGRNA_LENGTH}bp, got {}", seq.len()),
        });
    }
    if let Some(&bad) = seq
        .iter()
        .find(|c| !matches!(c.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T'))
    {
        return Err(EngineError {
            code: ErrorCode::InvalidInput,
            message: format!("sgRNA may only contain A/C/G/T, found '{}'", bad as char),
        });
    }

    let gc_content = gc_content_percent(seq);
    let off_target_score = Normal::new(OFF_TARGET_MEAN, OFF_TARGET_STD_DEV)
        .expect("fixed off-target parameters")
        .sample(rng);

    Ok(SgRnaReport {
        sequence: trimmed.to_string(),
        gc_content,
        off_target_score,
        gc_in_ideal_range: (GC_IDEAL_MIN..=GC_IDEAL_MAX).contains(&gc_content),
    })
}
