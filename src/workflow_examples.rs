//! Curated workflow payloads for demos, docs and tests.

use crate::PROCEDURES;
use crate::engine::{Operation, Workflow};

/// Builds the workflow that walks the named procedure from a fresh cursor to
/// completion, one advance per step.
pub fn walkthrough(procedure: &str) -> Option<Workflow> {
    let script = PROCEDURES.get(procedure)?;
    Some(Workflow {
        run_id: format!("walkthrough-{procedure}"),
        ops: (0..script.step_count())
            .map(|_| Operation::Advance {
                procedure: procedure.to_string(),
            })
            .collect(),
    })
}

/// A full teaching session: reset, then every procedure start to finish.
pub fn full_session() -> Workflow {
    let mut ops = vec![Operation::ResetExperiment];
    for id in PROCEDURES.ids_sorted() {
        if let Some(wf) = walkthrough(&id) {
            ops.extend(wf.ops);
        }
    }
    Workflow {
        run_id: "full-session".to_string(),
        ops,
    }
}
