use crate::engine::{Engine, EnvironmentField, LabEngine, Operation, Workflow};
use crate::gel_render::{result_gel_layout, write_gel_svg};
use crate::translations::Mode;
use crate::{curves, report, workflow_examples};
use serde_json::{Value, json};
use std::fs;

pub const DEFAULT_GEL_LADDER: &str = "GeneRuler 1 kb";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Help,
    Capabilities,
    StateSummary,
    SetMode { mode: Mode },
    Advance { procedure: String },
    Reset,
    Sample { procedure: String },
    Steps { procedure: String },
    Checklist { procedure: String },
    Metrics { procedure: String },
    Environment,
    SetEnvironment { field: EnvironmentField, value: f64 },
    ValidateSgRna { sequence: String },
    RenderGelSvg { output: String, ladder: Option<String> },
    AmplificationCurve { cycles: Option<u32> },
    Walkthrough { procedure: String },
    Op { payload: String },
    Workflow { payload: String },
}

#[derive(Debug, Clone)]
pub struct ShellRunResult {
    pub state_changed: bool,
    pub output: Value,
}

/// One interactive session: the engine plus the display-mode selection.
/// The mode is session state, not experiment state.
#[derive(Debug, Clone, Default)]
pub struct ShellSession {
    pub engine: LabEngine,
    pub mode: Mode,
}

impl ShellSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            engine: LabEngine::with_seed(seed),
            mode: Mode::default(),
        }
    }
}

impl ShellCommand {
    pub fn preview(&self) -> String {
        match self {
            Self::Help => "show shell command help".to_string(),
            Self::Capabilities => "inspect engine capabilities".to_string(),
            Self::StateSummary => "show experiment state summary".to_string(),
            Self::SetMode { mode } => format!("switch display mode to {}", mode.as_str()),
            Self::Advance { procedure } => format!("advance '{procedure}' by one step"),
            Self::Reset => "reset all experiment state".to_string(),
            Self::Sample { procedure } => format!("read sampled metrics for '{procedure}'"),
            Self::Steps { procedure } => format!("list the steps of '{procedure}'"),
            Self::Checklist { procedure } => format!("render the '{procedure}' checklist"),
            Self::Metrics { procedure } => format!("render the '{procedure}' results"),
            Self::Environment => "show environment readouts".to_string(),
            Self::SetEnvironment { field, value } => {
                format!("set environment {} to {value}", field.as_str())
            }
            Self::ValidateSgRna { .. } => "validate an sgRNA spacer design".to_string(),
            Self::RenderGelSvg { output, .. } => format!("render the result gel to '{output}'"),
            Self::AmplificationCurve { .. } => "generate a PCR amplification curve".to_string(),
            Self::Walkthrough { procedure } => format!("run '{procedure}' start to finish"),
            Self::Op { .. } => "apply one engine operation from JSON".to_string(),
            Self::Workflow { .. } => "apply an engine workflow from JSON".to_string(),
        }
    }

    pub fn is_state_mutating(&self) -> bool {
        matches!(
            self,
            Self::Advance { .. }
                | Self::Reset
                | Self::SetEnvironment { .. }
                | Self::Walkthrough { .. }
                | Self::Op { .. }
                | Self::Workflow { .. }
        )
    }
}

pub fn shell_help_text() -> &'static str {
    "LabSim shell commands:\n\
help\n\
capabilities\n\
state-summary\n\
set-mode professional|kids\n\
advance PROCEDURE\n\
reset\n\
sample PROCEDURE\n\
steps PROCEDURE\n\
checklist PROCEDURE\n\
metrics PROCEDURE\n\
environment\n\
set-environment temperature|ph|od600 VALUE\n\
validate-sgrna SEQUENCE\n\
render-gel-svg OUTPUT.svg [--ladder NAME]\n\
amplification-curve [CYCLES]\n\
walkthrough PROCEDURE\n\
op <operation-json-or-@file>\n\
workflow <workflow-json-or-@file>\n\
PROCEDURE is an id from 'capabilities'"
}

fn parse_json_payload(raw: &str) -> Result<String, String> {
    if let Some(path) = raw.strip_prefix('@') {
        fs::read_to_string(path).map_err(|e| format!("Could not read JSON file '{path}': {e}"))
    } else {
        Ok(raw.to_string())
    }
}

fn token_error(command: &str) -> String {
    format!("Invalid '{command}' usage. Try: help")
}

fn one_arg(tokens: &[String], cmd: &str) -> Result<String, String> {
    if tokens.len() == 2 {
        Ok(tokens[1].clone())
    } else {
        Err(token_error(cmd))
    }
}

pub fn parse_shell_tokens(tokens: &[String]) -> Result<ShellCommand, String> {
    if tokens.is_empty() {
        return Err("Missing shell command".to_string());
    }
    let cmd = tokens[0].as_str();
    match cmd {
        "help" | "-h" | "--help" => Ok(ShellCommand::Help),
        "capabilities" => {
            if tokens.len() == 1 {
                Ok(ShellCommand::Capabilities)
            } else {
                Err(token_error(cmd))
            }
        }
        "state-summary" => {
            if tokens.len() == 1 {
                Ok(ShellCommand::StateSummary)
            } else {
                Err(token_error(cmd))
            }
        }
        "set-mode" => {
            let raw = one_arg(tokens, cmd)?;
            let mode = Mode::parse(&raw)
                .ok_or_else(|| format!("Unknown mode '{raw}', expected 'professional' or 'kids'"))?;
            Ok(ShellCommand::SetMode { mode })
        }
        "advance" => Ok(ShellCommand::Advance {
            procedure: one_arg(tokens, cmd)?,
        }),
        "reset" => {
            if tokens.len() == 1 {
                Ok(ShellCommand::Reset)
            } else {
                Err(token_error(cmd))
            }
        }
        "sample" => Ok(ShellCommand::Sample {
            procedure: one_arg(tokens, cmd)?,
        }),
        "steps" => Ok(ShellCommand::Steps {
            procedure: one_arg(tokens, cmd)?,
        }),
        "checklist" => Ok(ShellCommand::Checklist {
            procedure: one_arg(tokens, cmd)?,
        }),
        "metrics" => Ok(ShellCommand::Metrics {
            procedure: one_arg(tokens, cmd)?,
        }),
        "environment" => {
            if tokens.len() == 1 {
                Ok(ShellCommand::Environment)
            } else {
                Err(token_error(cmd))
            }
        }
        "set-environment" => {
            if tokens.len() != 3 {
                return Err(token_error(cmd));
            }
            let field = EnvironmentField::parse(&tokens[1]).ok_or_else(|| {
                format!(
                    "Unknown environment field '{}', expected temperature, ph or od600",
                    tokens[1]
                )
            })?;
            let value = tokens[2]
                .parse::<f64>()
                .map_err(|_| format!("Invalid value '{}'", tokens[2]))?;
            Ok(ShellCommand::SetEnvironment { field, value })
        }
        "validate-sgrna" => Ok(ShellCommand::ValidateSgRna {
            sequence: one_arg(tokens, cmd)?,
        }),
        "render-gel-svg" => {
            if tokens.len() < 2 {
                return Err(token_error(cmd));
            }
            let output = tokens[1].clone();
            let mut ladder: Option<String> = None;
            let mut idx = 2usize;
            while idx < tokens.len() {
                match tokens[idx].as_str() {
                    "--ladder" => {
                        if idx + 1 >= tokens.len() {
                            return Err("Missing value after --ladder".to_string());
                        }
                        ladder = Some(tokens[idx + 1].clone());
                        idx += 2;
                    }
                    other => {
                        return Err(format!("Unknown argument '{other}' for render-gel-svg"));
                    }
                }
            }
            Ok(ShellCommand::RenderGelSvg { output, ladder })
        }
        "amplification-curve" => match tokens.len() {
            1 => Ok(ShellCommand::AmplificationCurve { cycles: None }),
            2 => {
                let cycles = tokens[1]
                    .parse::<u32>()
                    .map_err(|_| format!("Invalid cycle count '{}'", tokens[1]))?;
                Ok(ShellCommand::AmplificationCurve {
                    cycles: Some(cycles),
                })
            }
            _ => Err(token_error(cmd)),
        },
        "walkthrough" => Ok(ShellCommand::Walkthrough {
            procedure: one_arg(tokens, cmd)?,
        }),
        "op" => {
            let payload = tokens[1..].join(" ");
            if payload.trim().is_empty() {
                return Err("Missing operation JSON".to_string());
            }
            Ok(ShellCommand::Op { payload })
        }
        "workflow" => {
            let payload = tokens[1..].join(" ");
            if payload.trim().is_empty() {
                return Err("Missing workflow JSON".to_string());
            }
            Ok(ShellCommand::Workflow { payload })
        }
        other => Err(format!("Unknown shell command '{other}'. Try: help")),
    }
}

pub fn parse_shell_line(line: &str) -> Result<ShellCommand, String> {
    let tokens = split_shell_words(line)?;
    parse_shell_tokens(&tokens)
}

pub fn split_shell_words(line: &str) -> Result<Vec<String>, String> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Quoting {
        Normal,
        SingleQuoted,
        DoubleQuoted,
    }

    let mut out = Vec::new();
    let mut current = String::new();
    let mut quoting = Quoting::Normal;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match quoting {
            Quoting::Normal => match ch {
                '\'' => quoting = Quoting::SingleQuoted,
                '"' => quoting = Quoting::DoubleQuoted,
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        out.push(current.clone());
                        current.clear();
                    }
                }
                _ => current.push(ch),
            },
            Quoting::SingleQuoted => {
                if ch == '\'' {
                    quoting = Quoting::Normal;
                } else {
                    current.push(ch);
                }
            }
            Quoting::DoubleQuoted => {
                if ch == '"' {
                    quoting = Quoting::Normal;
                } else if ch == '\\' {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                } else {
                    current.push(ch);
                }
            }
        }
    }

    if quoting != Quoting::Normal {
        return Err("Unterminated quoted string in shell command".to_string());
    }
    if !current.is_empty() {
        out.push(current);
    }
    if out.is_empty() {
        return Err("Empty shell command".to_string());
    }
    Ok(out)
}

pub fn execute_shell_command(
    session: &mut ShellSession,
    command: &ShellCommand,
) -> Result<ShellRunResult, String> {
    let result = match command {
        ShellCommand::Help => ShellRunResult {
            state_changed: false,
            output: json!({ "help": shell_help_text() }),
        },
        ShellCommand::Capabilities => ShellRunResult {
            state_changed: false,
            output: serde_json::to_value(LabEngine::capabilities())
                .map_err(|e| format!("Could not serialize capabilities: {e}"))?,
        },
        ShellCommand::StateSummary => ShellRunResult {
            state_changed: false,
            output: serde_json::to_value(session.engine.summarize_state())
                .map_err(|e| format!("Could not serialize state summary: {e}"))?,
        },
        ShellCommand::SetMode { mode } => {
            session.mode = *mode;
            ShellRunResult {
                state_changed: false,
                output: json!({ "message": format!("Display mode set to {}", mode.as_str()) }),
            }
        }
        ShellCommand::Advance { procedure } => {
            let op_result = session
                .engine
                .apply(Operation::Advance {
                    procedure: procedure.clone(),
                })
                .map_err(|e| e.to_string())?;
            ShellRunResult {
                state_changed: !op_result.changed_procedures.is_empty(),
                output: json!({ "result": op_result }),
            }
        }
        ShellCommand::Reset => {
            let op_result = session
                .engine
                .apply(Operation::ResetExperiment)
                .map_err(|e| e.to_string())?;
            ShellRunResult {
                state_changed: true,
                output: json!({ "result": op_result }),
            }
        }
        ShellCommand::Sample { procedure } => {
            let op_result = session
                .engine
                .apply(Operation::Sample {
                    procedure: procedure.clone(),
                })
                .map_err(|e| e.to_string())?;
            ShellRunResult {
                state_changed: false,
                output: json!({ "result": op_result }),
            }
        }
        ShellCommand::Steps { procedure } => {
            let mut steps = vec![];
            let mut index = 1usize;
            loop {
                match session.engine.step_label(procedure, index) {
                    Ok(label) => {
                        steps.push(json!({ "index": index, "label": label }));
                        index += 1;
                    }
                    Err(e) if index == 1 => return Err(e.to_string()),
                    Err(_) => break,
                }
            }
            ShellRunResult {
                state_changed: false,
                output: json!({ "procedure": procedure, "steps": steps }),
            }
        }
        ShellCommand::Checklist { procedure } => {
            let title =
                report::procedure_title(procedure, session.mode).map_err(|e| e.to_string())?;
            let lines = report::checklist(session.engine.state(), procedure, session.mode)
                .map_err(|e| e.to_string())?;
            ShellRunResult {
                state_changed: false,
                output: json!({ "title": title, "lines": lines }),
            }
        }
        ShellCommand::Metrics { procedure } => {
            let title =
                report::procedure_title(procedure, session.mode).map_err(|e| e.to_string())?;
            let lines = report::metrics_report(session.engine.state(), procedure, session.mode)
                .map_err(|e| e.to_string())?;
            ShellRunResult {
                state_changed: false,
                output: json!({ "title": title, "lines": lines }),
            }
        }
        ShellCommand::Environment => ShellRunResult {
            state_changed: false,
            output: json!({
                "lines": report::environment_summary(session.engine.state(), session.mode)
            }),
        },
        ShellCommand::SetEnvironment { field, value } => {
            let op_result = session
                .engine
                .apply(Operation::ApplyEnvironmentEffect {
                    field: *field,
                    value: *value,
                })
                .map_err(|e| e.to_string())?;
            ShellRunResult {
                state_changed: true,
                output: json!({ "result": op_result }),
            }
        }
        ShellCommand::ValidateSgRna { sequence } => {
            let op_result = session
                .engine
                .apply(Operation::ValidateSgRna {
                    sequence: sequence.clone(),
                })
                .map_err(|e| e.to_string())?;
            ShellRunResult {
                state_changed: false,
                output: json!({ "result": op_result }),
            }
        }
        ShellCommand::RenderGelSvg { output, ladder } => {
            let ladder_name = ladder.as_deref().unwrap_or(DEFAULT_GEL_LADDER);
            let layout = result_gel_layout(ladder_name).map_err(|e| e.to_string())?;
            write_gel_svg(&layout, output).map_err(|e| e.to_string())?;
            ShellRunResult {
                state_changed: false,
                output: json!({
                    "message": format!("Rendered result gel to '{output}'"),
                    "lanes": layout.lanes.len(),
                    "ladder": ladder_name
                }),
            }
        }
        ShellCommand::AmplificationCurve { cycles } => {
            let cycles = cycles.unwrap_or(session.engine.state().parameters.pcr_cycles);
            let points = curves::amplification_curve(cycles, &mut rand::thread_rng());
            let points: Vec<Value> = points
                .iter()
                .map(|(cycle, fluorescence)| json!({ "cycle": cycle, "rfu": fluorescence }))
                .collect();
            ShellRunResult {
                state_changed: false,
                output: json!({ "cycles": cycles, "points": points }),
            }
        }
        ShellCommand::Walkthrough { procedure } => {
            let workflow = workflow_examples::walkthrough(procedure)
                .ok_or_else(|| format!("Unknown procedure '{procedure}'"))?;
            let results = session
                .engine
                .apply_workflow(workflow)
                .map_err(|e| e.to_string())?;
            ShellRunResult {
                state_changed: !results.is_empty(),
                output: json!({ "results": results }),
            }
        }
        ShellCommand::Op { payload } => {
            let json_text = parse_json_payload(payload)?;
            let op: Operation = serde_json::from_str(&json_text)
                .map_err(|e| format!("Invalid operation JSON: {e}"))?;
            let op_result = session.engine.apply(op).map_err(|e| e.to_string())?;
            let state_changed = !op_result.changed_procedures.is_empty()
                || !op_result.completed_procedures.is_empty();
            ShellRunResult {
                state_changed,
                output: json!({ "result": op_result }),
            }
        }
        ShellCommand::Workflow { payload } => {
            let json_text = parse_json_payload(payload)?;
            let workflow: Workflow = serde_json::from_str(&json_text)
                .map_err(|e| format!("Invalid workflow JSON: {e}"))?;
            let results = session
                .engine
                .apply_workflow(workflow)
                .map_err(|e| e.to_string())?;
            let state_changed = results.iter().any(|r| {
                !r.changed_procedures.is_empty() || !r.completed_procedures.is_empty()
            });
            ShellRunResult {
                state_changed,
                output: json!({ "results": results }),
            }
        }
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_advance_and_mode() {
        assert_eq!(
            parse_shell_line("advance heat_shock").unwrap(),
            ShellCommand::Advance {
                procedure: "heat_shock".to_string()
            }
        );
        assert_eq!(
            parse_shell_line("set-mode kids").unwrap(),
            ShellCommand::SetMode { mode: Mode::Kids }
        );
        assert!(parse_shell_line("set-mode grownups").is_err());
    }

    #[test]
    fn parse_op_payload_keeps_json_quoting() {
        // Single quotes protect the JSON payload from the word splitter.
        let cmd = parse_shell_line("op '{ \"Advance\": { \"procedure\": \"pcr\" } }'")
            .expect("op command parse");
        match cmd {
            ShellCommand::Op { payload } => {
                assert!(payload.contains("\"Advance\""));
                assert!(payload.contains("\"procedure\""));
                let op: Operation = serde_json::from_str(&payload).expect("payload is valid JSON");
                assert!(matches!(op, Operation::Advance { .. }));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_render_gel_with_ladder() {
        let cmd = parse_shell_line("render-gel-svg out.svg --ladder '100 bp'")
            .expect("parse command");
        assert_eq!(
            cmd,
            ShellCommand::RenderGelSvg {
                output: "out.svg".to_string(),
                ladder: Some("100 bp".to_string()),
            }
        );
    }

    #[test]
    fn execute_state_summary_returns_json() {
        let mut session = ShellSession::with_seed(42);
        let out = execute_shell_command(&mut session, &ShellCommand::StateSummary)
            .expect("execute state summary");
        assert!(!out.state_changed);
        assert!(out.output.get("environment").is_some());
        assert!(out.output.get("procedures").is_some());
    }

    #[test]
    fn execute_advance_and_checklist_round_trip() {
        let mut session = ShellSession::with_seed(42);
        let out = execute_shell_command(
            &mut session,
            &ShellCommand::Advance {
                procedure: "heat_shock".to_string(),
            },
        )
        .unwrap();
        assert!(out.state_changed);

        let out = execute_shell_command(
            &mut session,
            &ShellCommand::Checklist {
                procedure: "heat_shock".to_string(),
            },
        )
        .unwrap();
        let lines = out.output["lines"].as_array().unwrap();
        assert_eq!(lines[0].as_str().unwrap(), "✓ Prepare competent cells");
    }

    #[test]
    fn execute_walkthrough_then_metrics() {
        let mut session = ShellSession::with_seed(42);
        execute_shell_command(
            &mut session,
            &ShellCommand::Walkthrough {
                procedure: "heat_shock".to_string(),
            },
        )
        .unwrap();
        let out = execute_shell_command(
            &mut session,
            &ShellCommand::Metrics {
                procedure: "heat_shock".to_string(),
            },
        )
        .unwrap();
        let lines = out.output["lines"].as_array().unwrap();
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn set_environment_round_trip() {
        let mut session = ShellSession::with_seed(42);
        let cmd = parse_shell_line("set-environment temperature 37").unwrap();
        assert_eq!(
            cmd,
            ShellCommand::SetEnvironment {
                field: EnvironmentField::Temperature,
                value: 37.0,
            }
        );
        let out = execute_shell_command(&mut session, &cmd).unwrap();
        assert!(out.state_changed);
        assert_eq!(session.engine.state().environment.temperature, 37.0);
        assert!(parse_shell_line("set-environment salinity 3").is_err());
    }

    #[test]
    fn sample_before_completion_surfaces_error() {
        let mut session = ShellSession::with_seed(42);
        let err = execute_shell_command(
            &mut session,
            &ShellCommand::Sample {
                procedure: "pcr".to_string(),
            },
        )
        .unwrap_err();
        assert!(err.contains("PreconditionFailed"));
    }

    #[test]
    fn steps_lists_every_label() {
        let mut session = ShellSession::with_seed(42);
        let out = execute_shell_command(
            &mut session,
            &ShellCommand::Steps {
                procedure: "lb_preparation".to_string(),
            },
        )
        .unwrap();
        let steps = out.output["steps"].as_array().unwrap();
        assert_eq!(steps.len(), 6);
        assert_eq!(
            steps[3]["label"].as_str().unwrap(),
            "Adjust pH to 7.2-7.6"
        );
    }

    #[test]
    fn kids_mode_changes_rendered_labels_only() {
        let mut session = ShellSession::with_seed(42);
        execute_shell_command(&mut session, &ShellCommand::SetMode { mode: Mode::Kids }).unwrap();
        let out = execute_shell_command(
            &mut session,
            &ShellCommand::Checklist {
                procedure: "gel_electrophoresis".to_string(),
            },
        )
        .unwrap();
        assert_eq!(out.output["title"].as_str().unwrap(), "Jelly Run");
        // The engine's canonical step labels are untouched by the mode.
        assert_eq!(
            session
                .engine
                .step_label("gel_electrophoresis", 3)
                .unwrap(),
            "Run electrophoresis at 110 V"
        );
    }
}
