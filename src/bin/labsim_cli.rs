use labsim::about;
use labsim::engine_shell::{ShellSession, execute_shell_command, parse_shell_tokens};
use labsim::translations::Mode;
use std::{env, process};

fn usage() {
    eprintln!(
        "Usage:\n  \
  labsim_cli --version\n  \
  labsim_cli [--mode professional|kids] capabilities\n  \
  labsim_cli [--mode professional|kids] state-summary\n  \
  labsim_cli [--mode professional|kids] steps PROCEDURE\n  \
  labsim_cli [--mode professional|kids] checklist PROCEDURE\n  \
  labsim_cli [--mode professional|kids] walkthrough PROCEDURE\n  \
  labsim_cli [--mode professional|kids] validate-sgrna SEQUENCE\n  \
  labsim_cli [--mode professional|kids] render-gel-svg OUTPUT.svg [--ladder NAME]\n  \
  labsim_cli [--mode professional|kids] op '<operation-json>'\n  \
  labsim_cli [--mode professional|kids] workflow '<workflow-json>'\n\n  \
  Each invocation is one fresh session; nothing is persisted.\n  \
  Tip: pass @file.json instead of inline JSON"
    );
}

fn parse_mode_arg(args: &[String]) -> Result<(Mode, usize), String> {
    if args.len() >= 2 && args[0] == "--mode" {
        let mode = Mode::parse(&args[1])
            .ok_or_else(|| format!("Unknown mode '{}', expected 'professional' or 'kids'", args[1]))?;
        return Ok((mode, 2));
    }
    Ok((Mode::default(), 0))
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return Ok(());
    }
    if args.is_empty() {
        usage();
        return Err("Missing command".to_string());
    }

    let (mode, skip) = parse_mode_arg(&args)?;
    let tokens: Vec<String> = args[skip..].to_vec();
    let command = parse_shell_tokens(&tokens)?;

    let mut session = ShellSession::new();
    session.mode = mode;
    let result = execute_shell_command(&mut session, &command)?;
    let text = serde_json::to_string_pretty(&result.output)
        .map_err(|e| format!("Could not serialize output: {e}"))?;
    println!("{text}");
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
