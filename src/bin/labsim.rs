use labsim::about;
use labsim::engine_shell::{
    ShellSession, execute_shell_command, parse_shell_line, shell_help_text,
};
use std::env;
use std::io::{self, BufRead, Write};

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return;
    }

    println!("{}", about::version_cli_text());
    println!("Type 'help' for commands, 'quit' to leave the session.");

    // One session per process run: state lives here and dies with the REPL.
    let mut session = ShellSession::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("labsim> ");
        let _ = io::stdout().flush();
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        match parse_shell_line(line) {
            Ok(command) => {
                if command.is_state_mutating() {
                    println!("· {}", command.preview());
                }
                match execute_shell_command(&mut session, &command) {
                    Ok(result) => match serde_json::to_string_pretty(&result.output) {
                        Ok(text) => println!("{text}"),
                        Err(e) => eprintln!("Could not serialize output: {e}"),
                    },
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            Err(e) => {
                eprintln!("Error: {e}");
                eprintln!("{}", shell_help_text());
            }
        }
    }
}
