use clap::Parser;
use monkey::cli::{generate_completions, Args, Commands};
use monkey::config::AppConfig;
use monkey::diagnostic::render_diagnostics;
use monkey::interpreter::{Interpreter, RunError};
use monkey::object::Object;
use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;

const PROMPT: &str = ">> ";

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(Commands::Complete { shell }) = args.command {
        generate_completions(shell);
        return ExitCode::SUCCESS;
    }

    let config = AppConfig::from_args(&args);

    if let Some(code) = &args.eval {
        verbose_log(&config, "Evaluating code from --eval");
        return run_program(code, "<eval>", true, &config);
    }

    if let Some(file) = &args.file {
        verbose_log(&config, &format!("Reading program from file: {}", file.display()));
        return match read_file(file) {
            Ok(source) => run_program(&source, &file.display().to_string(), false, &config),
            Err(e) => {
                error_message(&config, &e);
                ExitCode::FAILURE
            }
        };
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    match run_repl(stdin.lock(), stdout.lock(), &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error_message(&config, &format!("Error reading input: {}", e));
            ExitCode::FAILURE
        }
    }
}

/// Runs a whole source text as one program.
fn run_program(source: &str, file_name: &str, print_result: bool, config: &AppConfig) -> ExitCode {
    verbose_log(config, &format!("Read {} bytes of source", source.len()));

    let mut interpreter = Interpreter::new();
    match interpreter.run(source) {
        Ok(Some(Object::Error(message))) => {
            error_message(config, &format!("ERROR: {}", message));
            ExitCode::FAILURE
        }
        Ok(Some(value)) => {
            verbose_log(config, &format!("Program produced a {}", value.kind()));
            if print_result {
                println!("{}", value.inspect());
            }
            ExitCode::SUCCESS
        }
        Ok(None) => {
            verbose_log(config, "Program produced no value");
            ExitCode::SUCCESS
        }
        Err(error) => {
            log_run_error(config, &error);
            let rendered = render_diagnostics(source, file_name, &error.to_diagnostics(), config.color_enabled);
            eprint!("{}", rendered);
            ExitCode::FAILURE
        }
    }
}

fn run_repl<R: BufRead, W: Write>(mut input: R, mut output: W, config: &AppConfig) -> io::Result<()> {
    if !config.quiet {
        let user = std::env::var("USER").unwrap_or_else(|_| "there".to_string());
        writeln!(output, "Hello {}! This is the Monkey programming language!", user)?;
        writeln!(output, "Feel free to type in commands")?;
    }
    verbose_log(config, "Entering interactive mode");

    let mut interpreter = Interpreter::new();
    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            verbose_log(config, "End of input");
            return Ok(());
        }

        match interpreter.run(&line) {
            Ok(Some(value)) => writeln!(output, "{}", value.inspect())?,
            Ok(None) => {}
            Err(RunError::Parse(errors)) => {
                verbose_log(config, &format!("{} parse error(s)", errors.len()));
                writeln!(output, "parser errors:")?;
                for error in &errors {
                    writeln!(output, "\t{}", error)?;
                }
            }
            Err(error @ RunError::Macro(_)) => {
                log_run_error(config, &error);
                output.flush()?;
                error_message(config, &error.to_string());
            }
        }
    }
}

fn log_run_error(config: &AppConfig, error: &RunError) {
    match error {
        RunError::Parse(errors) => verbose_log(config, &format!("Parsing failed with {} error(s)", errors.len())),
        RunError::Macro(error) => verbose_log(config, &format!("Expansion of macro `{}` failed", error.name())),
    }
}

fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))
}

fn verbose_log(config: &AppConfig, message: &str) {
    if config.verbose {
        eprintln!("[monkey:debug] {}", message);
    }
}

fn error_message(config: &AppConfig, message: &str) {
    if config.color_enabled {
        eprintln!("{}", message.red().bold());
    } else {
        eprintln!("{}", message);
    }
}
