//! CLI tool to format PHP source files.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Format PHP source files.
///
/// Without files, reads standard input and writes standard output.
#[derive(Debug, Parser)]
#[command(name = "phpfmt", version, about)]
struct Cli {
    /// Write the result back to the source file instead of standard output
    #[arg(short = 'w')]
    write: bool,

    /// Increase logging verbosity (-v: debug, -vv+: trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Files to format
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(cli.verbose))),
        )
        .with_writer(io::stderr)
        .init();

    if cli.files.is_empty() {
        if cli.write {
            eprintln!("phpfmt: cannot use -w with standard input");
            return ExitCode::from(2);
        }
        return match phpfmt_rs::format_reader(io::stdin().lock()) {
            Ok(out) => match io::stdout().lock().write_all(out.as_bytes()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("phpfmt: {e}");
                    ExitCode::FAILURE
                }
            },
            Err(e) => {
                eprintln!("phpfmt: {}", diagnostic("<stdin>", &e));
                ExitCode::FAILURE
            }
        };
    }

    let mut had_error = false;
    for path in &cli.files {
        let name = path.display().to_string();
        let result = fs::read_to_string(path)
            .map_err(phpfmt_rs::Error::from)
            .and_then(|content| {
                let out = phpfmt_rs::format_str(&content)?;
                Ok((content, out))
            });
        let (content, out) = match result {
            Ok(pair) => pair,
            Err(e) => {
                eprintln!("phpfmt: {}", diagnostic(&name, &e));
                had_error = true;
                continue;
            }
        };

        let written = if cli.write {
            if content == out {
                debug!(file = %name, "already formatted");
                Ok(())
            } else {
                debug!(file = %name, "rewriting");
                fs::write(path, out)
            }
        } else {
            io::stdout().lock().write_all(out.as_bytes())
        };
        if let Err(e) = written {
            eprintln!("phpfmt: {name}: {e}");
            had_error = true;
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// `FILE:LINE:COL: MESSAGE`, or `FILE: MESSAGE` for errors without a
/// position.
fn diagnostic(name: &str, err: &phpfmt_rs::Error) -> String {
    match err.position() {
        Some(pos) => format!("{name}:{}:{}: {}", pos.line, pos.column, err.message()),
        None => format!("{name}: {}", err.message()),
    }
}

const fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "phpfmt_rs=warn",
        1 => "phpfmt_rs=debug",
        _ => "phpfmt_rs=trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_levels() {
        assert_eq!(directive_for_verbosity(0), "phpfmt_rs=warn");
        assert_eq!(directive_for_verbosity(1), "phpfmt_rs=debug");
        assert_eq!(directive_for_verbosity(5), "phpfmt_rs=trace");
    }

    #[test]
    fn diagnostics_include_position() {
        let err = phpfmt_rs::format_str("<?php function a(").unwrap_err();
        assert_eq!(
            diagnostic("a.php", &err),
            "a.php:1:18: expecting ), found EOF"
        );
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from(["phpfmt", "-w", "-vv", "a.php", "b.php"]).unwrap();
        assert!(cli.write);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.files.len(), 2);
    }
}
