//! # Registry Filesystem Browser
//!
//! Entry point for the `regfs` command.

use regfs_cli::{load_filesystem, run_command, BrowseCommand, BrowseCommandParser};
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

struct Options {
    snapshot: PathBuf,
    config: Option<PathBuf>,
    command: BrowseCommand,
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    let options = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(&args[0]);
        process::exit(1);
    });

    let fs = load_filesystem(&options.snapshot, options.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Failed to load registry: {}", e);
        process::exit(1);
    });

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = run_command(&fs, &options.command, &mut out);
    let _ = out.flush();
    if let Err(e) = result {
        eprintln!("{}: {}", options.command.path(), e);
        process::exit(e.exit_code());
    }
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut snapshot = None;
    let mut config = None;
    let mut words = Vec::new();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--snapshot" | "-s" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --snapshot".to_string());
                }
                snapshot = Some(PathBuf::from(&args[i]));
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --config".to_string());
                }
                config = Some(PathBuf::from(&args[i]));
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') && words.is_empty() => {
                return Err(format!("Unknown option: {}", other));
            }
            word => words.push(word.to_string()),
        }
        i += 1;
    }

    let snapshot = snapshot.ok_or_else(|| "Missing --snapshot".to_string())?;
    let command = BrowseCommandParser::parse(words.as_slice()).map_err(|e| e.to_string())?;
    Ok(Options {
        snapshot,
        config,
        command,
    })
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} --snapshot <FILE> [OPTIONS] <COMMAND> <PATH>", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --snapshot <FILE>    Registry snapshot (JSON)");
    eprintln!("  -c, --config <FILE>      Filesystem configuration (JSON)");
    eprintln!("  -h, --help               Show this help message");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  ls <PATH>                List a key");
    eprintln!("  cat <PATH>               Print a value");
    eprintln!("  stat <PATH>              Print the status of a key or value");
    eprintln!();
    eprintln!("Set RUST_LOG=debug to trace filesystem calls.");
    eprintln!();
    eprintln!("Examples:");
    eprintln!(
        "  {} -s machine.json ls /proc/registry/HKEY_LOCAL_MACHINE/Software",
        program
    );
    eprintln!(
        "  {} -s machine.json cat /proc/registry64/HKEY_CURRENT_USER/Environment/PATH",
        program
    );
}
