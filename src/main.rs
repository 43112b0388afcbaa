//! CLI to list and resolve `${VAR}` path references in source files.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use cmake_path_resolver::{
    Collector, Error, Expansion, SourceBuffer, Summary, VariableEnv, format, parse_binding,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "cmake-paths",
    about = "Resolve CMake ${VAR} path references in source files",
    version
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct EnvArgs {
    /// CMakeCache.txt-style file with NAME:TYPE=VALUE lines.
    #[arg(long = "env", value_name = "FILE")]
    env_file: Option<PathBuf>,

    /// Extra binding, applied after the cache file.
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    vars: Vec<(String, String)>,
}

#[derive(Subcommand)]
enum Command {
    /// Print one `path:start-end<TAB>status<TAB>resolved` line per reference.
    Resolve {
        #[command(flatten)]
        env: EnvArgs,

        /// Re-expand values containing placeholders up to N times.
        #[arg(long, value_name = "N")]
        max_depth: Option<usize>,

        /// Warn about resolved paths that do not exist.
        #[arg(long)]
        check_exists: bool,

        #[arg(required = true, value_name = "FILES")]
        files: Vec<PathBuf>,
    },
    /// Print the merged variable environment.
    Vars {
        #[command(flatten)]
        env: EnvArgs,
    },
}

fn parse_var(binding: &str) -> Result<(String, String), String> {
    parse_binding(binding).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Resolve {
            env,
            max_depth,
            check_exists,
            files,
        } => resolve(&env, max_depth, check_exists, &files),
        Command::Vars { env } => vars(&env),
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_env(args: &EnvArgs) -> Result<VariableEnv, Error> {
    let mut env = VariableEnv::new();
    if let Some(path) = &args.env_file {
        let count = env.bootstrap_from_cmake_cache(path)?;
        info!(path = %path.display(), bindings = count, "loaded variables");
    }
    for (name, value) in &args.vars {
        env.bind(name.as_str(), value.as_str())?;
    }
    Ok(env)
}

fn resolve(
    args: &EnvArgs,
    max_depth: Option<usize>,
    check_exists: bool,
    files: &[PathBuf],
) -> ExitCode {
    let env = match build_env(args) {
        Ok(env) => env,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };

    let mut io_failed = false;
    let mut loaded = Vec::with_capacity(files.len());
    for path in files {
        match fs::read(path) {
            Ok(bytes) => loaded.push((path.display().to_string(), bytes)),
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                io_failed = true;
            }
        }
    }

    let buffers: Vec<_> = loaded
        .iter()
        .map(|(path, bytes)| SourceBuffer::new(path, bytes))
        .collect();
    let expansion = max_depth.map_or(Expansion::SinglePass, |fuel| Expansion::Recursive {
        fuel,
    });
    let refs = Collector::new()
        .expansion(expansion)
        .collect(&buffers, &env);

    if check_exists {
        for collected in &refs {
            let reference = &collected.reference;
            if reference.status.is_resolved() && !reference.exists_on_disk() {
                let buffer = &buffers[collected.buffer_id];
                let (line, column) = buffer.line_col(reference.source_span.start);
                warn!(
                    file = buffer.path,
                    line,
                    column,
                    resolved = %reference.resolved_path,
                    "resolved path does not exist"
                );
            }
        }
    }

    print!("{}", format(&buffers, &refs));

    let summary = Summary::of(refs.iter().map(|c| &c.reference));
    info!(
        files = buffers.len(),
        resolved = summary.resolved,
        unresolved = summary.unresolved,
        malformed = summary.malformed,
        "done"
    );

    if io_failed {
        ExitCode::from(2)
    } else if summary.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn vars(args: &EnvArgs) -> ExitCode {
    match build_env(args) {
        Ok(env) => {
            for (name, value) in env.bindings() {
                println!("{name}={value}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}
