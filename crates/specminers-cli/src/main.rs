//! Daikon file tools and invariant mining CLI.
//!
//! Provides the `specminers` binary with subcommands for inspecting
//! declarations, trace and invariant files, and for running Daikon through
//! its container image.
//!
//! Container settings come from the environment (see
//! `RunnerConfig::from_env`) and can be overridden with `--image` and
//! `--docker`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;

use specminers_core::{CodecError, Declarations, InvariantReader, TraceReader};
use specminers_runner::{mine, DockerDaikon, MineError, RunError, RunnerConfig, ToolRunner};

/// Daikon declarations, traces and invariants.
#[derive(Parser)]
#[command(name = "specminers", about = "Daikon declarations, traces and invariants")]
struct Cli {
    /// Daikon image tag (overrides SPECMINERS_DAIKON_IMAGE).
    #[arg(long, global = true)]
    image: Option<String>,

    /// Container CLI executable (overrides SPECMINERS_DOCKER).
    #[arg(long, global = true)]
    docker: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Parse a declarations file and summarise it.
    Decls {
        /// Path to the declarations file.
        file: PathBuf,

        /// Print the re-serialized declarations instead of a summary.
        #[arg(long)]
        emit: bool,
    },

    /// Read trace files and count records per program point.
    Trace {
        /// Declarations the traces were recorded against.
        #[arg(short, long)]
        decls: PathBuf,

        /// Trace files, read in order.
        #[arg(required = true)]
        traces: Vec<PathBuf>,

        /// Print counts as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Parse an invariant report and print it as JSON.
    Invariants {
        /// Declarations the report refers to.
        #[arg(short, long)]
        decls: PathBuf,

        /// Invariant report produced by `daikon.PrintInvariants`.
        report: PathBuf,
    },

    /// Build the Daikon image.
    Install {
        /// Rebuild even if the image exists.
        #[arg(long)]
        force: bool,
    },

    /// Mine invariants from declarations and trace files.
    Mine {
        /// Declarations file, passed to Daikon along with the traces.
        #[arg(short, long)]
        decls: PathBuf,

        /// Trace files.
        #[arg(required = true)]
        traces: Vec<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = RunnerConfig::from_env();
    if let Some(image) = cli.image {
        config.image = image;
    }
    if let Some(docker) = cli.docker {
        config.docker = docker;
    }

    let exit_code = match cli.command {
        Commands::Decls { file, emit } => run_decls(&file, emit),
        Commands::Trace {
            decls,
            traces,
            json,
        } => run_trace(&decls, &traces, json),
        Commands::Invariants { decls, report } => run_invariants(&decls, &report),
        Commands::Install { force } => run_install(&DockerDaikon::new(config), force),
        Commands::Mine { decls, traces } => run_mine(&DockerDaikon::new(config), &decls, &traces),
    };
    process::exit(exit_code);
}

/// Exit code for a codec failure: 3 = I/O error, 1 = anything else.
fn codec_exit_code(err: &CodecError) -> i32 {
    match err {
        CodecError::Io(_) => 3,
        _ => 1,
    }
}

fn load_decls(path: &Path) -> Result<Arc<Declarations>, i32> {
    Declarations::load(path).map(Arc::new).map_err(|e| {
        eprintln!("Error: failed to load declarations '{}': {}", path.display(), e);
        codec_exit_code(&e)
    })
}

fn print_json(value: &serde_json::Value) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e));
    println!("{}", json);
}

/// Execute the decls subcommand.
///
/// Returns exit code: 0 = success, 1 = parse error, 3 = I/O error.
fn run_decls(path: &Path, emit: bool) -> i32 {
    let decls = match load_decls(path) {
        Ok(decls) => decls,
        Err(code) => return code,
    };
    if emit {
        print!("{}", decls);
        return 0;
    }
    let points: Vec<_> = decls
        .points()
        .map(|ppt| {
            json!({
                "name": ppt.name(),
                "kind": ppt.kind(),
                "variables": ppt.len(),
            })
        })
        .collect();
    print_json(&json!({
        "program_points": decls.len(),
        "variables": decls.points().map(|ppt| ppt.len()).sum::<usize>(),
        "points": points,
    }));
    0
}

/// Execute the trace subcommand.
///
/// Returns exit code: 0 = success, 1 = parse error, 3 = I/O error.
fn run_trace(decls_path: &Path, traces: &[PathBuf], as_json: bool) -> i32 {
    let decls = match load_decls(decls_path) {
        Ok(decls) => decls,
        Err(code) => return code,
    };

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut total = 0usize;
    for record in TraceReader::new(Arc::clone(&decls)).read(traces) {
        match record {
            Ok(record) => {
                *counts.entry(record.ppt().name().to_string()).or_default() += 1;
                total += 1;
            }
            Err(e) => {
                eprintln!("Error: invalid trace after {} records: {}", total, e);
                return codec_exit_code(&e);
            }
        }
    }

    if as_json {
        let per_point: serde_json::Map<String, serde_json::Value> = decls
            .names()
            .map(|name| (name.to_string(), json!(counts.get(name).copied().unwrap_or(0))))
            .collect();
        print_json(&json!({ "records": total, "per_point": per_point }));
    } else {
        for name in decls.names() {
            if let Some(count) = counts.get(name) {
                println!("{:>8}  {}", count, name);
            }
        }
        println!("{:>8}  total", total);
    }
    0
}

/// Execute the invariants subcommand.
///
/// Returns exit code: 0 = success, 1 = parse error, 3 = I/O error.
fn run_invariants(decls_path: &Path, report_path: &Path) -> i32 {
    let decls = match load_decls(decls_path) {
        Ok(decls) => decls,
        Err(code) => return code,
    };
    match InvariantReader::new(decls).read_file(report_path) {
        Ok(report) => {
            print_json(&json!(report));
            0
        }
        Err(e) => {
            eprintln!("Error: invalid invariant report '{}': {}", report_path.display(), e);
            codec_exit_code(&e)
        }
    }
}

/// Execute the install subcommand.
///
/// Returns exit code: 0 = success, 2 = tool error.
fn run_install<R: ToolRunner>(runner: &R, force: bool) -> i32 {
    match runner.install(force) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            2
        }
    }
}

/// Execute the mine subcommand.
///
/// Returns exit code: 0 = success, 1 = invalid declarations or report,
/// 2 = tool error, 3 = I/O error.
fn run_mine<R: ToolRunner>(runner: &R, decls_path: &Path, traces: &[PathBuf]) -> i32 {
    let decls = match load_decls(decls_path) {
        Ok(decls) => decls,
        Err(code) => return code,
    };
    let mut inputs = Vec::with_capacity(traces.len() + 1);
    inputs.push(decls_path.to_path_buf());
    inputs.extend_from_slice(traces);

    match mine(runner, decls, &inputs) {
        Ok(report) => {
            print_json(&json!(report));
            0
        }
        Err(MineError::Run(RunError::Io(e))) => {
            eprintln!("I/O error: {}", e);
            3
        }
        Err(MineError::Run(e)) => {
            eprintln!("Tool error: {}", e);
            2
        }
        Err(MineError::Report(e)) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specminers_runner::InstallError;

    const DECLS: &str = "\
decl-version 2.0
ppt land:::ENTER
ppt-type enter
variable altitude
  var-kind variable
  dec-type float
  rep-type float
";

    struct Canned(Result<String, ()>);

    impl ToolRunner for Canned {
        fn is_installed(&self) -> bool {
            true
        }

        fn install(&self, _force: bool) -> Result<(), InstallError> {
            Err(InstallError::BuildFailed {
                image: "canned".into(),
                code: Some(1),
                stderr: "no network".into(),
            })
        }

        fn run(&self, _paths: &[PathBuf]) -> Result<String, RunError> {
            self.0.clone().map_err(|()| RunError::NoInputs)
        }
    }

    fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn decls_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(&dir, "good.decls", DECLS);
        let bad = write(&dir, "bad.decls", "ppt-type enter\n");
        assert_eq!(run_decls(&good, false), 0);
        assert_eq!(run_decls(&good, true), 0);
        assert_eq!(run_decls(&bad, false), 1);
        assert_eq!(run_decls(&dir.path().join("absent.decls"), false), 3);
    }

    #[test]
    fn trace_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let decls = write(&dir, "land.decls", DECLS);
        let good = write(&dir, "good.dtrace", "\nland:::ENTER\naltitude\n3.5\n1\n");
        let bad = write(&dir, "bad.dtrace", "\nland:::EXIT0\n");
        assert_eq!(run_trace(&decls, &[good.clone()], true), 0);
        assert_eq!(run_trace(&decls, &[good, bad], false), 1);
    }

    #[test]
    fn invariants_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let decls = write(&dir, "land.decls", DECLS);
        let report = write(
            &dir,
            "land.inv",
            &format!("{}\nland:::ENTER\naltitude >= 0.0\n", "=".repeat(75)),
        );
        assert_eq!(run_invariants(&decls, &report), 0);
        assert_eq!(run_invariants(&decls, &dir.path().join("absent.inv")), 3);
    }

    #[test]
    fn mine_and_install_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let decls = write(&dir, "land.decls", DECLS);
        let trace = write(&dir, "land.dtrace", "");

        let ok = Canned(Ok(format!("{}\nland:::ENTER\naltitude > 0.0\n", "=".repeat(75))));
        assert_eq!(run_mine(&ok, &decls, &[trace.clone()]), 0);
        assert_eq!(run_mine(&Canned(Err(())), &decls, &[trace.clone()]), 2);
        assert_eq!(run_mine(&Canned(Ok("garbage".into())), &decls, &[trace]), 1);
        assert_eq!(run_install(&ok, true), 2);
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "specminers",
            "--image",
            "daikon:dev",
            "mine",
            "--decls",
            "ardu.decls",
            "a.dtrace",
            "b.dtrace",
        ])
        .unwrap();
        assert_eq!(cli.image.as_deref(), Some("daikon:dev"));
        match cli.command {
            Commands::Mine { decls, traces } => {
                assert_eq!(decls, PathBuf::from("ardu.decls"));
                assert_eq!(traces.len(), 2);
            }
            _ => panic!("expected mine"),
        }
        assert!(Cli::try_parse_from(["specminers", "trace", "--decls", "x.decls"]).is_err());
    }
}
