#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sable::config::{self, Config};
use sable::pipeline::{self, ProgramSource, Verdict};
use sable_proof::{Expectation, Seed};
use sable_verify::{Backend, VerifyOutcome};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sable", version, about = "Compile proof scripts to Dafny or Rosette and check them")]
struct Cli {
    /// Log at debug level unless `SABLE_LOG` says otherwise.
    #[arg(long, global = true)]
    debug: bool,

    /// Use this manifest instead of searching for `sable.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum BackendArg {
    Dafny,
    Rosette,
}

impl From<BackendArg> for Backend {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Dafny => Backend::Dafny,
            BackendArg::Rosette => Backend::Rosette,
        }
    }
}

#[derive(clap::Args, Debug)]
struct Common {
    /// A script file, a literal script, or `-` to read stdin
    program: String,

    /// Keep the generated backend program
    #[arg(short = 'k', long = "keep-file")]
    keep_file: bool,

    /// Print the generated backend program
    #[arg(short, long)]
    verbose: bool,

    /// Logical backend (defaults to `verifier.backend` in sable.toml, then dafny)
    #[arg(short, long, value_enum)]
    backend: Option<BackendArg>,

    /// Additional directory to search for `dafny`/`racket` (repeatable)
    #[arg(long)]
    path: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Prove every assertion and equivalence in a script
    Prove {
        #[command(flatten)]
        common: Common,
    },
    /// Evaluate a script and print each top-level result
    Run {
        #[command(flatten)]
        common: Common,

        /// Expected final result: an integer or a value kind such as `Error`
        #[arg(short, long)]
        expect: Option<String>,

        /// Seed the initial context with `name=value`
        #[arg(short, long)]
        context: Option<String>,
    },
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("SABLE_LOG").unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

struct Input {
    src: String,
    config: Config,
    backend: Backend,
}

fn load_input(common: &Common, config_path: Option<&PathBuf>) -> miette::Result<Input> {
    let source = ProgramSource::from_arg(&common.program);
    let src = source.read()?;
    if source == ProgramSource::Stdin {
        println!("---");
    }
    let config = match config_path {
        Some(path) => config::load_manifest(path)?,
        None => config::load_config(&source.config_start()?)?,
    };
    let backend = common.backend.map(Backend::from).unwrap_or(config.backend);
    Ok(Input { src, config, backend })
}

fn print_script(program: &str) {
    println!();
    println!("Script:");
    println!("{program}");
}

fn print_kept(outcome: &VerifyOutcome) {
    if let Some(script) = &outcome.script {
        println!("  Script: {}", script.display());
    }
}

fn exit_code(verdict: Verdict) -> ExitCode {
    match verdict {
        Verdict::ExpectedFailure => println!("(expected failure)"),
        Verdict::UnexpectedPass => println!("(unexpected pass: script is marked XFAIL)"),
        Verdict::Passed | Verdict::Failed => {}
    }
    if verdict.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn prove(common: &Common, config_path: Option<&PathBuf>) -> miette::Result<ExitCode> {
    let input = load_input(common, config_path)?;
    if pipeline::is_skipped(&input.src, input.backend) {
        println!("Skipped ({} is excluded by the script)", input.backend.name());
        return Ok(ExitCode::SUCCESS);
    }

    let program = pipeline::compile_proofs(&input.src, input.backend, &input.config)?;
    let outcome = pipeline::verifier(input.backend, &input.config, &common.path, common.keep_file)
        .verbose(true)
        .verify(&program)?;

    println!("{}", if outcome.success { "Success!" } else { "FAILED!" });
    print_kept(&outcome);
    if common.verbose {
        print_script(&program);
    }
    Ok(exit_code(pipeline::verdict(&input.src, input.backend, outcome.success)))
}

fn run(
    common: &Common,
    expect: Option<&str>,
    context: Option<&str>,
    config_path: Option<&PathBuf>,
) -> miette::Result<ExitCode> {
    let input = load_input(common, config_path)?;
    if pipeline::is_skipped(&input.src, input.backend) {
        println!("Skipped ({} is excluded by the script)", input.backend.name());
        return Ok(ExitCode::SUCCESS);
    }

    let seed = context.map(str::parse::<Seed>).transpose()?;
    let expect = expect.and_then(Expectation::parse);
    let program = pipeline::compile_run(&input.src, seed, expect, input.backend, &input.config)?;
    let outcome = pipeline::verifier(input.backend, &input.config, &common.path, common.keep_file)
        .verify(&program)?;

    if !outcome.success {
        println!("FAILED!\n");
    }
    println!("{}", outcome.output);
    if common.verbose {
        print_script(&program);
    }
    print_kept(&outcome);
    Ok(exit_code(pipeline::verdict(&input.src, input.backend, outcome.success)))
}

fn main() -> miette::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    let config_path = cli.config.as_ref();

    match &cli.cmd {
        Cmd::Prove { common } => prove(common, config_path),
        Cmd::Run {
            common,
            expect,
            context,
        } => run(common, expect.as_deref(), context.as_deref(), config_path),
    }
}
