//! CLI for the shared-nonce search

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use noncesearch::math::{parse_candidate, parse_integer, to_hex_32};
use noncesearch::provider::load_signatures;
use noncesearch::synthetic::forge_shared_nonce;
use noncesearch::{Campaign, Recovery, SearchConfig, SearchError, SearchResult, SignatureInput};
use num_bigint::{BigInt, BigUint};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "noncesearch")]
#[command(about = "Search for a nonce shared by a set of ECDSA signatures")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(long, global = true)]
    json: bool,

    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Run search cycles until every signature agrees on one private key
    Search {
        #[arg(default_value = "-")]
        input: String,

        #[arg(long, help = "JSON file with search parameters")]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,
    },
    /// Print signatures that all reuse one nonce, as JSON
    Forge {
        #[arg(long, value_parser = parse_unsigned_arg)]
        secret: BigUint,

        #[arg(long, value_parser = parse_unsigned_arg)]
        nonce: BigUint,

        #[arg(long, default_value = "3")]
        count: usize,

        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Args)]
struct Overrides {
    #[arg(long, allow_hyphen_values = true, value_parser = parse_signed_arg)]
    initial_k: Option<BigInt>,
    #[arg(long)]
    t_init: Option<f64>,
    #[arg(long)]
    t_min: Option<f64>,
    #[arg(long)]
    alpha: Option<f64>,
    #[arg(long, help = "Annealing iterations per worker per cycle")]
    max_iter: Option<u64>,
    #[arg(long)]
    workers: Option<usize>,
    #[arg(long)]
    step_init: Option<u64>,
    #[arg(long)]
    min_step: Option<u64>,
    #[arg(long, value_parser = parse_unsigned_arg, help = "Predictor search radius")]
    radius: Option<BigUint>,
    #[arg(long, help = "Predictor sample count")]
    samples: Option<usize>,
    #[arg(long, value_parser = parse_unsigned_arg, help = "Max random offset per worker start")]
    perturbation: Option<BigUint>,
    #[arg(long)]
    cache_capacity: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, help = "Give up after this many cycles (default: never)")]
    max_cycles: Option<u64>,
}

impl Overrides {
    fn apply(self, config: &mut SearchConfig) {
        macro_rules! set {
            ($($field:ident),*) => {
                $(if let Some(v) = self.$field { config.$field = v; })*
            };
        }
        set!(
            initial_k,
            t_init,
            t_min,
            alpha,
            max_iter,
            workers,
            step_init,
            min_step,
            radius,
            samples,
            perturbation,
            cache_capacity
        );
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.max_cycles.is_some() {
            config.max_cycles = self.max_cycles;
        }
    }
}

fn parse_signed_arg(s: &str) -> Result<BigInt, String> {
    parse_candidate(s).map_err(|e| e.to_string())
}

fn parse_unsigned_arg(s: &str) -> Result<BigUint, String> {
    parse_integer(s).map_err(|e| e.to_string())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "noncesearch=info",
        1 => "noncesearch=debug",
        _ => "noncesearch=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

enum Outcome {
    Done,
    Exhausted,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::Exhausted) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<Outcome> {
    match cli.command {
        Command::Search {
            input,
            config,
            overrides,
        } => {
            let mut config = match config {
                Some(path) => SearchConfig::from_file(path)?,
                None => SearchConfig::default(),
            };
            overrides.apply(&mut config);

            let signatures = load_signatures(&input)?;
            tracing::info!(
                signatures = signatures.len(),
                workers = config.workers,
                initial_k = %config.initial_k,
                "starting search"
            );
            let mut campaign = Campaign::new(signatures, &config)?;

            match campaign.run() {
                Ok(recovery) => {
                    println!("{}", format_recovery(&recovery, cli.json)?);
                    Ok(Outcome::Done)
                }
                Err(SearchError::Exhausted { cycles, best }) => {
                    println!("{}", format_exhausted(cycles, &best, cli.json)?);
                    Ok(Outcome::Exhausted)
                }
                Err(e) => Err(e.into()),
            }
        }
        Command::Forge {
            secret,
            nonce,
            count,
            seed,
        } => {
            let mut rng = match seed {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            };
            let signatures = forge_shared_nonce(&secret, &nonce, count, &mut rng)
                .ok_or_else(|| {
                    anyhow!("Cannot sign: secret must lie in (1, n) and nonce in (0, n)")
                })?;
            let inputs: Vec<SignatureInput> =
                signatures.iter().map(SignatureInput::from).collect();
            println!("{}", serde_json::to_string_pretty(&inputs)?);
            Ok(Outcome::Done)
        }
    }
}

#[derive(Serialize)]
struct RecoveryOutput {
    status: &'static str,
    k: String,
    private_key_decimal: String,
    private_key_hex: String,
    public_key: Option<String>,
    cycles: u64,
    elapsed_secs: f64,
}

#[derive(Serialize)]
struct ExhaustedOutput {
    status: &'static str,
    cycles: u64,
    best_k: String,
    best_error: String,
}

fn format_recovery(recovery: &Recovery, json: bool) -> Result<String> {
    let report = RecoveryOutput {
        status: "recovered",
        k: recovery.k.to_string(),
        private_key_decimal: recovery.private_key.to_string(),
        private_key_hex: to_hex_32(&recovery.private_key),
        public_key: recovery.public_key.clone(),
        cycles: recovery.cycles,
        elapsed_secs: recovery.elapsed.as_secs_f64(),
    };

    if json {
        return Ok(serde_json::to_string_pretty(&report)?);
    }

    let mut output = String::new();
    output.push_str(&format!(
        "Zero-error candidate found after {} cycles ({:.1}s)\n\n",
        report.cycles, report.elapsed_secs
    ));
    output.push_str(&format!("  k: {}\n", report.k));
    output.push_str(&format!(
        "  Private Key (decimal): {}\n",
        report.private_key_decimal
    ));
    output.push_str(&format!("  Private Key (hex): {}\n", report.private_key_hex));
    if let Some(pk) = &report.public_key {
        output.push_str(&format!("  Public Key: {}\n", pk));
    }
    Ok(output)
}

fn format_exhausted(cycles: u64, best: &SearchResult, json: bool) -> Result<String> {
    let report = ExhaustedOutput {
        status: "exhausted",
        cycles,
        best_k: best.k.to_string(),
        best_error: best.error.to_string(),
    };

    if json {
        return Ok(serde_json::to_string_pretty(&report)?);
    }

    Ok(format!(
        "No zero-error candidate after {} cycles\n\n  Best k: {}\n  Best error: {}\n",
        report.cycles, report.best_k, report.best_error
    ))
}
