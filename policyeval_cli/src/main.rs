//! Command-line interface for the PolicyEval engine.
//!
//! Reads a policy (file path or inline JSON) and an input payload (inline
//! JSON), evaluates the policy, and maps the decision to the process exit
//! status.
//!
//! Exit codes:
//!   0: policy allowed the action
//!   1: a rule failed during evaluation
//!   2: usage error, or the policy could not be prepared
//!   3: policy denied the action

use anyhow::Context;
use clap::{Parser, Subcommand};
use policyeval::{load_policy, EvalOptions, PolicyEngine, PolicyError, StrictMode};
use serde_json::Value;

const EXIT_ALLOWED: i32 = 0;
const EXIT_EVALUATION_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_DENIED: i32 = 3;

/// PolicyEval command-line interface
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a policy against a JSON input payload
    Evaluate {
        /// Policy JSON file path or inline JSON
        #[clap(long)]
        policy: String,

        /// Inline JSON payload
        #[clap(long)]
        input: String,

        /// Strict mode: off, warn or raise
        #[clap(long)]
        strict: Option<String>,

        /// Print the per-rule explanation as JSON instead of allow/deny
        #[clap(long)]
        explain: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Evaluate {
            policy,
            input,
            strict,
            explain,
        } => cmd_evaluate(&policy, &input, strict.as_deref(), explain),
    };
    std::process::exit(code);
}

fn cmd_evaluate(policy: &str, input: &str, strict: Option<&str>, explain: bool) -> i32 {
    match run_evaluate(policy, input, strict, explain) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            match err.downcast_ref::<PolicyError>() {
                Some(PolicyError::Evaluation(_)) => EXIT_EVALUATION_ERROR,
                _ => EXIT_USAGE,
            }
        }
    }
}

fn run_evaluate(
    policy: &str,
    input: &str,
    strict: Option<&str>,
    explain: bool,
) -> anyhow::Result<i32> {
    let strict = strict.map(str::parse::<StrictMode>).transpose()?;
    let spec = load_policy(policy)?;
    let payload: Value = serde_json::from_str(input).context("invalid input JSON")?;

    let engine = PolicyEngine::new();
    let opts = EvalOptions {
        strict,
        now: None,
        explain,
    };
    let decision = engine.evaluate(&spec, &payload, opts)?;

    if explain {
        if let Some(explanation) = &decision.explanation {
            println!("{}", serde_json::to_string_pretty(explanation)?);
        }
    } else {
        println!("{}", if decision.allowed { "allow" } else { "deny" });
    }

    Ok(if decision.allowed {
        EXIT_ALLOWED
    } else {
        EXIT_DENIED
    })
}
