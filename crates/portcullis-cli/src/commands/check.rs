//! The `portcullis check` subcommand.
//!
//! Verifies a workload manifest against the attestation store and the
//! trusted key directory, printing the verdict and exiting non-zero on
//! rejection.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use color_eyre::eyre::Result;
use portcullis_ledger::{HttpOccurrenceStore, StoreConfig};
use portcullis_warden::{
    decide_with_store, parse_subject, DecisionPolicy, HashAllowlist, MatchRequirement,
    StoreFailurePolicy, TrustedKeyStore,
};

/// Arguments for `portcullis check`.
#[derive(Args)]
pub struct CheckArgs {
    /// Path to the workload manifest (JSON).
    pub workload: PathBuf,

    /// Base URL of the attestation store.
    #[arg(long, value_name = "URL")]
    pub store_url: String,

    /// Project whose occurrences are consulted.
    #[arg(long, value_name = "ID", default_value = "image-signing")]
    pub project: String,

    /// Directory of trusted armored public keys (`{keyId}.pub`).
    #[arg(long, value_name = "DIR")]
    pub trusted_keys: PathBuf,

    /// Require every matching occurrence to verify, not just one.
    #[arg(long)]
    pub require_all_occurrences: bool,

    /// Admit the workload when the attestation store is unavailable.
    #[arg(long)]
    pub fail_open: bool,

    /// Bound on concurrently verifying containers.
    #[arg(long, value_name = "N", default_value_t = 4)]
    pub max_workers: usize,

    /// Wall-clock budget for the decision, in seconds.
    #[arg(long, value_name = "SECS")]
    pub deadline_secs: Option<u64>,

    /// Output the verdict as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the check command.
pub async fn execute(args: CheckArgs) -> Result<()> {
    let manifest = std::fs::read_to_string(&args.workload)?;
    let subject = parse_subject(&manifest)?;

    let store = HttpOccurrenceStore::new(&StoreConfig::new(args.store_url, args.project))?;
    let keys = Arc::new(TrustedKeyStore::new(args.trusted_keys));

    let policy = DecisionPolicy {
        match_requirement: if args.require_all_occurrences {
            MatchRequirement::AllVerified
        } else {
            MatchRequirement::AnyVerified
        },
        on_store_failure: if args.fail_open {
            StoreFailurePolicy::FailOpen
        } else {
            StoreFailurePolicy::FailClosed
        },
        allowed_hashes: HashAllowlist::default(),
        max_workers: args.max_workers,
        deadline: args.deadline_secs.map(Duration::from_secs),
    };

    let verdict = decide_with_store(&*subject, &store, &keys, &policy).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else if verdict.allowed {
        println!("Workload admitted: {}", verdict.reason);
    } else {
        println!("Workload rejected: {}", verdict.reason);
    }

    if !verdict.allowed {
        process::exit(1);
    }

    Ok(())
}
