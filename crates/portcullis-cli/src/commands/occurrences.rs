//! The `portcullis occurrences` subcommand.
//!
//! Lists the occurrences recorded in the attestation store, optionally
//! filtered to those matching one image reference.

use clap::Args;
use color_eyre::eyre::Result;
use portcullis_ledger::{HttpOccurrenceStore, Occurrence, OccurrenceStore, StoreConfig};
use portcullis_warden::matcher::matching_occurrences;
use portcullis_warden::ImageRef;

/// Arguments for `portcullis occurrences`.
#[derive(Args)]
pub struct OccurrencesArgs {
    /// Base URL of the attestation store.
    #[arg(long, value_name = "URL")]
    pub store_url: String,

    /// Project whose occurrences are listed.
    #[arg(long, value_name = "ID", default_value = "image-signing")]
    pub project: String,

    /// Only show occurrences matching this image reference.
    #[arg(long, value_name = "REF")]
    pub image: Option<String>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the occurrences command.
pub async fn execute(args: OccurrencesArgs) -> Result<()> {
    let store = HttpOccurrenceStore::new(&StoreConfig::new(args.store_url, args.project))?;
    let occurrences = store.list_occurrences().await?;

    let selected: Vec<&Occurrence> = match &args.image {
        Some(image) => matching_occurrences(&ImageRef::from(image.as_str()), &occurrences),
        None => occurrences.iter().collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&selected)?);
        return Ok(());
    }

    for occurrence in &selected {
        let key_id = occurrence
            .pgp_attestation()
            .map_or("-", |a| a.pgp_key_id.as_str());
        println!(
            "{}  kind={}  key={}",
            occurrence.resource_url,
            occurrence.kind.as_deref().unwrap_or("-"),
            key_id
        );
    }
    println!();
    println!("{} occurrence(s)", selected.len());

    Ok(())
}
