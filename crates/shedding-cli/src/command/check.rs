use std::io::{self, Write};

use anyhow::Context;
use clap::{ArgGroup, Args};
use shedding_data::lookup::{self, DEFAULT_SIMILARITY_THRESHOLD, LookupResult};

use super::GlobalArg;
use crate::util::Output;

#[derive(Debug, Clone, Args)]
#[command(group(ArgGroup::new("query").required(true).multiple(true).args(["doi", "title"])))]
pub(crate) struct CheckArg {
    /// DOI of the publication
    #[arg(long)]
    pub doi: Option<String>,

    /// Title of the publication
    #[arg(long)]
    pub title: Option<String>,

    /// Minimum title similarity (0 to 1) for reporting a near match
    #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
    pub threshold: f64,
}

pub(crate) fn run(global: &GlobalArg, arg: &CheckArg) -> anyhow::Result<()> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&arg.threshold),
        "--threshold must be between 0 and 1, got {}",
        arg.threshold
    );
    let result = lookup::check_dataset(
        &global.data_dir,
        arg.doi.as_deref(),
        arg.title.as_deref(),
        arg.threshold,
    )
    .context("Failed to search the dataset corpus")?;

    Output::emit(global.output.as_deref(), global.format, &result, |out| {
        print_result(out, &result)
    })
}

fn print_result(out: &mut Output, result: &LookupResult) -> io::Result<()> {
    match result {
        LookupResult::Found { dataset_id } => {
            writeln!(out, "Found: the publication is already curated as {dataset_id}")
        }
        LookupResult::Similar {
            dataset_id,
            title,
            identifier,
            ratio,
        } => {
            writeln!(out, "Not found, but a similar dataset exists:")?;
            writeln!(out, "  Dataset    : {dataset_id}")?;
            writeln!(out, "  Title      : {title}")?;
            writeln!(out, "  DOI / URL  : {identifier}")?;
            writeln!(out, "  Similarity : {ratio:.2}")
        }
        LookupResult::NotFound => writeln!(out, "Not found: no matching dataset in the corpus"),
    }
}
