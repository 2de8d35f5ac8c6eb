use std::io::{self, Write};

use clap::Args;
use shedding_analysis::duration::{DurationSummary, SheddingDuration};

use super::{FilterArg, GlobalArg, table};
use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct DurationArg {
    /// Dataset identifier
    pub dataset: String,

    #[command(flatten)]
    pub filter: FilterArg,

    /// Report one row per participant and analyte instead of the summary
    #[arg(long)]
    pub individual: bool,
}

pub(crate) fn run(global: &GlobalArg, arg: &DurationArg) -> anyhow::Result<()> {
    let dataset = util::load_dataset(&global.data_dir, &arg.dataset)?;
    let filter = arg.filter.to_filter()?;
    let records = SheddingDuration::individual(&dataset, &filter)?;

    if arg.individual {
        Output::emit(global.output.as_deref(), global.format, &records, |out| {
            print_individual(out, &records)
        })
    } else {
        let summary = SheddingDuration::summarize(&records);
        Output::emit(global.output.as_deref(), global.format, &summary, |out| {
            print_summary(out, &summary)
        })
    }
}

fn print_individual(out: &mut Output, records: &[SheddingDuration]) -> io::Result<()> {
    table::title(out, "Shedding Duration by Participant")?;
    table::header(
        out,
        &format!(
            "{:>11} {:<20} {:>8} {:>12} {:>12} {:>12} {:>12} {:>10}",
            "Participant", "Analyte", "Samples", "First", "Last", "First det.", "Last det.", "Duration",
        ),
    )?;
    for r in records {
        writeln!(
            out,
            "  {:>11} {:<20} {:>8} {:>12.1} {:>12.1} {:>12} {:>12} {:>10}",
            r.participant_id,
            r.analyte,
            r.n_sample,
            r.first_sample,
            r.last_sample,
            table::opt(r.first_detect, 1),
            table::opt(r.last_detect, 1),
            table::opt(r.shedding_duration, 1),
        )?;
    }
    Ok(())
}

fn print_summary(out: &mut Output, summary: &[DurationSummary]) -> io::Result<()> {
    table::title(out, "Shedding Duration Summary (days)")?;
    table::header(
        out,
        &format!(
            "{:<16} {:<24} {:<20} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7} {:>8} {:>8}",
            "Biomarker", "Specimen", "Reference", "Min", "P25", "Median", "P75", "Max", "Mean", "Samples", "Subjects",
        ),
    )?;
    for s in summary {
        let q = s.shedding_duration;
        writeln!(
            out,
            "  {:<16} {:<24} {:<20} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7} {:>8} {:>8}",
            s.biomarker,
            s.specimen,
            s.reference_event,
            table::opt(q.map(|q| q.min), 1),
            table::opt(q.map(|q| q.q25), 1),
            table::opt(q.map(|q| q.median), 1),
            table::opt(q.map(|q| q.q75), 1),
            table::opt(q.map(|q| q.max), 1),
            table::opt(q.map(|q| q.mean), 1),
            s.n_sample,
            s.n_participant,
        )?;
    }
    Ok(())
}
