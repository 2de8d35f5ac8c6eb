use std::io::{self, Write};

use clap::Args;
use shedding_analysis::peak::{PeakSummary, SheddingPeak};

use super::{FilterArg, GlobalArg, table};
use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct PeakArg {
    /// Dataset identifier
    pub dataset: String,

    #[command(flatten)]
    pub filter: FilterArg,

    /// Report one row per participant and analyte instead of the summary
    #[arg(long)]
    pub individual: bool,
}

pub(crate) fn run(global: &GlobalArg, arg: &PeakArg) -> anyhow::Result<()> {
    let dataset = util::load_dataset(&global.data_dir, &arg.dataset)?;
    let filter = arg.filter.to_filter()?;
    let records = SheddingPeak::individual(&dataset, &filter)?;

    if arg.individual {
        Output::emit(global.output.as_deref(), global.format, &records, |out| {
            print_individual(out, &records)
        })
    } else {
        let summary = SheddingPeak::summarize(&records);
        Output::emit(global.output.as_deref(), global.format, &summary, |out| {
            print_summary(out, &summary)
        })
    }
}

fn print_individual(out: &mut Output, records: &[SheddingPeak]) -> io::Result<()> {
    table::title(out, "Shedding Peak by Participant")?;
    table::header(
        out,
        &format!(
            "{:>11} {:<20} {:<16} {:>8} {:>10} {:>14}",
            "Participant", "Analyte", "Unit", "Samples", "Peak time", "Peak value",
        ),
    )?;
    for r in records {
        writeln!(
            out,
            "  {:>11} {:<20} {:<16} {:>8} {:>10.1} {:>14.3e}",
            r.participant_id, r.analyte, r.unit, r.n_sample, r.peak_time, r.peak_value,
        )?;
    }
    Ok(())
}

fn print_summary(out: &mut Output, summary: &[PeakSummary]) -> io::Result<()> {
    table::title(out, "Shedding Peak Summary")?;
    table::header(
        out,
        &format!(
            "{:<16} {:<24} {:<16} {:>9} {:>9} {:>9} {:>11} {:>11} {:>11} {:>8} {:>8}",
            "Biomarker",
            "Specimen",
            "Unit",
            "Time P25",
            "Time Med",
            "Time P75",
            "Value P25",
            "Value Med",
            "Value P75",
            "Samples",
            "Subjects",
        ),
    )?;
    for s in summary {
        writeln!(
            out,
            "  {:<16} {:<24} {:<16} {:>9.1} {:>9.1} {:>9.1} {:>11.2e} {:>11.2e} {:>11.2e} {:>8} {:>8}",
            s.biomarker,
            s.specimen,
            s.unit,
            s.peak_time.q25,
            s.peak_time.median,
            s.peak_time.q75,
            s.peak_value.q25,
            s.peak_value.median,
            s.peak_value.q75,
            s.n_sample,
            s.n_participant,
        )?;
    }
    Ok(())
}
