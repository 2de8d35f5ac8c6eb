use std::io::{self, Write};

use clap::Args;
use shedding_analysis::summary::SheddingSummary;

use super::{FilterArg, GlobalArg, table};
use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct SummaryArg {
    /// Dataset identifier
    pub dataset: String,

    #[command(flatten)]
    pub filter: FilterArg,
}

pub(crate) fn run(global: &GlobalArg, arg: &SummaryArg) -> anyhow::Result<()> {
    let dataset = util::load_dataset(&global.data_dir, &arg.dataset)?;
    let filter = arg.filter.to_filter()?;
    let records = SheddingSummary::from_dataset(&dataset, &filter)?;
    Output::emit(global.output.as_deref(), global.format, &records, |out| {
        print_records(out, &dataset.dataset_id, &records)
    })
}

fn print_records(out: &mut Output, dataset_id: &str, records: &[SheddingSummary]) -> io::Result<()> {
    table::title(out, &format!("Shedding Summary: {dataset_id}"))?;
    table::header(
        out,
        &format!(
            "{:>11} {:<20} {:<14} {:>9} {:>9} {:>9} {:>11} {:>9} {:>5} {:>5} {:<12} {:>9}",
            "Participant",
            "Analyte",
            "Value type",
            "First pos",
            "Last pos",
            "Duration",
            "Peak value",
            "Peak time",
            "Pos",
            "Neg",
            "Status",
            "Clearance",
        ),
    )?;
    for r in records {
        writeln!(
            out,
            "  {:>11} {:<20} {:<14} {:>9} {:>9} {:>9} {:>11} {:>9} {:>5} {:>5} {:<12} {:>9}",
            r.participant_id,
            r.analyte,
            r.value_type.to_string(),
            table::opt(r.first_positive_time, 1),
            table::opt(r.last_positive_time, 1),
            table::opt(r.shedding_duration, 1),
            r.peak_value.map_or("N/A".to_string(), |v| format!("{v:.2e}")),
            table::opt(r.peak_time, 1),
            r.n_positive,
            r.n_negative,
            r.clearance_status.to_string(),
            table::opt(r.clearance_time, 1),
        )?;
    }
    Ok(())
}
