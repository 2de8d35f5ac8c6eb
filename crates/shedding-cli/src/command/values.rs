use std::io::{self, Write};

use clap::Args;
use shedding_analysis::{bins::TimeBinOptions, values::ValueSummary};

use super::{BinArg, FilterArg, GlobalArg, table};
use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct ValuesArg {
    /// Dataset identifier
    pub dataset: String,

    #[command(flatten)]
    pub filter: FilterArg,

    #[command(flatten)]
    pub bins: BinArg,
}

pub(crate) fn run(global: &GlobalArg, arg: &ValuesArg) -> anyhow::Result<()> {
    let dataset = util::load_dataset(&global.data_dir, &arg.dataset)?;
    let filter = arg.filter.to_filter()?;
    let summary = ValueSummary::from_dataset(&dataset, &filter, TimeBinOptions::from(&arg.bins))?;
    Output::emit(global.output.as_deref(), global.format, &summary, |out| {
        print_summary(out, &summary)
    })
}

fn print_summary(out: &mut Output, summary: &ValueSummary) -> io::Result<()> {
    table::title(
        out,
        &format!("Value Trajectory: {} ({})", summary.dataset_id, summary.value_type),
    )?;
    table::header(
        out,
        &format!(
            "{:>8} {:>6} {:>11} {:>11} {:>11} {:>11} {:>11} {:>11} {:>11}",
            "Time", "N", "Mean", "Std", "Median", "P25", "P75", "Min", "Max",
        ),
    )?;
    for bin in &summary.bins {
        writeln!(
            out,
            "  {:>8.1} {:>6} {:>11.3e} {:>11} {:>11.3e} {:>11.3e} {:>11.3e} {:>11.3e} {:>11.3e}",
            bin.time,
            bin.n,
            bin.mean,
            bin.std.map_or("N/A".to_string(), |s| format!("{s:.3e}")),
            bin.median,
            bin.q25,
            bin.q75,
            bin.min,
            bin.max,
        )?;
    }
    Ok(())
}
