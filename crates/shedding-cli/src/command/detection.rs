use std::io::{self, Write};

use clap::Args;
use shedding_analysis::{bins::TimeBinOptions, detection::DetectionSummary};

use super::{BinArg, FilterArg, GlobalArg, table};
use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct DetectionArg {
    /// Dataset identifier
    pub dataset: String,

    #[command(flatten)]
    pub filter: FilterArg,

    #[command(flatten)]
    pub bins: BinArg,
}

pub(crate) fn run(global: &GlobalArg, arg: &DetectionArg) -> anyhow::Result<()> {
    let dataset = util::load_dataset(&global.data_dir, &arg.dataset)?;
    let filter = arg.filter.to_filter()?;
    let summary = DetectionSummary::from_dataset(&dataset, &filter, TimeBinOptions::from(&arg.bins))?;
    Output::emit(global.output.as_deref(), global.format, &summary, |out| {
        print_summary(out, &summary)
    })
}

fn print_summary(out: &mut Output, summary: &DetectionSummary) -> io::Result<()> {
    table::title(
        out,
        &format!(
            "Detection Probability: {} (bin size {} days)",
            summary.dataset_id, summary.options.time_bin_size
        ),
    )?;
    table::header(
        out,
        &format!(
            "{:>8} {:>8} {:>8} {:>8} {:>10} {:>9} {:>9}",
            "Time", "Tested", "Pos", "Neg", "Detected%", "CI low%", "CI high%",
        ),
    )?;
    for bin in &summary.bins {
        writeln!(
            out,
            "  {:>8.1} {:>8} {:>8} {:>8} {:>9.1}% {:>8.1}% {:>8.1}%",
            bin.time,
            bin.n_tested,
            bin.n_positive,
            bin.n_negative,
            100.0 * bin.proportion,
            100.0 * bin.ci_lower,
            100.0 * bin.ci_upper,
        )?;
    }
    Ok(())
}
