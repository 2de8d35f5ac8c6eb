use std::io::{self, Write};

use clap::Args;
use shedding_analysis::overview::DatasetOverview;

use super::{GlobalArg, table};
use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct OverviewArg {
    /// Dataset identifier
    pub dataset: String,
}

pub(crate) fn run(global: &GlobalArg, arg: &OverviewArg) -> anyhow::Result<()> {
    let dataset = util::load_dataset(&global.data_dir, &arg.dataset)?;
    let overview = DatasetOverview::from_dataset(&dataset);
    Output::emit(global.output.as_deref(), global.format, &overview, |out| {
        print_overview(out, &overview)
    })
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items.into_iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn print_overview(out: &mut Output, overview: &DatasetOverview) -> io::Result<()> {
    table::title(out, &format!("Dataset Overview: {}", overview.dataset_id))?;

    writeln!(out, "  Title            : {}", table::opt_str(overview.title.as_deref()))?;
    writeln!(out, "  DOI / URL        : {}", table::opt_str(overview.doi.as_deref()))?;
    writeln!(out, "  Participants     : {}", overview.n_participants)?;
    writeln!(
        out,
        "  Measurements     : {} ({} positive, {} negative)",
        overview.n_measurements, overview.n_positive, overview.n_negative
    )?;
    writeln!(out, "  Biomarkers       : {}", join(&overview.biomarkers))?;
    writeln!(out, "  Specimens        : {}", join(&overview.specimens))?;
    let value_types = overview
        .value_types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    writeln!(out, "  Value types      : {}", join(&value_types))?;
    writeln!(out, "  Reference events : {}", join(&overview.reference_events))?;
    let time_range = overview
        .time_range
        .map_or("N/A".to_string(), |(min, max)| format!("{min} to {max} days"));
    writeln!(out, "  Time range       : {time_range}")?;
    writeln!(out)?;

    writeln!(out, "Analytes ({})", overview.n_analytes)?;
    table::header(
        out,
        &format!(
            "{:<24} {:<16} {:<24} {:<20} {:<14} {:>10} {:>10}",
            "Analyte", "Biomarker", "Specimen", "Unit", "Value type", "LOD", "LOQ"
        ),
    )?;
    for detail in &overview.analyte_details {
        writeln!(
            out,
            "  {:<24} {:<16} {:<24} {:<20} {:<14} {:>10} {:>10}",
            detail.analyte,
            detail.biomarker,
            detail.specimen,
            detail.unit,
            detail.value_type.to_string(),
            table::opt(detail.limit_of_detection, 1),
            table::opt(detail.limit_of_quantification, 1),
        )?;
    }
    Ok(())
}
