use std::{
    io::{self, Write},
    path::Path,
};

use clap::Args;
use shedding_analysis::{
    compare::{Comparison, ComparisonRow, compare_datasets},
    measurement::MeasurementFilter,
};
use shedding_data::loader;

use super::{FilterArg, GlobalArg, table};
use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct CompareArg {
    /// Dataset identifiers
    #[arg(required = true)]
    pub datasets: Vec<String>,

    #[command(flatten)]
    pub filter: FilterArg,

    /// Number of threads used to load datasets
    #[arg(long, default_value_t = util::default_workers())]
    pub workers: usize,
}

pub(crate) fn run(global: &GlobalArg, arg: &CompareArg) -> anyhow::Result<()> {
    let filter = arg.filter.to_filter()?;
    let comparison = load_and_compare(&global.data_dir, &arg.datasets, &filter, arg.workers)?;
    Output::emit(global.output.as_deref(), global.format, &comparison, |out| {
        print_comparison(out, &comparison)
    })
}

/// Compares the datasets that load, keeping an empty row in place of each one that does not.
fn load_and_compare(
    data_dir: &Path,
    dataset_ids: &[String],
    filter: &MeasurementFilter,
    workers: usize,
) -> anyhow::Result<Comparison> {
    let mut datasets = vec![];
    let mut failed = vec![];
    for (index, result) in loader::load_datasets(data_dir, dataset_ids, workers)
        .into_iter()
        .enumerate()
    {
        match result {
            Ok(dataset) => datasets.push(dataset),
            Err(_) => failed.push(index),
        }
    }
    anyhow::ensure!(
        !datasets.is_empty(),
        "None of the {} datasets could be loaded from {}",
        dataset_ids.len(),
        data_dir.display()
    );

    let mut comparison = compare_datasets(&datasets, filter)?;
    for index in failed {
        comparison
            .rows
            .insert(index, ComparisonRow::empty(&dataset_ids[index]));
    }
    Ok(comparison)
}

fn print_comparison(out: &mut Output, comparison: &Comparison) -> io::Result<()> {
    table::title(out, "Dataset Comparison")?;
    table::header(
        out,
        &format!(
            "{:<32} {:>8} {:>8} {:>7} {:>9} {:>13} {:>10} {:>19} {:>10} {:>9} {:>10}",
            "Dataset",
            "Subjects",
            "Samples",
            "Pos%",
            "Duration",
            "Duration IQR",
            "Peak",
            "Peak IQR",
            "Peak time",
            "Cleared%",
            "Clearance",
        ),
    )?;
    for row in &comparison.rows {
        writeln!(
            out,
            "  {:<32} {:>8} {:>8} {:>7} {:>9} {:>13} {:>10} {:>19} {:>10} {:>9} {:>10}",
            row.dataset_id,
            row.n_participants,
            row.n_measurements.map_or("N/A".to_string(), |n| n.to_string()),
            table::opt(row.pct_positive, 1),
            table::opt(row.median_shedding_duration, 1),
            table::opt_str(row.iqr_shedding_duration.as_deref()),
            row.median_peak_value.map_or("N/A".to_string(), |v| format!("{v:.2e}")),
            table::opt_str(row.iqr_peak_value.as_deref()),
            table::opt(row.median_peak_time, 1),
            table::opt(row.pct_cleared, 1),
            table::opt(row.median_clearance_time, 1),
        )?;
    }

    if !comparison.warnings.is_empty() {
        writeln!(out)?;
        writeln!(out, "Notes:")?;
        for warning in &comparison.warnings {
            writeln!(out, "  - {warning}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const DATASET: &str = r"
analyte:
  specimen: stool
  biomarker: SARS-CoV-2
  unit: gc/mL
  reference_event: symptom onset
participants:
  - measurements: [{time: 1, value: 100}, {time: 3, value: 10}, {time: 5, value: negative}]
";

    #[test]
    fn test_unloadable_dataset_keeps_its_row() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good2020.yaml"), DATASET).unwrap();
        fs::write(dir.path().join("broken2021.yaml"), "participants: [").unwrap();

        let ids = ["broken2021", "good2020", "missing2022"].map(String::from);
        let comparison = load_and_compare(dir.path(), &ids, &MeasurementFilter::default(), 2).unwrap();

        let row_ids = comparison.rows.iter().map(|r| r.dataset_id.as_str()).collect::<Vec<_>>();
        assert_eq!(row_ids, ["broken2021", "good2020", "missing2022"]);
        assert_eq!(comparison.rows[0], ComparisonRow::empty("broken2021"));
        assert_eq!(comparison.rows[1].n_participants, 1);
        assert_eq!(comparison.rows[1].median_shedding_duration, Some(3.0));
        assert_eq!(comparison.rows[2].n_measurements, None);
    }

    #[test]
    fn test_nothing_loadable_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ids = ["missing2022".to_owned()];
        let err = load_and_compare(dir.path(), &ids, &MeasurementFilter::default(), 1).unwrap_err();
        assert!(err.to_string().starts_with("None of the 1 datasets"), "{err}");
    }
}
