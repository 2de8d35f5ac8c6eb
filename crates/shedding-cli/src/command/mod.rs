use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use shedding_analysis::{bins::TimeBinOptions, measurement::MeasurementFilter};
use shedding_data::model::ValueType;

use crate::util::OutputFormat;

use self::{
    check::CheckArg, clearance::ClearanceArg, compare::CompareArg, detection::DetectionArg,
    duration::DurationArg, overview::OverviewArg, peak::PeakArg, summary::SummaryArg,
    validate::ValidateArg, values::ValuesArg,
};

mod check;
mod clearance;
mod compare;
mod detection;
mod duration;
mod overview;
mod peak;
mod summary;
mod table;
mod validate;
mod values;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(flatten)]
    global: GlobalArg,

    /// Analysis to run
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct GlobalArg {
    /// Directory containing the dataset YAML files
    #[arg(long, global = true, env = "SHEDDING_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Write output to this file instead of stdout
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Describe a dataset: counts, biomarkers, specimens and analytes
    Overview(#[clap(flatten)] OverviewArg),
    /// Shedding duration from first to last positive sample
    Duration(#[clap(flatten)] DurationArg),
    /// Peak value and time of peak
    Peak(#[clap(flatten)] PeakArg),
    /// Per-participant shedding summary with clearance status
    Summary(#[clap(flatten)] SummaryArg),
    /// Detection probability per time bin with Wilson intervals
    Detection(#[clap(flatten)] DetectionArg),
    /// Kaplan-Meier time to clearance
    Clearance(#[clap(flatten)] ClearanceArg),
    /// Measurement value distribution per time bin
    Values(#[clap(flatten)] ValuesArg),
    /// Compare key statistics across datasets
    Compare(#[clap(flatten)] CompareArg),
    /// Load and validate dataset files
    Validate(#[clap(flatten)] ValidateArg),
    /// Check whether a publication is already in the corpus
    Check(#[clap(flatten)] CheckArg),
}

pub fn run() -> anyhow::Result<()> {
    let CommandArgs { global, mode } = CommandArgs::parse();
    match mode {
        Mode::Overview(arg) => overview::run(&global, &arg)?,
        Mode::Duration(arg) => duration::run(&global, &arg)?,
        Mode::Peak(arg) => peak::run(&global, &arg)?,
        Mode::Summary(arg) => summary::run(&global, &arg)?,
        Mode::Detection(arg) => detection::run(&global, &arg)?,
        Mode::Clearance(arg) => clearance::run(&global, &arg)?,
        Mode::Values(arg) => values::run(&global, &arg)?,
        Mode::Compare(arg) => compare::run(&global, &arg)?,
        Mode::Validate(arg) => validate::run(&global, &arg)?,
        Mode::Check(arg) => check::run(&global, &arg)?,
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum ValueTypeArg {
    Concentration,
    Ct,
}

impl From<ValueTypeArg> for ValueType {
    fn from(arg: ValueTypeArg) -> Self {
        match arg {
            ValueTypeArg::Concentration => ValueType::Concentration,
            ValueTypeArg::Ct => ValueType::Ct,
        }
    }
}

/// Measurement selection shared by the analysis commands.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct FilterArg {
    /// Only use analytes of this biomarker
    #[arg(long)]
    pub biomarker: Option<String>,

    /// Only use analytes of this specimen (pooled specimens joined with '+')
    #[arg(long)]
    pub specimen: Option<String>,

    /// Only use analytes reporting this kind of value
    #[arg(long, value_enum)]
    pub value_type: Option<ValueTypeArg>,

    /// Earliest measurement time in days
    #[arg(long, requires = "time_max", allow_negative_numbers = true)]
    pub time_min: Option<f64>,

    /// Latest measurement time in days
    #[arg(long, requires = "time_min", allow_negative_numbers = true)]
    pub time_max: Option<f64>,
}

impl FilterArg {
    pub fn to_filter(&self) -> anyhow::Result<MeasurementFilter> {
        let mut filter = MeasurementFilter {
            biomarker: self.biomarker.clone(),
            specimen: self.specimen.clone(),
            value_type: self.value_type.map(ValueType::from),
            time_range: None,
        };
        if let (Some(min), Some(max)) = (self.time_min, self.time_max) {
            anyhow::ensure!(
                min <= max,
                "--time-min ({min}) must not be greater than --time-max ({max})"
            );
            filter = filter.time_range(min, max);
        }
        Ok(filter)
    }
}

/// Time binning shared by the binned commands.
#[derive(Debug, Clone, Args)]
pub(crate) struct BinArg {
    /// Width of the time bins in days
    #[arg(long, default_value_t = 1.0)]
    pub bin_size: f64,

    /// Drop bins with fewer measurements than this
    #[arg(long, default_value_t = 1)]
    pub min_observations: usize,
}

impl From<&BinArg> for TimeBinOptions {
    fn from(arg: &BinArg) -> Self {
        Self {
            time_bin_size: arg.bin_size,
            min_observations: arg.min_observations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter_and_globals() {
        let args = CommandArgs::try_parse_from([
            "shedding",
            "detection",
            "woelfel2020virological",
            "--specimen",
            "sputum",
            "--value-type",
            "ct",
            "--time-min",
            "-7",
            "--time-max",
            "28",
            "--bin-size",
            "7",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.global.format, OutputFormat::Json);
        let Mode::Detection(arg) = args.mode else {
            panic!("expected detection mode");
        };
        let filter = arg.filter.to_filter().unwrap();
        assert_eq!(filter.specimen.as_deref(), Some("sputum"));
        assert_eq!(filter.value_type, Some(ValueType::Ct));
        assert_eq!(filter.time_range, Some((-7.0, 28.0)));
        assert_eq!(TimeBinOptions::from(&arg.bins).time_bin_size, 7.0);
    }

    #[test]
    fn test_time_range_needs_both_bounds() {
        let result = CommandArgs::try_parse_from(["shedding", "values", "x", "--time-min", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_inverted_time_range() {
        let arg = FilterArg {
            time_min: Some(10.0),
            time_max: Some(0.0),
            ..FilterArg::default()
        };
        assert!(arg.to_filter().is_err());
    }
}
