use std::io::{self, Write};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use shedding_data::loader::{self, DatasetFileInfo};

use super::{GlobalArg, table};
use crate::util::Output;

#[derive(Debug, Clone, Args)]
pub(crate) struct ValidateArg {
    /// Dataset identifiers (all datasets in the data directory when omitted)
    pub datasets: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ValidationReport {
    dataset_id: String,
    valid: bool,
    file: Option<DatasetFileInfo>,
    error: Option<String>,
}

pub(crate) fn run(global: &GlobalArg, arg: &ValidateArg) -> anyhow::Result<()> {
    let dataset_ids = if arg.datasets.is_empty() {
        loader::list_dataset_ids(&global.data_dir)
            .with_context(|| format!("Failed to list datasets in {}", global.data_dir.display()))?
    } else {
        arg.datasets.clone()
    };

    let reports = dataset_ids
        .into_iter()
        .map(|dataset_id| match DatasetFileInfo::collect(&global.data_dir, &dataset_id) {
            Ok((info, _)) => ValidationReport {
                dataset_id,
                valid: true,
                file: Some(info),
                error: None,
            },
            Err(err) => {
                tracing::warn!(%dataset_id, "{err}");
                ValidationReport {
                    dataset_id,
                    valid: false,
                    file: None,
                    error: Some(err.to_string()),
                }
            }
        })
        .collect::<Vec<_>>();

    Output::emit(global.output.as_deref(), global.format, &reports, |out| {
        print_reports(out, &reports)
    })?;

    let failed = reports.iter().filter(|r| !r.valid).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} datasets failed validation", reports.len());
    }
    Ok(())
}

fn format_modified(modified: Option<DateTime<Utc>>) -> String {
    modified.map_or("N/A".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}

fn print_reports(out: &mut Output, reports: &[ValidationReport]) -> io::Result<()> {
    table::title(out, "Dataset Validation")?;
    table::header(
        out,
        &format!(
            "{:<40} {:<7} {:>8} {:>8} {:>12} {:>10} {:<16}",
            "Dataset", "Status", "Subjects", "Analytes", "Measurements", "Bytes", "Modified (UTC)",
        ),
    )?;
    for report in reports {
        match (&report.file, &report.error) {
            (Some(info), _) => writeln!(
                out,
                "  {:<40} {:<7} {:>8} {:>8} {:>12} {:>10} {:<16}",
                report.dataset_id,
                "OK",
                info.participants,
                info.analytes,
                info.measurements,
                info.size,
                format_modified(info.modified),
            )?,
            (None, error) => writeln!(
                out,
                "  {:<40} {:<7} {}",
                report.dataset_id,
                "FAILED",
                table::opt_str(error.as_deref())
            )?,
        }
    }
    let failed = reports.iter().filter(|r| !r.valid).count();
    writeln!(out)?;
    writeln!(out, "  {} datasets checked, {failed} failed", reports.len())
}
