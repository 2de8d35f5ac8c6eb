use std::collections::BTreeMap;

use shedding_data::model::{
    AnalyteSpec, Dataset, Limit, Measurement, Participant, Specimen, Time, Value,
};

/// Builds in-memory datasets for unit tests.
pub(crate) struct Fixture {
    dataset: Dataset,
}

impl Fixture {
    pub(crate) fn new(dataset_id: &str) -> Self {
        Self {
            dataset: Dataset {
                dataset_id: dataset_id.to_owned(),
                title: Some(format!("Study {dataset_id}")),
                doi: None,
                url: None,
                description: None,
                analytes: BTreeMap::new(),
                participants: vec![],
            },
        }
    }

    pub(crate) fn analyte(mut self, name: &str, spec: AnalyteSpec) -> Self {
        self.dataset.analytes.insert(name.to_owned(), spec);
        self
    }

    pub(crate) fn participant(mut self, measurements: &[(&str, Time, Value)]) -> Self {
        let measurements = measurements
            .iter()
            .map(|(analyte, time, value)| Measurement {
                analyte: (*analyte).to_owned(),
                time: *time,
                value: *value,
            })
            .collect();
        self.dataset.participants.push(Participant {
            attributes: None,
            measurements,
        });
        self
    }

    pub(crate) fn build(self) -> Dataset {
        self.dataset
    }
}

pub(crate) fn concentration_analyte(specimen: &str, biomarker: &str) -> AnalyteSpec {
    analyte(Specimen::Single(specimen.to_owned()), biomarker, "gc/mL")
}

pub(crate) fn ct_analyte(specimens: &[&str], biomarker: &str) -> AnalyteSpec {
    let specimen = match specimens {
        [single] => Specimen::Single((*single).to_owned()),
        many => Specimen::Multiple(many.iter().map(|s| (*s).to_owned()).collect()),
    };
    analyte(specimen, biomarker, "cycle threshold")
}

fn analyte(specimen: Specimen, biomarker: &str, unit: &str) -> AnalyteSpec {
    AnalyteSpec {
        specimen,
        biomarker: biomarker.to_owned(),
        unit: unit.to_owned(),
        reference_event: "symptom onset".to_owned(),
        limit_of_detection: Limit::Unknown,
        limit_of_quantification: Limit::Unknown,
        gene_target: None,
        description: None,
    }
}

/// Single-analyte concentration dataset, one participant per entry of `participants`.
pub(crate) fn single_analyte(dataset_id: &str, participants: &[&[(f64, Value)]]) -> Dataset {
    let mut fixture =
        Fixture::new(dataset_id).analyte(dataset_id, concentration_analyte("stool", "SARS-CoV-2"));
    for measurements in participants {
        let measurements = measurements
            .iter()
            .map(|(t, v)| (dataset_id, Time::Day(*t), *v))
            .collect::<Vec<_>>();
        fixture = fixture.participant(&measurements);
    }
    fixture.build()
}
