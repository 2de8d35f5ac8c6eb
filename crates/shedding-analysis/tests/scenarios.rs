use shedding_analysis::{
    bins::TimeBinOptions,
    clearance::{ClearanceSummary, DEFAULT_TIME_POINTS},
    compare::compare_datasets,
    detection::DetectionSummary,
    duration::SheddingDuration,
    error::AnalysisError,
    measurement::MeasurementFilter,
    peak::SheddingPeak,
    summary::{ClearanceStatus, SheddingSummary},
};
use shedding_data::model::{Dataset, ValueType};

fn dataset(id: &str, yaml: &str) -> Dataset {
    Dataset::from_yaml_str(id, yaml).unwrap()
}

const TWO_PARTICIPANTS: &str = r"
title: Two participants
analyte:
  specimen: stool
  biomarker: SARS-CoV-2
  unit: gc/mL
  reference_event: symptom onset
participants:
  - measurements:
      - {time: 0, value: 1.0}
      - {time: 1, value: 2.0}
      - {time: 2, value: negative}
  - measurements:
      - {time: 0, value: negative}
      - {time: 1, value: 3.0}
";

const MULTI_ANALYTE: &str = r"
title: Stool and swabs
analytes:
  stool_rna:
    specimen: stool
    biomarker: SARS-CoV-2
    unit: gc/wet gram
    reference_event: symptom onset
    limit_of_detection: 100
  swab_ct:
    specimen: [nasopharyngeal_swab, oropharyngeal_swab]
    biomarker: SARS-CoV-2
    unit: cycle threshold
    reference_event: symptom onset
    limit_of_detection: 40
participants:
  - attributes: {age: 34, sex: female}
    measurements:
      - {analyte: stool_rna, time: 2, value: 5.2e6}
      - {analyte: stool_rna, time: 9, value: 3.1e4}
      - {analyte: stool_rna, time: 20, value: negative}
      - {analyte: swab_ct, time: 2, value: 22.5}
      - {analyte: swab_ct, time: 5, value: 19.0}
      - {analyte: swab_ct, time: 12, value: negative}
  - measurements:
      - {analyte: stool_rna, time: 1, value: positive}
      - {analyte: stool_rna, time: 15, value: 800}
      - {analyte: swab_ct, time: 1, value: 30.0}
      - {analyte: swab_ct, time: unknown, value: 35}
      - {analyte: swab_ct, time: 7, value: negative}
  - measurements:
      - {analyte: stool_rna, time: 3, value: negative}
      - {analyte: swab_ct, time: 3, value: negative}
";

#[test]
fn duration_worked_example() {
    let dataset = dataset("two", TWO_PARTICIPANTS);
    let records = SheddingDuration::individual(&dataset, &MeasurementFilter::default()).unwrap();
    let durations = records.iter().map(|r| r.shedding_duration).collect::<Vec<_>>();
    assert_eq!(durations, [Some(2.0), Some(1.0)]);

    let summary = SheddingDuration::summarize(&records);
    assert_eq!(summary.len(), 1);
    let quartiles = summary[0].shedding_duration.unwrap();
    assert_eq!(quartiles.min, 1.0);
    assert_eq!(quartiles.max, 2.0);
    assert_eq!(summary[0].n_sample, 5);
    assert_eq!(summary[0].n_participant, 2);
}

#[test]
fn durations_never_negative() {
    let dataset = dataset("multi", MULTI_ANALYTE);
    let records = SheddingDuration::individual(&dataset, &MeasurementFilter::default()).unwrap();
    for record in &records {
        match (record.first_detect, record.last_detect) {
            (Some(first), Some(last)) => {
                assert_eq!(record.shedding_duration, Some(last - first + 1.0));
                assert!(last >= first);
            }
            _ => assert_eq!(record.shedding_duration, None),
        }
    }
}

#[test]
fn peak_direction_follows_unit() {
    let dataset = dataset("multi", MULTI_ANALYTE);
    let records = SheddingPeak::individual(&dataset, &MeasurementFilter::default()).unwrap();

    let stool = records
        .iter()
        .find(|r| r.participant_id == 1 && r.analyte == "stool_rna")
        .unwrap();
    assert_eq!(stool.value_type, ValueType::Concentration);
    assert_eq!((stool.peak_time, stool.peak_value), (2.0, 5.2e6));

    let swab = records
        .iter()
        .find(|r| r.participant_id == 1 && r.analyte == "swab_ct")
        .unwrap();
    assert_eq!(swab.value_type, ValueType::Ct);
    assert_eq!(swab.specimen, "nasopharyngeal_swab+oropharyngeal_swab");
    assert_eq!((swab.peak_time, swab.peak_value), (5.0, 19.0));

    // Participant 3 has no quantified value at all.
    assert!(records.iter().all(|r| r.participant_id != 3));
}

#[test]
fn detection_proportions_within_interval() {
    let dataset = dataset("multi", MULTI_ANALYTE);
    let options = TimeBinOptions {
        time_bin_size: 7.0,
        min_observations: 1,
    };
    let summary = DetectionSummary::from_dataset(&dataset, &MeasurementFilter::default(), options).unwrap();
    assert!(!summary.bins.is_empty());
    for bin in &summary.bins {
        assert!((0.0..=1.0).contains(&bin.proportion));
        assert!(bin.ci_lower <= bin.proportion && bin.proportion <= bin.ci_upper);
        assert_eq!(bin.n_positive + bin.n_negative, bin.n_tested);
    }
    let tested = summary.bins.iter().map(|b| b.n_tested).sum::<usize>();
    // One swab measurement has an unknown time.
    assert_eq!(tested, 12);
}

#[test]
fn survival_is_monotone() {
    let dataset = dataset("multi", MULTI_ANALYTE);
    let filter = MeasurementFilter::default().value_type(ValueType::Ct);
    let summary = ClearanceSummary::from_dataset(&dataset, &filter, &DEFAULT_TIME_POINTS).unwrap();

    let first = summary.survival_table[0];
    assert_eq!((first.time, first.survival), (0.0, 1.0));
    for pair in summary.survival_table.windows(2) {
        assert!(pair[1].survival <= pair[0].survival);
        assert!(pair[1].time >= pair[0].time);
    }
    // Participant 1 clears at 12, participant 2 at 7.
    assert_eq!(summary.n_participants, 2);
    assert_eq!(summary.n_cleared, 2);
    assert_eq!(summary.median_clearance_time, Some(7.0));
    let last = summary.survival_table.last().unwrap();
    assert_eq!(last.survival, 0.0);
    assert_eq!(last.n_at_risk - last.n_events - last.n_censored, 0);
}

#[test]
fn all_censored_cohort() {
    let yaml = r"
analyte:
  specimen: plasma
  biomarker: HIV
  unit: copies/mL
  reference_event: enrollment
participants:
  - measurements: [{time: 0, value: negative}, {time: 10, value: 5000}]
  - measurements: [{time: 3, value: positive}]
";
    let dataset = dataset("censored", yaml);
    let summary = ClearanceSummary::from_dataset(&dataset, &MeasurementFilter::default(), &DEFAULT_TIME_POINTS)
        .unwrap();
    assert_eq!(summary.n_cleared, 0);
    assert_eq!(summary.n_censored, 2);
    assert_eq!(summary.median_clearance_time, None);

    let records = SheddingSummary::from_dataset(&dataset, &MeasurementFilter::default()).unwrap();
    assert!(records.iter().all(|r| r.clearance_status == ClearanceStatus::Censored));
}

#[test]
fn filter_errors_surface() {
    let dataset = dataset("multi", MULTI_ANALYTE);
    let filter = MeasurementFilter::default().specimen("urine");
    let err = SheddingDuration::individual(&dataset, &filter).unwrap_err();
    assert_eq!(err, AnalysisError::NoMatchingSpecimen("urine".to_owned()));
    assert_eq!(err.to_string(), "no measurements found for specimen 'urine'");
}

#[test]
fn comparison_survives_partial_failure() {
    let two = dataset("two", TWO_PARTICIPANTS);
    let multi = dataset("multi", MULTI_ANALYTE);
    let ct_only = MeasurementFilter::default().value_type(ValueType::Ct);

    let comparison = compare_datasets(&[two, multi], &ct_only).unwrap();
    assert_eq!(comparison.rows.len(), 2);

    let failed = &comparison.rows[0];
    assert_eq!(failed.dataset_id, "two");
    assert_eq!(failed.n_participants, 0);
    assert_eq!(failed.n_measurements, None);
    assert_eq!(failed.median_shedding_duration, None);

    let multi = &comparison.rows[1];
    assert_eq!(multi.n_participants, 2);
    assert_eq!(multi.n_measurements, Some(5));
    assert_eq!(multi.pct_positive, Some(60.0));
    assert_eq!(multi.median_peak_value, Some(24.5));
    assert_eq!(multi.pct_cleared, Some(100.0));
    assert_eq!(multi.median_clearance_time, Some(7.0));

    let json = serde_json::to_value(&comparison).unwrap();
    assert_eq!(json["rows"][0]["pct_positive"], serde_json::Value::Null);
}
