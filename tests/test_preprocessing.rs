//! Preprocessing tests over generated survey files

mod common;

use common::*;
use lungcancer_rf::preprocessing::{
    encode_categoricals, replace_yes_no, Preprocessor, CATEGORICAL_COLUMNS, IRRELEVANT_FEATURES,
};
use lungcancer_rf::utils::DataLoader;
use polars::prelude::*;

fn categorical_columns() -> Vec<String> {
    CATEGORICAL_COLUMNS.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_survey_to_feature_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("survey.csv");
    let mut lines: Vec<String> = (0..30).map(|i| survey_row(i, survey_label(i))).collect();
    // Exact duplicates of the first two rows
    lines.push(lines[0].clone());
    lines.push(lines[1].clone());
    write_lines(&path, &lines);

    let df = DataLoader::new().load_csv(&path).unwrap();
    assert_eq!(df.height(), 32);

    let features = Preprocessor::new().run(&df).unwrap();

    assert_eq!(features.n_samples(), 30, "duplicates should be removed");
    assert_eq!(features.target_name, "LUNG_CANCER");
    // 16 columns - label - 4 dropped + interaction
    assert_eq!(features.n_features(), 12);
    assert_eq!(features.feature_names.last().map(String::as_str), Some("ANXYELFIN"));
    for dropped in IRRELEVANT_FEATURES {
        assert!(
            !features.feature_names.iter().any(|f| f == dropped),
            "{} should have been dropped",
            dropped
        );
    }

    let position = |name: &str| features.feature_names.iter().position(|f| f == name).unwrap();
    let (anxiety, yellow, inter) = (position("ANXIETY"), position("YELLOW_FINGERS"), position("ANXYELFIN"));
    for row in features.x.rows() {
        assert_eq!(row[inter], row[anxiety] * row[yellow]);
        assert!([1.0, 2.0, 4.0].contains(&row[inter]));
    }

    // YES encodes to 1 (sorted label order), NO to 0
    for (i, label) in features.y.iter().enumerate() {
        assert_eq!(*label, i64::from(survey_label(i)), "row {}", i);
    }
}

#[test]
fn test_encoding_skipped_without_categorical_columns() {
    let df = df!(
        "YELLOW_FINGERS" => &[1i64, 2, 2],
        "ANXIETY" => &[2i64, 1, 2]
    )
    .unwrap();

    let encoded = encode_categoricals(df.clone(), &categorical_columns()).unwrap();
    assert!(encoded.equals(&df));
}

#[test]
fn test_encoding_applies_to_present_column_only() {
    let df = df!(
        "GENDER" => &["M", "F", "F"],
        "ANXIETY" => &[2i64, 1, 2]
    )
    .unwrap();

    let encoded = encode_categoricals(df, &categorical_columns()).unwrap();
    let gender: Vec<Option<i64>> = encoded
        .column("GENDER")
        .unwrap()
        .as_materialized_series()
        .i64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(gender, vec![Some(1), Some(0), Some(0)]);
}

#[test]
fn test_yes_no_recoded_in_any_column() {
    let df = df!(
        "CHRONIC DISEASE" => &["YES", "NO", "YES"],
        "NOTES" => &["YES", "maybe", "NO"]
    )
    .unwrap();

    let recoded = replace_yes_no(df, 2, 1).unwrap();

    let chronic = recoded.column("CHRONIC DISEASE").unwrap();
    assert_eq!(chronic.dtype(), &DataType::Int64);
    let values: Vec<Option<i64>> = chronic.as_materialized_series().i64().unwrap().into_iter().collect();
    assert_eq!(values, vec![Some(2), Some(1), Some(2)]);

    let notes: Vec<Option<&str>> = recoded
        .column("NOTES")
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(notes, vec![Some("2"), Some("maybe"), Some("1")]);
}

#[test]
fn test_missing_interaction_input_is_reported() {
    let df = df!(
        "GENDER" => &["M", "F"],
        "AGE" => &[50i64, 60],
        "SMOKING" => &[1i64, 2],
        "SHORTNESS OF BREATH" => &[1i64, 2],
        "ANXIETY" => &[2i64, 1],
        "LUNG_CANCER" => &["YES", "NO"]
    )
    .unwrap();

    let err = Preprocessor::new().run(&df).unwrap_err();
    assert!(err.to_string().contains("YELLOW_FINGERS"), "{}", err);
}
