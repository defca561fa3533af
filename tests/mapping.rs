mod common;

use common::{fixture_bytes, survey_xml};
use survey_import::mapping::{ADMIN_CODES, build_code_mapping};
use survey_import::survey::parse_survey;
use survey_import::validate::validate_codes;

fn mapping_for(xml: &str) -> survey_import::mapping::CodeMapping {
    let schema = parse_survey(xml.as_bytes()).expect("parse survey");
    build_code_mapping(&schema)
}

#[test]
fn admin_codes_always_map_to_themselves() {
    let mapping = mapping_for(&survey_xml(&[(100, 1, 5, "L", "Q1", "N")], &[]));
    for code in ADMIN_CODES {
        assert_eq!(mapping.get(code), Some(code));
    }
}

#[test]
fn plain_question_maps_to_survey_group_question_identifier() {
    let mapping = mapping_for(&survey_xml(&[(100, 1, 5, "L", "Q1", "N")], &[]));
    assert_eq!(mapping.get("Q1"), Some("100X1X5"));
    assert!(!mapping.contains_key("Q1_other"));
    assert_eq!(mapping.len(), ADMIN_CODES.len() + 1);
}

#[test]
fn other_option_adds_suffixed_code_and_column() {
    let mapping = mapping_for(&survey_xml(&[(100, 1, 5, "L", "Q1", "Y")], &[]));
    let base = mapping.get("Q1").expect("base code");
    let other = mapping.get("Q1_other").expect("other code");
    assert_eq!(other, format!("{base}other"));
}

#[test]
fn single_axis_subquestions_map_per_subquestion() {
    let mapping = mapping_for(&survey_xml(
        &[(100, 1, 5, "M", "Q1", "N")],
        &[(5, 1, 1, "SQ1", 0)],
    ));
    assert_eq!(mapping.get("Q1_SQ1"), Some("100X1X5SQ1"));
    // A question with subquestions has no column of its own.
    assert!(!mapping.contains_key("Q1"));
}

#[test]
fn other_flag_is_ignored_when_subquestions_exist() {
    let mapping = mapping_for(&survey_xml(
        &[(100, 1, 5, "M", "Q1", "Y")],
        &[(5, 1, 6, "SQ1", 0)],
    ));
    assert!(!mapping.contains_key("Q1_other"));
}

#[test]
fn dual_axis_subquestions_map_the_cartesian_product() {
    let mapping = mapping_for(&survey_xml(
        &[(100, 1, 5, "1", "Q1", "N")],
        &[
            (5, 1, 6, "R1", 0),
            (5, 1, 7, "R2", 0),
            (5, 1, 8, "C1", 1),
            (5, 1, 9, "C2", 1),
            (5, 1, 10, "C3", 1),
        ],
    ));
    assert_eq!(mapping.len(), ADMIN_CODES.len() + 2 * 3);
    assert_eq!(mapping.get("Q1_R1_C1"), Some("100X1X5R1_C1"));
    assert_eq!(mapping.get("Q1_R2_C3"), Some("100X1X5R2_C3"));
    assert!(!mapping.contains_key("Q1_R1"));
}

#[test]
fn dual_axis_without_primary_rows_maps_nothing() {
    let mapping = mapping_for(&survey_xml(
        &[(100, 1, 5, "1", "Q1", "N")],
        &[(5, 1, 8, "C1", 1)],
    ));
    assert_eq!(mapping.len(), ADMIN_CODES.len());
}

#[test]
fn colliding_codes_keep_the_later_question() {
    // Two questions whose derived codes coincide: the later one wins silently.
    let mapping = mapping_for(&survey_xml(
        &[(100, 1, 5, "L", "Q1_SQ1", "N"), (100, 1, 6, "M", "Q1", "N")],
        &[(6, 1, 7, "SQ1", 0)],
    ));
    assert_eq!(mapping.get("Q1_SQ1"), Some("100X1X6SQ1"));
    assert_eq!(mapping.len(), ADMIN_CODES.len() + 1);
}

#[test]
fn admin_code_can_be_overwritten_by_a_question_title() {
    let mapping = mapping_for(&survey_xml(&[(100, 1, 5, "S", "lastpage", "N")], &[]));
    assert_eq!(mapping.get("lastpage"), Some("100X1X5"));
}

#[test]
fn fixture_mapping_matches_expected_columns() {
    let schema = parse_survey(&fixture_bytes("survey_100.lss")).expect("parse survey");
    let mapping = build_code_mapping(&schema);
    let expected = [
        ("Q1", "100X1X5"),
        ("Q2", "100X1X6"),
        ("Q3", "100X1X7"),
        ("Q3_other", "100X1X7other"),
        ("Q4_SQ001", "100X2X8SQ001"),
        ("Q4_SQ002", "100X2X8SQ002"),
        ("Q5_SQ001_A", "100X2X11SQ001_A"),
        ("Q5_SQ002_C", "100X2X11SQ002_C"),
    ];
    for (code, column) in expected {
        assert_eq!(mapping.get(code), Some(column), "code {code}");
    }
    assert_eq!(mapping.len(), ADMIN_CODES.len() + 4 + 2 + 6);
}

#[test]
fn header_equal_to_mapping_keys_validates_cleanly() {
    let schema = parse_survey(&fixture_bytes("survey_100.lss")).expect("parse survey");
    let mapping = build_code_mapping(&schema);
    let codes = mapping.codes().map(str::to_string).collect::<Vec<_>>();
    assert!(validate_codes(&codes, &mapping).is_ok());
}
