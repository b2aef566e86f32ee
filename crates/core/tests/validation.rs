use std::collections::BTreeMap;
use std::fs;

use dumpscope_core::config::ValidationThresholds;
use dumpscope_core::model::Schema;
use dumpscope_core::schema::build;
use dumpscope_core::validate::{
    check_field_coverage, check_instance_names, check_template_coverage, check_type_validation,
    validate, DataDir, InstanceFile, Level, LoadedFiles, SourceError, Verdict,
};
use serde_json::{json, Value};
use tempfile::tempdir;

fn fixture_schema() -> Schema {
    build(include_str!("fixtures/synthetic_dump.cs"))
}

fn loaded(entries: &[(&str, Value)]) -> LoadedFiles {
    entries
        .iter()
        .map(|(name, body)| (name.to_string(), InstanceFile::parse(&body.to_string())))
        .collect()
}

fn levels(records: &[dumpscope_core::validate::CheckRecord]) -> Vec<Level> {
    records.iter().map(|r| r.level).collect()
}

fn good_weapon() -> Value {
    json!({
        "name": "test_weapon",
        "m_GameDesignComment": "", "m_ID": "w1", "m_IsGarbage": false, "m_IsInitialized": true,
        "Title": "Rifle", "Weight": 10, "Value": 50.0,
        "MinRange": 5, "MaxRange": 20, "Damage": 15.5, "Accuracy": 0.85, "Ammo": 30,
        "IsAutomatic": true, "WeaponClass": 2, "Tags": null
    })
}

#[test]
fn coverage_passes_with_every_concrete_template() {
    let schema = fixture_schema();
    let files: LoadedFiles = schema
        .concrete_templates()
        .map(|(name, _)| (name.clone(), InstanceFile::Instances(vec![json!({"name": "x"})])))
        .collect();

    let records = check_template_coverage(&schema, &files, &ValidationThresholds::default());
    assert_eq!(levels(&records), [Level::Pass]);
    assert_eq!(records[0].message, "5/5 types have output (3 abstract, expected no output)");
}

#[test]
fn coverage_grades_by_ratio_and_lists_missing() {
    let schema = fixture_schema();
    let thresholds = ValidationThresholds::default();

    let four = loaded(&[
        ("WeaponTemplate", json!([])),
        ("ArmorTemplate", json!([])),
        ("SkillTemplate", json!([])),
        ("TagTemplate", json!([])),
    ]);
    let records = check_template_coverage(&schema, &four, &thresholds);
    assert_eq!(levels(&records), [Level::Warn, Level::Info]);
    assert_eq!(records[1].message, "  Missing: LootTableTemplate");

    let one = loaded(&[("WeaponTemplate", json!([]))]);
    let records = check_template_coverage(&schema, &one, &thresholds);
    assert_eq!(records[0].level, Level::Fail);
    assert_eq!(records.len(), 1 + 4);
}

#[test]
fn placeholder_names_fail_the_naming_check() {
    let files = loaded(&[(
        "WeaponTemplate",
        json!([{"name": "unknown_0"}, {"name": "unknown_1"}, {"name": "unknown_2"}]),
    )]);
    let records = check_instance_names(&files, &ValidationThresholds::default());
    assert_eq!(levels(&records), [Level::Fail]);
    assert_eq!(records[0].message, "WeaponTemplate: 0/3 named (0%)");
}

#[test]
fn naming_check_grades_partial_and_odd_files() {
    let files = loaded(&[
        ("ArmorTemplate", json!([{"name": "helmet"}, {"name": "unknown_1"}])),
        ("SkillTemplate", json!({"name": "not a list"})),
        ("TagTemplate", json!([])),
        ("WeaponTemplate", json!([{"name": "a"}, {"name": "b"}])),
    ]);
    let mut files = files;
    files.insert("LootTableTemplate".to_string(), InstanceFile::parse("{ not json"));

    let records = check_instance_names(&files, &ValidationThresholds::default());
    let by_message: Vec<(Level, &str)> =
        records.iter().map(|r| (r.level, r.message.as_str())).collect();
    assert_eq!(
        by_message,
        [
            (Level::Warn, "ArmorTemplate: 1/2 named (50%)"),
            (Level::Fail, "LootTableTemplate: Could not read JSON"),
            (Level::Warn, "SkillTemplate: Not a list"),
            (Level::Warn, "TagTemplate: Empty file"),
            (Level::Pass, "WeaponTemplate: 2/2 named (100%)"),
        ]
    );
}

#[test]
fn field_coverage_uses_a_named_sample_and_skips_complex_fields() {
    let schema = fixture_schema();
    let thresholds = ValidationThresholds::default();

    let files = loaded(&[("WeaponTemplate", json!([{"Damage": 1.0}, good_weapon()]))]);
    let records = check_field_coverage(&schema, &files, &thresholds);
    assert_eq!(levels(&records), [Level::Pass]);
    assert_eq!(records[0].message, "WeaponTemplate: 15/15 fields");

    let sparse = loaded(&[(
        "LootTableTemplate",
        json!([{"name": "table", "_template_type": "LootTableTemplate", "m_ID": "t"}]),
    )]);
    let records = check_field_coverage(&schema, &sparse, &thresholds);
    assert_eq!(records[0].level, Level::Fail);
    assert_eq!(records[0].message, "LootTableTemplate: 1/4 fields (5 complex skipped)");
    let missing: Vec<&str> = records[1..].iter().map(|r| r.message.as_str()).collect();
    assert_eq!(
        missing,
        ["  Missing: m_GameDesignComment", "  Missing: m_IsGarbage", "  Missing: m_IsInitialized"]
    );
}

#[test]
fn garbage_float_is_flagged_as_wrong_offset() {
    let schema = fixture_schema();
    let files = loaded(&[(
        "WeaponTemplate",
        json!([{"name": "test_weapon", "Damage": 2.03e32, "MinRange": 5}]),
    )]);

    let records = check_type_validation(&schema, &files, &ValidationThresholds::default());
    assert_eq!(levels(&records), [Level::Fail, Level::Info]);
    assert_eq!(records[0].message, "WeaponTemplate: 1 type errors");
    assert!(records[1].message.contains("WeaponTemplate.Damage[test_weapon]"));
    assert!(records[1].message.contains("2.030e32"));
    assert!(records[1].message.contains("wrong offset"));
}

#[test]
fn good_values_pass_type_validation() {
    let schema = fixture_schema();
    let files = loaded(&[("WeaponTemplate", json!([good_weapon()]))]);

    let records = check_type_validation(&schema, &files, &ValidationThresholds::default());
    assert_eq!(levels(&records), [Level::Pass]);
}

#[test]
fn type_errors_are_capped_with_a_remainder_line() {
    let schema = fixture_schema();
    let bad: Vec<Value> = (0..4)
        .map(|i| json!({"name": format!("w{i}"), "Ammo": "lots", "IsAutomatic": 1}))
        .collect();
    let files = loaded(&[("WeaponTemplate", Value::Array(bad))]);

    let records = check_type_validation(&schema, &files, &ValidationThresholds::default());
    assert_eq!(records[0].message, "WeaponTemplate: 8 type errors");
    assert_eq!(records.len(), 1 + 5 + 1);
    assert_eq!(records[6].message, "  ... and 3 more");
    assert!(records[1].message.contains("expected int, got str=\"lots\""));
}

#[test]
fn integer_ranges_follow_the_declared_width() {
    let schema = build(
        "\
public class RangeTemplate : ScriptableObject // TypeDefIndex: 1
{
\tpublic byte Small; // 0x10
\tpublic int Wide; // 0x14
}
",
    );
    let files = loaded(&[("RangeTemplate", json!([{"name": "r", "Small": 300, "Wide": 300}]))]);
    let records = check_type_validation(&schema, &files, &ValidationThresholds::default());
    assert_eq!(records[0].message, "RangeTemplate: 1 type errors");
    assert!(records[1].message.contains("RangeTemplate.Small[r]: expected byte"));
}

#[test]
fn files_without_real_data_report_nothing() {
    let schema = fixture_schema();
    let files = loaded(&[("TagTemplate", json!([{"name": "only"}]))]);
    let records = check_type_validation(&schema, &files, &ValidationThresholds::default());
    assert!(records.is_empty());
}

#[test]
fn full_run_over_a_directory() {
    let schema = fixture_schema();
    let tmp = tempdir().expect("temp dir");
    for (name, _) in schema.concrete_templates() {
        let body = if name == "WeaponTemplate" { json!([good_weapon()]) } else { json!([]) };
        fs::write(tmp.path().join(format!("{name}.json")), body.to_string())
            .expect("write instance file");
    }

    let source = DataDir::open(tmp.path()).expect("open data dir");
    let report = validate(&schema, &source, &ValidationThresholds::default());
    assert!(!report.no_data);
    assert_eq!(report.count(Level::Fail), 0);
    assert_eq!(report.count(Level::Warn), 4, "four empty files");
    assert_eq!(report.verdict(), Verdict::Warn);
    assert_eq!(report.verdict().exit_code(), 1);
}

#[test]
fn no_data_is_a_hard_failure() {
    let schema = fixture_schema();
    let empty: BTreeMap<String, InstanceFile> = BTreeMap::new();
    let report = validate(&schema, &empty, &ValidationThresholds::default());
    assert!(report.no_data);
    assert!(report.naming.is_empty());
    assert_eq!(report.verdict(), Verdict::Fail);
    assert_eq!(report.verdict().exit_code(), 2);
}

#[test]
fn malformed_file_on_disk_fails_naming() {
    let schema = fixture_schema();
    let tmp = tempdir().expect("temp dir");
    fs::write(tmp.path().join("WeaponTemplate.json"), "[{ broken").expect("write broken file");

    let source = DataDir::open(tmp.path()).expect("open data dir");
    let report = validate(&schema, &source, &ValidationThresholds::default());
    assert_eq!(levels(&report.naming), [Level::Fail]);
    assert_eq!(report.verdict(), Verdict::Fail);
}

#[test]
fn data_dir_must_exist() {
    let tmp = tempdir().expect("temp dir");
    match DataDir::open(tmp.path().join("missing")) {
        Err(SourceError::Missing(path)) => assert!(path.ends_with("missing")),
        other => panic!("expected SourceError::Missing, got {other:?}"),
    }
}

fn schema_with_templates(count: usize) -> Schema {
    let text: String = (0..count)
        .map(|i| {
            format!(
                "public class Kind{i}Template : ScriptableObject // TypeDefIndex: {i}\n{{\n\tpublic int Value; // 0x10\n}}\n"
            )
        })
        .collect();
    build(&text)
}

#[test]
fn coverage_warn_threshold_is_inclusive() {
    let schema = schema_with_templates(10);
    let thresholds = ValidationThresholds::default();
    let present = |n: usize| -> LoadedFiles {
        schema
            .concrete_templates()
            .take(n)
            .map(|(name, _)| (name.clone(), InstanceFile::Instances(Vec::new())))
            .collect()
    };

    let records = check_template_coverage(&schema, &present(7), &thresholds);
    assert_eq!(records[0].level, Level::Warn, "7/10 sits exactly on the warn ratio");
    assert_eq!(records[0].message, "7/10 types have output (0 abstract, expected no output)");

    let records = check_template_coverage(&schema, &present(6), &thresholds);
    assert_eq!(records[0].level, Level::Fail);
}

#[test]
fn naming_warn_threshold_is_inclusive() {
    let thresholds = ValidationThresholds::default();

    let half = loaded(&[(
        "WeaponTemplate",
        json!([{"name": "a"}, {"name": "b"}, {"name": "unknown_2"}, {"name": "unknown_3"}]),
    )]);
    let records = check_instance_names(&half, &thresholds);
    assert_eq!(records[0].level, Level::Warn);
    assert_eq!(records[0].message, "WeaponTemplate: 2/4 named (50%)");

    let below = loaded(&[(
        "WeaponTemplate",
        json!([{"name": "a"}, {"name": "b"}, {"name": "unknown_2"}, {"name": "unknown_3"}, {"name": "unknown_4"}]),
    )]);
    let records = check_instance_names(&below, &thresholds);
    assert_eq!(records[0].level, Level::Fail);
    assert_eq!(records[0].message, "WeaponTemplate: 2/5 named (40%)");
}
