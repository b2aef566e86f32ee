use std::fs;

use dumpscope_core::config::{ClassificationRules, ConfigError, DumpscopeConfig};
use dumpscope_core::model::FieldCategory;
use dumpscope_core::schema::SchemaBuilder;
use tempfile::tempdir;

#[test]
fn defaults_cover_the_built_in_sets() {
    let rules = ClassificationRules::default();
    assert!(rules.is_template_name("WeaponTemplate"));
    assert!(!rules.is_template_name("DataTemplateLoader"));
    assert!(!rules.is_template_name("UxmlTemplate"));
    assert!(!rules.is_template_name("Outer.InnerTemplate"));
    assert!(rules.is_generated_field("NativeFieldInfoPtr_Damage"));
    assert!(rules.is_generated_field("<Name>k__BackingField"));
    assert!(!rules.is_generated_field("Damage"));

    let skip = rules.skip_types();
    for name in ["Int32", "String", "GameObject", "MonoBehaviour", "Vector3", "LocalizedLine"] {
        assert!(skip.contains(name), "{name} should be skipped");
    }
}

#[test]
fn missing_path_uses_defaults() {
    let config = DumpscopeConfig::load_or_default(None).expect("defaults");
    assert_eq!(config, DumpscopeConfig::default());
}

#[test]
fn json_config_overrides_only_given_keys() {
    let tmp = tempdir().expect("temp dir");
    let path = tmp.path().join("dumpscope.json");
    fs::write(
        &path,
        r#"{ "rules": { "template_suffix": "Def" }, "validation": { "type_check_sample": 10 } }"#,
    )
    .expect("write config");

    let config = DumpscopeConfig::load(&path).expect("load json config");
    assert_eq!(config.rules.template_suffix, "Def");
    assert_eq!(config.validation.type_check_sample, 10);
    assert_eq!(config.validation.coverage_warn_ratio, 0.70);
    assert!(config.rules.primitive_types.contains("int"));
}

#[test]
fn yaml_config_changes_what_the_builder_sees() {
    let tmp = tempdir().expect("temp dir");
    let path = tmp.path().join("dumpscope.yaml");
    fs::write(
        &path,
        "rules:\n  external_asset_types: [VideoClip]\n  template_suffix: Def\n",
    )
    .expect("write config");

    let config = DumpscopeConfig::load(&path).expect("load yaml config");
    let text = "\
public class WeaponDef : ScriptableObject // TypeDefIndex: 1
{
\tpublic VideoClip Intro; // 0x10
\tpublic Sprite Icon; // 0x18
}
";
    let schema = SchemaBuilder::new(&config.rules).build(text);
    let weapon = &schema.templates["WeaponDef"];
    assert_eq!(weapon.fields[0].category, FieldCategory::ExternalAsset);
    assert_eq!(weapon.fields[1].category, FieldCategory::Reference, "Sprite list was replaced");
}

#[test]
fn unsupported_extension_and_bad_content_are_errors() {
    let tmp = tempdir().expect("temp dir");

    let toml = tmp.path().join("dumpscope.toml");
    fs::write(&toml, "x = 1").expect("write config");
    assert!(matches!(DumpscopeConfig::load(&toml), Err(ConfigError::UnsupportedFormat(_))));

    let broken = tmp.path().join("broken.json");
    fs::write(&broken, "{ rules: ").expect("write config");
    assert!(matches!(DumpscopeConfig::load(&broken), Err(ConfigError::Json { .. })));

    let absent = tmp.path().join("absent.yml");
    assert!(matches!(DumpscopeConfig::load(&absent), Err(ConfigError::Read { .. })));
}
