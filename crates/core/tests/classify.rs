use dumpscope_core::config::ClassificationRules;
use dumpscope_core::model::FieldCategory;
use dumpscope_core::schema::{classify, collection_element, KnownTypes};

fn known() -> KnownTypes {
    let mut known = KnownTypes::default();
    known.enums.insert("WeaponType".to_string());
    known.structs.insert("DamageInfo".to_string());
    known.templates.insert("TagTemplate".to_string());
    known
}

fn category(ty: &str) -> FieldCategory {
    classify(ty, &known(), &ClassificationRules::default()).category
}

#[test]
fn fixed_sets_and_known_names() {
    assert_eq!(category("int"), FieldCategory::Primitive);
    assert_eq!(category("Single"), FieldCategory::Primitive);
    assert_eq!(category("string"), FieldCategory::String);
    assert_eq!(category("WeaponType"), FieldCategory::Enum);
    assert_eq!(category("DamageInfo"), FieldCategory::Struct);
    assert_eq!(category("LocalizedLine"), FieldCategory::LocalizedText);
    assert_eq!(category("Sprite"), FieldCategory::ExternalAsset);
    assert_eq!(category("TagTemplate"), FieldCategory::Reference);
}

#[test]
fn collections_carry_their_element_type() {
    let rules = ClassificationRules::default();
    let k = known();

    let list = classify("List<DropEntry>", &k, &rules);
    assert_eq!(list.category, FieldCategory::Collection);
    assert_eq!(list.element_type.as_deref(), Some("DropEntry"));

    let qualified = classify("System.Collections.Generic.List<int>", &k, &rules);
    assert_eq!(qualified.element_type.as_deref(), Some("int"));

    let array = classify("int[]", &k, &rules);
    assert_eq!(array.category, FieldCategory::Collection, "exact match, not primitive");
    assert_eq!(array.element_type.as_deref(), Some("int"));

    assert_eq!(collection_element("Vector3[,]"), Some("Vector3"));
    assert_eq!(collection_element("Dictionary<string, int>"), None);
    assert_eq!(collection_element("MyList<int>"), None);
}

#[test]
fn plain_capitalized_names_are_references_and_the_rest_unknown() {
    assert_eq!(category("SomeComponent"), FieldCategory::Reference);
    assert_eq!(category("UnknownTemplate"), FieldCategory::Reference);
    assert_eq!(category("Dictionary<string, int>"), FieldCategory::Unknown);
    assert_eq!(category("UnityEngine.Color"), FieldCategory::Unknown);
    assert_eq!(category("intPtr"), FieldCategory::Unknown);
}

#[test]
fn classification_follows_custom_rules() {
    let mut rules = ClassificationRules::default();
    rules.external_asset_types.insert("VideoClip".to_string());
    rules.primitive_types.insert("half".to_string());

    let k = KnownTypes::default();
    assert_eq!(classify("VideoClip", &k, &rules).category, FieldCategory::ExternalAsset);
    assert_eq!(classify("half", &k, &rules).category, FieldCategory::Primitive);
}
