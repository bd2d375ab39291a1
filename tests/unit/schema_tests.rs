//! Unit tests for schema loading and validation
//!
//! These tests load the embedded base schema together with the fixture
//! schemas and check the merged model.

use std::fs;

use tempfile::TempDir;

use store_schema_compiler::schema::{DefaultValue, ItemRight, Literal, ValueType, BASE_SCHEMA_XML};
use store_schema_compiler::{Schema, SchemaBuilder, SchemaCompilerError, SchemaSource};

use crate::common::{fixture_path, load_base, load_fixture};

fn names<T>(items: &[T], name: impl Fn(&T) -> &str) -> Vec<String> {
    items.iter().map(|i| name(i).to_string()).collect()
}

fn validation_messages(err: &SchemaCompilerError) -> Vec<String> {
    err.validation_errors()
        .unwrap_or_else(|| panic!("Expected validation errors, got: {}", err))
        .iter()
        .map(|e| e.to_string())
        .collect()
}

// ============================================================================
// Base Schema Tests
// ============================================================================

#[test]
fn test_base_schema_contents() {
    let schema = load_base();

    assert_eq!(
        names(schema.enums(), |e| &e.name),
        vec![
            "AttemptStatus",
            "CompletionStatus",
            "SuccessStatus",
            "LessonStatus",
            "PackageFormat"
        ]
    );
    assert_eq!(
        names(schema.item_types(), |i| &i.name),
        vec![
            "UserItem",
            "PackageItem",
            "ActivityPackageItem",
            "AttemptItem",
            "ActivityAttemptItem"
        ]
    );
    assert_eq!(schema.views().len(), 2);
    assert_eq!(schema.rights().len(), 2);

    assert!(schema.item_types().iter().all(|i| i.in_base_schema));
    assert!(schema
        .item_types()
        .iter()
        .flat_map(|i| &i.properties)
        .all(|p| p.in_base_schema));
}

#[test]
fn test_base_schema_has_no_security_functions() {
    let schema = load_base();
    for item_type in schema.item_types() {
        for right in ItemRight::ALL {
            assert_eq!(item_type.security_function(right), None, "{}", item_type.name);
        }
    }
    assert!(schema.views().iter().all(|v| v.security_function().is_none()));
    assert!(schema.rights().iter().all(|r| r.security_function().is_none()));
}

#[test]
fn test_base_schema_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("MyBase.xml");
    fs::write(&path, BASE_SCHEMA_XML).unwrap();

    let source = SchemaSource::File(path.clone());
    assert_eq!(source.display_name(), path.display().to_string());

    let schema = Schema::from_base_schema(&source).unwrap();
    assert_eq!(schema.item_types().len(), load_base().item_types().len());
}

// ============================================================================
// Derived Schema Tests
// ============================================================================

#[test]
fn test_derived_entities_follow_base_entities() {
    let schema = load_fixture("derived_schema.xml");

    assert_eq!(
        names(schema.item_types(), |i| &i.name),
        vec![
            "UserItem",
            "PackageItem",
            "ActivityPackageItem",
            "AttemptItem",
            "ActivityAttemptItem",
            "EnrollmentItem",
            "CourseItem"
        ]
    );
    assert_eq!(schema.enums().last().unwrap().name, "CourseLevel");
    assert!(!schema.enum_type("CourseLevel").unwrap().in_base_schema);
    assert!(!schema.view("CourseEnrollmentView").unwrap().in_base_schema);
    assert!(!schema.right("EnrollRight").unwrap().in_base_schema);
}

#[test]
fn test_forward_reference_resolves() {
    let schema = load_fixture("derived_schema.xml");
    let enrollment = schema.item_type("EnrollmentItem").unwrap();
    let course_id = enrollment.property("CourseId").unwrap();

    assert_eq!(course_id.value_type, ValueType::ItemIdentifier);
    assert!(course_id.cascade_delete);
    assert_eq!(schema.referenced_item_type(course_id).unwrap().name, "CourseItem");

    let status = enrollment.property("Status").unwrap();
    assert_eq!(schema.referenced_enum(status).unwrap().name, "AttemptStatus");
}

#[test]
fn test_extend_item_type_adds_to_base_item_type() {
    let schema = load_fixture("derived_schema.xml");
    let user = schema.item_type("UserItem").unwrap();

    assert!(user.in_base_schema);
    let department = user.property("Department").unwrap();
    assert!(!department.in_base_schema);
    assert_eq!(department.length, Some(100));
    assert!(user.property("Key").unwrap().in_base_schema);

    let name_remarks = user.property("Name").unwrap().documentation.remarks.clone();
    assert!(name_remarks.unwrap().contains("Shown on course rosters."));

    assert_eq!(user.delete_right_expressions, vec!["0".to_string()]);
    assert_eq!(
        user.security_function(ItemRight::Delete).as_deref(),
        Some("UserItem$DeleteSecurity")
    );
    assert_eq!(user.security_function(ItemRight::Update), None);
    // Indexes are kept unless ReplaceIndexes is set
    assert_eq!(user.indexes.len(), 1);
}

#[test]
fn test_extend_view_and_right() {
    let schema = load_fixture("derived_schema.xml");

    let view = schema.view("AttemptItemView").unwrap();
    assert!(view.in_base_schema);
    assert_eq!(view.right_expressions, vec!["1".to_string()]);
    assert_eq!(view.security_function().as_deref(), Some("AttemptItemView$Security"));

    let right = schema.right("CreateAttemptRight").unwrap();
    assert_eq!(
        names(&right.parameters, |p| &p.name),
        vec!["RootActivityId", "LearnerId", "CourseId"]
    );
    assert!(right.parameters[0].in_base_schema);
    assert!(!right.parameters[2].in_base_schema);
    assert_eq!(right.security_function().as_deref(), Some("CreateAttemptRight"));
}

#[test]
fn test_grant_expressions_accumulate() {
    let schema = load_fixture("derived_schema.xml");
    let enrollment = schema.item_type("EnrollmentItem").unwrap();

    assert_eq!(enrollment.update_right_expressions.len(), 2);
    assert_eq!(enrollment.query_right_expressions.len(), 1);
    assert_eq!(enrollment.add_right_expressions, vec!["1".to_string()]);
    assert!(enrollment.delete_right_expressions.is_empty());
}

#[test]
fn test_default_values_are_typed() {
    let schema = load_fixture("derived_schema.xml");
    let course = schema.item_type("CourseItem").unwrap();

    assert_eq!(
        course.property("Level").unwrap().default,
        Some(DefaultValue::Literal(Literal::Enumeration(1)))
    );
    assert_eq!(
        course.property("Capacity").unwrap().default,
        Some(DefaultValue::Literal(Literal::Int32(30)))
    );
    assert_eq!(
        course.property("CourseGuid").unwrap().default,
        Some(DefaultValue::Function("NEWID()".to_string()))
    );
    assert!(course.property("CourseGuid").unwrap().row_guid);

    let enrolled_on = schema
        .item_type("EnrollmentItem")
        .unwrap()
        .property("EnrolledOn")
        .unwrap();
    assert_eq!(
        enrolled_on.default.as_ref().unwrap().sql_constant(),
        "{ts '2024-01-15 09:30:00.000'}"
    );
}

#[test]
fn test_enum_values_may_share_an_integer() {
    let schema = load_fixture("derived_schema.xml");
    let level = schema.enum_type("CourseLevel").unwrap();

    assert_eq!(level.values.len(), 4);
    assert_eq!(level.value_name(3), Some("Advanced"));
    assert_eq!(
        level.value("Expert").unwrap().documentation.as_deref(),
        Some("Another name for Advanced.")
    );
}

#[test]
fn test_empty_derived_schema_adds_nothing() {
    let schema = load_fixture("empty_schema.xml");
    let base = load_base();

    assert_eq!(schema.item_types(), base.item_types());
    assert_eq!(schema.enums(), base.enums());
    assert!(schema.sql_before().is_empty());
}

#[test]
fn test_sql_snippets_are_collected() {
    let schema = load_fixture("derived_schema.xml");
    assert_eq!(schema.sql_before().len(), 1);
    assert_eq!(schema.sql_after().len(), 1);
    assert_eq!(
        schema.item_type("EnrollmentItem").unwrap().sql_after,
        vec!["PRINT 'EnrollmentItem created'".to_string()]
    );
}

// ============================================================================
// Validation Error Tests
// ============================================================================

#[test]
fn test_duplicate_names_across_files_and_kinds() {
    let err = Schema::from_base_schema_and_file(
        &SchemaSource::Embedded,
        &fixture_path("duplicate_names.xml"),
    )
    .unwrap_err();

    let messages = validation_messages(&err);
    assert_eq!(messages.len(), 2, "{:?}", messages);
    assert!(messages[0].contains("duplicate_names.xml("));
    assert!(messages[0].contains("the name useritem is already used by the element at BaseSchema.xml("));
    assert!(messages[1].contains("the name BadgeItem is already used"));
}

#[test]
fn test_unresolved_references_are_all_reported() {
    let err = Schema::from_base_schema_and_file(
        &SchemaSource::Embedded,
        &fixture_path("unresolved_references.xml"),
    )
    .unwrap_err();

    let errors = err.validation_errors().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors.mentions("property BadgeItem.OwnerId refers to item type OwnerItem"));
    assert!(errors.mentions("property BadgeItem.Kind refers to enum BadgeKind"));
}

#[test]
fn test_malformed_file_reports_location() {
    let err = Schema::from_base_schema_and_file(
        &SchemaSource::Embedded,
        &fixture_path("malformed.xml"),
    )
    .unwrap_err();

    let errors = err.validation_errors().unwrap();
    assert_eq!(errors.len(), 1);
    let location = errors.iter().next().unwrap().location.clone().unwrap();
    assert!(location.file.ends_with("malformed.xml"));
    assert!(location.line >= 4);
}

#[test]
fn test_missing_file_is_a_read_error() {
    let err = Schema::from_base_schema_and_file(
        &SchemaSource::Embedded,
        &fixture_path("does_not_exist.xml"),
    )
    .unwrap_err();
    assert!(matches!(err, SchemaCompilerError::SchemaReadError { .. }));
}

#[test]
fn test_builder_accepts_several_files() {
    let mut builder = SchemaBuilder::new();
    builder
        .apply_text(BASE_SCHEMA_XML, "BaseSchema.xml", true)
        .unwrap();
    builder
        .apply_text(
            &fs::read_to_string(fixture_path("derived_schema.xml")).unwrap(),
            "derived_schema.xml",
            false,
        )
        .unwrap();
    let schema = builder.finish().unwrap();
    assert!(schema.item_type("CourseItem").is_some());
}

// ============================================================================
// Encoding Tests
// ============================================================================

const SMALL_SCHEMA: &str = r#"<StoreSchema xmlns="urn:schemas-microsoft-com:learning-components:learning-store-schema">
  <Enum Name="Mood">
    <Documentation><Summary>Caf&#233; or café</Summary></Documentation>
    <Values><Value Name="Calm" Value="0"/></Values>
  </Enum>
</StoreSchema>"#;

#[test]
fn test_utf16_file_with_bom() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("utf16.xml");

    let mut bytes = vec![0xFF, 0xFE];
    for unit in SMALL_SCHEMA.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    fs::write(&path, bytes).unwrap();

    let schema = Schema::from_base_schema_and_file(&SchemaSource::Embedded, &path).unwrap();
    let summary = schema.enum_type("Mood").unwrap().documentation.summary.clone();
    assert!(summary.unwrap().ends_with("café"));
}

#[test]
fn test_windows_1252_file_without_bom() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cp1252.xml");

    // 0xE9 is 'é' in Windows-1252 and not valid UTF-8 on its own
    let bytes: Vec<u8> = SMALL_SCHEMA
        .replace("café", "caf\u{0}")
        .bytes()
        .map(|b| if b == 0 { 0xE9 } else { b })
        .collect();
    fs::write(&path, bytes).unwrap();

    let schema = Schema::from_base_schema_and_file(&SchemaSource::Embedded, &path).unwrap();
    let summary = schema.enum_type("Mood").unwrap().documentation.summary.clone();
    assert!(summary.unwrap().ends_with("café"));
}
