//! Unit tests for C# helper generation
//!
//! These tests cover the derived helper, the components helper and the
//! storage helper rendered from the base schema and the derived fixture.

use store_schema_compiler::codegen::helper_file::{
    render_components_helper, render_helper, render_storage_helper,
};
use store_schema_compiler::codegen::HelperNamespaces;
use store_schema_compiler::schema::MAX_STRING_LENGTH;

use crate::common::{count, load_base, load_fixture};

const NAMESPACE: &str = "Contoso.Training";
const SCHEMA_NAMESPACE: &str = "Contoso.Training.Schema";

fn derived_helper() -> String {
    render_helper(
        &load_fixture("derived_schema.xml"),
        &HelperNamespaces::default(),
        NAMESPACE,
        SCHEMA_NAMESPACE,
    )
    .unwrap()
}

/// Text of the first `namespace name {` block
fn namespace_block<'a>(text: &'a str, name: &str) -> &'a str {
    let header = format!("namespace {} {{\n", name);
    let start = text
        .find(&header)
        .unwrap_or_else(|| panic!("Missing namespace {}", name));
    let end = text[start..].find("\n}\n").map_or(text.len(), |i| start + i + 3);
    &text[start..end]
}

// ============================================================================
// Derived Helper Tests
// ============================================================================

#[test]
fn test_helper_is_deterministic() {
    assert_eq!(derived_helper(), derived_helper());
}

#[test]
fn test_helper_file_layout() {
    let cs = derived_helper();
    assert!(cs.starts_with("//------------------------------------------------------------------------------\n// <auto-generated>\n"));

    let classes = namespace_block(&cs, SCHEMA_NAMESPACE);
    assert!(classes.contains("    using System;\n    using System.Diagnostics.CodeAnalysis;\n"));
    assert!(classes.contains("    public abstract class EnrollmentItem {\n"));
    assert!(classes.contains("    public abstract class CourseEnrollmentView {\n"));
    assert!(classes.contains("    public abstract class EnrollRight {\n"));

    let types = namespace_block(&cs, NAMESPACE);
    assert!(types.contains("    using Microsoft.LearningComponents.Storage;\n"));
    assert!(types.contains("    public enum CourseLevel {\n"));
    assert!(types.contains("    public class EnrollmentItemIdentifier : LearningStoreItemIdentifier {\n"));
}

#[test]
fn test_derived_members_are_literals() {
    let cs = derived_helper();
    assert!(cs.contains("        public const string ItemTypeName = \"EnrollmentItem\";\n"));
    assert!(cs.contains("        public const string Id = \"Id\";\n"));
    assert!(cs.contains("        public const string CourseId = \"CourseId\";\n"));
    assert!(cs.contains("        public const int MaxTitleLength = 200;\n"));
    assert!(cs.contains(&format!(
        "        public const int MaxNotesLength = {};\n",
        MAX_STRING_LENGTH
    )));
    assert!(cs.contains("        public const string ViewName = \"CourseEnrollmentView\";\n"));
    assert!(cs.contains("        public const string RightName = \"EnrollRight\";\n"));
}

#[test]
fn test_base_members_refer_to_storage_helper() {
    let cs = derived_helper();
    let base = "Microsoft.LearningComponents.Storage.BaseSchema";

    assert!(cs.contains(&format!(
        "public const string ItemTypeName = {}.UserItem.ItemTypeName;",
        base
    )));
    assert!(cs.contains(&format!("public const string Key = {}.UserItem.Key;", base)));
    assert!(cs.contains(&format!(
        "public const int MaxKeyLength = {}.UserItem.MaxKeyLength;",
        base
    )));
    assert!(cs.contains(&format!(
        "public const string ViewName = {}.AttemptItemView.ViewName;",
        base
    )));
    assert!(cs.contains(&format!(
        "public const string RootActivityId = {}.CreateAttemptRight.RootActivityId;",
        base
    )));

    // Members added by the derived schema stay literal, even on base entities
    assert!(cs.contains("public const string Department = \"Department\";"));
    assert!(cs.contains("public const int MaxDepartmentLength = 100;"));
    assert!(cs.contains("public const string CourseId = \"CourseId\";"));
}

#[test]
fn test_only_derived_enums_and_identifiers() {
    let cs = derived_helper();
    let types = namespace_block(&cs, NAMESPACE);

    assert!(!types.contains("public enum AttemptStatus"));
    assert!(!types.contains("UserItemIdentifier"));
    assert!(types.contains("public class CourseItemIdentifier"));
    assert_eq!(count(types, "Identifier : LearningStoreItemIdentifier {"), 2);
}

#[test]
fn test_identifier_constructors() {
    let cs = derived_helper();
    assert!(cs.contains(
        "public EnrollmentItemIdentifier(long key) : base(Contoso.Training.Schema.EnrollmentItem.ItemTypeName, key) {\n"
    ));
    assert!(cs.contains(
        "public EnrollmentItemIdentifier(LearningStoreItemIdentifier id) : base(id) {\n"
    ));
    assert!(cs.contains("throw new ArgumentNullException(\"id\");"));
    assert!(cs.contains(
        "if (id.ItemTypeName != Contoso.Training.Schema.EnrollmentItem.ItemTypeName) {\n"
    ));
    assert!(cs.contains("throw new ArgumentOutOfRangeException(\"id\");"));
}

#[test]
fn test_enum_values() {
    let cs = derived_helper();
    assert!(cs.contains("        Beginner = 1,\n"));
    assert!(cs.contains("        Advanced = 3,\n"));
    assert!(cs.contains("        Expert = 3,\n"));
    assert!(cs.contains("        /// Expert (3)\n        /// Another name for Advanced.\n"));
    assert!(cs.contains("    /// <summary>\n    /// Difficulty of a course.\n    /// </summary>\n    public enum CourseLevel {\n"));
}

#[test]
fn test_naming_suppressions() {
    let cs = derived_helper();
    assert!(cs.contains(
        "    [SuppressMessageAttribute(\"Microsoft.Naming\", \"CA1704\")]\n    public abstract class CourseItem {\n"
    ));
    assert!(cs.contains(
        "        [SuppressMessageAttribute(\"Microsoft.Naming\", \"CA1704\")]\n        public const string Title = \"Title\";\n"
    ));
}

// ============================================================================
// Documentation Tests
// ============================================================================

#[test]
fn test_property_documentation() {
    let cs = derived_helper();

    assert!(cs.contains("/// Name of the CourseId property on the EnrollmentItem item type.\n"));
    assert!(cs.contains("/// Type: Identifier of a <Typ>CourseItem</Typ> item<p/>\n"));
    assert!(cs.contains(
        "/// The item is deleted automatically when the item it refers to is deleted.<p/>\n"
    ));
    assert!(cs.contains("/// Type: Enumeration <Typ>/Contoso.Training.CourseLevel</Typ><p/>\n"));
    assert!(cs.contains(
        "/// Default value: <Fld>/Contoso.Training.CourseLevel.Beginner</Fld><p/>\n"
    ));
    assert!(cs.contains(
        "/// Type: Enumeration <Typ>/Microsoft.LearningComponents.AttemptStatus</Typ><p/>\n"
    ));
    assert!(cs.contains("/// Default value: 2024-01-15 09:30:00<p/>\n"));
    assert!(cs.contains("/// Type: String with a maximum length of 200 characters<p/>\n"));
    assert!(cs.contains("/// Free-form notes from the instructor.\n"));
    assert!(cs.contains("/// Can be null.<p/>\n"));
    assert!(cs.contains("/// No default value.<p/>\n"));
}

#[test]
fn test_item_type_documentation_lists_properties() {
    let cs = derived_helper();
    assert!(cs.contains(
        "    /// <summary>\n\
         \x20   /// Describes the CourseItem item type.\n\
         \x20   /// A course learners can enroll in.\n\
         \x20   /// </summary>\n\
         \x20   /// <remarks>\n\
         \x20   /// Properties of this item type:\n\
         \x20   /// <ul>\n\
         \x20   /// <li><Fld>Capacity</Fld></li>\n\
         \x20   /// <li><Fld>CourseGuid</Fld></li>\n\
         \x20   /// <li><Fld>Id</Fld></li>\n\
         \x20   /// <li><Fld>Level</Fld></li>\n\
         \x20   /// <li><Fld>Syllabus</Fld></li>\n\
         \x20   /// <li><Fld>Title</Fld></li>\n\
         \x20   /// </ul>\n\
         \x20   /// </remarks>\n"
    ));
}

#[test]
fn test_view_and_right_documentation() {
    let cs = derived_helper();
    assert!(cs.contains("/// Parameters of this view:\n    /// <ul>\n    /// <li><Fld>CourseId</Fld></li>\n"));
    assert!(cs.contains("/// Parameters of this view:\n    /// None\n"));
    assert!(cs.contains("/// Name of the LearnerName column of the CourseEnrollmentView view.\n"));
    assert!(cs.contains("/// Type: Identifier of a <Typ>UserItem</Typ> item\n"));
    assert!(cs.contains("/// Name of the CourseId parameter of the EnrollRight right.\n"));
    assert!(cs.contains("/// Parameters of this right:\n"));
}

// ============================================================================
// Base Schema Helper Tests
// ============================================================================

#[test]
fn test_components_helper() {
    let cs = render_components_helper(&load_base(), &HelperNamespaces::default()).unwrap();

    let block = namespace_block(&cs, "Microsoft.LearningComponents");
    assert!(block.contains("    public enum AttemptStatus {\n"));
    assert!(block.contains("    public enum PackageFormat {\n"));
    assert!(block.contains("        V1p3 = 2,\n"));
    assert!(block.contains("    internal abstract class BaseSchemaInternal {\n"));
    assert!(block.contains("        public abstract class UserItem {\n"));
    assert!(block.contains("            public const int MaxKeyLength = 250;\n"));
    assert!(block.contains("            public const int MaxSuspendDataLength = 64000;\n"));
    assert!(!cs.contains("ItemTypeName"));
}

#[test]
fn test_storage_helper() {
    let cs = render_storage_helper(&load_base(), &HelperNamespaces::default()).unwrap();

    let classes = namespace_block(&cs, "Microsoft.LearningComponents.Storage.BaseSchema");
    assert!(classes.contains("        public const string ItemTypeName = \"UserItem\";\n"));
    assert!(classes.contains(
        "        public const int MaxKeyLength = BaseSchemaInternal.UserItem.MaxKeyLength;\n"
    ));
    assert!(classes.contains("        public const string RightName = \"CreateAttemptRight\";\n"));
    assert!(classes.contains("/// Type: Enumeration <Typ>/Microsoft.LearningComponents.AttemptStatus</Typ><p/>\n"));

    let identifiers = namespace_block(&cs, "Microsoft.LearningComponents.Storage");
    assert_eq!(count(identifiers, ": LearningStoreItemIdentifier {"), 5);
    assert!(identifiers.contains(
        "public UserItemIdentifier(long key) : base(Microsoft.LearningComponents.Storage.BaseSchema.UserItem.ItemTypeName, key) {\n"
    ));
}

#[test]
fn test_custom_base_namespaces() {
    let namespaces = HelperNamespaces {
        components: "Acme".to_string(),
        storage: "Acme.Storage".to_string(),
        base_schema: "Acme.Storage.Base".to_string(),
    };
    let cs = render_helper(
        &load_fixture("derived_schema.xml"),
        &namespaces,
        NAMESPACE,
        SCHEMA_NAMESPACE,
    )
    .unwrap();
    assert!(cs.contains("public const string Key = Acme.Storage.Base.UserItem.Key;"));
    assert!(cs.contains("<Typ>/Acme.AttemptStatus</Typ>"));
}
