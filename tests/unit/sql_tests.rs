//! Unit tests for the init and upgrade scripts
//!
//! These tests render scripts for the base schema and the derived fixture
//! and check tables, constraints, security functions and the persisted
//! schema document.

use store_schema_compiler::codegen::sql_init::{render_init, render_upgrade};

use crate::common::{count, load_base, load_fixture};

fn derived_init() -> String {
    render_init(&load_fixture("derived_schema.xml")).unwrap()
}

fn derived_upgrade() -> String {
    render_upgrade(&load_fixture("derived_schema.xml")).unwrap()
}

/// Position of `needle`, panicking with a readable message if missing
fn position(text: &str, needle: &str) -> usize {
    text.find(needle)
        .unwrap_or_else(|| panic!("Script should contain {:?}", needle))
}

// ============================================================================
// Script Structure Tests
// ============================================================================

#[test]
fn test_init_is_deterministic() {
    let schema = load_fixture("derived_schema.xml");
    assert_eq!(render_init(&schema).unwrap(), render_init(&schema).unwrap());
    assert_eq!(render_upgrade(&schema).unwrap(), render_upgrade(&schema).unwrap());
}

#[test]
fn test_init_starts_with_header_and_guards() {
    let sql = derived_init();
    assert!(sql.starts_with("-- This script was generated by store-schema-compiler.\n"));
    assert!(sql.contains("IF DB_NAME()='master'\nBEGIN\n    RAISERROR(N'"));
    assert!(sql.contains("SET XACT_ABORT ON\nSET IMPLICIT_TRANSACTIONS ON\n"));
    assert!(sql.ends_with("COMMIT TRANSACTION\nGO\n\n"));
}

#[test]
fn test_init_section_order() {
    let sql = derived_init();

    let sql_before = position(&sql, "PRINT 'Creating the training schema'");
    let configuration = position(&sql, "CREATE TABLE Configuration (");
    let role = position(&sql, "CREATE ROLE LearningStore");
    let enum_table = position(&sql, "CREATE TABLE [AttemptStatus](");
    let item_table = position(&sql, "CREATE TABLE [UserItem](");
    let foreign_key = position(&sql, "ADD CONSTRAINT FK_PackageItem_Owner");
    let first_function = position(&sql, "CREATE FUNCTION");
    let item_sql_after = position(&sql, "PRINT 'EnrollmentItem created'");
    let sql_after = position(&sql, "PRINT 'Training schema created'");
    let commit = position(&sql, "COMMIT TRANSACTION");

    assert!(sql_before < configuration);
    assert!(configuration < role);
    assert!(role < enum_table);
    assert!(enum_table < item_table);
    assert!(item_table < foreign_key);
    assert!(foreign_key < first_function);
    assert!(sql.rfind("CREATE FUNCTION").unwrap() < item_sql_after);
    assert!(item_sql_after < sql_after);
    assert!(sql_after < commit);
}

// ============================================================================
// Table Tests
// ============================================================================

#[test]
fn test_item_type_table_columns() {
    let sql = derived_init();
    assert!(sql.contains(
        "CREATE TABLE [EnrollmentItem](\n\
         \x20   Id bigint IDENTITY PRIMARY KEY NOT NULL,\n\
         \x20   [CourseId] bigint NOT NULL,\n\
         \x20   [LearnerId] bigint NOT NULL,\n\
         \x20   [Status] int,\n\
         \x20   [EnrolledOn] datetime NOT NULL DEFAULT {ts '2024-01-15 09:30:00.000'},\n\
         \x20   [Notes] nvarchar(max)\n\
         )\n\
         GRANT SELECT, INSERT, DELETE, UPDATE ON [EnrollmentItem] TO LearningStore\n"
    ));
}

#[test]
fn test_column_modifiers() {
    let sql = derived_init();
    assert!(sql.contains("    [Title] nvarchar(200) NOT NULL,\n"));
    assert!(sql.contains("    [Level] int NOT NULL DEFAULT 1,\n"));
    assert!(sql.contains("    [Syllabus] nvarchar(max) CHECK(LEN([Syllabus])<=20000),\n"));
    assert!(sql.contains("    [CourseGuid] uniqueidentifier ROWGUIDCOL NOT NULL DEFAULT NEWID()\n"));
    assert!(sql.contains("    [ScaledScore] float(24) CHECK(ScaledScore BETWEEN -1 AND 1),\n"));
    assert!(sql.contains("    [AudioCaptioning] bit NOT NULL DEFAULT 0,\n"));
    assert!(sql.contains("    [Warnings] xml DEFAULT NULL\n"));
    assert!(sql.contains("    [Department] nvarchar(100)\n"));
}

#[test]
fn test_foreign_keys() {
    let sql = derived_init();
    assert!(sql.contains(
        "ALTER TABLE [EnrollmentItem]\n\
         ADD CONSTRAINT FK_EnrollmentItem_CourseId FOREIGN KEY ([CourseId])\n\
         REFERENCES [CourseItem] (Id) ON DELETE CASCADE\n"
    ));
    assert!(sql.contains(
        "ALTER TABLE [EnrollmentItem]\n\
         ADD CONSTRAINT FK_EnrollmentItem_Status FOREIGN KEY ([Status])\n\
         REFERENCES [AttemptStatus] (Id)\n"
    ));
    assert!(sql.contains("CREATE INDEX EnrollmentItem_LearnerId ON EnrollmentItem(LearnerId)\n"));
}

#[test]
fn test_enum_table_inserts_first_name_of_each_value() {
    let sql = derived_init();
    assert!(sql.contains("SET IDENTITY_INSERT [CourseLevel] ON\n"));
    assert!(sql.contains("SET IDENTITY_INSERT [CourseLevel] OFF\n"));
    assert_eq!(count(&sql, "INSERT INTO [CourseLevel]("), 3);
    assert!(sql.contains("    3,\n    'Advanced'\n"));
    assert!(!sql.contains("'Expert'"));
}

// ============================================================================
// Security Function Tests
// ============================================================================

#[test]
fn test_security_functions_only_where_granted() {
    let sql = derived_init();

    assert!(sql.contains("CREATE FUNCTION [UserItem$DeleteSecurity](@UserKey nvarchar(250),@Id bigint)"));
    assert!(!sql.contains("[PackageItem$DeleteSecurity]"));
    assert!(!sql.contains("[EnrollmentItem$DeleteSecurity]"));
    assert!(!sql.contains("[CourseItem$AddSecurity]"));
    assert!(!sql.contains("[CourseItem$DefaultViewSecurity]"));
    assert!(!sql.contains("CREATE FUNCTION [DeleteAttemptRight]"));
    assert!(!sql.contains("[ActivityPackageItemView$Security]"));
}

#[test]
fn test_base_schema_alone_has_no_security_functions() {
    let sql = render_init(&load_base()).unwrap();
    assert!(!sql.contains("RETURNS bit"));
    assert_eq!(count(&sql, "$DefaultView](@UserKey nvarchar(250))"), 5);
}

#[test]
fn test_grant_expressions_are_combined_in_one_return() {
    let sql = derived_init();
    let combined = "    RETURN (CASE WHEN @Status$Changed = 1 THEN 0 ELSE 1 END) | \
                    (CASE WHEN @UserKey = N'admin' THEN 1 ELSE 0 END)\n";
    assert_eq!(count(&sql, combined), 1);
}

#[test]
fn test_update_security_parameters() {
    let sql = derived_init();
    assert!(sql.contains(
        "CREATE FUNCTION [EnrollmentItem$UpdateSecurity](@UserKey nvarchar(250),@Id bigint,\
         @CourseId$Changed bit,@CourseId bigint,\
         @LearnerId$Changed bit,@LearnerId bigint,\
         @Status$Changed bit,@Status int,\
         @EnrolledOn$Changed bit,@EnrolledOn datetime,\
         @Notes$Changed bit,@Notes nvarchar(max))\n\
         RETURNS bit\nAS\nBEGIN\n"
    ));
}

#[test]
fn test_add_security_parameters_carry_defaults() {
    let sql = derived_init();
    assert!(sql.contains(
        "CREATE FUNCTION [EnrollmentItem$AddSecurity](@UserKey nvarchar(250),\
         @CourseId bigint,@LearnerId bigint,@Status int,\
         @EnrolledOn datetime={ts '2024-01-15 09:30:00.000'},@Notes nvarchar(max))\n"
    ));
}

#[test]
fn test_view_and_right_functions() {
    let sql = derived_init();

    assert!(sql.contains(
        "CREATE FUNCTION [CourseEnrollmentView](@UserKey nvarchar(250),@CourseId bigint=NULL)\n\
         RETURNS TABLE\nAS\nRETURN (\n    SELECT E.LearnerId, U.Name AS LearnerName, C.Level\n"
    ));
    assert!(sql.contains("GRANT SELECT ON [CourseEnrollmentView] TO LearningStore\n"));
    assert!(sql.contains(
        "CREATE FUNCTION [CourseEnrollmentView$Security](@UserKey nvarchar(250),@CourseId bigint=NULL)\n"
    ));
    assert!(sql.contains(
        "CREATE FUNCTION [AttemptItemView$Security](@UserKey nvarchar(250),@LearnerId bigint=NULL)\n"
    ));
    assert!(sql.contains(
        "CREATE FUNCTION [EnrollRight](@UserKey nvarchar(250),@CourseId bigint=NULL,@LearnerId bigint=NULL)\n"
    ));
    assert!(sql.contains(
        "CREATE FUNCTION [CreateAttemptRight](@UserKey nvarchar(250),\
         @RootActivityId bigint=NULL,@LearnerId bigint=NULL,@CourseId bigint=NULL)\n"
    ));
    assert!(sql.contains("GRANT EXECUTE ON [EnrollRight] TO LearningStore\n"));
}

#[test]
fn test_default_views() {
    let sql = derived_init();
    assert!(sql.contains(
        "CREATE FUNCTION [CourseItem$DefaultView](@UserKey nvarchar(250))\n\
         RETURNS TABLE\nAS\nRETURN (\n\
         \x20   SELECT Id, [Title], [Level], [Syllabus], [Capacity], [CourseGuid]\n\
         \x20   FROM [CourseItem]\n\
         )\nGO\n"
    ));
    assert!(sql.contains(
        "CREATE FUNCTION [EnrollmentItem$DefaultViewSecurity](@UserKey nvarchar(250))\n"
    ));
}

// ============================================================================
// Persisted Schema Document Tests
// ============================================================================

#[test]
fn test_schema_document_records_functions() {
    let sql = derived_init();
    assert!(sql.contains(
        "'<ItemType Name=\"EnrollmentItem\" ViewFunction=\"EnrollmentItem$DefaultView\" \
         ViewSecurityFunction=\"EnrollmentItem$DefaultViewSecurity\" \
         AddSecurityFunction=\"EnrollmentItem$AddSecurity\" \
         UpdateSecurityFunction=\"EnrollmentItem$UpdateSecurity\">' +\n"
    ));
    assert!(sql.contains(
        "'<Property Name=\"CourseId\" TypeCode=\"1\" Nullable=\"false\" HasDefault=\"false\" \
         ReferencedItemTypeName=\"CourseItem\"/>' +\n"
    ));
    assert!(sql.contains(
        "'<View Name=\"CourseEnrollmentView\" Function=\"CourseEnrollmentView\" \
         SecurityFunction=\"CourseEnrollmentView$Security\">' +\n"
    ));
    assert!(sql.contains("'<Right Name=\"EnrollRight\" SecurityFunction=\"EnrollRight\">' +\n"));
    assert!(sql.contains("'<Right Name=\"DeleteAttemptRight\">' +\n"));
    assert!(sql.contains("'<Value Name=\"Expert\" Value=\"3\"/>' +\n"));
    assert!(sql.contains("SET @schema = @schema + '</StoreSchema>'\n"));
}

// ============================================================================
// Upgrade Script Tests
// ============================================================================

#[test]
fn test_upgrade_leaves_tables_alone() {
    let sql = derived_upgrade();
    assert!(!sql.contains("CREATE TABLE"));
    assert!(!sql.contains("INSERT INTO ["));
    assert!(!sql.contains("CREATE ROLE"));
    assert!(!sql.contains("$DefaultView](@UserKey"));
    assert!(!sql.contains("PRINT 'Creating the training schema'"));
}

#[test]
fn test_upgrade_guards_and_drops() {
    let sql = derived_upgrade();
    assert!(sql.contains("IF NOT EXISTS(SELECT * FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_NAME='Configuration')\n"));
    assert!(sql.contains("DECLARE DropCursor CURSOR LOCAL FOR\n"));
    assert_eq!(count(&sql, "CROSS APPLY SchemaDefinition.nodes("), 7);
    assert!(sql.contains("SET @command = 'DROP FUNCTION [' + @name + ']'\n"));
    assert!(position(&sql, "DEALLOCATE DropCursor") < position(&sql, "CREATE FUNCTION"));
}

#[test]
fn test_upgrade_rewrites_schema_document() {
    let sql = derived_upgrade();
    assert!(sql.contains(
        "UPDATE Configuration SET SchemaDefinition.modify('delete /StoreSchema/View')\n"
    ));
    assert!(sql.contains(
        "UPDATE Configuration SET SchemaDefinition.modify('insert attribute \
         ViewSecurityFunction{\"EnrollmentItem$DefaultViewSecurity\"} \
         into /StoreSchema[1]/ItemType[@Name=\"EnrollmentItem\"][1]')\n"
    ));
    assert!(sql.contains(
        "UPDATE Configuration SET SchemaDefinition.modify('insert attribute \
         DeleteSecurityFunction{\"UserItem$DeleteSecurity\"} \
         into /StoreSchema[1]/ItemType[@Name=\"UserItem\"][1]')\n"
    ));
    // One dynamic insert per view and right
    assert_eq!(count(&sql, "EXEC(@command)"), 1 + 3 + 3);
}

#[test]
fn test_upgrade_recreates_functions() {
    let sql = derived_upgrade();
    assert!(sql.contains("CREATE FUNCTION [CourseEnrollmentView](@UserKey"));
    assert!(sql.contains("CREATE FUNCTION [EnrollmentItem$UpdateSecurity](@UserKey"));
    assert!(sql.contains("CREATE FUNCTION [EnrollmentItem$DefaultViewSecurity](@UserKey"));
    assert!(sql.ends_with("COMMIT TRANSACTION\nGO\n\n"));
}
