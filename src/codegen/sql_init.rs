//! T-SQL scripts that create a LearningStore database or upgrade its views
//! and security functions in place.

use std::path::Path;

use super::code_writer::CodeWriter;
use super::schema_xml::{self, item_type_security_attributes};
use super::write_output;
use crate::schema::{
    EnumType, ItemRight, ItemType, ItemTypeProperty, Parameter, Right, Schema, ValueType, View,
};
use crate::util::sql_string;

/// Database role every generated object is granted to
pub const LEARNING_STORE_ROLE: &str = "LearningStore";

const HEADER: &str = "\
-- This script was generated by store-schema-compiler.
-- Changes made by hand are lost when the script is regenerated.";

const CANT_USE_MASTER: &str =
    "This script must not be run against the master database. Select a LearningStore database first.";

const CANT_UPGRADE_EMPTY_DATABASE: &str =
    "This database has no Configuration table. Run the full init script instead of the upgrade script.";

/// Function names recorded in the persisted schema, as `(attribute, element)`.
/// The upgrade script drops every one of them before recreating the current set.
const RECORDED_FUNCTIONS: [(&str, &str); 7] = [
    ("Function", "View"),
    ("SecurityFunction", "View"),
    ("ViewSecurityFunction", "ItemType"),
    ("AddSecurityFunction", "ItemType"),
    ("DeleteSecurityFunction", "ItemType"),
    ("UpdateSecurityFunction", "ItemType"),
    ("SecurityFunction", "Right"),
];

/// Render the script that creates a database for `schema`
pub fn render_init(schema: &Schema) -> anyhow::Result<String> {
    let mut w = CodeWriter::new();
    write_header(&mut w);
    write_raise_if(&mut w, "DB_NAME()='master'", CANT_USE_MASTER);
    write_session_settings(&mut w);

    for snippet in schema.sql_before() {
        w.statements(snippet).blank();
    }

    w.line("-- Create the table holding the engine version and the schema document");
    w.line("CREATE TABLE Configuration (")
        .indent()
        .line("EngineVersion int NOT NULL,")
        .line("SchemaDefinition xml NOT NULL")
        .dedent()
        .line(")");
    schema_xml::write_schema_variable(&mut w, schema)?;
    w.line("INSERT INTO Configuration (")
        .indent()
        .line("EngineVersion,")
        .line("SchemaDefinition")
        .dedent()
        .line(") VALUES (")
        .indent()
        .line("1,@schema")
        .dedent()
        .line(")")
        .blank();

    w.line(&format!("-- Create the {} role", LEARNING_STORE_ROLE));
    w.line(&format!("CREATE ROLE {}", LEARNING_STORE_ROLE));
    w.line(&format!("GRANT SELECT ON Configuration TO {}", LEARNING_STORE_ROLE));
    w.blank();

    for en in schema.enums() {
        write_enum_table(&mut w, en);
    }
    for item_type in schema.item_types() {
        write_item_type_table(&mut w, item_type);
    }
    for item_type in schema.item_types() {
        write_constraints_and_indexes(&mut w, schema, item_type)?;
    }
    w.line("GO").blank();

    write_functions(&mut w, schema, true);

    for item_type in schema.item_types() {
        for snippet in &item_type.sql_after {
            w.statements(snippet).blank();
        }
    }
    for snippet in schema.sql_after() {
        w.statements(snippet).blank();
    }

    write_commit(&mut w);
    Ok(w.finish())
}

/// Render the script that replaces the views and security functions of an
/// existing database. Tables and their data are left alone.
pub fn render_upgrade(schema: &Schema) -> anyhow::Result<String> {
    let mut w = CodeWriter::new();
    write_header(&mut w);
    write_raise_if(&mut w, "DB_NAME()='master'", CANT_USE_MASTER);
    write_raise_if(
        &mut w,
        "NOT EXISTS(SELECT * FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_NAME='Configuration')",
        CANT_UPGRADE_EMPTY_DATABASE,
    );
    write_session_settings(&mut w);

    w.line("-- Drop every view and security function recorded in the schema document");
    write_drop_functions(&mut w);
    w.line("GO").blank();

    w.line("-- Replace the view, right and security information in the schema document");
    write_schema_upgrade(&mut w, schema)?;
    w.line("GO").blank();

    write_functions(&mut w, schema, false);

    write_commit(&mut w);
    Ok(w.finish())
}

pub fn write_init(schema: &Schema, path: &Path) -> anyhow::Result<()> {
    write_output(path, &render_init(schema)?)?;
    Ok(())
}

pub fn write_upgrade(schema: &Schema, path: &Path) -> anyhow::Result<()> {
    write_output(path, &render_upgrade(schema)?)?;
    Ok(())
}

fn write_header(w: &mut CodeWriter) {
    for line in HEADER.lines() {
        w.line(line);
    }
    w.blank();
}

fn write_raise_if(w: &mut CodeWriter, condition: &str, message: &str) {
    w.line(&format!("IF {}", condition))
        .line("BEGIN")
        .indent()
        .line(&format!("RAISERROR(N{},16,1)", sql_string(message)))
        .line("RETURN")
        .dedent()
        .line("END")
        .blank();
}

fn write_session_settings(w: &mut CodeWriter) {
    w.line("SET NOCOUNT ON")
        .line("SET XACT_ABORT ON")
        .line("SET IMPLICIT_TRANSACTIONS ON")
        .line("SET QUOTED_IDENTIFIER ON")
        .blank();
}

fn write_commit(w: &mut CodeWriter) {
    w.line("COMMIT TRANSACTION").line("GO").blank();
}

/// Security functions and views. The init script also creates the default
/// views; the upgrade script never drops them, so it only recreates their
/// security functions.
fn write_functions(w: &mut CodeWriter, schema: &Schema, include_default_views: bool) {
    for item_type in schema.item_types() {
        write_item_type_security(w, item_type);
    }
    for view in schema.views() {
        write_view(w, view);
        write_view_security(w, view);
    }
    for right in schema.rights() {
        write_right_security(w, right);
    }
    for item_type in schema.item_types() {
        if include_default_views {
            write_default_view(w, item_type);
        }
        write_default_view_security(w, item_type);
    }
}

fn write_enum_table(w: &mut CodeWriter, en: &EnumType) {
    let table = format!("[{}]", en.name);
    w.line(&format!("-- Create the {} table", en.name));
    w.line(&format!("CREATE TABLE {}(", table))
        .indent()
        .line("Id int IDENTITY PRIMARY KEY,")
        .line("Name varchar(63) NOT NULL")
        .dedent()
        .line(")");
    w.line(&format!("GRANT SELECT ON {} TO {}", table, LEARNING_STORE_ROLE));

    if !en.values.is_empty() {
        w.line(&format!("SET IDENTITY_INSERT {} ON", table));
        // Id is the primary key, so only the first name of a shared value gets a row
        let mut inserted: Vec<i32> = Vec::new();
        for value in &en.values {
            if inserted.contains(&value.value) {
                continue;
            }
            inserted.push(value.value);
            w.line(&format!("INSERT INTO {}(", table))
                .indent()
                .line("Id,")
                .line("Name")
                .dedent()
                .line(") VALUES (")
                .indent()
                .line(&format!("{},", value.value))
                .line(&sql_string(&value.name))
                .dedent()
                .line(")");
        }
        w.line(&format!("SET IDENTITY_INSERT {} OFF", table));
    }
    w.blank();
}

/// Column definition without the leading indentation
fn property_definition(property: &ItemTypeProperty) -> String {
    let mut definition = format!("[{}] {}", property.name, property.sql_type());
    if property.row_guid {
        definition.push_str(" ROWGUIDCOL");
    }
    if !property.nullable {
        definition.push_str(" NOT NULL");
    }
    if let Some(default) = &property.default {
        definition.push_str(" DEFAULT ");
        definition.push_str(&default.sql_constant());
    }
    if let Some(length) = property.value_type.check_constraint_length(property.length) {
        definition.push_str(&format!(" CHECK(LEN([{}])<={})", property.name, length));
    }
    for constraint in &property.constraints {
        definition.push(' ');
        definition.push_str(constraint.trim());
    }
    definition
}

fn write_item_type_table(w: &mut CodeWriter, item_type: &ItemType) {
    let table = format!("[{}]", item_type.name);
    w.line(&format!("-- Create the {} table", item_type.name));
    w.line(&format!("CREATE TABLE {}(", table)).indent();

    let mut columns = vec!["Id bigint IDENTITY PRIMARY KEY NOT NULL".to_string()];
    columns.extend(item_type.properties.iter().map(property_definition));
    let count = columns.len();
    for (i, column) in columns.iter().enumerate() {
        if i + 1 < count {
            w.line(&format!("{},", column));
        } else {
            w.line(column);
        }
    }

    w.dedent().line(")");
    w.line(&format!(
        "GRANT SELECT, INSERT, DELETE, UPDATE ON {} TO {}",
        table, LEARNING_STORE_ROLE
    ));
    w.blank();
}

fn write_constraints_and_indexes(
    w: &mut CodeWriter,
    schema: &Schema,
    item_type: &ItemType,
) -> anyhow::Result<()> {
    for property in &item_type.properties {
        let (target, cascade) = match property.value_type {
            ValueType::ItemIdentifier => (
                &schema.referenced_item_type(property)?.name,
                property.cascade_delete,
            ),
            ValueType::Enumeration => (&schema.referenced_enum(property)?.name, false),
            _ => continue,
        };
        w.line(&format!("ALTER TABLE [{}]", item_type.name));
        w.line(&format!(
            "ADD CONSTRAINT FK_{}_{} FOREIGN KEY ([{}])",
            item_type.name, property.name, property.name
        ));
        if cascade {
            w.line(&format!("REFERENCES [{}] (Id) ON DELETE CASCADE", target));
        } else {
            w.line(&format!("REFERENCES [{}] (Id)", target));
        }
        w.blank();
    }

    for index in &item_type.indexes {
        w.statements(index).blank();
    }
    Ok(())
}

/// `RETURN (e1) | (e2) | ...`
fn union_expressions(expressions: &[String]) -> String {
    let joined = expressions
        .iter()
        .map(|e| format!("({})", e))
        .collect::<Vec<_>>()
        .join(" | ");
    format!("RETURN {}", joined)
}

fn write_security_function(
    w: &mut CodeWriter,
    comment: &str,
    function: &str,
    parameters: &str,
    expressions: &[String],
) {
    w.line(&format!("-- {}", comment));
    w.line(&format!(
        "CREATE FUNCTION [{}](@UserKey nvarchar(250){})",
        function, parameters
    ));
    w.line("RETURNS bit").line("AS").line("BEGIN").indent();
    w.statements(&union_expressions(expressions));
    w.dedent().line("END").line("GO");
    w.line(&format!(
        "GRANT EXECUTE ON [{}] TO {}",
        function, LEARNING_STORE_ROLE
    ));
    w.line("GO").blank();
}

fn write_item_type_security(w: &mut CodeWriter, item_type: &ItemType) {
    if let Some(function) = item_type.security_function(ItemRight::Delete) {
        write_security_function(
            w,
            &format!("Create the function that checks delete rights on {}", item_type.name),
            &function,
            ",@Id bigint",
            &item_type.delete_right_expressions,
        );
    }

    if let Some(function) = item_type.security_function(ItemRight::Update) {
        let mut parameters = String::from(",@Id bigint");
        for property in &item_type.properties {
            parameters.push_str(&format!(
                ",@{}$Changed bit,@{} {}",
                property.name,
                property.name,
                property.sql_type()
            ));
        }
        write_security_function(
            w,
            &format!("Create the function that checks update rights on {}", item_type.name),
            &function,
            &parameters,
            &item_type.update_right_expressions,
        );
    }

    if let Some(function) = item_type.security_function(ItemRight::Add) {
        let mut parameters = String::new();
        for property in &item_type.properties {
            parameters.push_str(&format!(",@{} {}", property.name, property.sql_type()));
            if let Some(default) = &property.default {
                parameters.push('=');
                parameters.push_str(&default.sql_constant());
            }
        }
        write_security_function(
            w,
            &format!("Create the function that checks add rights on {}", item_type.name),
            &function,
            &parameters,
            &item_type.add_right_expressions,
        );
    }
}

/// `,@p type=NULL` for each parameter
fn parameter_list(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(|p| format!(",@{} {}=NULL", p.name, p.sql_type()))
        .collect()
}

fn write_view(w: &mut CodeWriter, view: &View) {
    w.line(&format!("-- Create the {} view", view.name));
    w.line(&format!(
        "CREATE FUNCTION [{}](@UserKey nvarchar(250){})",
        view.name,
        parameter_list(&view.parameters)
    ));
    w.line("RETURNS TABLE").line("AS").line("RETURN (").indent();
    w.statements(&view.implementation);
    w.dedent().line(")").line("GO");
    w.line(&format!("GRANT SELECT ON [{}] TO {}", view.name, LEARNING_STORE_ROLE));
    w.line("GO").blank();
}

fn write_view_security(w: &mut CodeWriter, view: &View) {
    if let Some(function) = view.security_function() {
        write_security_function(
            w,
            &format!("Create the function that checks query rights on {}", view.name),
            &function,
            &parameter_list(&view.parameters),
            &view.right_expressions,
        );
    }
}

fn write_right_security(w: &mut CodeWriter, right: &Right) {
    if let Some(function) = right.security_function() {
        write_security_function(
            w,
            &format!("Create the function that checks the {} right", right.name),
            &function,
            &parameter_list(&right.parameters),
            &right.right_expressions,
        );
    }
}

fn write_default_view(w: &mut CodeWriter, item_type: &ItemType) {
    let function = item_type.default_view_function();
    let mut select = String::from("SELECT Id");
    for property in &item_type.properties {
        select.push_str(&format!(", [{}]", property.name));
    }

    w.line(&format!("-- Create the default view of {}", item_type.name));
    w.line(&format!("CREATE FUNCTION [{}](@UserKey nvarchar(250))", function));
    w.line("RETURNS TABLE").line("AS").line("RETURN (").indent();
    w.line(&select);
    w.line(&format!("FROM [{}]", item_type.name));
    w.dedent().line(")").line("GO");
    w.line(&format!("GRANT SELECT ON [{}] TO {}", function, LEARNING_STORE_ROLE));
    w.line("GO").blank();
}

fn write_default_view_security(w: &mut CodeWriter, item_type: &ItemType) {
    if let Some(function) = item_type.security_function(ItemRight::Query) {
        write_security_function(
            w,
            &format!("Create the function that checks query rights on the default view of {}", item_type.name),
            &function,
            "",
            &item_type.query_right_expressions,
        );
    }
}

fn write_drop_functions(w: &mut CodeWriter) {
    w.line("DECLARE @name varchar(100)");
    w.line("DECLARE @command varchar(max)");
    w.line("DECLARE DropCursor CURSOR LOCAL FOR");
    for (i, (attribute, element)) in RECORDED_FUNCTIONS.iter().enumerate() {
        if i > 0 {
            w.line("UNION");
        }
        w.line(&format!("SELECT V.value('@{}', 'nvarchar(100)')", attribute));
        w.line("FROM Configuration");
        w.line(&format!(
            "CROSS APPLY SchemaDefinition.nodes('/StoreSchema/{}') AS Result(V)",
            element
        ));
        w.line(&format!(
            "WHERE V.value('@{}','nvarchar(100)') IS NOT NULL",
            attribute
        ));
    }
    w.line("OPEN DropCursor");
    w.line("FETCH NEXT FROM DropCursor INTO @name");
    w.line("WHILE @@FETCH_STATUS = 0");
    w.line("BEGIN").indent();
    w.line("SET @command = 'DROP FUNCTION [' + @name + ']'");
    w.line("EXEC(@command)");
    w.line("FETCH NEXT FROM DropCursor INTO @name");
    w.dedent().line("END");
    w.line("DEALLOCATE DropCursor");
    w.blank();
}

fn write_schema_upgrade(w: &mut CodeWriter, schema: &Schema) -> anyhow::Result<()> {
    w.line("DECLARE @command varchar(max)");

    for attribute in [
        "ViewSecurityFunction",
        "AddSecurityFunction",
        "DeleteSecurityFunction",
        "UpdateSecurityFunction",
    ] {
        w.line(&format!(
            "UPDATE Configuration SET SchemaDefinition.modify('delete /StoreSchema/ItemType/@{}')",
            attribute
        ));
    }
    w.line("UPDATE Configuration SET SchemaDefinition.modify('delete /StoreSchema/View')");
    w.line("UPDATE Configuration SET SchemaDefinition.modify('delete /StoreSchema/Right')");

    for item_type in schema.item_types() {
        for (attribute, function) in item_type_security_attributes(item_type) {
            w.line(&format!(
                "UPDATE Configuration SET SchemaDefinition.modify('insert attribute {}{{\"{}\"}} into /StoreSchema[1]/ItemType[@Name=\"{}\"][1]')",
                attribute, function, item_type.name
            ));
        }
    }

    for view in schema.views() {
        write_insert_command_start(w);
        schema_xml::write_view(w, schema, view)?;
        write_insert_command_end(w);
    }
    for right in schema.rights() {
        write_insert_command_start(w);
        schema_xml::write_right(w, schema, right)?;
        write_insert_command_end(w);
    }
    Ok(())
}

/// `modify()` only takes a literal, so each node is inserted through a
/// dynamic command built from the same string literals as `@schema`
fn write_insert_command_start(w: &mut CodeWriter) {
    w.line("SET @command = 'UPDATE Configuration SET SchemaDefinition.modify(''insert ' +");
    w.indent();
}

fn write_insert_command_end(w: &mut CodeWriter) {
    w.line("+ ' into /StoreSchema[1]'')'");
    w.dedent();
    w.line("EXEC(@command)");
}
