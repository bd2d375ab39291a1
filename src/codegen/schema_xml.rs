//! The schema document persisted in `Configuration.SchemaDefinition`.
//!
//! The runtime reads this document to find tables, views, rights and the
//! security functions guarding them. Every entity is written as a chain of
//! SQL string literals joined with `+`, one XML tag per line, so the init
//! script can append it to `@schema` and the upgrade script can splice it
//! into a dynamic `modify('insert ...')` command.

use super::code_writer::CodeWriter;
use super::xml_fragments::{end_tag, tag, xml_bool, TagKind};
use crate::schema::{
    EnumType, ItemRight, ItemType, Parameter, Right, Schema, TypedReference, ValueType, View,
};
use crate::util::sql_string;

/// Attribute name of each item type security function, in output order
const ITEM_SECURITY_ATTRIBUTES: [(ItemRight, &str); 4] = [
    (ItemRight::Query, "ViewSecurityFunction"),
    (ItemRight::Add, "AddSecurityFunction"),
    (ItemRight::Delete, "DeleteSecurityFunction"),
    (ItemRight::Update, "UpdateSecurityFunction"),
];

/// `(attribute name, function name)` for every security function an item
/// type has
pub fn item_type_security_attributes(item_type: &ItemType) -> Vec<(&'static str, String)> {
    ITEM_SECURITY_ATTRIBUTES
        .iter()
        .filter_map(|(right, attribute)| {
            item_type
                .security_function(*right)
                .map(|function| (*attribute, function))
        })
        .collect()
}

fn continued(w: &mut CodeWriter, xml: &str) {
    w.line(&format!("{} +", sql_string(xml)));
}

fn last(w: &mut CodeWriter, xml: &str) {
    w.line(&sql_string(xml));
}

/// `ReferencedItemTypeName` or `EnumName`, when the value type needs one
fn reference_attribute(
    schema: &Schema,
    member: &impl TypedReference,
) -> anyhow::Result<Option<(&'static str, String)>> {
    Ok(match member.value_type() {
        ValueType::ItemIdentifier => Some((
            "ReferencedItemTypeName",
            schema.referenced_item_type(member)?.name.clone(),
        )),
        ValueType::Enumeration => Some(("EnumName", schema.referenced_enum(member)?.name.clone())),
        _ => None,
    })
}

fn type_code(member: &impl TypedReference) -> (&'static str, String) {
    ("TypeCode", member.value_type().type_code().to_string())
}

fn as_str_pairs<'a>(attributes: &'a [(&'a str, String)]) -> Vec<(&'a str, &'a str)> {
    attributes.iter().map(|(k, v)| (*k, v.as_str())).collect()
}

pub fn write_item_type(w: &mut CodeWriter, schema: &Schema, item_type: &ItemType) -> anyhow::Result<()> {
    let mut attributes = vec![
        ("Name", item_type.name.clone()),
        ("ViewFunction", item_type.default_view_function()),
    ];
    attributes.extend(item_type_security_attributes(item_type));
    continued(w, &tag("ItemType", &as_str_pairs(&attributes), TagKind::Start)?);

    w.indent();
    for property in &item_type.properties {
        let mut attributes = vec![
            ("Name", property.name.clone()),
            type_code(property),
            ("Nullable", xml_bool(property.nullable).to_string()),
            ("HasDefault", xml_bool(property.default.is_some()).to_string()),
        ];
        attributes.extend(reference_attribute(schema, property)?);
        continued(w, &tag("Property", &as_str_pairs(&attributes), TagKind::Empty)?);
    }
    w.dedent();

    last(w, &end_tag("ItemType")?);
    Ok(())
}

pub fn write_enum(w: &mut CodeWriter, en: &EnumType) -> anyhow::Result<()> {
    continued(w, &tag("Enum", &[("Name", en.name.as_str())], TagKind::Start)?);
    w.indent();
    for value in &en.values {
        let number = value.value.to_string();
        continued(
            w,
            &tag(
                "Value",
                &[("Name", value.name.as_str()), ("Value", number.as_str())],
                TagKind::Empty,
            )?,
        );
    }
    w.dedent();
    last(w, &end_tag("Enum")?);
    Ok(())
}

/// Columns and parameters are always nullable in the persisted schema
fn write_nullable_member(
    w: &mut CodeWriter,
    schema: &Schema,
    element: &str,
    member: &impl TypedReference,
) -> anyhow::Result<()> {
    let mut attributes = vec![
        ("Name", member.name().to_string()),
        type_code(member),
        ("Nullable", "true".to_string()),
    ];
    attributes.extend(reference_attribute(schema, member)?);
    continued(w, &tag(element, &as_str_pairs(&attributes), TagKind::Empty)?);
    Ok(())
}

fn write_parameters(w: &mut CodeWriter, schema: &Schema, parameters: &[Parameter]) -> anyhow::Result<()> {
    for parameter in parameters {
        write_nullable_member(w, schema, "Parameter", parameter)?;
    }
    Ok(())
}

pub fn write_view(w: &mut CodeWriter, schema: &Schema, view: &View) -> anyhow::Result<()> {
    let mut attributes = vec![("Name", view.name.clone()), ("Function", view.name.clone())];
    if let Some(function) = view.security_function() {
        attributes.push(("SecurityFunction", function));
    }
    continued(w, &tag("View", &as_str_pairs(&attributes), TagKind::Start)?);

    w.indent();
    for column in &view.columns {
        write_nullable_member(w, schema, "Column", column)?;
    }
    write_parameters(w, schema, &view.parameters)?;
    w.dedent();

    last(w, &end_tag("View")?);
    Ok(())
}

pub fn write_right(w: &mut CodeWriter, schema: &Schema, right: &Right) -> anyhow::Result<()> {
    let mut attributes = vec![("Name", right.name.clone())];
    if let Some(function) = right.security_function() {
        attributes.push(("SecurityFunction", function));
    }
    continued(w, &tag("Right", &as_str_pairs(&attributes), TagKind::Start)?);

    w.indent();
    write_parameters(w, schema, &right.parameters)?;
    w.dedent();

    last(w, &end_tag("Right")?);
    Ok(())
}

/// Build `@schema`: item types, enums, views, rights
pub fn write_schema_variable(w: &mut CodeWriter, schema: &Schema) -> anyhow::Result<()> {
    w.line("DECLARE @schema varchar(max)");
    w.line(&format!("SET @schema = {}", sql_string("<StoreSchema>")));

    for item_type in schema.item_types() {
        w.line("SET @schema = @schema +").indent();
        write_item_type(w, schema, item_type)?;
        w.dedent();
    }
    for en in schema.enums() {
        w.line("SET @schema = @schema +").indent();
        write_enum(w, en)?;
        w.dedent();
    }
    for view in schema.views() {
        w.line("SET @schema = @schema +").indent();
        write_view(w, schema, view)?;
        w.dedent();
    }
    for right in schema.rights() {
        w.line("SET @schema = @schema +").indent();
        write_right(w, schema, right)?;
        w.dedent();
    }

    w.line(&format!("SET @schema = @schema + {}", sql_string("</StoreSchema>")));
    Ok(())
}
