//! XML documentation comments for the generated helper classes.
//!
//! Each comment combines boilerplate describing the schema element with the
//! `<Summary>` and `<Remarks>` markup written in the schema file.

use super::code_writer::CodeWriter;
use crate::schema::{
    DefaultValue, EnumType, EnumValue, ItemType, ItemTypeProperty, Literal, Parameter,
    ParameterOwner, Right, Schema, TypedReference, ValueType, View, ViewColumn,
};
use crate::util::trimmed_lines;

/// A `<summary>` block and an optional `<remarks>` block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocComment {
    summary: Vec<String>,
    remarks: Option<Vec<String>>,
}

impl DocComment {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: vec![summary.into()],
            remarks: None,
        }
    }

    /// Append schema file markup to the summary
    pub fn summary_text(mut self, text: Option<&str>) -> Self {
        if let Some(text) = text {
            self.summary
                .extend(trimmed_lines(text).into_iter().map(str::to_string));
        }
        self
    }

    pub fn remark(mut self, line: impl Into<String>) -> Self {
        self.remarks.get_or_insert_with(Vec::new).push(line.into());
        self
    }

    /// Append schema file markup to the remarks, ending in `<p/>`
    pub fn remarks_text(mut self, text: Option<&str>) -> Self {
        let lines = text.map(trimmed_lines).unwrap_or_default();
        if let Some((last, rest)) = lines.split_last() {
            let remarks = self.remarks.get_or_insert_with(Vec::new);
            remarks.extend(rest.iter().map(|line| line.to_string()));
            remarks.push(format!("{}<p/>", last));
        }
        self
    }

    /// Sorted `<ul>` of `<Fld>` entries
    fn field_list(mut self, mut names: Vec<&str>) -> Self {
        names.sort_unstable();
        self = self.remark("<ul>");
        for name in names {
            self = self.remark(format!("<li><Fld>{}</Fld></li>", name));
        }
        self.remark("</ul>")
    }

    pub fn render(&self, w: &mut CodeWriter) {
        w.line("/// <summary>");
        for line in &self.summary {
            doc_line(w, line);
        }
        w.line("/// </summary>");

        if let Some(remarks) = &self.remarks {
            w.line("/// <remarks>");
            for line in remarks {
                doc_line(w, line);
            }
            w.line("/// </remarks>");
        }
    }
}

fn doc_line(w: &mut CodeWriter, line: &str) {
    if line.is_empty() {
        w.line("///");
    } else {
        w.line(&format!("/// {}", line));
    }
}

/// Builds the doc comment of every generated declaration.
///
/// Enum tags depend on where the enum class is generated: base enums live in
/// `base_enum_namespace`, all others in `type_namespace`.
#[derive(Debug, Clone, Copy)]
pub struct DocContext<'a> {
    schema: &'a Schema,
    base_enum_namespace: &'a str,
    type_namespace: &'a str,
}

impl<'a> DocContext<'a> {
    pub fn new(schema: &'a Schema, base_enum_namespace: &'a str, type_namespace: &'a str) -> Self {
        Self {
            schema,
            base_enum_namespace,
            type_namespace,
        }
    }

    /// `/Namespace.Enum`
    pub fn enum_tag(&self, en: &EnumType) -> String {
        if en.in_base_schema {
            format!("/{}.{}", self.base_enum_namespace, en.name)
        } else {
            format!("/{}.{}", self.type_namespace, en.name)
        }
    }

    fn type_description(
        &self,
        member: &impl TypedReference,
        max_length: Option<i32>,
    ) -> anyhow::Result<String> {
        let target = match member.value_type() {
            ValueType::Enumeration => Some(self.enum_tag(self.schema.referenced_enum(member)?)),
            ValueType::ItemIdentifier => Some(self.schema.referenced_item_type(member)?.name.clone()),
            _ => None,
        };
        Ok(member.value_type().doc_description(max_length, target.as_deref()))
    }

    fn default_text(
        &self,
        property: &ItemTypeProperty,
        default: &DefaultValue,
    ) -> anyhow::Result<String> {
        let value_tag = match default {
            DefaultValue::Literal(Literal::Enumeration(value)) => {
                let en = self.schema.referenced_enum(property)?;
                en.value_name(*value)
                    .map(|name| format!("{}.{}", self.enum_tag(en), name))
            }
            _ => None,
        };
        Ok(default.doc_text(value_tag.as_deref()))
    }

    pub fn item_type(&self, item_type: &ItemType) -> DocComment {
        DocComment::new(format!("Describes the {} item type.", item_type.name))
            .summary_text(item_type.documentation.summary.as_deref())
            .remarks_text(item_type.documentation.remarks.as_deref())
            .remark("Properties of this item type:")
            .field_list(
                std::iter::once("Id")
                    .chain(item_type.properties.iter().map(|p| p.name.as_str()))
                    .collect(),
            )
    }

    pub fn item_type_name(&self, item_type: &ItemType) -> DocComment {
        DocComment::new(format!("Name of the {} item type.", item_type.name))
    }

    pub fn id(&self, item_type: &ItemType) -> DocComment {
        DocComment::new(property_summary("Id", &item_type.name))
            .remark("Identifies an item of this type. The store assigns it when the item is added.<p/>")
            .remark(format!(
                "Type: {}<p/>",
                ValueType::ItemIdentifier.doc_description(None, Some(&item_type.name))
            ))
            .remark("Cannot be null.<p/>")
    }

    pub fn property(&self, property: &ItemTypeProperty) -> anyhow::Result<DocComment> {
        let description = self.type_description(property, property.max_length())?;
        let mut doc = DocComment::new(property_summary(&property.name, &property.item_type_name))
            .summary_text(property.documentation.summary.as_deref())
            .remarks_text(property.documentation.remarks.as_deref())
            .remark(format!("Type: {}<p/>", description))
            .remark(if property.nullable {
                "Can be null.<p/>"
            } else {
                "Cannot be null.<p/>"
            });

        doc = match &property.default {
            Some(default) => doc.remark(format!(
                "Default value: {}<p/>",
                self.default_text(property, default)?
            )),
            None => doc.remark("No default value.<p/>"),
        };

        if property.value_type == ValueType::ItemIdentifier && property.cascade_delete {
            doc = doc.remark(
                "The item is deleted automatically when the item it refers to is deleted.<p/>",
            );
        }
        Ok(doc)
    }

    pub fn max_length(&self, property: &ItemTypeProperty) -> DocComment {
        let unit = if property.value_type == ValueType::ByteArray {
            "bytes"
        } else {
            "characters"
        };
        DocComment::new(format!(
            "Maximum length of the {} property, in {}.",
            property.name, unit
        ))
    }

    pub fn view(&self, view: &View) -> DocComment {
        let doc = DocComment::new(format!("Describes the {} view.", view.name))
            .summary_text(view.documentation.summary.as_deref())
            .remarks_text(view.documentation.remarks.as_deref())
            .remark("Columns returned by this view:")
            .field_list(view.columns.iter().map(|c| c.name.as_str()).collect())
            .remark("Parameters of this view:");
        parameter_list(doc, &view.parameters)
    }

    pub fn view_name(&self, view: &View) -> DocComment {
        DocComment::new(format!("Name of the {} view.", view.name))
    }

    pub fn column(&self, column: &ViewColumn) -> anyhow::Result<DocComment> {
        Ok(DocComment::new(format!(
            "Name of the {} column of the {} view.",
            column.name, column.view_name
        ))
        .summary_text(column.documentation.summary.as_deref())
        .remarks_text(column.documentation.remarks.as_deref())
        .remark(format!("Type: {}", self.type_description(column, None)?)))
    }

    pub fn parameter(&self, parameter: &Parameter) -> anyhow::Result<DocComment> {
        let summary = match &parameter.owner {
            ParameterOwner::View(view) => {
                format!("Name of the {} parameter of the {} view.", parameter.name, view)
            }
            ParameterOwner::Right(right) => {
                format!("Name of the {} parameter of the {} right.", parameter.name, right)
            }
        };
        Ok(DocComment::new(summary)
            .summary_text(parameter.documentation.summary.as_deref())
            .remarks_text(parameter.documentation.remarks.as_deref())
            .remark(format!("Type: {}", self.type_description(parameter, None)?)))
    }

    pub fn right(&self, right: &Right) -> DocComment {
        let doc = DocComment::new(format!("Describes the {} right.", right.name))
            .summary_text(right.documentation.summary.as_deref())
            .remarks_text(right.documentation.remarks.as_deref())
            .remark("Parameters of this right:");
        parameter_list(doc, &right.parameters)
    }

    pub fn right_name(&self, right: &Right) -> DocComment {
        DocComment::new(format!("Name of the {} right.", right.name))
    }

    pub fn enum_type(&self, en: &EnumType) -> DocComment {
        let summary = en.documentation.summary.as_deref().map(str::trim);
        let doc = match summary {
            Some(summary) if !summary.is_empty() => DocComment::default().summary_text(Some(summary)),
            _ => DocComment::new(en.name.clone()),
        };
        match en.documentation.remarks.as_deref() {
            Some(remarks) => DocComment {
                remarks: Some(trimmed_lines(remarks).into_iter().map(str::to_string).collect()),
                ..doc
            },
            None => doc,
        }
    }

    pub fn enum_value(&self, value: &EnumValue) -> DocComment {
        DocComment::new(format!("{} ({})", value.name, value.value))
            .summary_text(value.documentation.as_deref())
    }

    /// Doc of `<ItemType>Identifier`; `item_type_namespace` holds the item
    /// type class
    pub fn identifier(&self, item_type: &ItemType, item_type_namespace: &str) -> DocComment {
        DocComment::new(format!(
            "Identifier of an item of type <Typ>/{}.{}</Typ>.",
            item_type_namespace, item_type.name
        ))
    }

    pub fn identifier_from_key(&self, item_type: &ItemType) -> DocComment {
        DocComment::new(format!(
            "Create a {}Identifier from the key of a {} item.",
            item_type.name, item_type.name
        ))
    }

    pub fn identifier_from_identifier(&self, item_type: &ItemType) -> DocComment {
        DocComment::new(format!(
            "Create a {}Identifier from a generic identifier.",
            item_type.name
        ))
        .remark(format!(
            "<paramref name=\"id\"/> must refer to a {} item.",
            item_type.name
        ))
    }

    pub fn base_schema_internal(&self) -> DocComment {
        DocComment::new("Maximum lengths of base schema properties.")
    }

    pub fn base_schema_internal_item_type(&self, item_type: &ItemType) -> DocComment {
        DocComment::new(format!(
            "Maximum lengths of the properties of the {} item type.",
            item_type.name
        ))
    }
}

fn property_summary(property: &str, item_type: &str) -> String {
    format!("Name of the {} property on the {} item type.", property, item_type)
}

fn parameter_list(doc: DocComment, parameters: &[Parameter]) -> DocComment {
    if parameters.is_empty() {
        doc.remark("None")
    } else {
        doc.field_list(parameters.iter().map(|p| p.name.as_str()).collect())
    }
}
