//! Schema assembly and validation.
//!
//! Loading happens in two phases. [`SchemaBuilder::apply`] takes the
//! declarations of one file at a time (base file first), registers names
//! and merges `Extend*` directives into draft entities. Nothing may read the
//! drafts. [`SchemaBuilder::finish`] then resolves every cross reference and
//! freezes the result into a [`Schema`], the only type generators accept.

use std::collections::HashMap;
use std::path::Path;

use super::document::{
    parse_schema_file, read_schema_file, ItemTypeExtension, RightExtension, SchemaFile,
    SchemaSource, ViewExtension,
};
use super::elements::{EnumType, ItemType, Right, TypedReference, View};
use super::value_type::{DefaultValue, Literal};
use crate::error::{SchemaCompilerError, SourceLocation, ValidationError, ValidationErrors};

/// Draft schema while files are being applied
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    enums: Vec<EnumType>,
    item_types: Vec<ItemType>,
    views: Vec<View>,
    rights: Vec<Right>,
    sql_before: Vec<String>,
    sql_after: Vec<String>,
    /// Enum, item type, view and right names share one registry. Keys are
    /// lowercase because SQL Server resolves object names case-insensitively.
    names: HashMap<String, SourceLocation>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` and apply its declarations
    pub fn apply_text(
        &mut self,
        text: &str,
        file_name: &str,
        in_base_schema: bool,
    ) -> Result<(), ValidationErrors> {
        let file = parse_schema_file(text, file_name, in_base_schema)?;
        self.apply(file)
    }

    /// Apply the declarations of one file.
    ///
    /// New entities are registered first (enums, item types, views, rights),
    /// then the file's `Extend*` directives are merged, so a file may extend
    /// what it declares itself.
    pub fn apply(&mut self, file: SchemaFile) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        for declared in file.enums {
            if self.register(&declared.item.name, &declared.location, &mut errors) {
                self.enums.push(declared.item);
            }
        }
        for declared in file.item_types {
            if self.register(&declared.item.name, &declared.location, &mut errors) {
                self.item_types.push(declared.item);
            }
        }
        for declared in file.views {
            if self.register(&declared.item.name, &declared.location, &mut errors) {
                self.views.push(declared.item);
            }
        }
        for declared in file.rights {
            if self.register(&declared.item.name, &declared.location, &mut errors) {
                self.rights.push(declared.item);
            }
        }

        for extension in file.item_type_extensions {
            self.extend_item_type(extension, &mut errors);
        }
        for extension in file.view_extensions {
            self.extend_view(extension, &mut errors);
        }
        for extension in file.right_extensions {
            self.extend_right(extension, &mut errors);
        }

        self.sql_before.extend(file.sql_before);
        self.sql_after.extend(file.sql_after);

        match ValidationErrors::from_vec(errors) {
            Some(errors) => Err(errors),
            None => Ok(()),
        }
    }

    fn register(
        &mut self,
        name: &str,
        location: &SourceLocation,
        errors: &mut Vec<ValidationError>,
    ) -> bool {
        let key = name.to_ascii_lowercase();
        if let Some(previous) = self.names.get(&key) {
            errors.push(ValidationError::at(
                location.clone(),
                format!("the name {} is already used by the element at {}", name, previous),
            ));
            return false;
        }
        self.names.insert(key, location.clone());
        true
    }

    fn extend_item_type(&mut self, extension: ItemTypeExtension, errors: &mut Vec<ValidationError>) {
        let Some(item_type) = self.item_types.iter_mut().find(|i| i.name == extension.name) else {
            errors.push(ValidationError::at(
                extension.location,
                format!("cannot extend item type {}: it does not exist", extension.name),
            ));
            return;
        };

        let body = extension.body;
        item_type.documentation.append(&body.documentation);
        for (right, expression) in body.expressions {
            item_type.expressions_mut(right).push(expression);
        }

        for declared in body.properties {
            if item_type.property(&declared.item.name).is_some() {
                errors.push(ValidationError::at(
                    declared.location,
                    format!(
                        "item type {} already has a property named {}",
                        item_type.name, declared.item.name
                    ),
                ));
            } else {
                item_type.properties.push(declared.item);
            }
        }

        for member in body.property_extensions {
            match item_type.properties.iter_mut().find(|p| p.name == member.name) {
                Some(property) => property.documentation.append(&member.documentation),
                None => errors.push(ValidationError::at(
                    member.location,
                    format!(
                        "cannot extend property {}.{}: it does not exist",
                        item_type.name, member.name
                    ),
                )),
            }
        }

        if extension.replace_indexes {
            item_type.indexes.clear();
        }
        item_type.indexes.extend(body.indexes);
        item_type.sql_after.extend(body.sql_after);
    }

    fn extend_view(&mut self, extension: ViewExtension, errors: &mut Vec<ValidationError>) {
        let Some(view) = self.views.iter_mut().find(|v| v.name == extension.name) else {
            errors.push(ValidationError::at(
                extension.location,
                format!("cannot extend view {}: it does not exist", extension.name),
            ));
            return;
        };
        view.documentation.append(&extension.documentation);
        view.right_expressions.extend(extension.query_right_expressions);
    }

    fn extend_right(&mut self, extension: RightExtension, errors: &mut Vec<ValidationError>) {
        let Some(right) = self.rights.iter_mut().find(|r| r.name == extension.name) else {
            errors.push(ValidationError::at(
                extension.location,
                format!("cannot extend right {}: it does not exist", extension.name),
            ));
            return;
        };

        right.documentation.append(&extension.documentation);
        right.right_expressions.extend(extension.right_expressions);

        for declared in extension.parameters {
            if right.parameter(&declared.item.name).is_some() {
                errors.push(ValidationError::at(
                    declared.location,
                    format!(
                        "right {} already has a parameter named {}",
                        right.name, declared.item.name
                    ),
                ));
            } else {
                right.parameters.push(declared.item);
            }
        }

        for member in extension.parameter_extensions {
            match right.parameters.iter_mut().find(|p| p.name == member.name) {
                Some(parameter) => parameter.documentation.append(&member.documentation),
                None => errors.push(ValidationError::at(
                    member.location,
                    format!(
                        "cannot extend parameter {} of right {}: it does not exist",
                        member.name, right.name
                    ),
                )),
            }
        }
    }

    /// Resolve references and freeze the schema.
    ///
    /// Every unresolved item type or enum reference and every enum default
    /// that names no value is reported, not just the first.
    pub fn finish(self) -> Result<Schema, ValidationErrors> {
        let mut errors = Vec::new();

        for item_type in &self.item_types {
            for property in &item_type.properties {
                self.check_references(property, &mut errors);

                let (Some(DefaultValue::Literal(Literal::Enumeration(value))), Some(enum_name)) =
                    (&property.default, &property.enum_name)
                else {
                    continue;
                };
                if let Some(en) = self.enums.iter().find(|e| &e.name == enum_name) {
                    if en.value_name(*value).is_none() {
                        errors.push(ValidationError::new(format!(
                            "the default value {} of {} is not a value of enum {}",
                            value,
                            property.describe(),
                            en.name
                        )));
                    }
                }
            }
        }
        for view in &self.views {
            for column in &view.columns {
                self.check_references(column, &mut errors);
            }
            for parameter in &view.parameters {
                self.check_references(parameter, &mut errors);
            }
        }
        for right in &self.rights {
            for parameter in &right.parameters {
                self.check_references(parameter, &mut errors);
            }
        }

        if let Some(errors) = ValidationErrors::from_vec(errors) {
            return Err(errors);
        }

        Ok(Schema {
            enums: self.enums,
            item_types: self.item_types,
            views: self.views,
            rights: self.rights,
            sql_before: self.sql_before,
            sql_after: self.sql_after,
        })
    }

    fn check_references(&self, member: &impl TypedReference, errors: &mut Vec<ValidationError>) {
        if let Some(name) = member.referenced_item_type_name() {
            if !self.item_types.iter().any(|i| i.name == name) {
                errors.push(ValidationError::new(format!(
                    "{} refers to item type {}, which does not exist",
                    member.describe(),
                    name
                )));
            }
        }
        if let Some(name) = member.enum_name() {
            if !self.enums.iter().any(|e| e.name == name) {
                errors.push(ValidationError::new(format!(
                    "{} refers to enum {}, which does not exist",
                    member.describe(),
                    name
                )));
            }
        }
    }
}

/// A validated schema. Entities keep declaration order, base file first.
#[derive(Debug, Clone)]
pub struct Schema {
    enums: Vec<EnumType>,
    item_types: Vec<ItemType>,
    views: Vec<View>,
    rights: Vec<Right>,
    sql_before: Vec<String>,
    sql_after: Vec<String>,
}

impl Schema {
    /// Load and validate the base schema alone
    pub fn from_base_schema(base: &SchemaSource) -> Result<Schema, SchemaCompilerError> {
        let mut builder = SchemaBuilder::new();
        builder.apply_text(&base.read_text()?, &base.display_name(), true)?;
        Ok(builder.finish()?)
    }

    /// Load the base schema, apply the derived schema at `path` and validate
    /// the result
    pub fn from_base_schema_and_file(
        base: &SchemaSource,
        path: &Path,
    ) -> Result<Schema, SchemaCompilerError> {
        let mut builder = SchemaBuilder::new();
        builder.apply_text(&base.read_text()?, &base.display_name(), true)?;
        let text = read_schema_file(path)?;
        builder.apply_text(&text, &path.display().to_string(), false)?;
        Ok(builder.finish()?)
    }

    pub fn enums(&self) -> &[EnumType] {
        &self.enums
    }

    pub fn item_types(&self) -> &[ItemType] {
        &self.item_types
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn rights(&self) -> &[Right] {
        &self.rights
    }

    pub fn sql_before(&self) -> &[String] {
        &self.sql_before
    }

    pub fn sql_after(&self) -> &[String] {
        &self.sql_after
    }

    pub fn enum_type(&self, name: &str) -> Option<&EnumType> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn item_type(&self, name: &str) -> Option<&ItemType> {
        self.item_types.iter().find(|i| i.name == name)
    }

    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }

    pub fn right(&self, name: &str) -> Option<&Right> {
        self.rights.iter().find(|r| r.name == name)
    }

    /// The item type an ItemIdentifier member points at
    pub fn referenced_item_type(
        &self,
        member: &impl TypedReference,
    ) -> Result<&ItemType, SchemaCompilerError> {
        member
            .referenced_item_type_name()
            .and_then(|name| self.item_type(name))
            .ok_or(SchemaCompilerError::Internal { code: "SCMP3010" })
    }

    /// The enum an Enumeration member points at
    pub fn referenced_enum(
        &self,
        member: &impl TypedReference,
    ) -> Result<&EnumType, SchemaCompilerError> {
        member
            .enum_name()
            .and_then(|name| self.enum_type(name))
            .ok_or(SchemaCompilerError::Internal { code: "SCMP3020" })
    }
}
