//! C# helper files exposing schema names as constants.
//!
//! Declarations are assembled into a small C# syntax tree ([`CsNamespace`],
//! [`CsType`], [`CsMember`]) built with chained constructors, then rendered
//! through a [`CodeWriter`].

use std::path::Path;

use super::code_writer::CodeWriter;
use super::helper_docs::{DocComment, DocContext};
use super::write_output;
use crate::schema::{EnumType, ItemType, ItemTypeProperty, Right, Schema, View};
use crate::util::csharp_string;

/// Code analysis rules suppressed on generated names that come straight
/// from the schema
const NAMING_SUPPRESSIONS: [&str; 3] = ["CA1726", "CA1702", "CA1704"];

const FILE_HEADER: &str = "\
//------------------------------------------------------------------------------
// <auto-generated>
//     This code was generated by store-schema-compiler.
//
//     Changes to this file may cause incorrect behavior and will be lost if
//     the code is regenerated.
// </auto-generated>
//------------------------------------------------------------------------------";

/// Fixed namespaces of the base schema helpers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperNamespaces {
    /// Base enums and `BaseSchemaInternal`
    pub components: String,
    /// Base identifier classes
    pub storage: String,
    /// Base item type, view and right classes
    pub base_schema: String,
}

impl Default for HelperNamespaces {
    fn default() -> Self {
        Self {
            components: "Microsoft.LearningComponents".to_string(),
            storage: "Microsoft.LearningComponents.Storage".to_string(),
            base_schema: "Microsoft.LearningComponents.Storage.BaseSchema".to_string(),
        }
    }
}

/// Right-hand side of a constant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsValue {
    Str(String),
    Int(i32),
    /// Another constant, by qualified name
    Reference(String),
}

impl CsValue {
    fn render(&self) -> String {
        match self {
            CsValue::Str(s) => csharp_string(s),
            CsValue::Int(n) => n.to_string(),
            CsValue::Reference(name) => name.clone(),
        }
    }
}

/// `if (condition) { throw new exception("id"); }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    pub condition: String,
    pub exception: String,
    pub argument: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsMember {
    Const {
        doc: DocComment,
        attributes: Vec<String>,
        ty: &'static str,
        name: String,
        value: CsValue,
    },
    EnumValue {
        doc: DocComment,
        attributes: Vec<String>,
        name: String,
        value: i32,
    },
    Constructor {
        doc: DocComment,
        name: String,
        parameters: String,
        base_arguments: String,
        guards: Vec<Guard>,
    },
    Nested(CsType),
}

impl CsMember {
    pub fn constant(ty: &'static str, name: impl Into<String>, value: CsValue, doc: DocComment) -> Self {
        CsMember::Const {
            doc,
            attributes: Vec::new(),
            ty,
            name: name.into(),
            value,
        }
    }

    pub fn enum_value(name: impl Into<String>, value: i32, doc: DocComment) -> Self {
        CsMember::EnumValue {
            doc,
            attributes: Vec::new(),
            name: name.into(),
            value,
        }
    }

    /// Add the naming suppressions to a constant or enum value
    pub fn naming_suppressed(mut self) -> Self {
        if let CsMember::Const { attributes, .. } | CsMember::EnumValue { attributes, .. } =
            &mut self
        {
            attributes.extend(naming_attributes());
        }
        self
    }

    fn render(&self, w: &mut CodeWriter) {
        match self {
            CsMember::Const {
                doc,
                attributes,
                ty,
                name,
                value,
            } => {
                doc.render(w);
                render_attributes(w, attributes);
                w.line(&format!("public const {} {} = {};", ty, name, value.render()));
            }
            CsMember::EnumValue {
                doc,
                attributes,
                name,
                value,
            } => {
                doc.render(w);
                render_attributes(w, attributes);
                w.line(&format!("{} = {},", name, value));
            }
            CsMember::Constructor {
                doc,
                name,
                parameters,
                base_arguments,
                guards,
            } => {
                doc.render(w);
                w.line(&format!(
                    "public {}({}) : base({}) {{",
                    name, parameters, base_arguments
                ))
                .indent();
                for guard in guards {
                    w.line(&format!("if ({}) {{", guard.condition))
                        .indent()
                        .line(&format!(
                            "throw new {}({});",
                            guard.exception,
                            csharp_string(&guard.argument)
                        ))
                        .dedent()
                        .line("}");
                }
                w.dedent().line("}");
            }
            CsMember::Nested(ty) => ty.render(w),
        }
    }
}

fn naming_attributes() -> Vec<String> {
    NAMING_SUPPRESSIONS
        .iter()
        .map(|rule| format!("SuppressMessageAttribute(\"Microsoft.Naming\", \"{}\")", rule))
        .collect()
}

fn render_attributes(w: &mut CodeWriter, attributes: &[String]) {
    for attribute in attributes {
        w.line(&format!("[{}]", attribute));
    }
}

/// A class or enum declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsType {
    /// Modifiers and keyword, e.g. `public abstract class`
    declaration: &'static str,
    name: String,
    base: Option<String>,
    doc: DocComment,
    attributes: Vec<String>,
    members: Vec<CsMember>,
}

impl CsType {
    pub fn new(declaration: &'static str, name: impl Into<String>, doc: DocComment) -> Self {
        Self {
            declaration,
            name: name.into(),
            base: None,
            doc,
            attributes: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn naming_suppressed(mut self) -> Self {
        self.attributes.extend(naming_attributes());
        self
    }

    pub fn member(mut self, member: CsMember) -> Self {
        self.members.push(member);
        self
    }

    pub fn members(mut self, members: impl IntoIterator<Item = CsMember>) -> Self {
        self.members.extend(members);
        self
    }

    fn render(&self, w: &mut CodeWriter) {
        self.doc.render(w);
        render_attributes(w, &self.attributes);
        match &self.base {
            Some(base) => w.line(&format!("{} {} : {} {{", self.declaration, self.name, base)),
            None => w.line(&format!("{} {} {{", self.declaration, self.name)),
        };
        w.indent();
        for member in &self.members {
            w.blank();
            member.render(w);
        }
        w.dedent().line("}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsNamespace {
    name: String,
    usings: Vec<&'static str>,
    types: Vec<CsType>,
}

impl CsNamespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            usings: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn using(mut self, namespace: &'static str) -> Self {
        self.usings.push(namespace);
        self
    }

    pub fn ty(mut self, ty: CsType) -> Self {
        self.types.push(ty);
        self
    }

    pub fn types(mut self, types: impl IntoIterator<Item = CsType>) -> Self {
        self.types.extend(types);
        self
    }

    fn render(&self, w: &mut CodeWriter) {
        w.line(&format!("namespace {} {{", self.name)).indent();
        for using in &self.usings {
            w.line(&format!("using {};", using));
        }
        for ty in &self.types {
            w.blank();
            ty.render(w);
        }
        w.dedent().line("}");
    }
}

/// Render a complete file
fn render_file(namespaces: &[CsNamespace]) -> String {
    let mut w = CodeWriter::new();
    for line in FILE_HEADER.lines() {
        w.line(line);
    }
    for namespace in namespaces {
        w.blank();
        namespace.render(&mut w);
    }
    w.finish()
}

/// Whether base schema members are spelled out or refer to the storage helper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    /// The storage helper itself: every value is a literal
    Storage,
    /// A derived helper: base members refer to the storage helper
    Derived,
}

/// Builds the item type, view, right, enum and identifier declarations of
/// one helper file
struct ClassBuilder<'a> {
    schema: &'a Schema,
    namespaces: &'a HelperNamespaces,
    docs: DocContext<'a>,
    flavor: Flavor,
}

impl<'a> ClassBuilder<'a> {
    fn new(
        schema: &'a Schema,
        namespaces: &'a HelperNamespaces,
        type_namespace: &'a str,
        flavor: Flavor,
    ) -> Self {
        Self {
            schema,
            namespaces,
            docs: DocContext::new(schema, &namespaces.components, type_namespace),
            flavor,
        }
    }

    /// `value`, or a reference to the same constant in the storage helper
    /// when the member comes from the base schema
    fn value(&self, in_base_schema: bool, entity: &str, member: &str, value: CsValue) -> CsValue {
        if in_base_schema && self.flavor == Flavor::Derived {
            CsValue::Reference(format!("{}.{}.{}", self.namespaces.base_schema, entity, member))
        } else {
            value
        }
    }

    fn name_constant(&self, in_base_schema: bool, entity: &str, member: &str, doc: DocComment) -> CsMember {
        CsMember::constant(
            "string",
            member,
            self.value(in_base_schema, entity, member, CsValue::Str(member.to_string())),
            doc,
        )
    }

    fn max_length_constant(&self, item_type: &ItemType, property: &ItemTypeProperty) -> Option<CsMember> {
        let max_length = property.max_length()?;
        let name = property.max_length_constant();
        let value = match self.flavor {
            Flavor::Storage => {
                CsValue::Reference(format!("BaseSchemaInternal.{}.{}", item_type.name, name))
            }
            Flavor::Derived => self.value(
                property.in_base_schema,
                &item_type.name,
                &name,
                CsValue::Int(max_length),
            ),
        };
        Some(CsMember::constant("int", name, value, self.docs.max_length(property)).naming_suppressed())
    }

    fn item_type(&self, item_type: &ItemType) -> anyhow::Result<CsType> {
        let in_base = item_type.in_base_schema;
        let mut ty = CsType::new("public abstract class", &item_type.name, self.docs.item_type(item_type))
            .naming_suppressed()
            .member(CsMember::constant(
                "string",
                "ItemTypeName",
                self.value(
                    in_base,
                    &item_type.name,
                    "ItemTypeName",
                    CsValue::Str(item_type.name.clone()),
                ),
                self.docs.item_type_name(item_type),
            ))
            .member(self.name_constant(in_base, &item_type.name, "Id", self.docs.id(item_type)));

        for property in &item_type.properties {
            ty = ty.member(
                self.name_constant(
                    property.in_base_schema,
                    &item_type.name,
                    &property.name,
                    self.docs.property(property)?,
                )
                .naming_suppressed(),
            );
            ty = ty.members(self.max_length_constant(item_type, property));
        }
        Ok(ty)
    }

    fn view(&self, view: &View) -> anyhow::Result<CsType> {
        let mut ty = CsType::new("public abstract class", &view.name, self.docs.view(view))
            .naming_suppressed()
            .member(CsMember::constant(
                "string",
                "ViewName",
                self.value(
                    view.in_base_schema,
                    &view.name,
                    "ViewName",
                    CsValue::Str(view.name.clone()),
                ),
                self.docs.view_name(view),
            ));

        for column in &view.columns {
            ty = ty.member(
                self.name_constant(
                    column.in_base_schema,
                    &view.name,
                    &column.name,
                    self.docs.column(column)?,
                )
                .naming_suppressed(),
            );
        }
        for parameter in &view.parameters {
            ty = ty.member(
                self.name_constant(
                    parameter.in_base_schema,
                    &view.name,
                    &parameter.name,
                    self.docs.parameter(parameter)?,
                )
                .naming_suppressed(),
            );
        }
        Ok(ty)
    }

    fn right(&self, right: &Right) -> anyhow::Result<CsType> {
        let mut ty = CsType::new("public abstract class", &right.name, self.docs.right(right))
            .naming_suppressed()
            .member(CsMember::constant(
                "string",
                "RightName",
                self.value(
                    right.in_base_schema,
                    &right.name,
                    "RightName",
                    CsValue::Str(right.name.clone()),
                ),
                self.docs.right_name(right),
            ));

        for parameter in &right.parameters {
            ty = ty.member(
                self.name_constant(
                    parameter.in_base_schema,
                    &right.name,
                    &parameter.name,
                    self.docs.parameter(parameter)?,
                )
                .naming_suppressed(),
            );
        }
        Ok(ty)
    }

    /// Item type, view and right classes, in that order
    fn schema_classes(&self) -> anyhow::Result<Vec<CsType>> {
        let mut types = Vec::new();
        for item_type in self.schema.item_types() {
            types.push(self.item_type(item_type)?);
        }
        for view in self.schema.views() {
            types.push(self.view(view)?);
        }
        for right in self.schema.rights() {
            types.push(self.right(right)?);
        }
        Ok(types)
    }

    fn enum_type(&self, en: &EnumType) -> CsType {
        CsType::new("public enum", &en.name, self.docs.enum_type(en)).members(
            en.values.iter().map(|value| {
                CsMember::enum_value(&value.name, value.value, self.docs.enum_value(value))
                    .naming_suppressed()
            }),
        )
    }

    /// `<ItemType>Identifier`; `item_type_namespace` holds the item type
    /// class whose `ItemTypeName` it checks against
    fn identifier(&self, item_type: &ItemType, item_type_namespace: &str) -> CsType {
        let class_name = format!("{}Identifier", item_type.name);
        let item_type_name = format!("{}.{}.ItemTypeName", item_type_namespace, item_type.name);

        CsType::new(
            "public class",
            &class_name,
            self.docs.identifier(item_type, item_type_namespace),
        )
        .base("LearningStoreItemIdentifier")
        .member(CsMember::Constructor {
            doc: self.docs.identifier_from_key(item_type),
            name: class_name.clone(),
            parameters: "long key".to_string(),
            base_arguments: format!("{}, key", item_type_name),
            guards: Vec::new(),
        })
        .member(CsMember::Constructor {
            doc: self.docs.identifier_from_identifier(item_type),
            name: class_name,
            parameters: "LearningStoreItemIdentifier id".to_string(),
            base_arguments: "id".to_string(),
            guards: vec![
                Guard {
                    condition: "id == null".to_string(),
                    exception: "ArgumentNullException".to_string(),
                    argument: "id".to_string(),
                },
                Guard {
                    condition: format!("id.ItemTypeName != {}", item_type_name),
                    exception: "ArgumentOutOfRangeException".to_string(),
                    argument: "id".to_string(),
                },
            ],
        })
    }
}

/// `BaseSchemaInternal`: the maximum lengths of base schema properties, so
/// the storage helper can refer to them
fn base_schema_internal(schema: &Schema, docs: &DocContext) -> CsType {
    let item_types = schema.item_types().iter().map(|item_type| {
        let constants = item_type.properties.iter().filter_map(|property| {
            let max_length = property.max_length()?;
            Some(
                CsMember::constant(
                    "int",
                    property.max_length_constant(),
                    CsValue::Int(max_length),
                    docs.max_length(property),
                )
                .naming_suppressed(),
            )
        });
        CsMember::Nested(
            CsType::new(
                "public abstract class",
                &item_type.name,
                docs.base_schema_internal_item_type(item_type),
            )
            .naming_suppressed()
            .members(constants),
        )
    });

    CsType::new(
        "internal abstract class",
        "BaseSchemaInternal",
        docs.base_schema_internal(),
    )
    .members(item_types)
}

/// Render the components helper: base enums and `BaseSchemaInternal`
pub fn render_components_helper(schema: &Schema, namespaces: &HelperNamespaces) -> anyhow::Result<String> {
    let builder = ClassBuilder::new(schema, namespaces, &namespaces.components, Flavor::Storage);
    let namespace = CsNamespace::new(&namespaces.components)
        .using("System")
        .using("System.Diagnostics.CodeAnalysis")
        .types(schema.enums().iter().map(|en| builder.enum_type(en)))
        .ty(base_schema_internal(schema, &builder.docs));
    Ok(render_file(&[namespace]))
}

/// Render the storage helper: base item type, view and right classes, then
/// the base identifier classes
pub fn render_storage_helper(schema: &Schema, namespaces: &HelperNamespaces) -> anyhow::Result<String> {
    let builder = ClassBuilder::new(schema, namespaces, &namespaces.components, Flavor::Storage);
    let classes = CsNamespace::new(&namespaces.base_schema)
        .using("System")
        .using("System.Diagnostics.CodeAnalysis")
        .types(builder.schema_classes()?);
    let identifiers = CsNamespace::new(&namespaces.storage).using("System").types(
        schema
            .item_types()
            .iter()
            .map(|item_type| builder.identifier(item_type, &namespaces.base_schema)),
    );
    Ok(render_file(&[classes, identifiers]))
}

/// Render a derived helper. `schema_namespace` gets the item type, view and
/// right classes; `namespace` gets the enums and identifier classes the
/// base schema does not already provide.
pub fn render_helper(
    schema: &Schema,
    namespaces: &HelperNamespaces,
    namespace: &str,
    schema_namespace: &str,
) -> anyhow::Result<String> {
    let builder = ClassBuilder::new(schema, namespaces, namespace, Flavor::Derived);
    let classes = CsNamespace::new(schema_namespace)
        .using("System")
        .using("System.Diagnostics.CodeAnalysis")
        .types(builder.schema_classes()?);

    let enums = schema
        .enums()
        .iter()
        .filter(|en| !en.in_base_schema)
        .map(|en| builder.enum_type(en));
    let identifiers = schema
        .item_types()
        .iter()
        .filter(|item_type| !item_type.in_base_schema)
        .map(|item_type| builder.identifier(item_type, schema_namespace));
    let types = CsNamespace::new(namespace)
        .using("System")
        .using("System.Diagnostics.CodeAnalysis")
        .using("Microsoft.LearningComponents.Storage")
        .types(enums)
        .types(identifiers);

    Ok(render_file(&[classes, types]))
}

pub fn write_components_helper(schema: &Schema, path: &Path) -> anyhow::Result<()> {
    let contents = render_components_helper(schema, &HelperNamespaces::default())?;
    write_output(path, &contents)?;
    Ok(())
}

pub fn write_storage_helper(schema: &Schema, path: &Path) -> anyhow::Result<()> {
    let contents = render_storage_helper(schema, &HelperNamespaces::default())?;
    write_output(path, &contents)?;
    Ok(())
}

pub fn write_helper(
    schema: &Schema,
    path: &Path,
    namespace: &str,
    schema_namespace: &str,
) -> anyhow::Result<()> {
    let contents = render_helper(schema, &HelperNamespaces::default(), namespace, schema_namespace)?;
    write_output(path, &contents)?;
    Ok(())
}
