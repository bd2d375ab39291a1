//! Reader for store schema XML files.
//!
//! A file is parsed with roxmltree, checked against the grammar in
//! [`super::grammar`] and turned into raw declarations ([`SchemaFile`]).
//! Checks that only need one element (attribute combinations, lengths,
//! default values) happen here; anything that needs the whole schema is
//! left to [`super::builder`].

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use encoding_rs::{Encoding, WINDOWS_1252};
use regex::Regex;
use roxmltree::{Document, Node, NodeType};

use super::elements::{
    Documentation, EnumType, EnumValue, ItemRight, ItemType, ItemTypeProperty, Parameter,
    ParameterOwner, Right, View, ViewColumn,
};
use super::grammar::{self, ElementRule};
use super::value_type::{parse_xml_boolean, DefaultValue, ValueType};
use crate::error::{SchemaCompilerError, SourceLocation, ValidationError, ValidationErrors};

/// Namespace of every structural element in a schema file
pub const SCHEMA_NAMESPACE: &str =
    "urn:schemas-microsoft-com:learning-components:learning-store-schema";

/// The base schema compiled into the binary
pub const BASE_SCHEMA_XML: &str = include_str!("../../schemas/BaseSchema.xml");

const BASE_SCHEMA_FILE_NAME: &str = "BaseSchema.xml";

/// Names become SQL identifiers and C# member names
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Where the base schema comes from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SchemaSource {
    #[default]
    Embedded,
    File(PathBuf),
}

impl SchemaSource {
    /// Name used in diagnostics
    pub fn display_name(&self) -> String {
        match self {
            SchemaSource::Embedded => BASE_SCHEMA_FILE_NAME.to_string(),
            SchemaSource::File(path) => path.display().to_string(),
        }
    }

    pub fn read_text(&self) -> Result<String, SchemaCompilerError> {
        match self {
            SchemaSource::Embedded => Ok(BASE_SCHEMA_XML.to_string()),
            SchemaSource::File(path) => read_schema_file(path),
        }
    }
}

/// Read a schema file, honoring a byte order mark
pub fn read_schema_file(path: &Path) -> Result<String, SchemaCompilerError> {
    read_file_with_encoding_detection(path).map_err(|source| SchemaCompilerError::SchemaReadError {
        path: path.to_path_buf(),
        source,
    })
}

fn read_file_with_encoding_detection(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;

    // A BOM names the encoding outright (UTF-8, UTF-16LE, UTF-16BE)
    if let Some((encoding, bom_length)) = Encoding::for_bom(&bytes) {
        let (decoded, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
        return if had_errors {
            Err(invalid_data(encoding.name()))
        } else {
            Ok(decoded.into_owned())
        };
    }

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            // Fall back to Windows-1252 for files saved by older editors
            let bytes = e.into_bytes();
            let (decoded, _, had_errors) = WINDOWS_1252.decode(&bytes);
            if had_errors {
                Err(invalid_data(WINDOWS_1252.name()))
            } else {
                Ok(decoded.into_owned())
            }
        }
    }
}

fn invalid_data(encoding: &str) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("File contains characters that are not valid {}", encoding),
    )
}

/// A declaration together with where it was found
#[derive(Debug, Clone)]
pub struct Declared<T> {
    pub item: T,
    pub location: SourceLocation,
}

/// `ExtendProperty` / `ExtendParameter`: documentation for an existing member
#[derive(Debug, Clone)]
pub struct MemberExtension {
    pub name: String,
    pub location: SourceLocation,
    pub documentation: Documentation,
}

/// Everything an `ItemType` or `ExtendItemType` element can contain
#[derive(Debug, Clone, Default)]
pub struct ItemTypeBody {
    pub documentation: Documentation,
    pub expressions: Vec<(ItemRight, String)>,
    pub properties: Vec<Declared<ItemTypeProperty>>,
    pub property_extensions: Vec<MemberExtension>,
    pub indexes: Vec<String>,
    pub sql_after: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ItemTypeExtension {
    pub name: String,
    pub location: SourceLocation,
    pub replace_indexes: bool,
    pub body: ItemTypeBody,
}

#[derive(Debug, Clone)]
pub struct ViewExtension {
    pub name: String,
    pub location: SourceLocation,
    pub documentation: Documentation,
    pub query_right_expressions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RightExtension {
    pub name: String,
    pub location: SourceLocation,
    pub documentation: Documentation,
    pub right_expressions: Vec<String>,
    pub parameters: Vec<Declared<Parameter>>,
    pub parameter_extensions: Vec<MemberExtension>,
}

/// Raw declarations read from one schema file, in document order
#[derive(Debug, Clone, Default)]
pub struct SchemaFile {
    pub file_name: String,
    pub enums: Vec<Declared<EnumType>>,
    pub item_types: Vec<Declared<ItemType>>,
    pub views: Vec<Declared<View>>,
    pub rights: Vec<Declared<Right>>,
    pub item_type_extensions: Vec<ItemTypeExtension>,
    pub view_extensions: Vec<ViewExtension>,
    pub right_extensions: Vec<RightExtension>,
    pub sql_before: Vec<String>,
    pub sql_after: Vec<String>,
}

/// Parse one schema file.
///
/// Every structural problem in the file is reported, not just the first.
pub fn parse_schema_file(
    text: &str,
    file_name: &str,
    in_base_schema: bool,
) -> Result<SchemaFile, ValidationErrors> {
    let doc = Document::parse(text).map_err(|e| {
        let pos = e.pos();
        ValidationErrors::single(ValidationError::at(
            SourceLocation {
                file: file_name.to_string(),
                line: pos.row,
                column: pos.col,
            },
            e.to_string(),
        ))
    })?;

    let mut reader = Reader {
        doc: &doc,
        input: text,
        file_name,
        in_base_schema,
        errors: Vec::new(),
    };
    let file = reader.schema_file(doc.root_element());

    match ValidationErrors::from_vec(reader.errors) {
        Some(errors) => Err(errors),
        None => Ok(file),
    }
}

/// Element children of `node` with the given local name
fn children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |c| c.is_element() && c.tag_name().name() == name)
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &'static str) -> Option<Node<'a, 'input>> {
    children(node, name).next()
}

/// Concatenated text content of an element (CDATA included)
fn element_text(node: Node) -> String {
    node.children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect()
}

struct Reader<'a, 'input> {
    doc: &'a Document<'input>,
    input: &'input str,
    file_name: &'a str,
    in_base_schema: bool,
    errors: Vec<ValidationError>,
}

impl Reader<'_, '_> {
    fn location(&self, node: Node) -> SourceLocation {
        let pos = self.doc.text_pos_at(node.range().start);
        SourceLocation {
            file: self.file_name.to_string(),
            line: pos.row,
            column: pos.col,
        }
    }

    fn error(&mut self, node: Node, message: impl Into<String>) {
        let location = self.location(node);
        self.errors.push(ValidationError::at(location, message));
    }

    /// Check attributes, children and text of `node` against `rule`
    fn check(&mut self, node: Node, rule: &ElementRule) {
        for attribute in node.attributes() {
            // xsi:schemaLocation and friends
            if attribute.namespace().is_some() {
                continue;
            }
            if !rule.allows_attribute(attribute.name()) {
                self.error(
                    node,
                    format!(
                        "attribute '{}' is not allowed on <{}>",
                        attribute.name(),
                        rule.name
                    ),
                );
            }
        }

        for required in rule.required_attributes {
            if node.attribute(*required).is_none() {
                self.error(
                    node,
                    format!("<{}> is missing required attribute '{}'", rule.name, required),
                );
            }
        }

        let mut seen: Vec<&str> = Vec::new();
        for c in node.children() {
            match c.node_type() {
                NodeType::Element => {
                    let name = c.tag_name().name();
                    let qualified = c.tag_name().namespace() == Some(SCHEMA_NAMESPACE);
                    if !rule.allows_child(name, qualified) {
                        self.error(
                            c,
                            format!("element <{}> is not allowed in <{}>", name, rule.name),
                        );
                    } else if rule.single_children.contains(&name) {
                        if seen.contains(&name) {
                            self.error(
                                c,
                                format!("<{}> may contain at most one <{}>", rule.name, name),
                            );
                        } else {
                            seen.push(name);
                        }
                    }
                }
                NodeType::Text if !rule.text => {
                    if c.text().is_some_and(|t| !t.trim().is_empty()) {
                        self.error(c, format!("<{}> cannot contain text", rule.name));
                    }
                }
                _ => {}
            }
        }
    }

    fn name_attribute(&mut self, node: Node) -> String {
        let Some(name) = node.attribute("Name") else {
            // reported by check()
            return String::new();
        };
        if !NAME_RE.is_match(name) {
            self.error(node, format!("'{}' is not a valid name", name));
        }
        name.to_string()
    }

    fn bool_attribute(&mut self, node: Node, name: &str) -> Option<bool> {
        let value = node.attribute(name)?;
        let parsed = parse_xml_boolean(value);
        if parsed.is_none() {
            self.error(
                node,
                format!("attribute '{}' must be true or false, not '{}'", name, value),
            );
        }
        parsed
    }

    fn int_attribute(&mut self, node: Node, name: &str) -> Option<i32> {
        let value = node.attribute(name)?;
        match value.trim().parse::<i32>() {
            Ok(n) => Some(n),
            Err(_) => {
                self.error(
                    node,
                    format!("attribute '{}' must be a 32-bit integer, not '{}'", name, value),
                );
                None
            }
        }
    }

    fn value_type_attribute(&mut self, node: Node) -> Option<ValueType> {
        let type_name = node.attribute("Type")?;
        let value_type = ValueType::from_schema_name(type_name);
        if value_type.is_none() {
            self.error(node, format!("'{}' is not a valid value type", type_name));
        }
        value_type
    }

    /// Read `ReferencedItemTypeName` or `EnumName`, which must be present
    /// exactly when the value type is `expected`
    fn reference_attribute(
        &mut self,
        node: Node,
        describe: &str,
        value_type: ValueType,
        attribute: &str,
        expected: ValueType,
    ) -> Option<String> {
        let value = node.attribute(attribute).map(str::to_string);
        match (value_type == expected, &value) {
            (true, None) => self.error(
                node,
                format!(
                    "{} has type {} but no '{}' attribute",
                    describe, expected, attribute
                ),
            ),
            (false, Some(_)) => self.error(
                node,
                format!(
                    "{} has a '{}' attribute but is not of type {}",
                    describe, attribute, expected
                ),
            ),
            _ => {}
        }
        value
    }

    /// Text of a statement-like element, which must not be empty
    fn statement(&mut self, node: Node, rule: &ElementRule) -> Option<String> {
        self.check(node, rule);
        let text = element_text(node);
        if text.trim().is_empty() {
            self.error(node, format!("<{}> must not be empty", rule.name));
            None
        } else {
            Some(text)
        }
    }

    /// Raw markup between the start and end tags of `node`
    fn inner_xml(&self, node: Node) -> String {
        match (node.first_child(), node.last_child()) {
            (Some(first), Some(last)) => {
                self.input[first.range().start..last.range().end].to_string()
            }
            _ => String::new(),
        }
    }

    fn documentation(&mut self, parent: Node) -> Documentation {
        let Some(node) = child(parent, "Documentation") else {
            return Documentation::default();
        };
        self.check(node, &grammar::DOCUMENTATION);
        Documentation {
            summary: child(node, "Summary").map(|n| self.inner_xml(n)),
            remarks: child(node, "Remarks").map(|n| self.inner_xml(n)),
        }
    }

    fn expressions(&mut self, parent: Node, grant: &'static str) -> Vec<String> {
        let mut expressions = Vec::new();
        for node in children(parent, grant) {
            self.check(node, &grammar::grant(grant));
            for expression in children(node, "Expression") {
                expressions.extend(self.statement(expression, &grammar::EXPRESSION));
            }
        }
        expressions
    }

    fn schema_file(&mut self, root: Node) -> SchemaFile {
        let mut file = SchemaFile {
            file_name: self.file_name.to_string(),
            ..SchemaFile::default()
        };

        if root.tag_name().name() != grammar::STORE_SCHEMA.name
            || root.tag_name().namespace() != Some(SCHEMA_NAMESPACE)
        {
            self.error(
                root,
                format!(
                    "root element must be <StoreSchema xmlns=\"{}\">",
                    SCHEMA_NAMESPACE
                ),
            );
            return file;
        }
        self.check(root, &grammar::STORE_SCHEMA);

        for node in root.children().filter(|n| n.is_element()) {
            match node.tag_name().name() {
                "Enum" => file.enums.push(self.enum_type(node)),
                "ItemType" => file.item_types.push(self.item_type(node)),
                "View" => file.views.push(self.view(node)),
                "Right" => file.rights.push(self.right(node)),
                "ExtendItemType" => file.item_type_extensions.push(self.item_type_extension(node)),
                "ExtendView" => file.view_extensions.push(self.view_extension(node)),
                "ExtendRight" => file.right_extensions.push(self.right_extension(node)),
                "SqlBefore" => file
                    .sql_before
                    .extend(self.statement(node, &grammar::SQL_BEFORE)),
                "SqlAfter" => file
                    .sql_after
                    .extend(self.statement(node, &grammar::SQL_AFTER)),
                // reported by check()
                _ => {}
            }
        }

        file
    }

    fn enum_type(&mut self, node: Node) -> Declared<EnumType> {
        self.check(node, &grammar::ENUM);
        let name = self.name_attribute(node);
        let documentation = self.documentation(node);

        let mut values: Vec<EnumValue> = Vec::new();
        if let Some(values_node) = child(node, "Values") {
            self.check(values_node, &grammar::VALUES);
            for value_node in children(values_node, "Value") {
                self.check(value_node, &grammar::VALUE);
                let value_name = self.name_attribute(value_node);
                let Some(value) = self.int_attribute(value_node, "Value") else {
                    continue;
                };
                if values.iter().any(|v| v.name == value_name) {
                    self.error(
                        value_node,
                        format!("enum {} has more than one value named {}", name, value_name),
                    );
                    continue;
                }
                values.push(EnumValue {
                    name: value_name,
                    value,
                    documentation: child(value_node, "Documentation").map(|n| self.inner_xml(n)),
                });
            }
        }

        Declared {
            location: self.location(node),
            item: EnumType {
                name,
                values,
                documentation,
                in_base_schema: self.in_base_schema,
            },
        }
    }

    fn item_type_body(&mut self, node: Node, item_type_name: &str, extending: bool) -> ItemTypeBody {
        let mut body = ItemTypeBody {
            documentation: self.documentation(node),
            ..ItemTypeBody::default()
        };

        for (right, grant) in [
            (ItemRight::Query, "GrantQueryRight"),
            (ItemRight::Add, "GrantAddRight"),
            (ItemRight::Update, "GrantUpdateRight"),
            (ItemRight::Delete, "GrantDeleteRight"),
        ] {
            for expression in self.expressions(node, grant) {
                body.expressions.push((right, expression));
            }
        }

        if let Some(properties) = child(node, "Properties") {
            let rule = if extending {
                &grammar::EXTEND_PROPERTIES
            } else {
                &grammar::PROPERTIES
            };
            self.check(properties, rule);
            for property in properties.children().filter(|n| n.is_element()) {
                match property.tag_name().name() {
                    "Property" => {
                        if let Some(declared) = self.property(property, item_type_name) {
                            if body.properties.iter().any(|p| p.item.name == declared.item.name) {
                                self.error(
                                    property,
                                    format!(
                                        "item type {} has more than one property named {}",
                                        item_type_name, declared.item.name
                                    ),
                                );
                            } else {
                                body.properties.push(declared);
                            }
                        }
                    }
                    "ExtendProperty" if extending => {
                        body.property_extensions
                            .push(self.member_extension(property, "ExtendProperty"));
                    }
                    _ => {}
                }
            }
        }

        if let Some(indexes) = child(node, "Indexes") {
            self.check(indexes, &grammar::INDEXES);
            for index in children(indexes, "Index") {
                body.indexes.extend(self.statement(index, &grammar::INDEX));
            }
        }

        for sql_after in children(node, "SqlAfter") {
            body.sql_after
                .extend(self.statement(sql_after, &grammar::SQL_AFTER));
        }

        body
    }

    fn item_type(&mut self, node: Node) -> Declared<ItemType> {
        self.check(node, &grammar::ITEM_TYPE);
        let name = self.name_attribute(node);
        let body = self.item_type_body(node, &name, false);

        let mut item_type = ItemType::new(name, self.in_base_schema);
        item_type.documentation = body.documentation;
        for (right, expression) in body.expressions {
            item_type.expressions_mut(right).push(expression);
        }
        item_type.properties = body.properties.into_iter().map(|p| p.item).collect();
        item_type.indexes = body.indexes;
        item_type.sql_after = body.sql_after;

        Declared {
            location: self.location(node),
            item: item_type,
        }
    }

    fn item_type_extension(&mut self, node: Node) -> ItemTypeExtension {
        self.check(node, &grammar::EXTEND_ITEM_TYPE);
        let name = self.name_attribute(node);
        let replace_indexes = self.bool_attribute(node, "ReplaceIndexes").unwrap_or(false);
        let body = self.item_type_body(node, &name, true);
        ItemTypeExtension {
            name,
            location: self.location(node),
            replace_indexes,
            body,
        }
    }

    fn member_extension(&mut self, node: Node, element: &'static str) -> MemberExtension {
        self.check(node, &grammar::extend_member(element));
        MemberExtension {
            name: self.name_attribute(node),
            location: self.location(node),
            documentation: self.documentation(node),
        }
    }

    fn property(&mut self, node: Node, item_type_name: &str) -> Option<Declared<ItemTypeProperty>> {
        self.check(node, &grammar::PROPERTY);
        let name = self.name_attribute(node);
        let describe = format!("property {}.{}", item_type_name, name);
        if name == "Id" {
            self.error(
                node,
                format!("{}: 'Id' is reserved for the item identifier column", describe),
            );
        }

        let value_type = self.value_type_attribute(node)?;
        let referenced_item_type_name = self.reference_attribute(
            node,
            &describe,
            value_type,
            "ReferencedItemTypeName",
            ValueType::ItemIdentifier,
        );
        let enum_name =
            self.reference_attribute(node, &describe, value_type, "EnumName", ValueType::Enumeration);

        let length = self.int_attribute(node, "Length");
        if let Some(length) = length {
            match value_type.length_limit() {
                Some(limit) if (1..=limit).contains(&length) => {}
                Some(limit) => self.error(
                    node,
                    format!("{}: Length must be between 1 and {}", describe, limit),
                ),
                None => self.error(
                    node,
                    format!(
                        "{}: Length is only allowed on String and ByteArray properties",
                        describe
                    ),
                ),
            }
        }

        let nullable = self.bool_attribute(node, "Nullable").unwrap_or(false);

        let row_guid = self.bool_attribute(node, "RowGuid").unwrap_or(false);
        if row_guid && value_type != ValueType::Guid {
            self.error(
                node,
                format!("{}: RowGuid is only allowed on Guid properties", describe),
            );
        }

        let cascade_delete = self.bool_attribute(node, "CascadeDelete");
        if cascade_delete.is_some() && value_type != ValueType::ItemIdentifier {
            self.error(
                node,
                format!(
                    "{}: CascadeDelete is only allowed on ItemIdentifier properties",
                    describe
                ),
            );
        }

        let default = match child(node, "Default") {
            Some(default_node) => self.default_value(default_node, &describe, value_type, nullable),
            None => None,
        };

        let mut constraints = Vec::new();
        if let Some(constraints_node) = child(node, "Constraints") {
            self.check(constraints_node, &grammar::CONSTRAINTS);
            for constraint in children(constraints_node, "Constraint") {
                constraints.extend(self.statement(constraint, &grammar::CONSTRAINT));
            }
        }

        Some(Declared {
            location: self.location(node),
            item: ItemTypeProperty {
                item_type_name: item_type_name.to_string(),
                name,
                value_type,
                nullable,
                length: length.filter(|_| value_type.accepts_length()),
                cascade_delete: cascade_delete.unwrap_or(false),
                row_guid,
                referenced_item_type_name,
                enum_name,
                default,
                constraints,
                documentation: self.documentation(node),
                in_base_schema: self.in_base_schema,
            },
        })
    }

    fn default_value(
        &mut self,
        node: Node,
        describe: &str,
        value_type: ValueType,
        nullable: bool,
    ) -> Option<DefaultValue> {
        self.check(node, &grammar::DEFAULT);
        let is_function = self.bool_attribute(node, "IsFunction").unwrap_or(false);

        if self.bool_attribute(node, "Null").unwrap_or(false) {
            if !nullable {
                self.error(
                    node,
                    format!("{} has a null default but is not nullable", describe),
                );
            }
            return Some(DefaultValue::Null);
        }

        let text = element_text(node);
        if text.is_empty() {
            self.error(node, format!("{} has a <Default> without a value", describe));
            return None;
        }
        if is_function {
            return Some(DefaultValue::Function(text));
        }

        match value_type.parse_literal(&text) {
            Ok(literal) => Some(DefaultValue::Literal(literal)),
            Err(reason) => {
                self.error(
                    node,
                    format!("{} has an invalid default value: {}", describe, reason),
                );
                None
            }
        }
    }

    fn view_column(&mut self, node: Node, view_name: &str) -> Option<ViewColumn> {
        self.check(node, &grammar::typed_member("Column"));
        let name = self.name_attribute(node);
        let describe = format!("column {}.{}", view_name, name);
        let value_type = self.value_type_attribute(node)?;
        Some(ViewColumn {
            view_name: view_name.to_string(),
            referenced_item_type_name: self.reference_attribute(
                node,
                &describe,
                value_type,
                "ReferencedItemTypeName",
                ValueType::ItemIdentifier,
            ),
            enum_name: self.reference_attribute(
                node,
                &describe,
                value_type,
                "EnumName",
                ValueType::Enumeration,
            ),
            documentation: self.documentation(node),
            name,
            value_type,
            in_base_schema: self.in_base_schema,
        })
    }

    fn parameter(&mut self, node: Node, owner: &ParameterOwner) -> Option<Declared<Parameter>> {
        self.check(node, &grammar::typed_member("Parameter"));
        let name = self.name_attribute(node);
        let describe = match owner {
            ParameterOwner::View(view) => format!("parameter {} of view {}", name, view),
            ParameterOwner::Right(right) => format!("parameter {} of right {}", name, right),
        };
        let value_type = self.value_type_attribute(node)?;
        Some(Declared {
            location: self.location(node),
            item: Parameter {
                owner: owner.clone(),
                referenced_item_type_name: self.reference_attribute(
                    node,
                    &describe,
                    value_type,
                    "ReferencedItemTypeName",
                    ValueType::ItemIdentifier,
                ),
                enum_name: self.reference_attribute(
                    node,
                    &describe,
                    value_type,
                    "EnumName",
                    ValueType::Enumeration,
                ),
                documentation: self.documentation(node),
                name,
                value_type,
                in_base_schema: self.in_base_schema,
            },
        })
    }

    /// Parameters of a view or right, plus `ExtendParameter` entries when
    /// `extending`
    fn parameters(
        &mut self,
        parent: Node,
        owner: &ParameterOwner,
        extending: bool,
    ) -> (Vec<Declared<Parameter>>, Vec<MemberExtension>) {
        let mut parameters: Vec<Declared<Parameter>> = Vec::new();
        let mut extensions = Vec::new();
        let Some(node) = child(parent, "Parameters") else {
            return (parameters, extensions);
        };
        let rule = if extending {
            &grammar::EXTEND_PARAMETERS
        } else {
            &grammar::PARAMETERS
        };
        self.check(node, rule);

        for p in node.children().filter(|n| n.is_element()) {
            match p.tag_name().name() {
                "Parameter" => {
                    let Some(declared) = self.parameter(p, owner) else {
                        continue;
                    };
                    // Names only have to be unique within a right
                    let must_be_unique = matches!(owner, ParameterOwner::Right(_));
                    if must_be_unique
                        && parameters.iter().any(|x| x.item.name == declared.item.name)
                    {
                        self.error(
                            p,
                            format!(
                                "right {} has more than one parameter named {}",
                                owner.name(),
                                declared.item.name
                            ),
                        );
                    } else {
                        parameters.push(declared);
                    }
                }
                "ExtendParameter" if extending => {
                    extensions.push(self.member_extension(p, "ExtendParameter"));
                }
                _ => {}
            }
        }
        (parameters, extensions)
    }

    fn view(&mut self, node: Node) -> Declared<View> {
        self.check(node, &grammar::VIEW);
        let name = self.name_attribute(node);

        let mut columns = Vec::new();
        if let Some(columns_node) = child(node, "Columns") {
            self.check(columns_node, &grammar::COLUMNS);
            for column in children(columns_node, "Column") {
                columns.extend(self.view_column(column, &name));
            }
        }

        let owner = ParameterOwner::View(name.clone());
        let (parameters, _) = self.parameters(node, &owner, false);

        let implementation = match child(node, "Implementation") {
            Some(implementation) => self
                .statement(implementation, &grammar::IMPLEMENTATION)
                .unwrap_or_default(),
            None => {
                self.error(node, format!("view {} has no <Implementation>", name));
                String::new()
            }
        };

        Declared {
            location: self.location(node),
            item: View {
                columns,
                parameters: parameters.into_iter().map(|p| p.item).collect(),
                implementation,
                right_expressions: self.expressions(node, "GrantQueryRight"),
                documentation: self.documentation(node),
                name,
                in_base_schema: self.in_base_schema,
            },
        }
    }

    fn view_extension(&mut self, node: Node) -> ViewExtension {
        self.check(node, &grammar::EXTEND_VIEW);
        ViewExtension {
            name: self.name_attribute(node),
            location: self.location(node),
            documentation: self.documentation(node),
            query_right_expressions: self.expressions(node, "GrantQueryRight"),
        }
    }

    fn right(&mut self, node: Node) -> Declared<Right> {
        self.check(node, &grammar::RIGHT);
        let name = self.name_attribute(node);
        let owner = ParameterOwner::Right(name.clone());
        let (parameters, _) = self.parameters(node, &owner, false);

        Declared {
            location: self.location(node),
            item: Right {
                parameters: parameters.into_iter().map(|p| p.item).collect(),
                right_expressions: self.expressions(node, "Grant"),
                documentation: self.documentation(node),
                name,
                in_base_schema: self.in_base_schema,
            },
        }
    }

    fn right_extension(&mut self, node: Node) -> RightExtension {
        self.check(node, &grammar::EXTEND_RIGHT);
        let name = self.name_attribute(node);
        let owner = ParameterOwner::Right(name.clone());
        let (parameters, parameter_extensions) = self.parameters(node, &owner, true);

        RightExtension {
            location: self.location(node),
            documentation: self.documentation(node),
            right_expressions: self.expressions(node, "Grant"),
            parameters,
            parameter_extensions,
            name,
        }
    }
}
