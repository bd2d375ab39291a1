//! Schema element definitions

use super::value_type::{DefaultValue, ValueType};

/// Free-form `<Summary>` / `<Remarks>` markup attached to a schema element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Documentation {
    pub summary: Option<String>,
    pub remarks: Option<String>,
}

impl Documentation {
    /// Append documentation from an `Extend*` directive
    pub fn append(&mut self, other: &Documentation) {
        append_text(&mut self.summary, other.summary.as_deref());
        append_text(&mut self.remarks, other.remarks.as_deref());
    }
}

fn append_text(target: &mut Option<String>, extra: Option<&str>) {
    if let Some(extra) = extra {
        target.get_or_insert_with(String::new).push_str(extra);
    }
}

/// Anything that holds a value type and may point at an enum or item type
pub trait TypedReference {
    fn name(&self) -> &str;
    fn value_type(&self) -> ValueType;
    fn referenced_item_type_name(&self) -> Option<&str>;
    fn enum_name(&self) -> Option<&str>;
    /// How diagnostics refer to this element, e.g. `property UserItem.Key`
    fn describe(&self) -> String;
}

/// One named value of an enum
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub name: String,
    pub value: i32,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<EnumValue>,
    pub documentation: Documentation,
    pub in_base_schema: bool,
}

impl EnumType {
    pub fn value(&self, name: &str) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.name == name)
    }

    /// Name of the first value with the given integer
    pub fn value_name(&self, value: i32) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.value == value)
            .map(|v| v.name.as_str())
    }
}

/// A column of an item type table
#[derive(Debug, Clone, PartialEq)]
pub struct ItemTypeProperty {
    pub item_type_name: String,
    pub name: String,
    pub value_type: ValueType,
    pub nullable: bool,
    /// Declared length, String and ByteArray only
    pub length: Option<i32>,
    pub cascade_delete: bool,
    pub row_guid: bool,
    pub referenced_item_type_name: Option<String>,
    pub enum_name: Option<String>,
    pub default: Option<DefaultValue>,
    /// Free-form SQL appended to the column definition
    pub constraints: Vec<String>,
    pub documentation: Documentation,
    pub in_base_schema: bool,
}

impl ItemTypeProperty {
    /// Declared length, or the type's limit for String and ByteArray
    pub fn max_length(&self) -> Option<i32> {
        self.value_type.max_length(self.length)
    }

    pub fn sql_type(&self) -> String {
        self.value_type.sql_type(self.length)
    }

    /// Name of the `Max<Property>Length` helper constant
    pub fn max_length_constant(&self) -> String {
        format!("Max{}Length", self.name)
    }
}

impl TypedReference for ItemTypeProperty {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_type(&self) -> ValueType {
        self.value_type
    }

    fn referenced_item_type_name(&self) -> Option<&str> {
        self.referenced_item_type_name.as_deref()
    }

    fn enum_name(&self) -> Option<&str> {
        self.enum_name.as_deref()
    }

    fn describe(&self) -> String {
        format!("property {}.{}", self.item_type_name, self.name)
    }
}

/// Which security function an item type expression list feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRight {
    Query,
    Add,
    Update,
    Delete,
}

impl ItemRight {
    pub const ALL: [ItemRight; 4] = [
        ItemRight::Query,
        ItemRight::Add,
        ItemRight::Update,
        ItemRight::Delete,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemType {
    pub name: String,
    pub properties: Vec<ItemTypeProperty>,
    pub query_right_expressions: Vec<String>,
    pub add_right_expressions: Vec<String>,
    pub update_right_expressions: Vec<String>,
    pub delete_right_expressions: Vec<String>,
    /// Raw index creation statements
    pub indexes: Vec<String>,
    pub sql_after: Vec<String>,
    pub documentation: Documentation,
    pub in_base_schema: bool,
}

impl ItemType {
    pub fn new(name: impl Into<String>, in_base_schema: bool) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            query_right_expressions: Vec::new(),
            add_right_expressions: Vec::new(),
            update_right_expressions: Vec::new(),
            delete_right_expressions: Vec::new(),
            indexes: Vec::new(),
            sql_after: Vec::new(),
            documentation: Documentation::default(),
            in_base_schema,
        }
    }

    pub fn property(&self, name: &str) -> Option<&ItemTypeProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn expressions(&self, right: ItemRight) -> &[String] {
        match right {
            ItemRight::Query => &self.query_right_expressions,
            ItemRight::Add => &self.add_right_expressions,
            ItemRight::Update => &self.update_right_expressions,
            ItemRight::Delete => &self.delete_right_expressions,
        }
    }

    pub fn expressions_mut(&mut self, right: ItemRight) -> &mut Vec<String> {
        match right {
            ItemRight::Query => &mut self.query_right_expressions,
            ItemRight::Add => &mut self.add_right_expressions,
            ItemRight::Update => &mut self.update_right_expressions,
            ItemRight::Delete => &mut self.delete_right_expressions,
        }
    }

    /// Table-valued function returning every row of the item type table
    pub fn default_view_function(&self) -> String {
        format!("{}$DefaultView", self.name)
    }

    /// Security function for `right`, present only when expressions exist
    pub fn security_function(&self, right: ItemRight) -> Option<String> {
        if self.expressions(right).is_empty() {
            return None;
        }
        let suffix = match right {
            ItemRight::Query => "DefaultViewSecurity",
            ItemRight::Add => "AddSecurity",
            ItemRight::Update => "UpdateSecurity",
            ItemRight::Delete => "DeleteSecurity",
        };
        Some(format!("{}${}", self.name, suffix))
    }
}

/// A column returned by a view
#[derive(Debug, Clone, PartialEq)]
pub struct ViewColumn {
    pub view_name: String,
    pub name: String,
    pub value_type: ValueType,
    pub referenced_item_type_name: Option<String>,
    pub enum_name: Option<String>,
    pub documentation: Documentation,
    pub in_base_schema: bool,
}

impl TypedReference for ViewColumn {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_type(&self) -> ValueType {
        self.value_type
    }

    fn referenced_item_type_name(&self) -> Option<&str> {
        self.referenced_item_type_name.as_deref()
    }

    fn enum_name(&self) -> Option<&str> {
        self.enum_name.as_deref()
    }

    fn describe(&self) -> String {
        format!("column {}.{}", self.view_name, self.name)
    }
}

/// The view or right a parameter belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterOwner {
    View(String),
    Right(String),
}

impl ParameterOwner {
    pub fn name(&self) -> &str {
        match self {
            ParameterOwner::View(name) | ParameterOwner::Right(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub owner: ParameterOwner,
    pub name: String,
    pub value_type: ValueType,
    pub referenced_item_type_name: Option<String>,
    pub enum_name: Option<String>,
    pub documentation: Documentation,
    pub in_base_schema: bool,
}

impl Parameter {
    /// Parameters carry no length, so String and ByteArray are always `max`
    pub fn sql_type(&self) -> String {
        self.value_type.sql_type(None)
    }
}

impl TypedReference for Parameter {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_type(&self) -> ValueType {
        self.value_type
    }

    fn referenced_item_type_name(&self) -> Option<&str> {
        self.referenced_item_type_name.as_deref()
    }

    fn enum_name(&self) -> Option<&str> {
        self.enum_name.as_deref()
    }

    fn describe(&self) -> String {
        match &self.owner {
            ParameterOwner::View(view) => format!("parameter {} of view {}", self.name, view),
            ParameterOwner::Right(right) => format!("parameter {} of right {}", self.name, right),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub name: String,
    pub columns: Vec<ViewColumn>,
    pub parameters: Vec<Parameter>,
    /// Body of the table-valued function
    pub implementation: String,
    pub right_expressions: Vec<String>,
    pub documentation: Documentation,
    pub in_base_schema: bool,
}

impl View {
    pub fn security_function(&self) -> Option<String> {
        if self.right_expressions.is_empty() {
            None
        } else {
            Some(format!("{}$Security", self.name))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Right {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub right_expressions: Vec<String>,
    pub documentation: Documentation,
    pub in_base_schema: bool,
}

impl Right {
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// A right's security function is named after the right itself
    pub fn security_function(&self) -> Option<String> {
        if self.right_expressions.is_empty() {
            None
        } else {
            Some(self.name.clone())
        }
    }
}
