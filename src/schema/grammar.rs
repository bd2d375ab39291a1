//! Structural grammar of store schema files.
//!
//! `schemas/StoreSchema.xsd` describes the same grammar for editors and
//! external tools. The reader checks each element it visits against one of
//! the rules below; free-form documentation markup is never checked.

/// Allowed shape of one element
#[derive(Debug)]
pub(crate) struct ElementRule {
    pub name: &'static str,
    pub required_attributes: &'static [&'static str],
    pub optional_attributes: &'static [&'static str],
    pub children: &'static [&'static str],
    /// Children that may appear at most once
    pub single_children: &'static [&'static str],
    /// Children accepted outside the schema namespace
    pub unqualified_children: &'static [&'static str],
    /// Whether non-whitespace text content is allowed
    pub text: bool,
}

const fn container(name: &'static str, child: &'static [&'static str]) -> ElementRule {
    ElementRule {
        name,
        required_attributes: &[],
        optional_attributes: &[],
        children: child,
        single_children: &[],
        unqualified_children: &[],
        text: false,
    }
}

const fn text(name: &'static str) -> ElementRule {
    ElementRule {
        name,
        required_attributes: &[],
        optional_attributes: &[],
        children: &[],
        single_children: &[],
        unqualified_children: &[],
        text: true,
    }
}

pub(crate) const STORE_SCHEMA: ElementRule = container(
    "StoreSchema",
    &[
        "Enum",
        "ItemType",
        "View",
        "Right",
        "ExtendItemType",
        "ExtendView",
        "ExtendRight",
        "SqlBefore",
        "SqlAfter",
    ],
);

pub(crate) const DOCUMENTATION: ElementRule = ElementRule {
    name: "Documentation",
    required_attributes: &[],
    optional_attributes: &[],
    children: &["Summary", "Remarks"],
    single_children: &["Summary", "Remarks"],
    unqualified_children: &["Summary", "Remarks"],
    text: false,
};

pub(crate) const ENUM: ElementRule = ElementRule {
    name: "Enum",
    required_attributes: &["Name"],
    optional_attributes: &[],
    children: &["Documentation", "Values"],
    single_children: &["Documentation", "Values"],
    unqualified_children: &[],
    text: false,
};

pub(crate) const VALUES: ElementRule = container("Values", &["Value"]);

pub(crate) const VALUE: ElementRule = ElementRule {
    name: "Value",
    required_attributes: &["Name", "Value"],
    optional_attributes: &[],
    children: &["Documentation"],
    single_children: &["Documentation"],
    unqualified_children: &["Documentation"],
    text: false,
};

const ITEM_TYPE_CHILDREN: &[&str] = &[
    "Documentation",
    "GrantQueryRight",
    "GrantAddRight",
    "GrantUpdateRight",
    "GrantDeleteRight",
    "Properties",
    "Indexes",
    "SqlAfter",
];

pub(crate) const ITEM_TYPE: ElementRule = ElementRule {
    name: "ItemType",
    required_attributes: &["Name"],
    optional_attributes: &[],
    children: ITEM_TYPE_CHILDREN,
    single_children: &["Documentation", "Properties", "Indexes"],
    unqualified_children: &[],
    text: false,
};

pub(crate) const EXTEND_ITEM_TYPE: ElementRule = ElementRule {
    name: "ExtendItemType",
    required_attributes: &["Name"],
    optional_attributes: &["ReplaceIndexes"],
    children: ITEM_TYPE_CHILDREN,
    single_children: &["Documentation", "Properties", "Indexes"],
    unqualified_children: &[],
    text: false,
};

/// `GrantQueryRight`, `GrantAddRight`, `GrantUpdateRight`,
/// `GrantDeleteRight` and `Grant` all share this shape
pub(crate) const fn grant(name: &'static str) -> ElementRule {
    container(name, &["Expression"])
}

pub(crate) const EXPRESSION: ElementRule = text("Expression");

pub(crate) const PROPERTIES: ElementRule = container("Properties", &["Property"]);

pub(crate) const EXTEND_PROPERTIES: ElementRule =
    container("Properties", &["Property", "ExtendProperty"]);

pub(crate) const PROPERTY: ElementRule = ElementRule {
    name: "Property",
    required_attributes: &["Name", "Type"],
    optional_attributes: &[
        "ReferencedItemTypeName",
        "EnumName",
        "Length",
        "Nullable",
        "RowGuid",
        "CascadeDelete",
    ],
    children: &["Documentation", "Default", "Constraints"],
    single_children: &["Documentation", "Default", "Constraints"],
    unqualified_children: &[],
    text: false,
};

pub(crate) const DEFAULT: ElementRule = ElementRule {
    name: "Default",
    required_attributes: &[],
    optional_attributes: &["IsFunction", "Null"],
    children: &[],
    single_children: &[],
    unqualified_children: &[],
    text: true,
};

pub(crate) const CONSTRAINTS: ElementRule = container("Constraints", &["Constraint"]);

pub(crate) const CONSTRAINT: ElementRule = text("Constraint");

pub(crate) const INDEXES: ElementRule = container("Indexes", &["Index"]);

pub(crate) const INDEX: ElementRule = text("Index");

pub(crate) const SQL_BEFORE: ElementRule = text("SqlBefore");

pub(crate) const SQL_AFTER: ElementRule = text("SqlAfter");

pub(crate) const IMPLEMENTATION: ElementRule = text("Implementation");

/// `ExtendProperty` and `ExtendParameter`
pub(crate) const fn extend_member(name: &'static str) -> ElementRule {
    ElementRule {
        name,
        required_attributes: &["Name"],
        optional_attributes: &[],
        children: &["Documentation"],
        single_children: &["Documentation"],
        unqualified_children: &[],
        text: false,
    }
}

pub(crate) const VIEW: ElementRule = ElementRule {
    name: "View",
    required_attributes: &["Name"],
    optional_attributes: &[],
    children: &[
        "Documentation",
        "GrantQueryRight",
        "Columns",
        "Parameters",
        "Implementation",
    ],
    single_children: &["Documentation", "Columns", "Parameters", "Implementation"],
    unqualified_children: &[],
    text: false,
};

pub(crate) const EXTEND_VIEW: ElementRule = ElementRule {
    name: "ExtendView",
    required_attributes: &["Name"],
    optional_attributes: &[],
    children: &["Documentation", "GrantQueryRight"],
    single_children: &["Documentation"],
    unqualified_children: &[],
    text: false,
};

pub(crate) const COLUMNS: ElementRule = container("Columns", &["Column"]);

/// `Column` and `Parameter`
pub(crate) const fn typed_member(name: &'static str) -> ElementRule {
    ElementRule {
        name,
        required_attributes: &["Name", "Type"],
        optional_attributes: &["ReferencedItemTypeName", "EnumName"],
        children: &["Documentation"],
        single_children: &["Documentation"],
        unqualified_children: &[],
        text: false,
    }
}

pub(crate) const PARAMETERS: ElementRule = container("Parameters", &["Parameter"]);

pub(crate) const EXTEND_PARAMETERS: ElementRule =
    container("Parameters", &["Parameter", "ExtendParameter"]);

pub(crate) const RIGHT: ElementRule = ElementRule {
    name: "Right",
    required_attributes: &["Name"],
    optional_attributes: &[],
    children: &["Documentation", "Grant", "Parameters"],
    single_children: &["Documentation", "Parameters"],
    unqualified_children: &[],
    text: false,
};

pub(crate) const EXTEND_RIGHT: ElementRule = ElementRule {
    name: "ExtendRight",
    required_attributes: &["Name"],
    optional_attributes: &[],
    children: &["Documentation", "Grant", "Parameters"],
    single_children: &["Documentation", "Parameters"],
    unqualified_children: &[],
    text: false,
};

impl ElementRule {
    pub fn allows_attribute(&self, name: &str) -> bool {
        self.required_attributes.contains(&name) || self.optional_attributes.contains(&name)
    }

    pub fn allows_child(&self, name: &str, qualified: bool) -> bool {
        self.children.contains(&name) && (qualified || self.unqualified_children.contains(&name))
    }
}
