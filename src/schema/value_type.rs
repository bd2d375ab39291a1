//! Value types a property, column or parameter can hold.
//!
//! Each value type has exactly one descriptor in [`DESCRIPTORS`]. The schema
//! loader, the helper generator and the SQL generator all go through it, so
//! the SQL type of a column, of a security-function parameter and of a
//! default value can never disagree.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use uuid::Uuid;

/// Longest string a property can declare, in characters
pub const MAX_STRING_LENGTH: i32 = (i32::MAX - 2) / 2;

/// Longest byte array a property can declare, in bytes
pub const MAX_BYTE_ARRAY_LENGTH: i32 = i32::MAX - 2;

/// The value type of a property, view column or parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    ItemIdentifier,
    String,
    Boolean,
    DateTime,
    Single,
    Double,
    Xml,
    Enumeration,
    Int32,
    ByteArray,
    Guid,
}

/// How a value type maps onto a SQL Server column type
#[derive(Debug, Clone, Copy)]
enum SqlType {
    Fixed(&'static str),
    /// `name(N)` up to `inline_limit`, `name(max)` beyond it or when no
    /// length is declared
    Sized {
        name: &'static str,
        inline_limit: i32,
    },
}

#[derive(Debug)]
struct Descriptor {
    value_type: ValueType,
    /// Spelling of the `Type` attribute in schema files
    schema_name: &'static str,
    /// Numeric code recorded in the persisted schema document
    type_code: i32,
    sql_type: SqlType,
    /// Upper bound for `Length`, only for types that accept one
    max_length: Option<i32>,
    /// Type description used in generated documentation
    doc_name: &'static str,
}

static DESCRIPTORS: [Descriptor; 11] = [
    Descriptor {
        value_type: ValueType::ItemIdentifier,
        schema_name: "ItemIdentifier",
        type_code: 1,
        sql_type: SqlType::Fixed("bigint"),
        max_length: None,
        doc_name: "Item identifier",
    },
    Descriptor {
        value_type: ValueType::String,
        schema_name: "String",
        type_code: 2,
        sql_type: SqlType::Sized {
            name: "nvarchar",
            inline_limit: 4000,
        },
        max_length: Some(MAX_STRING_LENGTH),
        doc_name: "String",
    },
    Descriptor {
        value_type: ValueType::Boolean,
        schema_name: "Boolean",
        type_code: 3,
        sql_type: SqlType::Fixed("bit"),
        max_length: None,
        doc_name: "Boolean",
    },
    Descriptor {
        value_type: ValueType::DateTime,
        schema_name: "DateTime",
        type_code: 4,
        sql_type: SqlType::Fixed("datetime"),
        max_length: None,
        doc_name: "DateTime",
    },
    Descriptor {
        value_type: ValueType::Single,
        schema_name: "Single",
        type_code: 5,
        sql_type: SqlType::Fixed("float(24)"),
        max_length: None,
        doc_name: "Single",
    },
    Descriptor {
        value_type: ValueType::Double,
        schema_name: "Double",
        type_code: 6,
        sql_type: SqlType::Fixed("float(53)"),
        max_length: None,
        doc_name: "Double",
    },
    Descriptor {
        value_type: ValueType::Xml,
        schema_name: "Xml",
        type_code: 7,
        sql_type: SqlType::Fixed("xml"),
        max_length: None,
        doc_name: "Xml",
    },
    Descriptor {
        value_type: ValueType::Enumeration,
        schema_name: "Enum",
        type_code: 8,
        sql_type: SqlType::Fixed("int"),
        max_length: None,
        doc_name: "Enumeration",
    },
    Descriptor {
        value_type: ValueType::Int32,
        schema_name: "Int32",
        type_code: 9,
        sql_type: SqlType::Fixed("int"),
        max_length: None,
        doc_name: "Int32",
    },
    Descriptor {
        value_type: ValueType::ByteArray,
        schema_name: "ByteArray",
        type_code: 10,
        sql_type: SqlType::Sized {
            name: "varbinary",
            inline_limit: 8000,
        },
        max_length: Some(MAX_BYTE_ARRAY_LENGTH),
        doc_name: "Byte array",
    },
    Descriptor {
        value_type: ValueType::Guid,
        schema_name: "Guid",
        type_code: 11,
        sql_type: SqlType::Fixed("uniqueidentifier"),
        max_length: None,
        doc_name: "Guid",
    },
];

impl ValueType {
    pub const ALL: [ValueType; 11] = [
        ValueType::ItemIdentifier,
        ValueType::String,
        ValueType::Boolean,
        ValueType::DateTime,
        ValueType::Single,
        ValueType::Double,
        ValueType::Xml,
        ValueType::Enumeration,
        ValueType::Int32,
        ValueType::ByteArray,
        ValueType::Guid,
    ];

    fn descriptor(self) -> &'static Descriptor {
        // DESCRIPTORS is ordered like the enum; the unit tests pin that down
        &DESCRIPTORS[self as usize]
    }

    /// Look up a value type by its `Type` attribute spelling
    pub fn from_schema_name(name: &str) -> Option<Self> {
        DESCRIPTORS
            .iter()
            .find(|d| d.schema_name == name)
            .map(|d| d.value_type)
    }

    pub fn schema_name(self) -> &'static str {
        self.descriptor().schema_name
    }

    /// Numeric code written to the `TypeCode` attribute of the persisted schema
    pub fn type_code(self) -> i32 {
        self.descriptor().type_code
    }

    /// True for types that accept a `Length` attribute
    pub fn accepts_length(self) -> bool {
        self.descriptor().max_length.is_some()
    }

    /// Largest legal `Length` value, for types that accept one
    pub fn length_limit(self) -> Option<i32> {
        self.descriptor().max_length
    }

    /// Effective maximum length: the declared length, or the type's limit
    pub fn max_length(self, declared: Option<i32>) -> Option<i32> {
        let limit = self.descriptor().max_length?;
        Some(declared.unwrap_or(limit))
    }

    /// SQL type for a table column or security-function parameter
    pub fn sql_type(self, length: Option<i32>) -> String {
        match self.descriptor().sql_type {
            SqlType::Fixed(name) => name.to_string(),
            SqlType::Sized { name, inline_limit } => match length {
                Some(n) if n <= inline_limit => format!("{}({})", name, n),
                _ => format!("{}(max)", name),
            },
        }
    }

    /// Length checked by a `CHECK(LEN(..))` constraint because the column
    /// type itself is `max`
    pub fn check_constraint_length(self, length: Option<i32>) -> Option<i32> {
        match (self.descriptor().sql_type, length) {
            (SqlType::Sized { inline_limit, .. }, Some(n)) if n > inline_limit => Some(n),
            _ => None,
        }
    }

    /// Type description for generated documentation.
    ///
    /// `max_length` is included for String and ByteArray when known;
    /// `target` is the enum tag or referenced item type name.
    pub fn doc_description(self, max_length: Option<i32>, target: Option<&str>) -> String {
        match (self, max_length, target) {
            (ValueType::String, Some(n), _) => {
                format!("String with a maximum length of {} characters", n)
            }
            (ValueType::ByteArray, Some(n), _) => {
                format!("Byte array with a maximum length of {} bytes", n)
            }
            (ValueType::Enumeration, _, Some(tag)) => {
                format!("Enumeration <Typ>{}</Typ>", tag)
            }
            (ValueType::ItemIdentifier, _, Some(item_type)) => {
                format!("Identifier of a <Typ>{}</Typ> item", item_type)
            }
            _ => self.descriptor().doc_name.to_string(),
        }
    }

    /// Parse the text of a `<Default>` element for this type.
    ///
    /// Uses XML Schema lexical rules. The error is a human readable reason.
    pub fn parse_literal(self, text: &str) -> Result<Literal, String> {
        let trimmed = text.trim();
        let literal = match self {
            ValueType::ItemIdentifier => {
                return Err("item identifier properties cannot have a default value".to_string())
            }
            ValueType::String => Literal::String(text.to_string()),
            ValueType::Xml => Literal::Xml(text.to_string()),
            ValueType::Boolean => Literal::Boolean(
                parse_xml_boolean(trimmed).ok_or_else(|| invalid(trimmed, self))?,
            ),
            ValueType::ByteArray => {
                let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
                Literal::ByteArray(STANDARD.decode(compact).map_err(|e| {
                    format!("'{}' is not valid base64 data: {}", trimmed, e)
                })?)
            }
            ValueType::DateTime => {
                Literal::DateTime(parse_xml_date_time(trimmed).ok_or_else(|| invalid(trimmed, self))?)
            }
            ValueType::Double => {
                let value: f64 = parse_xml_float(trimmed).ok_or_else(|| invalid(trimmed, self))?;
                Literal::Double(value)
            }
            ValueType::Single => {
                let value: f32 = parse_xml_float(trimmed).ok_or_else(|| invalid(trimmed, self))?;
                Literal::Single(value)
            }
            ValueType::Int32 => {
                Literal::Int32(trimmed.parse().map_err(|_| invalid(trimmed, self))?)
            }
            ValueType::Enumeration => {
                Literal::Enumeration(trimmed.parse().map_err(|_| invalid(trimmed, self))?)
            }
            ValueType::Guid => Literal::Guid(
                Uuid::parse_str(trimmed).map_err(|_| invalid(trimmed, self))?,
            ),
        };
        Ok(literal)
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.schema_name())
    }
}

fn invalid(text: &str, value_type: ValueType) -> String {
    format!("'{}' is not a valid {} value", text, value_type.schema_name())
}

/// `xs:boolean`
pub(crate) fn parse_xml_boolean(text: &str) -> Option<bool> {
    match text.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// `xs:double` / `xs:float`, finite values only
fn parse_xml_float<T>(text: &str) -> Option<T>
where
    T: std::str::FromStr + Copy + Into<f64>,
{
    // Rust also accepts "inf" and "nan" spellings; neither has a SQL literal
    let value: T = text.parse().ok()?;
    if value.into().is_finite() {
        Some(value)
    } else {
        None
    }
}

/// `xs:dateTime` or `xs:date`. Values with an offset are converted to UTC.
fn parse_xml_date_time(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    let local = text.strip_suffix('Z').unwrap_or(text);
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(local, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(local, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// A typed default value parsed from a schema file
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Boolean(bool),
    ByteArray(Vec<u8>),
    DateTime(NaiveDateTime),
    Double(f64),
    Single(f32),
    Int32(i32),
    Enumeration(i32),
    Guid(Uuid),
    String(String),
    Xml(String),
}

impl Literal {
    /// The literal as T-SQL source text
    pub fn sql_constant(&self) -> String {
        match self {
            Literal::ByteArray(bytes) => format!("0x{}", hex::encode_upper(bytes)),
            Literal::Boolean(b) => (if *b { "1" } else { "0" }).to_string(),
            Literal::DateTime(dt) => format!("{{ts '{}'}}", dt.format("%Y-%m-%d %H:%M:%S%.3f")),
            Literal::Double(v) => v.to_string(),
            Literal::Single(v) => v.to_string(),
            Literal::Int32(v) | Literal::Enumeration(v) => v.to_string(),
            Literal::String(s) => format!("'{}'", s.replace('\'', "''")),
            Literal::Xml(s) => {
                let flattened = s.replace("\r\n", " ").replace(['\r', '\n'], " ");
                format!("'{}'", flattened.replace('\'', "''"))
            }
            Literal::Guid(g) => format!("'{}'", g.hyphenated()),
        }
    }

    /// The literal as shown in generated documentation.
    ///
    /// Enumeration values need the enum value tag, which only the caller
    /// can resolve; without it the integer is shown.
    pub fn doc_text(&self, enum_value_tag: Option<&str>) -> String {
        match self {
            Literal::Boolean(b) => (if *b { "True" } else { "False" }).to_string(),
            Literal::ByteArray(bytes) => bytes
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join("-"),
            Literal::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Literal::Double(v) => v.to_string(),
            Literal::Single(v) => v.to_string(),
            Literal::Int32(v) => v.to_string(),
            Literal::Enumeration(v) => match enum_value_tag {
                Some(tag) => format!("<Fld>{}</Fld>", tag),
                None => v.to_string(),
            },
            Literal::Guid(g) => g.hyphenated().to_string(),
            Literal::String(s) => format!("\"{}\"", s.replace('"', "\\\"")),
            Literal::Xml(s) => quick_xml::escape::escape(s.as_str()).into_owned(),
        }
    }
}

/// The default of an item type property
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// `<Default Null="true"/>`
    Null,
    /// `<Default IsFunction="true">` text, an opaque SQL expression
    Function(String),
    Literal(Literal),
}

impl DefaultValue {
    pub fn sql_constant(&self) -> String {
        match self {
            DefaultValue::Null => "NULL".to_string(),
            DefaultValue::Function(expression) => expression.clone(),
            DefaultValue::Literal(literal) => literal.sql_constant(),
        }
    }

    pub fn doc_text(&self, enum_value_tag: Option<&str>) -> String {
        match self {
            DefaultValue::Null => "null".to_string(),
            DefaultValue::Function(expression) => expression.clone(),
            DefaultValue::Literal(literal) => literal.doc_text(enum_value_tag),
        }
    }
}
