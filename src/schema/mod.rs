//! Store schema model, reader and validator

mod builder;
pub mod document;
pub mod elements;
mod grammar;
pub mod value_type;

pub use builder::{Schema, SchemaBuilder};
pub use document::{read_schema_file, SchemaSource, BASE_SCHEMA_XML, SCHEMA_NAMESPACE};
pub use elements::{
    Documentation, EnumType, EnumValue, ItemRight, ItemType, ItemTypeProperty, Parameter,
    ParameterOwner, Right, TypedReference, View, ViewColumn,
};
pub use value_type::{DefaultValue, Literal, ValueType, MAX_BYTE_ARRAY_LENGTH, MAX_STRING_LENGTH};
