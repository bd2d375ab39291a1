//! Output generation: C# helper files and T-SQL scripts.
//!
//! Every artifact is rendered into a `String` first and written with a
//! single call, so a failed render never leaves a partial file behind.

pub mod code_writer;
pub mod helper_docs;
pub mod helper_file;
pub mod schema_xml;
pub mod sql_init;
pub mod xml_fragments;

use std::path::Path;

use crate::error::SchemaCompilerError;

pub use code_writer::CodeWriter;
pub use helper_file::{write_components_helper, write_helper, write_storage_helper, HelperNamespaces};
pub use sql_init::{write_init, write_upgrade, LEARNING_STORE_ROLE};

/// Write a rendered artifact, creating parent directories as needed
pub fn write_output(path: &Path, contents: &str) -> Result<(), SchemaCompilerError> {
    let to_error = |source| SchemaCompilerError::OutputWriteError {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(to_error)?;
        }
    }
    std::fs::write(path, contents).map_err(to_error)
}
