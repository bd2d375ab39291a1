//! store-schema-compiler: compiles LearningStore XML schemas
//!
//! This library reads a store schema (the embedded base schema plus an
//! optional derived schema) and generates the C# helper files and T-SQL
//! scripts that create or upgrade a LearningStore database.

pub mod codegen;
pub mod error;
pub mod schema;
pub mod util;

use std::path::{Path, PathBuf};

use anyhow::Result;

pub use error::{SchemaCompilerError, SourceLocation, ValidationError, ValidationErrors};
pub use schema::{Schema, SchemaBuilder, SchemaSource};

/// Options for one compiler run
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Derived schema file
    pub input: Option<PathBuf>,
    /// Base schema file; the embedded base schema is used when absent
    pub base_schema: Option<PathBuf>,
    /// Full init script for the derived schema
    pub output_init: Option<PathBuf>,
    /// Upgrade script for the derived schema
    pub output_upgrade: Option<PathBuf>,
    /// Helper file for the derived schema
    pub output_helper: Option<PathBuf>,
    /// Namespace of the derived enums and identifier classes
    pub namespace: Option<String>,
    /// Namespace of the derived item type, view and right classes
    pub schema_namespace: Option<String>,
    /// Components helper for the base schema
    pub output_components_helper: Option<PathBuf>,
    /// Storage helper for the base schema
    pub output_storage_helper: Option<PathBuf>,
    /// Init script for the base schema alone
    pub output_base_init: Option<PathBuf>,
    /// Enable verbose output
    pub verbose: bool,
}

impl CompileOptions {
    fn has_base_outputs(&self) -> bool {
        self.output_components_helper.is_some()
            || self.output_storage_helper.is_some()
            || self.output_base_init.is_some()
    }

    fn has_derived_outputs(&self) -> bool {
        self.output_init.is_some() || self.output_upgrade.is_some() || self.output_helper.is_some()
    }

    /// Check that the options form a meaningful run
    pub fn validate(&self) -> Result<(), SchemaCompilerError> {
        if self.has_derived_outputs() && self.input.is_none() {
            return Err(SchemaCompilerError::command_line(
                "/OutputInit, /OutputUpgrade and /OutputHelper require an input schema file",
            ));
        }
        if self.output_helper.is_some()
            && (self.namespace.is_none() || self.schema_namespace.is_none())
        {
            return Err(SchemaCompilerError::command_line(
                "/OutputHelper requires /Namespace and /SchemaNamespace",
            ));
        }
        if !self.has_base_outputs() && !self.has_derived_outputs() && self.input.is_none() {
            return Err(SchemaCompilerError::command_line(
                "Nothing to do: give an input schema file or at least one output",
            ));
        }
        Ok(())
    }

    pub fn base_schema_source(&self) -> SchemaSource {
        match &self.base_schema {
            Some(path) => SchemaSource::File(path.clone()),
            None => SchemaSource::Embedded,
        }
    }
}

/// Compile the schemas named in `options` and write every requested
/// output. Returns the paths written, in order.
///
/// Base schema outputs are written before the derived schema is loaded. An
/// input file without derived outputs is only validated.
pub fn compile(options: CompileOptions) -> Result<Vec<PathBuf>> {
    options.validate()?;

    let base = options.base_schema_source();
    let mut written = Vec::new();

    // Phase 1: outputs of the base schema alone
    if options.has_base_outputs() {
        if options.verbose {
            println!("Loading base schema: {}", base.display_name());
        }
        let schema = Schema::from_base_schema(&base)?;
        if options.verbose {
            print_counts(&schema);
        }

        if let Some(path) = &options.output_base_init {
            log_output(options.verbose, "base init script", path);
            codegen::write_init(&schema, path)?;
            written.push(path.clone());
        }
        if let Some(path) = &options.output_components_helper {
            log_output(options.verbose, "components helper", path);
            codegen::write_components_helper(&schema, path)?;
            written.push(path.clone());
        }
        if let Some(path) = &options.output_storage_helper {
            log_output(options.verbose, "storage helper", path);
            codegen::write_storage_helper(&schema, path)?;
            written.push(path.clone());
        }
    }

    // Phase 2: base schema plus the derived schema
    if let Some(input) = &options.input {
        if options.verbose {
            println!(
                "Loading schema: {} (base: {})",
                input.display(),
                base.display_name()
            );
        }
        let schema = Schema::from_base_schema_and_file(&base, input)?;
        if options.verbose {
            print_counts(&schema);
        }

        if let Some(path) = &options.output_init {
            log_output(options.verbose, "init script", path);
            codegen::write_init(&schema, path)?;
            written.push(path.clone());
        }
        if let Some(path) = &options.output_upgrade {
            log_output(options.verbose, "upgrade script", path);
            codegen::write_upgrade(&schema, path)?;
            written.push(path.clone());
        }
        if let (Some(path), Some(namespace), Some(schema_namespace)) = (
            &options.output_helper,
            &options.namespace,
            &options.schema_namespace,
        ) {
            log_output(options.verbose, "helper", path);
            codegen::write_helper(&schema, path, namespace, schema_namespace)?;
            written.push(path.clone());
        }
    }

    if options.verbose {
        println!("Wrote {} file(s)", written.len());
    }

    Ok(written)
}

fn print_counts(schema: &Schema) {
    println!(
        "Loaded {} enums, {} item types, {} views and {} rights",
        schema.enums().len(),
        schema.item_types().len(),
        schema.views().len(),
        schema.rights().len()
    );
}

fn log_output(verbose: bool, what: &str, path: &Path) {
    if verbose {
        println!("Writing {}: {}", what, path.display());
    }
}
