//! Common test utilities for store-schema-compiler tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use store_schema_compiler::{compile, CompileOptions, Schema, SchemaSource};

/// Path of a file under tests/fixtures
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load the embedded base schema plus a fixture, panicking on errors
pub fn load_fixture(name: &str) -> Schema {
    Schema::from_base_schema_and_file(&SchemaSource::Embedded, &fixture_path(name))
        .unwrap_or_else(|e| panic!("Fixture '{}' failed to load: {}", name, e))
}

/// Load the embedded base schema alone
pub fn load_base() -> Schema {
    Schema::from_base_schema(&SchemaSource::Embedded).expect("Embedded base schema should load")
}

/// Test context with temporary directory for isolated test execution
pub struct TestContext {
    /// Kept to prevent temp directory cleanup until TestContext is dropped
    _temp_dir: TempDir,
    pub work_dir: PathBuf,
    /// Stored for debugging purposes
    fixture_name: String,
}

impl TestContext {
    /// Create a new test context by copying a fixture schema to a temp directory
    pub fn with_fixture(fixture_name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let work_dir = temp_dir.path().to_path_buf();

        fs::copy(fixture_path(fixture_name), work_dir.join(fixture_name))
            .expect("Failed to copy fixture");

        Self {
            _temp_dir: temp_dir,
            work_dir,
            fixture_name: fixture_name.to_string(),
        }
    }

    /// Create a context with an empty temp directory
    pub fn empty() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let work_dir = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            work_dir,
            fixture_name: String::new(),
        }
    }

    /// Path of the copied schema file
    pub fn schema_path(&self) -> PathBuf {
        self.work_dir.join(&self.fixture_name)
    }

    /// Path for an output file inside the temp directory
    pub fn output(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }

    /// Options with the copied schema as input and nothing else set
    pub fn options(&self) -> CompileOptions {
        CompileOptions {
            input: Some(self.schema_path()),
            ..Default::default()
        }
    }

    /// Run the compiler
    pub fn compile(&self, options: CompileOptions) -> CompileResult {
        match compile(options) {
            Ok(written) => CompileResult {
                success: true,
                written,
                errors: vec![],
            },
            Err(e) => CompileResult {
                success: false,
                written: vec![],
                errors: vec![format!("{:#}", e)],
            },
        }
    }

    /// Run the compiler, panicking if it fails
    pub fn compile_successfully(&self, options: CompileOptions) -> Vec<PathBuf> {
        let result = self.compile(options);
        assert!(
            result.success,
            "Compile failed for fixture '{}': {:?}",
            self.fixture_name, result.errors
        );
        result.written
    }

    /// Read an output file written into the temp directory
    pub fn read(&self, name: &str) -> String {
        read_file(&self.output(name))
    }
}

/// Result of a compiler run
#[derive(Debug)]
pub struct CompileResult {
    pub success: bool,
    pub written: Vec<PathBuf>,
    pub errors: Vec<String>,
}

impl CompileResult {
    /// The error text, or an empty string on success
    pub fn error_text(&self) -> String {
        self.errors.join("\n")
    }
}

pub fn read_file(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

/// Number of non-overlapping occurrences of `needle` in `text`
pub fn count(text: &str, needle: &str) -> usize {
    text.matches(needle).count()
}
