use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;

use store_schema_compiler::util::eq_ci;
use store_schema_compiler::{compile, CompileOptions};

/// `/Flag` spellings accepted in any case, and the long option each one
/// stands for
const SLASH_FLAGS: [(&str, &str); 9] = [
    ("/BaseSchema", "--base-schema"),
    ("/OutputInit", "--output-init"),
    ("/OutputUpgrade", "--output-upgrade"),
    ("/OutputHelper", "--output-helper"),
    ("/Namespace", "--namespace"),
    ("/SchemaNamespace", "--schema-namespace"),
    ("/OutputComponentsHelper", "--output-components-helper"),
    ("/OutputStorageHelper", "--output-storage-helper"),
    ("/OutputBaseInit", "--output-base-init"),
];

#[derive(Parser, Debug)]
#[command(name = "store-schema-compiler")]
#[command(
    version,
    about = "Compile LearningStore XML schemas into C# helper files and T-SQL scripts",
    after_help = "Options may also be written in the /OutputInit form, in any case."
)]
struct Cli {
    /// Derived schema file
    input: Option<PathBuf>,

    /// Base schema file (defaults to the embedded base schema)
    #[arg(long, value_name = "PATH")]
    base_schema: Option<PathBuf>,

    /// Write the init script for the base and derived schema
    #[arg(long, value_name = "PATH")]
    output_init: Option<PathBuf>,

    /// Write the upgrade script for the base and derived schema
    #[arg(long, value_name = "PATH")]
    output_upgrade: Option<PathBuf>,

    /// Write the helper file for the derived schema
    #[arg(long, value_name = "PATH")]
    output_helper: Option<PathBuf>,

    /// Namespace of the derived enums and identifier classes
    #[arg(long)]
    namespace: Option<String>,

    /// Namespace of the derived item type, view and right classes
    #[arg(long)]
    schema_namespace: Option<String>,

    /// Write the components helper for the base schema
    #[arg(long, value_name = "PATH")]
    output_components_helper: Option<PathBuf>,

    /// Write the storage helper for the base schema
    #[arg(long, value_name = "PATH")]
    output_storage_helper: Option<PathBuf>,

    /// Write the init script for the base schema alone
    #[arg(long, value_name = "PATH")]
    output_base_init: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl From<Cli> for CompileOptions {
    fn from(cli: Cli) -> Self {
        CompileOptions {
            input: cli.input,
            base_schema: cli.base_schema,
            output_init: cli.output_init,
            output_upgrade: cli.output_upgrade,
            output_helper: cli.output_helper,
            namespace: cli.namespace,
            schema_namespace: cli.schema_namespace,
            output_components_helper: cli.output_components_helper,
            output_storage_helper: cli.output_storage_helper,
            output_base_init: cli.output_base_init,
            verbose: cli.verbose,
        }
    }
}

/// Rewrite `/Flag` arguments to their long form. Anything else, including
/// absolute paths, passes through untouched.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| {
            let long = arg.to_str().and_then(|text| {
                SLASH_FLAGS
                    .iter()
                    .find(|(slash, _)| eq_ci(slash, text))
                    .map(|(_, long)| *long)
            });
            match long {
                Some(long) => OsString::from(long),
                None => arg,
            }
        })
        .collect()
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => {
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    print!("{}", e);
                    ExitCode::SUCCESS
                }
                _ => {
                    println!("{}", e.render());
                    ExitCode::FAILURE
                }
            };
        }
    };

    match compile(cli.into()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
