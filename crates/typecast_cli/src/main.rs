//! Command-line probe for the coercion engine.
//!
//! - `typecast coerce <TYPE> <JSON>` - coerce a JSON value into a declared type
//! - `typecast ping` - print the linked core version
//!
//! Options for `coerce`:
//! - `--struct Name=field,field` - register an untyped structured type
//! - `--foreign Name` - register a foreign capability-only type
//! - `--config` - JSON config file (coercion policy and logging)
//! - `--fail-on-duplicate-keys` - reject colliding hash keys
//! - `--log-dir` / `--log-level` - enable file logging

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::info;
use typecast_core::{
    core_version, init_logging, parse_type_with, AttributeOptions,
    DuplicateKeyPolicy, LoggingConfig, StructuredType, TypeRegistry, TypecastConfig, Value,
};

#[derive(Parser)]
#[command(name = "typecast", version, about = "Runtime type coercion probe")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Coerce a JSON value into a declared type
    Coerce {
        /// Type notation, e.g. `Array[Hash[String => Integer]]`
        ty: String,

        /// JSON input value
        json: String,

        /// Structured type declaration `Name=field,field` (repeatable)
        #[arg(long = "struct", value_name = "DECL")]
        structs: Vec<String>,

        /// Foreign type name whose instances pass through untouched (repeatable)
        #[arg(long = "foreign", value_name = "NAME")]
        foreign: Vec<String>,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Fail when two hash keys coerce to the same key
        #[arg(long = "fail-on-duplicate-keys")]
        fail_on_duplicate_keys: bool,

        /// Absolute directory for rolling log files
        #[arg(long = "log-dir")]
        log_dir: Option<String>,

        /// Log level (trace|debug|info|warn|error)
        #[arg(long = "log-level")]
        log_level: Option<String>,
    },
    /// Print the linked core version
    Ping,
}

struct CoerceRequest<'a> {
    ty: &'a str,
    json: &'a str,
    structs: &'a [String],
    foreign: &'a [String],
    config: Option<&'a Path>,
    fail_on_duplicate_keys: bool,
    log_dir: Option<String>,
    log_level: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Coerce {
            ty,
            json,
            structs,
            foreign,
            config,
            fail_on_duplicate_keys,
            log_dir,
            log_level,
        } => {
            let request = CoerceRequest {
                ty: &ty,
                json: &json,
                structs: &structs,
                foreign: &foreign,
                config: config.as_deref(),
                fail_on_duplicate_keys,
                log_dir,
                log_level,
            };
            match coerce(request) {
                Ok(output) => println!("{output}"),
                Err(err) => {
                    eprintln!("error: {}", error_chain(err.as_ref()));
                    process::exit(1);
                }
            }
        }
        Commands::Ping => {
            println!("typecast_core ping=pong version={}", core_version());
        }
    }
}

fn coerce(request: CoerceRequest<'_>) -> Result<String, Box<dyn Error>> {
    let mut config = match request.config {
        Some(path) => TypecastConfig::load(path)?,
        None => TypecastConfig::default(),
    };
    if request.fail_on_duplicate_keys {
        config.coercion.duplicate_keys = DuplicateKeyPolicy::FailOnCollision;
    }
    if let Some(logging) = logging_config(config.logging.take(), request.log_dir, request.log_level)
    {
        init_logging(&logging)?;
    }

    let registry = Arc::new(TypeRegistry::new());
    for decl in request.structs {
        registry.register_structured(parse_struct_decl(decl)?)?;
    }
    for name in request.foreign {
        registry.register_foreign(name)?;
    }

    let options = AttributeOptions::default().with_config(config.coercion);
    let attribute = parse_type_with(request.ty, &registry, &options)?;
    attribute.finalize_deep()?;

    let input = Value::from_json(serde_json::from_str(request.json)?);
    let output = attribute.coerce(input)?;
    info!(
        "event=cli_coerce module=cli status=ok type={} output={}",
        attribute,
        output.kind_name()
    );
    Ok(output.to_json().to_string())
}

/// CLI flags override the config file; either flag alone enables logging.
fn logging_config(
    from_file: Option<LoggingConfig>,
    log_dir: Option<String>,
    log_level: Option<String>,
) -> Option<LoggingConfig> {
    if log_dir.is_none() && log_level.is_none() {
        return from_file;
    }
    let base = from_file.unwrap_or_default();
    Some(LoggingConfig::new(
        log_level.unwrap_or(base.level),
        log_dir.unwrap_or(base.log_dir),
    ))
}

fn parse_struct_decl(decl: &str) -> Result<StructuredType, String> {
    let Some((name, fields)) = decl.split_once('=') else {
        return Err(format!(
            "struct declaration `{decl}` must look like Name=field,field"
        ));
    };
    let fields: Vec<&str> = fields
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .collect();
    if fields.is_empty() {
        return Err(format!("struct declaration `{decl}` has no fields"));
    }
    Ok(StructuredType::untyped(name.trim(), fields))
}

fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
