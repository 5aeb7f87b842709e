//! schemaviz CLI library
//!
//! This module contains the core CLI logic: it reads a schema file, builds
//! the schema graph and writes the rendered diagram.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, info};
use tempfile::NamedTempFile;

use schemaviz::{
    SchemaVizError, Visualizer,
    config::{AppConfig, BuildOptions},
    export::{OutputFormat, graphviz::GraphvizSink},
    source::SourceError,
};

/// Run the schemaviz CLI application
///
/// The output format and the configured style are validated first, so an
/// unsupported option fails before the schema is read. The diagram is written to `FILENAME.EXT`; the
/// target file is only replaced once rendering has succeeded.
///
/// # Errors
///
/// Returns `SchemaVizError` for:
/// - Unsupported output formats or style settings
/// - Configuration loading errors
/// - An unreadable schema file
/// - Schema parse errors
/// - Graph building and rendering errors
pub fn run(args: &Args) -> Result<(), SchemaVizError> {
    let format: OutputFormat = args.output.parse()?;
    if let Some(server) = &args.server {
        return Err(SchemaVizError::UnsupportedOption(format!(
            "server address `{server}`: live connections are not supported, \
             pass an exported schema file instead"
        )));
    }

    info!(
        schema_path = args.schema,
        database = args.database,
        format:% = format;
        "Processing schema"
    );

    let app_config = apply_overrides(config::load_config(args.config.as_ref())?, args);
    debug!(build:? = app_config.build(); "Effective build options");

    let visualizer = Visualizer::new(app_config);
    let style = visualizer.style()?;

    let source = fs::read_to_string(&args.schema)
        .map_err(|err| SourceError::unavailable(format!("{}: {err}", args.schema)))?;

    let schema = visualizer.parse(&source)?;
    let graph = visualizer.build_graph(&schema)?;
    let bytes =
        visualizer.render_styled(&graph, &args.database, &style, &GraphvizSink::new(format))?;

    let output = output_path(&args.filename, format);
    write_atomically(&output, &bytes)?;

    info!(output_file = output.display().to_string(); "Diagram exported successfully");

    Ok(())
}

/// Apply the `--attributes` and `--roles` toggles on top of the loaded configuration.
fn apply_overrides(config: AppConfig, args: &Args) -> AppConfig {
    let build = config.build();
    let options = BuildOptions::new(
        args.attributes.unwrap_or(build.include_ownership()),
        args.roles.unwrap_or(build.include_roles()),
    );
    config.with_build(options)
}

fn output_path(filename: &str, format: OutputFormat) -> PathBuf {
    PathBuf::from(format!("{filename}.{}", format.extension()))
}

/// Write `bytes` to a temporary file next to `path`, then move it into place.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), SchemaVizError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_output_path_appends_extension() {
        assert_eq!(
            output_path("out/diagram", OutputFormat::Svg),
            PathBuf::from("out/diagram.svg")
        );
        assert_eq!(
            output_path("schema_diagram", OutputFormat::Png),
            PathBuf::from("schema_diagram.png")
        );
    }

    #[test]
    fn test_overrides_only_replace_given_toggles() {
        let args = Args::parse_from(["schemaviz", "s.tql", "-r", "false"]);
        let config = AppConfig::default().with_build(BuildOptions::new(false, true));

        let config = apply_overrides(config, &args);

        assert!(!config.build().include_ownership());
        assert!(!config.build().include_roles());
    }

    #[test]
    fn test_unsupported_format_fails_before_reading_schema() {
        let args = Args::parse_from(["schemaviz", "does/not/exist.tql", "-o", "pdf"]);

        assert!(matches!(
            run(&args),
            Err(SchemaVizError::UnsupportedOption(_))
        ));
    }

    #[test]
    fn test_server_address_is_unsupported() {
        let args = Args::parse_from(["schemaviz", "schema.tql", "-s", "localhost:1729"]);

        assert!(matches!(
            run(&args),
            Err(SchemaVizError::UnsupportedOption(msg)) if msg.contains("localhost:1729")
        ));
    }

    #[test]
    fn test_invalid_color_fails_before_reading_schema() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.toml");
        fs::write(&config, "[style]\nrole_color = \"greenish\"\n").unwrap();
        let args = Args::parse_from([
            "schemaviz",
            "does/not/exist.tql",
            "-o",
            "dot",
            "-c",
            config.to_str().unwrap(),
        ]);

        assert!(matches!(
            run(&args),
            Err(SchemaVizError::UnsupportedOption(_))
        ));
    }

    #[test]
    fn test_missing_schema_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let filename = dir.path().join("out");
        let args = Args::parse_from([
            "schemaviz",
            "does/not/exist.tql",
            "-o",
            "dot",
            "-f",
            filename.to_str().unwrap(),
        ]);

        assert!(matches!(
            run(&args),
            Err(SchemaVizError::SourceUnavailable(_))
        ));
        assert!(!dir.path().join("out.dot").exists());
    }

    #[test]
    fn test_write_atomically_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diagram.dot");
        fs::write(&path, "old").unwrap();

        write_atomically(&path, b"digraph {}").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "digraph {}");
    }
}
