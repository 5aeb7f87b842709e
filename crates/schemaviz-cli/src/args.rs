//! Command-line argument definitions for the schemaviz CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the schema file, the output format and
//! filename, the diagram name, which optional edges are drawn, the
//! configuration file and the logging verbosity.

use clap::{Parser, builder::BoolishValueParser};

/// Command-line arguments for the schemaviz diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the exported TypeQL schema (`define` statements)
    #[arg(help = "Path to the schema file")]
    pub schema: String,

    /// Output format (png, svg or dot)
    #[arg(short, long, default_value = "png")]
    pub output: String,

    /// Output filename without extension
    #[arg(short, long, default_value = "schema_diagram")]
    pub filename: String,

    /// Database server address; live connections are not supported, export
    /// the schema and pass the file instead
    #[arg(short, long)]
    pub server: Option<String>,

    /// Database name, used as the diagram name
    #[arg(short, long, default_value = "test")]
    pub database: String,

    /// Draw ownership edges (overrides the configuration file)
    #[arg(short, long, value_parser = BoolishValueParser::new())]
    pub attributes: Option<bool>,

    /// Draw role edges (overrides the configuration file)
    #[arg(short, long, value_parser = BoolishValueParser::new())]
    pub roles: Option<bool>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["schemaviz", "schema.tql"]).unwrap();

        assert_eq!(args.schema, "schema.tql");
        assert_eq!(args.output, "png");
        assert_eq!(args.filename, "schema_diagram");
        assert_eq!(args.database, "test");
        assert_eq!(args.attributes, None);
        assert_eq!(args.roles, None);
        assert_eq!(args.server, None);
    }

    #[test]
    fn test_boolish_toggles() {
        let args =
            Args::try_parse_from(["schemaviz", "s.tql", "-a", "No", "-r", "ON"]).unwrap();

        assert_eq!(args.attributes, Some(false));
        assert_eq!(args.roles, Some(true));

        let args = Args::try_parse_from(["schemaviz", "s.tql", "-a", "0", "-r", "yes"]).unwrap();
        assert_eq!(args.attributes, Some(false));
        assert_eq!(args.roles, Some(true));
    }

    #[test]
    fn test_invalid_toggle_rejected() {
        assert!(Args::try_parse_from(["schemaviz", "s.tql", "-a", "maybe"]).is_err());
    }

    #[test]
    fn test_schema_required() {
        assert!(Args::try_parse_from(["schemaviz"]).is_err());
    }
}
