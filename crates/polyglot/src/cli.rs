//! Command line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Compile ICU messages from self-healing translation catalogs
#[derive(Parser, Debug)]
#[command(name = "polyglot", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "polyglot.toml")]
    pub config: PathBuf,

    /// Override the configured log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Parsed-message table produced by the external ICU parser
    #[arg(long, global = true)]
    pub asts: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Look up keys, seeding missing ones into the catalog
    Seed {
        /// Locale tag
        #[arg(short = 'L', long)]
        locale: String,
        /// Message keys
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Rewrite message calls for one locale and print the generated code
    Compile {
        /// Locale tag
        #[arg(short = 'L', long)]
        locale: String,
        /// Call sites as `key` or `key=values-expression`
        #[arg(required = true)]
        calls: Vec<String>,
    },

    /// Compile keys for every configured locale and print a summary
    Build {
        /// Message keys; defaults to every key of the configured locales
        keys: Vec<String>,
    },

    /// Render one message with the runtime
    Render {
        /// Locale tag
        #[arg(short = 'L', long)]
        locale: String,
        /// Message key
        key: String,
        /// Message values as a JSON object
        #[arg(long, default_value = "{}")]
        values: String,
    },
}

/// Split a `key=values` call argument.
pub fn parse_call_site(raw: &str) -> polyglot_i18n::CallSite {
    match raw.split_once('=') {
        Some((key, values)) => polyglot_i18n::CallSite::new(key.trim()).with_values(values.trim()),
        None => polyglot_i18n::CallSite::new(raw.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render() {
        let cli = Cli::try_parse_from([
            "polyglot", "--asts", "asts.json", "render", "-L", "fr", "items", "--values", r#"{"count":2}"#,
        ])
        .unwrap();
        assert_eq!(cli.asts, Some(PathBuf::from("asts.json")));
        assert_eq!(
            cli.command,
            Command::Render {
                locale: "fr".into(),
                key: "items".into(),
                values: r#"{"count":2}"#.into(),
            }
        );
    }

    #[test]
    fn test_call_site_argument() {
        let site = parse_call_site("items={ count }");
        assert_eq!(site.key, "items");
        assert_eq!(site.values.as_deref(), Some("{ count }"));
        assert_eq!(parse_call_site("title").values, None);
    }
}
