//! Subcommand implementations.

use crate::cli::{parse_call_site, Command};
use crate::error::AppResult;
use polyglot_config::{Config, ConfigCache};
use polyglot_i18n::{
    emit_message, AstTableParser, BuildPipeline, CallSite, FormatContext, FormatterCache, Locale,
    MessageParser, MessageValues,
};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Load the parsed-message table, or an empty one that only handles plain text.
pub fn load_parser(asts: Option<&Path>) -> AppResult<Arc<dyn MessageParser>> {
    let parser = match asts {
        Some(path) => {
            let parser = AstTableParser::from_file(path)?;
            info!(path = %path.display(), messages = parser.len(), "loaded parsed messages");
            parser
        }
        None => AstTableParser::new(),
    };
    Ok(Arc::new(parser))
}

/// Apply a command line log level override through the configuration cache
pub fn apply_log_level(config: &ConfigCache, level: Option<&str>) -> AppResult<()> {
    if let Some(level) = level {
        let mut updated = Config::clone(&config.get());
        updated.logging.level = level.to_string();
        config.update(updated)?;
    }
    Ok(())
}

/// Everything one command line invocation works with
#[derive(Debug)]
pub struct App {
    config: Arc<ConfigCache>,
    pipeline: BuildPipeline,
    formatters: Arc<FormatterCache>,
}

impl App {
    /// Open the catalogs of the current configuration.
    ///
    /// One-shot runs do not watch the catalog directory.
    pub fn new(config: Arc<ConfigCache>, parser: Arc<dyn MessageParser>) -> AppResult<Self> {
        let mut snapshot = Config::clone(&config.get());
        snapshot.catalog.watch = false;
        let formatters = Arc::new(FormatterCache::from_config(&snapshot.runtime));
        let pipeline = BuildPipeline::from_config(&snapshot, parser)?;
        Ok(Self {
            config,
            pipeline,
            formatters,
        })
    }

    /// Configuration the app was opened with
    pub fn config(&self) -> Arc<Config> {
        self.config.get()
    }

    /// Run a subcommand, writing its output to `out`
    pub fn run(&self, command: &Command, out: &mut impl Write) -> AppResult<()> {
        match command {
            Command::Seed { locale, keys } => self.seed(&Locale::parse(locale)?, keys, out),
            Command::Compile { locale, calls } => {
                let calls: Vec<CallSite> = calls.iter().map(|c| parse_call_site(c)).collect();
                self.compile(&Locale::parse(locale)?, &calls, out)
            }
            Command::Build { keys } => self.build(keys, out),
            Command::Render {
                locale,
                key,
                values,
            } => self.render(&Locale::parse(locale)?, key, values, out),
        }
    }

    fn seed(&self, locale: &Locale, keys: &[String], out: &mut impl Write) -> AppResult<()> {
        let catalogs = self.pipeline.catalogs();
        for key in keys {
            writeln!(out, "{key} = {}", catalogs.get(locale, key)?)?;
        }
        let written = catalogs.flush_all()?;
        info!(locale = %locale, written, "catalogs flushed");
        Ok(())
    }

    fn compile(&self, locale: &Locale, calls: &[CallSite], out: &mut impl Write) -> AppResult<()> {
        let module = self.pipeline.compile_module(locale, calls)?;
        if let Some(import) = &module.import {
            writeln!(out, "{import}")?;
        }
        for call in &module.calls {
            writeln!(out, "{call}")?;
        }
        for skipped in &module.skipped {
            writeln!(out, "// skipped {}: {}", skipped.key, skipped.reason)?;
        }
        Ok(())
    }

    fn build(&self, keys: &[String], out: &mut impl Write) -> AppResult<()> {
        let keys = if keys.is_empty() {
            self.known_keys()?
        } else {
            keys.to_vec()
        };
        let table = self.pipeline.build_table(&keys)?;

        let mut document = serde_json::Map::new();
        for locale in self.pipeline.locales() {
            let messages: serde_json::Map<String, serde_json::Value> = keys
                .iter()
                .filter_map(|key| {
                    let message = table.get(locale, key)?;
                    Some((key.clone(), emit_message(message).into()))
                })
                .collect();
            document.insert(locale.to_string(), messages.into());
        }
        writeln!(out, "{}", serde_json::to_string_pretty(&document)?)?;
        Ok(())
    }

    fn render(&self, locale: &Locale, key: &str, values: &str, out: &mut impl Write) -> AppResult<()> {
        let message = self.pipeline.compile_key(locale, key)?;
        let values = MessageValues::from_json(serde_json::from_str(values)?);
        let ctx = FormatContext::new(locale.clone(), Arc::clone(&self.formatters));
        writeln!(out, "{}", message.render(&ctx, &values))?;
        Ok(())
    }

    /// Union of the keys of every configured locale's catalog
    fn known_keys(&self) -> AppResult<Vec<String>> {
        let mut keys = BTreeSet::new();
        for locale in self.pipeline.locales() {
            keys.extend(self.pipeline.catalogs().catalog(locale)?.entries().into_keys());
        }
        Ok(keys.into_iter().collect())
    }
}
