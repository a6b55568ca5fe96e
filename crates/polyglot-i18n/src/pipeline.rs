//! Build pipeline joining catalogs, the external parser and the compiler
//!
//! For every message call site the pipeline resolves the key through the
//! locale's catalog, hands the text to the configured [`MessageParser`],
//! compiles the AST and rewrites the call. Compiled messages are cached per
//! locale and dropped whenever that locale's catalog is reloaded.

use crate::catalog::CatalogManager;
use crate::compiler::{
    collect_helpers, compile, import_declaration, rewrite_call, AstNode, CompiledMessage,
    HelperSet,
};
use crate::error::{CompileError, CompileResult, I18nError, ParseError};
use crate::locale::Locale;
use crate::runtime::FormatContext;
use crate::value::MessageValues;
use dashmap::DashMap;
use polyglot_config::{BuildConfig, Config, ParseErrorPolicy};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::thread;
use tracing::{debug, error, info, warn};

/// External ICU message parser
pub trait MessageParser: Send + Sync {
    /// Parse message text into its AST
    fn parse(&self, source: &str) -> Result<Vec<AstNode>, ParseError>;
}

impl<F> MessageParser for F
where
    F: Fn(&str) -> Result<Vec<AstNode>, ParseError> + Send + Sync,
{
    fn parse(&self, source: &str) -> Result<Vec<AstNode>, ParseError> {
        self(source)
    }
}

/// Parser backed by ASTs produced ahead of time by an external tool.
///
/// The table maps message text to its AST in the numeric-kind JSON form.
/// Text without any `{` or `}` needs no table entry and parses as a single
/// literal.
#[derive(Debug, Clone, Default)]
pub struct AstTableParser {
    table: HashMap<String, Vec<AstNode>>,
}

impl AstTableParser {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a `{ "message text": [ast nodes] }` document
    pub fn from_json(json: &str) -> CompileResult<Self> {
        Ok(Self {
            table: serde_json::from_str(json)?,
        })
    }

    /// Read and decode a table file
    pub fn from_file(path: &Path) -> CompileResult<Self> {
        let json = std::fs::read_to_string(path).map_err(I18nError::from)?;
        Self::from_json(&json)
    }

    /// Register the AST for a message text
    pub fn insert(&mut self, source: impl Into<String>, ast: Vec<AstNode>) {
        self.table.insert(source.into(), ast);
    }

    /// Number of registered messages
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no messages are registered
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl MessageParser for AstTableParser {
    fn parse(&self, source: &str) -> Result<Vec<AstNode>, ParseError> {
        if let Some(ast) = self.table.get(source) {
            return Ok(ast.clone());
        }
        if source.contains(['{', '}']) {
            return Err(ParseError::new(format!("no parsed form for message {source:?}")));
        }
        Ok(vec![AstNode::literal(source)])
    }
}

/// A `_("key", values)` call found in source code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Literal message key
    pub key: String,
    /// Source text of the values argument, if any
    pub values: Option<String>,
}

impl CallSite {
    /// Call without a values argument
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            values: None,
        }
    }

    /// Call passing `values` source text
    #[must_use]
    pub fn with_values(mut self, values: impl Into<String>) -> Self {
        self.values = Some(values.into());
        self
    }
}

/// A message left out of a build under [`ParseErrorPolicy::Skip`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedMessage {
    /// Message key
    pub key: String,
    /// Why it was skipped
    pub reason: String,
}

/// Result of compiling one source module for one locale
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledModule {
    /// Rewritten calls, in call-site order
    pub calls: Vec<String>,
    /// Helpers the module's messages use
    pub helpers: HelperSet,
    /// Import statement for those helpers
    pub import: Option<String>,
    /// Whether any call site was rewritten
    pub uses_intl: bool,
    /// Catalog file the module depends on, for the host's watch set
    pub watch_file: Option<PathBuf>,
    /// Messages that failed to parse and were left as keys
    pub skipped: Vec<SkippedMessage>,
}

#[derive(Debug, Clone)]
struct CachedMessage {
    epoch: u64,
    message: Arc<CompiledMessage>,
}

type MessageCache = DashMap<(Locale, String), CachedMessage>;

/// Compiled messages registered ahead of time: locale, then key.
#[derive(Debug, Clone, Default)]
pub struct MessageTable {
    locales: HashMap<Locale, HashMap<String, Arc<CompiledMessage>>>,
}

impl MessageTable {
    /// Message for a key in a locale
    pub fn get(&self, locale: &Locale, key: &str) -> Option<&Arc<CompiledMessage>> {
        self.locales.get(locale)?.get(key)
    }

    /// Render a registered message in the context's locale
    pub fn render(&self, ctx: &FormatContext, key: &str, values: &MessageValues) -> Option<String> {
        self.get(ctx.locale(), key)
            .map(|message| message.render(ctx, values))
    }

    /// Registered locales
    pub fn locales(&self) -> impl Iterator<Item = &Locale> {
        self.locales.keys()
    }

    /// Number of messages registered for a locale
    pub fn len_for(&self, locale: &Locale) -> usize {
        self.locales.get(locale).map_or(0, HashMap::len)
    }
}

/// Build pass over the configured locales
pub struct BuildPipeline {
    catalogs: Arc<CatalogManager>,
    parser: Arc<dyn MessageParser>,
    locales: Vec<Locale>,
    helpers_module: String,
    on_parse_error: ParseErrorPolicy,
    cache: Arc<MessageCache>,
}

impl BuildPipeline {
    /// Create a pipeline over existing catalogs
    pub fn new(
        catalogs: Arc<CatalogManager>,
        parser: Arc<dyn MessageParser>,
        config: &BuildConfig,
    ) -> CompileResult<Self> {
        let locales = config
            .locales
            .iter()
            .map(|tag| Locale::parse(tag))
            .collect::<Result<Vec<_>, _>>()?;

        let cache: Arc<MessageCache> = Arc::new(DashMap::new());
        let weak: Weak<MessageCache> = Arc::downgrade(&cache);
        catalogs.on_reload(move |locale| {
            if let Some(cache) = weak.upgrade() {
                cache.retain(|(cached, _), _| cached != locale);
                debug!(locale = %locale, "compiled messages invalidated");
            }
        });

        Ok(Self {
            catalogs,
            parser,
            locales,
            helpers_module: config.helpers_module.clone(),
            on_parse_error: config.on_parse_error,
            cache,
        })
    }

    /// Open the configured catalog directory and create a pipeline over it
    pub fn from_config(config: &Config, parser: Arc<dyn MessageParser>) -> CompileResult<Self> {
        let catalogs = Arc::new(CatalogManager::open(&config.catalog)?);
        Self::new(catalogs, parser, &config.build)
    }

    /// Catalogs the pipeline reads from
    pub fn catalogs(&self) -> &Arc<CatalogManager> {
        &self.catalogs
    }

    /// Locales compiled by [`build_table`](Self::build_table)
    pub fn locales(&self) -> &[Locale] {
        &self.locales
    }

    /// Compile one key for one locale, reusing the cached result while the
    /// locale's catalog has not been reloaded.
    pub fn compile_key(&self, locale: &Locale, key: &str) -> CompileResult<Arc<CompiledMessage>> {
        let catalog = self.catalogs.catalog(locale)?;
        let epoch = catalog.epoch();
        let cache_key = (locale.clone(), key.to_string());
        if let Some(cached) = self.cache.get(&cache_key) {
            if cached.epoch == epoch {
                return Ok(Arc::clone(&cached.message));
            }
        }

        let text = catalog.get(key);
        let ast = self.parser.parse(&text).map_err(|source| {
            error!(locale = %locale, key, error = %source, "translation failed to parse");
            CompileError::MalformedTranslation {
                locale: locale.to_string(),
                key: key.to_string(),
                source,
            }
        })?;
        let message = Arc::new(compile(&ast)?);

        self.cache.insert(
            cache_key,
            CachedMessage {
                epoch,
                message: Arc::clone(&message),
            },
        );
        Ok(message)
    }

    /// Compile every call site of a module for one locale
    pub fn compile_module(&self, locale: &Locale, calls: &[CallSite]) -> CompileResult<CompiledModule> {
        let mut rewritten = Vec::with_capacity(calls.len());
        let mut messages = Vec::with_capacity(calls.len());
        let mut skipped = Vec::new();

        for call in calls {
            match self.resolve(locale, &call.key)? {
                Some(message) => {
                    rewritten.push(rewrite_call(&message, call.values.as_deref()));
                    messages.push(message);
                }
                None => {
                    let fallback = CompiledMessage::Constant(call.key.clone());
                    rewritten.push(rewrite_call(&fallback, call.values.as_deref()));
                    skipped.push(SkippedMessage {
                        key: call.key.clone(),
                        reason: "translation failed to parse".to_string(),
                    });
                }
            }
        }

        let helpers = collect_helpers(messages.iter().map(AsRef::as_ref));
        let uses_intl = !rewritten.is_empty();
        Ok(CompiledModule {
            import: import_declaration(&helpers, &self.helpers_module),
            helpers,
            calls: rewritten,
            uses_intl,
            watch_file: if uses_intl {
                self.catalogs.path_for(locale)
            } else {
                None
            },
            skipped,
        })
    }

    /// Compile `keys` for every configured locale, one thread per locale
    pub fn build_table(&self, keys: &[String]) -> CompileResult<MessageTable> {
        let results: Vec<CompileResult<(Locale, HashMap<String, Arc<CompiledMessage>>)>> =
            thread::scope(|scope| {
                let handles: Vec<_> = self
                    .locales
                    .iter()
                    .map(|locale| scope.spawn(move || self.compile_locale(locale, keys)))
                    .collect();
                handles
                    .into_iter()
                    .zip(&self.locales)
                    .map(|(handle, locale)| {
                        handle.join().unwrap_or_else(|_| {
                            Err(CompileError::Catalog(I18nError::IoError(std::io::Error::other(
                                format!("build worker for {locale} panicked"),
                            ))))
                        })
                    })
                    .collect()
            });

        let mut table = MessageTable::default();
        for result in results {
            let (locale, messages) = result?;
            table.locales.insert(locale, messages);
        }
        info!(locales = self.locales.len(), keys = keys.len(), "message table built");
        Ok(table)
    }

    fn compile_locale(
        &self,
        locale: &Locale,
        keys: &[String],
    ) -> CompileResult<(Locale, HashMap<String, Arc<CompiledMessage>>)> {
        let mut messages = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(message) = self.resolve(locale, key)? {
                messages.insert(key.clone(), message);
            }
        }
        debug!(locale = %locale, messages = messages.len(), "locale compiled");
        Ok((locale.clone(), messages))
    }

    /// Apply the parse error policy: `None` means the message was skipped.
    fn resolve(&self, locale: &Locale, key: &str) -> CompileResult<Option<Arc<CompiledMessage>>> {
        match self.compile_key(locale, key) {
            Ok(message) => Ok(Some(message)),
            Err(e @ CompileError::MalformedTranslation { .. })
                if self.on_parse_error == ParseErrorPolicy::Skip =>
            {
                warn!(error = %e, "skipping message");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for BuildPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildPipeline")
            .field("locales", &self.locales)
            .field("helpers_module", &self.helpers_module)
            .field("on_parse_error", &self.on_parse_error)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}
