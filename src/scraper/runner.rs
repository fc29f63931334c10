use crate::scraper::{
    Result, ScraperError,
    cache::ResponseCache,
    catalog::{AddonKind, ScraperInfo},
    program::ScraperProgram,
    provider::{AddonRegistry, ExpressionEngine, HttpFetcher, ParseContext},
    url::{ScraperUrl, UrlEntry},
    xml::{XmlDocument, XmlElement},
};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

/// Maximum number of parameters handed to the expression engine
pub const MAX_SCRAPER_BUFFERS: usize = 20;

/// Implicit dependency of every scraper; never merged
const METADATA_DEPENDENCY: &str = "xbmc.metadata";

/// Functions for which an empty result is a normal outcome
const OPTIONAL_RESULT_FUNCTIONS: &[&str] = &["NfoUrl", "ResolveIDToUrl"];

/// Executes scraper functions and follows the chains in their output
pub struct ScraperRunner {
    info: ScraperInfo,
    engine: Arc<dyn ExpressionEngine>,
    registry: Arc<dyn AddonRegistry>,
    cache_root: PathBuf,
    cache: ResponseCache,
    settings: HashMap<String, String>,
    program: OnceCell<Option<ScraperProgram>>,
}

impl ScraperRunner {
    pub fn new(
        info: ScraperInfo,
        engine: Arc<dyn ExpressionEngine>,
        registry: Arc<dyn AddonRegistry>,
        cache_root: &Path,
    ) -> Self {
        let cache = ResponseCache::new(cache_root, &info.id);
        Self {
            info,
            engine,
            registry,
            cache_root: cache_root.to_path_buf(),
            cache,
            settings: HashMap::new(),
            program: OnceCell::new(),
        }
    }

    pub fn info(&self) -> &ScraperInfo {
        &self.info
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn settings(&self) -> &HashMap<String, String> {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.settings
    }

    /// Unloaded copy sharing engine, registry and cache location
    pub(crate) fn fresh(&self, info: ScraperInfo) -> Self {
        Self {
            cache: ResponseCache::new(&self.cache_root, &info.id),
            cache_root: self.cache_root.clone(),
            info,
            engine: Arc::clone(&self.engine),
            registry: Arc::clone(&self.registry),
            settings: self.settings.clone(),
            program: OnceCell::new(),
        }
    }

    /// Load the program and its library dependencies.
    ///
    /// Runs once; the outcome is kept for the lifetime of the runner.
    pub async fn load(&self) -> bool {
        self.program
            .get_or_init(|| async {
                match self.load_program().await {
                    Ok(program) => {
                        info!("Loaded scraper {}", self.info.id);
                        Some(program)
                    }
                    Err(e) => {
                        warn!("Failed to load scraper {}: {}", self.info.id, e);
                        None
                    }
                }
            })
            .await
            .is_some()
    }

    /// Whether a load has been attempted and succeeded
    pub fn is_loaded(&self) -> bool {
        matches!(self.program.get(), Some(Some(_)))
    }

    /// The loaded program; `Aborted` when loading failed
    pub async fn program(&self) -> Result<&ScraperProgram> {
        self.load().await;
        self.program
            .get()
            .and_then(Option::as_ref)
            .ok_or(ScraperError::Aborted)
    }

    async fn load_program(&self) -> Result<ScraperProgram> {
        let mut program = ScraperProgram::load_file(&self.info.program_path).await?;

        // Only direct dependencies are considered
        for dependency in &self.info.dependencies {
            if dependency.id == METADATA_DEPENDENCY {
                continue;
            }

            match self.registry.addon(&dependency.id) {
                Some(addon) if addon.kind == AddonKind::ScraperLibrary => {
                    let library = ScraperProgram::load_file(&addon.program_path).await?;
                    program.merge(&library);
                    debug!("Merged scraper library {} into {}", addon.id, self.info.id);
                }
                Some(_) => {}
                None if dependency.optional => {
                    debug!(
                        "Optional dependency {} of {} is not installed",
                        dependency.id, self.info.id
                    );
                }
                None => {
                    return Err(ScraperError::Load(format!(
                        "required dependency {} is not installed",
                        dependency.id
                    )));
                }
            }
        }

        Ok(program)
    }

    /// Run a scraper function and every chain its output refers to.
    ///
    /// Returns the function's own XML first, followed by the fragments of
    /// each chained call in document order.
    pub async fn run(
        &self,
        function: &str,
        url: &ScraperUrl,
        http: &dyn HttpFetcher,
        extras: &[String],
    ) -> Result<Vec<String>> {
        let program = self.program().await?;

        let mut params = Vec::with_capacity(url.entries.len() + extras.len());
        for entry in &url.entries {
            let body = self.fetch(entry, http).await?;
            if body.is_empty() {
                warn!("{}: empty response from {}", function, entry.url);
                return Err(ScraperError::Aborted);
            }
            params.push(body);
        }
        params.extend(extras.iter().cloned());

        if params.len() > MAX_SCRAPER_BUFFERS {
            warn!(
                "{}: {} parameters given, only {} are passed",
                function,
                params.len(),
                MAX_SCRAPER_BUFFERS
            );
            params.truncate(MAX_SCRAPER_BUFFERS);
        }

        let context = ParseContext {
            program,
            function,
            params: &params,
            scraper_id: &self.info.id,
            language: &self.info.language,
            settings: &self.settings,
        };
        let text = self.engine.parse(&context);
        debug!("{}: {} returned {} bytes", self.info.id, function, text.len());

        if text.is_empty() {
            if OPTIONAL_RESULT_FUNCTIONS.contains(&function) {
                debug!("{}: {} produced no result", self.info.id, function);
            } else {
                error!("{}: {} produced no result", self.info.id, function);
            }
            return Err(ScraperError::Aborted);
        }

        let doc = XmlDocument::parse(&text).map_err(|e| {
            error!("{}: unable to parse output of {}: {}", self.info.id, function, e);
            ScraperError::Aborted
        })?;

        let mut fragments = vec![text];
        if let Some(root) = doc.root() {
            for link in root.elements().filter(|e| is_chain_link(e)) {
                let Some(next) = link.attr("function") else {
                    continue;
                };

                let (next_url, next_extras) = chain_arguments(link);
                let chained = self.run_no_throw(next, &next_url, http, &next_extras).await?;
                fragments.extend(chained);
            }
        }

        Ok(fragments)
    }

    /// [`run`](Self::run) with aborts turned into an empty result.
    ///
    /// User-visible errors still propagate.
    pub fn run_no_throw<'a>(
        &'a self,
        function: &'a str,
        url: &'a ScraperUrl,
        http: &'a dyn HttpFetcher,
        extras: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        async move {
            match self.run(function, url, http, extras).await {
                Ok(fragments) => Ok(fragments),
                Err(e) if e.is_aborted() => {
                    debug!("{}: {} aborted: {}", self.info.id, function, e);
                    Ok(Vec::new())
                }
                Err(e) => Err(e),
            }
        }
        .boxed()
    }

    /// Body of one URL entry, served from the response cache when possible
    async fn fetch(&self, entry: &UrlEntry, http: &dyn HttpFetcher) -> Result<String> {
        if let Some(name) = entry.cache.as_deref()
            && let Some(body) = self.cache.load(name).await
        {
            return Ok(body);
        }

        let body = http.fetch(entry).await?;

        if let Some(name) = entry.cache.as_deref()
            && !body.is_empty()
            && let Err(e) = self.cache.store(name, &body).await
        {
            warn!("Failed to cache response for {}: {}", entry.url, e);
        }

        Ok(body)
    }
}

fn is_chain_link(element: &XmlElement) -> bool {
    element.name == "url" || element.name == "chain"
}

/// URL and extra parameters for a chained call.
///
/// `<chain>` passes its text as the single parameter; `<url>` is fetched.
fn chain_arguments(link: &XmlElement) -> (ScraperUrl, Vec<String>) {
    if link.name == "chain" {
        let extras = link.first_text().map(str::to_string).into_iter().collect();
        (ScraperUrl::new(), extras)
    } else {
        (ScraperUrl::from_element(link), Vec::new())
    }
}
