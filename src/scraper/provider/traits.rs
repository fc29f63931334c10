use crate::scraper::{
    Result,
    catalog::AddonInfo,
    program::ScraperProgram,
    url::UrlEntry,
};
use async_trait::async_trait;
use std::collections::HashMap;

/// Fetches URL entries for the runner
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Fetch the body of one URL entry, honouring its spoof/post/gzip hints
    async fn fetch(&self, entry: &UrlEntry) -> Result<String>;

    /// Abort the transfer currently in flight
    fn cancel(&self) {}

    /// Re-arm the client after a cancel
    fn reset(&self) {}
}

/// Everything the expression engine sees for one function call
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub program: &'a ScraperProgram,
    pub function: &'a str,
    /// Positional buffers: fetched URL bodies first, then extra parameters
    pub params: &'a [String],
    pub scraper_id: &'a str,
    pub language: &'a str,
    pub settings: &'a HashMap<String, String>,
}

/// The scraper expression evaluator.
///
/// Takes a function of the declarative program plus its parameters and
/// returns the XML text it produces, or an empty string on failure.
pub trait ExpressionEngine: Send + Sync {
    fn parse(&self, context: &ParseContext<'_>) -> String;
}

/// Lookup of installed addons used for dependency loading
pub trait AddonRegistry: Send + Sync {
    fn addon(&self, id: &str) -> Option<AddonInfo>;
}

/// In-memory registry
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    addons: HashMap<String, AddonInfo>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: register an addon
    #[must_use]
    pub fn with_addon(mut self, addon: AddonInfo) -> Self {
        self.insert(addon);
        self
    }

    pub fn insert(&mut self, addon: AddonInfo) {
        self.addons.insert(addon.id.clone(), addon);
    }
}

impl AddonRegistry for StaticRegistry {
    fn addon(&self, id: &str) -> Option<AddonInfo> {
        self.addons.get(id).cloned()
    }
}
