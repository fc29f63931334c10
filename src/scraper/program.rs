use crate::scraper::{
    Result, ScraperError,
    xml::{XmlDocument, XmlElement},
};
use std::path::Path;

const SEARCH_FUNCTIONS: &[&str] = &[
    "CreateSearchUrl",
    "CreateArtistSearchUrl",
    "CreateAlbumSearchUrl",
];

/// Declarative scraper program: a `<scraper>` document whose children are the
/// named functions evaluated by the expression engine
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperProgram {
    root: XmlElement,
}

impl ScraperProgram {
    /// Parse program text. The root element must be `<scraper>`.
    pub fn parse(text: &str) -> Result<Self> {
        let doc = XmlDocument::parse(text)?;
        let root = doc
            .roots
            .into_iter()
            .next()
            .filter(|r| r.name == "scraper")
            .ok_or_else(|| ScraperError::Load("missing <scraper> root".to_string()))?;

        Ok(Self { root })
    }

    /// Read and parse a program file
    pub async fn load_file(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::parse(&text)
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Definition of a function; the first definition wins
    pub fn function(&self, name: &str) -> Option<&XmlElement> {
        self.root.child(name)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.function(name).is_some()
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.root.elements().map(|e| e.name.as_str())
    }

    /// Append a library's functions after our own.
    ///
    /// Functions this program already defines keep their definition.
    pub fn merge(&mut self, library: &ScraperProgram) {
        for function in library.root.elements() {
            if !self.has_function(&function.name) {
                self.root.push_child(function.clone());
            }
        }
    }

    /// A program without any search entry point does nothing
    pub fn is_noop(&self) -> bool {
        !SEARCH_FUNCTIONS.iter().any(|f| self.has_function(f))
    }

    /// Charset search terms must be converted to before URL encoding
    pub fn search_string_encoding(&self, function: &str) -> &str {
        self.function(function)
            .and_then(|f| f.attr("SearchStringEncoding"))
            .filter(|e| !e.is_empty())
            .unwrap_or("UTF-8")
    }
}
