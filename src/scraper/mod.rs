mod cache;
mod catalog;
mod matcher;
mod parser;
mod program;
mod provider;
mod runner;
mod types;
mod url;
mod writer;
pub mod xml;


pub use cache::ResponseCache;
pub use catalog::{AddonInfo, AddonKind, ContentType, Dependency, Scraper, ScraperInfo};
pub use matcher::{Matcher, Ranked};
pub use parser::{CleanedTitle, Parser};
pub use program::ScraperProgram;
pub use provider::{
    AddonRegistry, ExpressionEngine, HttpClient, HttpFetcher, ParseContext, StaticRegistry,
};
pub use runner::{MAX_SCRAPER_BUFFERS, ScraperRunner};
pub use types::{
    AlbumCandidate, AlbumInfo, ArtistCandidate, ArtistInfo, CastMember, EpisodeGuideEntry,
    TrackInfo, VideoDetails, XmlLoadable,
};
pub use url::{ScraperUrl, UrlEntry, UrlKind};
pub use writer::Writer;

/// Scraper result type
pub type Result<T> = std::result::Result<T, ScraperError>;

/// Scraper error types
///
/// Everything except [`ScraperError::UserVisible`] counts as an abort: the
/// caller sees "no data" once the error reaches a no-throw boundary. A
/// user-visible error carries the scraper author's own title and message and
/// always travels up to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("Scraper aborted")]
    Aborted,

    #[error("{title}: {message}")]
    UserVisible { title: String, message: String },

    #[error("Load error: {0}")]
    Load(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScraperError {
    /// Build the user-visible error for an `<error>` response root
    pub fn user_visible(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UserVisible {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Whether this error is absorbed at a no-throw boundary
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        !matches!(self, Self::UserVisible { .. })
    }
}

/// Raise a user-visible error when a response root is `<error>`
pub(crate) fn check_scraper_error(root: &xml::XmlElement) -> Result<()> {
    if root.name != "error" {
        return Ok(());
    }

    let title = root.child_text("title").unwrap_or_default();
    let message = root.child_text("message").unwrap_or_default();
    Err(ScraperError::user_visible(title, message))
}
