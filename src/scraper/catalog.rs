use crate::scraper::{
    Result, ScraperError, check_scraper_error,
    matcher::Matcher,
    parser::Parser,
    program::ScraperProgram,
    provider::{AddonRegistry, ExpressionEngine, HttpFetcher},
    runner::ScraperRunner,
    types::{
        AlbumCandidate, AlbumInfo, ArtistCandidate, ArtistInfo, EpisodeGuideEntry, VideoDetails,
        XmlLoadable,
    },
    url::ScraperUrl,
    xml::{XmlDocument, XmlElement},
};
use encoding_rs::{Encoding, UTF_8};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Cache persistence used when an addon does not declare one
pub const DEFAULT_PERSISTENCE: Duration = Duration::from_secs(24 * 60 * 60);

/// Media category a scraper produces metadata for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    None,
    Albums,
    Artists,
    Movies,
    TvShows,
    MusicVideos,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Albums => "albums",
            Self::Artists => "artists",
            Self::Movies => "movies",
            Self::TvShows => "tvshows",
            Self::MusicVideos => "musicvideos",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "albums" => Ok(Self::Albums),
            "artists" => Ok(Self::Artists),
            "movies" => Ok(Self::Movies),
            "tvshows" => Ok(Self::TvShows),
            "musicvideos" => Ok(Self::MusicVideos),
            other => Err(ScraperError::Config(format!("unknown content type '{other}'"))),
        }
    }
}

/// Addon subtypes known to the scraper engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AddonKind {
    ScraperMovies,
    ScraperTvShows,
    ScraperMusicVideos,
    ScraperAlbums,
    ScraperArtists,
    /// Shared functions merged into dependent scrapers
    ScraperLibrary,
    #[default]
    Other,
}

impl AddonKind {
    /// Content a scraper of this kind handles
    pub fn content(&self) -> Option<ContentType> {
        match self {
            Self::ScraperMovies => Some(ContentType::Movies),
            Self::ScraperTvShows => Some(ContentType::TvShows),
            Self::ScraperMusicVideos => Some(ContentType::MusicVideos),
            Self::ScraperAlbums => Some(ContentType::Albums),
            Self::ScraperArtists => Some(ContentType::Artists),
            Self::ScraperLibrary | Self::Other => None,
        }
    }
}

/// A declared addon dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,
    pub optional: bool,
}

impl Dependency {
    pub fn required(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            optional: false,
        }
    }

    pub fn optional(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            optional: true,
        }
    }
}

/// An installed addon as seen by the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    pub kind: AddonKind,
    /// Declarative program file
    pub program_path: PathBuf,
    pub dependencies: Vec<Dependency>,
    pub language: String,
    pub requires_settings: bool,
    /// How long cached responses stay valid
    pub persistence: Duration,
}

impl AddonInfo {
    pub fn new(id: impl Into<String>, kind: AddonKind, program_path: impl Into<PathBuf>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            version: "1.0.0".to_string(),
            kind,
            program_path: program_path.into(),
            dependencies: Vec::new(),
            language: "en".to_string(),
            requires_settings: false,
            persistence: DEFAULT_PERSISTENCE,
        }
    }

    /// Builder pattern: add a dependency
    #[must_use]
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Builder pattern: set the language
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Builder pattern: set the cache persistence
    #[must_use]
    pub fn with_persistence(mut self, persistence: Duration) -> Self {
        self.persistence = persistence;
        self
    }

    /// Builder pattern: mark the addon as needing user settings
    #[must_use]
    pub fn with_requires_settings(mut self, requires_settings: bool) -> Self {
        self.requires_settings = requires_settings;
        self
    }
}

/// Metadata of one scraper bound to a content type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    pub content: ContentType,
    pub language: String,
    pub requires_settings: bool,
    pub persistence: Duration,
    pub program_path: PathBuf,
    pub dependencies: Vec<Dependency>,
}

impl ScraperInfo {
    pub fn from_addon(addon: &AddonInfo, content: ContentType) -> Self {
        Self {
            id: addon.id.clone(),
            name: addon.name.clone(),
            version: addon.version.clone(),
            content,
            language: addon.language.clone(),
            requires_settings: addon.requires_settings,
            persistence: addon.persistence,
            program_path: addon.program_path.clone(),
            dependencies: addon.dependencies.clone(),
        }
    }
}

/// A scraper addon: typed search and detail operations over a [`ScraperRunner`]
pub struct Scraper {
    kind: AddonKind,
    runner: ScraperRunner,
}

impl Scraper {
    pub fn new(
        addon: &AddonInfo,
        content: ContentType,
        engine: Arc<dyn ExpressionEngine>,
        registry: Arc<dyn AddonRegistry>,
        cache_root: &Path,
    ) -> Self {
        let info = ScraperInfo::from_addon(addon, content);
        Self {
            kind: addon.kind,
            runner: ScraperRunner::new(info, engine, registry, cache_root),
        }
    }

    pub fn info(&self) -> &ScraperInfo {
        self.runner.info()
    }

    pub fn id(&self) -> &str {
        &self.info().id
    }

    pub fn content(&self) -> ContentType {
        self.info().content
    }

    pub fn language(&self) -> &str {
        &self.info().language
    }

    pub fn kind(&self) -> AddonKind {
        self.kind
    }

    pub fn runner(&self) -> &ScraperRunner {
        &self.runner
    }

    /// Whether this scraper's addon kind provides the given content
    pub fn supports(&self, content: ContentType) -> bool {
        self.kind.content() == Some(content)
    }

    pub fn requires_settings(&self) -> bool {
        self.info().requires_settings
    }

    /// User settings passed to the expression engine
    pub fn settings(&self) -> &HashMap<String, String> {
        self.runner.settings()
    }

    pub fn set_setting(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.runner.settings_mut().insert(key.into(), value.into());
    }

    /// Deep copy for another content type; the copy loads its program anew
    pub fn clone_for(&self, content: ContentType) -> Self {
        let mut info = self.info().clone();
        info.content = content;
        Self {
            kind: self.kind,
            runner: self.runner.fresh(info),
        }
    }

    /// Load the program once; later calls return the cached outcome
    pub async fn load(&self) -> bool {
        self.runner.load().await
    }

    async fn program(&self) -> Result<&ScraperProgram> {
        self.runner.program().await
    }

    /// Whether the program has no search entry point at all
    pub async fn is_noop(&self) -> Result<bool> {
        Ok(self.program().await?.is_noop())
    }

    /// Delete cached responses older than the scraper's persistence
    pub fn clear_cache(&self) -> Result<usize> {
        self.runner.cache().clear_expired(self.info().persistence)
    }

    /// Resolve the URL described by the contents of an NFO file
    pub async fn nfo_url(&self, http: &dyn HttpFetcher, nfo_contents: &str) -> Result<ScraperUrl> {
        self.resolve_url(http, "NfoUrl", nfo_contents).await
    }

    /// Resolve the URL for an identifier at the scraped site
    pub async fn resolve_id_to_url(&self, http: &dyn HttpFetcher, external_id: &str) -> Result<ScraperUrl> {
        self.resolve_url(http, "ResolveIDToUrl", external_id).await
    }

    /// Run a URL-resolving function and pick the first terminal URL.
    ///
    /// Output may be `<details><url/><id/></details>` or loose `<url/><id/>`
    /// siblings. URLs carrying a `function` attribute were already followed
    /// by the runner and are skipped.
    async fn resolve_url(&self, http: &dyn HttpFetcher, function: &str, input: &str) -> Result<ScraperUrl> {
        let mut resolved = ScraperUrl::new();
        if self.is_noop().await? {
            return Ok(resolved);
        }

        let extras = [input.to_string()];
        let fragments = self
            .runner
            .run_no_throw(function, &ScraperUrl::new(), http, &extras)
            .await?;
        if fragments.len() > 1 {
            warn!("{}: {} returned multiple results; using first", self.id(), function);
        }

        for fragment in &fragments {
            let Ok(doc) = XmlDocument::parse(fragment) else {
                continue;
            };
            let Some(root) = doc.root() else {
                continue;
            };
            check_scraper_error(root)?;

            let (url, id) = if root.name == "details" {
                (root.child("url"), root.child("id"))
            } else {
                (doc.first_child("url"), doc.first_child("id"))
            };

            if let Some(id) = id.and_then(XmlElement::first_text) {
                resolved.id = id.to_string();
            }

            match url {
                Some(url) if url.attr("function").is_some() => continue,
                Some(url) => {
                    resolved.parse_element(url);
                }
                None => continue,
            }
            break;
        }

        Ok(resolved)
    }

    /// Search for a movie, TV show or music video by title.
    ///
    /// `first` marks the first attempt with the raw title; retries replace
    /// dashes with spaces and leave out the year.
    pub async fn find_movie(
        &self,
        http: &dyn HttpFetcher,
        title: &str,
        year: Option<i32>,
        first: bool,
    ) -> Result<Vec<ScraperUrl>> {
        let cleaned = Parser::clean_title(title, true, first);
        debug!(
            "Searching for '{}' using {} scraper (content: '{}', version: '{}')",
            cleaned.title,
            self.id(),
            self.content(),
            self.info().version
        );

        let program = self.program().await?;
        if program.is_noop() {
            return Ok(Vec::new());
        }

        let mut search_title = cleaned.title.clone();
        if !first {
            search_title = search_title.replace('-', " ");
        }
        let search_title = search_title.to_lowercase();
        let year = year.or(cleaned.year);

        let mut extras = vec![encode_search_term(program, "CreateSearchUrl", &search_title)];
        if first && let Some(year) = year {
            extras.push(year.to_string());
        }

        let fragments = self
            .runner
            .run("CreateSearchUrl", &ScraperUrl::new(), http, &extras)
            .await?;
        let Some(search) = fragments.first() else {
            debug!("{}: CreateSearchUrl failed", self.id());
            return Err(ScraperError::Aborted);
        };
        let mut search_url = ScraperUrl::new();
        search_url.parse_string(search);

        let extras = vec![search_url.first_url().unwrap_or_default().to_string()];
        let fragments = self
            .runner
            .run("GetSearchResults", &search_url, http, &extras)
            .await?;

        let mut sort = true;
        let mut seen_results = false;
        let mut candidates = Vec::new();

        for fragment in &fragments {
            let Ok(doc) = XmlDocument::parse(fragment) else {
                error!("{}: unable to parse search results", self.id());
                continue;
            };
            if let Some(root) = doc.root() {
                check_scraper_error(root)?;
            }
            let Some(results) = doc.first_child("results") else {
                continue;
            };
            seen_results = true;

            if sort && let Some(sorted) = results.attr("sorted") {
                sort = !sorted.eq_ignore_ascii_case("yes");
            }

            for entity in results.children_named("entity") {
                if let Some(candidate) = movie_candidate(entity, &search_title, year) {
                    candidates.push(candidate);
                }
            }
        }

        if !seen_results {
            return Err(ScraperError::Aborted);
        }

        let mut candidates = Matcher::dedup(candidates);
        if sort {
            Matcher::stable_sort(&mut candidates);
        }
        Ok(candidates)
    }

    /// Search for an album
    pub async fn find_album(
        &self,
        http: &dyn HttpFetcher,
        album: &str,
        artist: &str,
    ) -> Result<Vec<AlbumCandidate>> {
        debug!("Searching for album '{}' by '{}' using {}", album, artist, self.id());

        let program = self.program().await?;
        if program.is_noop() {
            return Ok(Vec::new());
        }

        let extras = vec![
            encode_search_term(program, "CreateAlbumSearchUrl", album),
            encode_search_term(program, "CreateAlbumSearchUrl", artist),
        ];
        let Some(search_url) = self
            .search_url(http, "CreateAlbumSearchUrl", &extras)
            .await?
        else {
            return Ok(Vec::new());
        };

        let fragments = self
            .runner
            .run_no_throw("GetAlbumSearchResults", &search_url, http, &[])
            .await?;

        let mut candidates = Vec::new();
        for entity in search_entities(&fragments)? {
            let Some(title) = entity.child_text("title").filter(|t| !t.is_empty()) else {
                continue;
            };
            let url = entity_urls(&entity, &search_url);
            if url.is_empty() {
                continue;
            }

            let artist = entity.child_text("artist").unwrap_or_default();
            let year = entity.child_text("year").and_then(|y| y.trim().parse().ok());
            candidates.push(
                AlbumCandidate::new(title, artist, url)
                    .with_year(year)
                    .with_relevance(entity_relevance(&entity)),
            );
        }

        Ok(Matcher::rank(candidates))
    }

    /// Search for an artist
    pub async fn find_artist(&self, http: &dyn HttpFetcher, artist: &str) -> Result<Vec<ArtistCandidate>> {
        debug!("Searching for artist '{}' using {}", artist, self.id());

        let program = self.program().await?;
        if program.is_noop() {
            return Ok(Vec::new());
        }

        let extras = vec![encode_search_term(program, "CreateArtistSearchUrl", artist)];
        let Some(search_url) = self
            .search_url(http, "CreateArtistSearchUrl", &extras)
            .await?
        else {
            return Ok(Vec::new());
        };

        let fragments = self
            .runner
            .run_no_throw("GetArtistSearchResults", &search_url, http, &[])
            .await?;

        let mut candidates = Vec::new();
        for entity in search_entities(&fragments)? {
            let Some(name) = entity.child("title").and_then(XmlElement::first_text) else {
                continue;
            };
            let url = entity_urls(&entity, &search_url);
            if url.is_empty() {
                continue;
            }

            let genre = entity.child_text("genre").unwrap_or_default();
            let born = entity.child_text("year").unwrap_or_default();
            candidates.push(
                ArtistCandidate::new(name, genre, born, url).with_relevance(entity_relevance(&entity)),
            );
        }

        Ok(Matcher::rank(candidates))
    }

    /// URL produced by a `Create*SearchUrl` function, if any
    async fn search_url(
        &self,
        http: &dyn HttpFetcher,
        function: &str,
        extras: &[String],
    ) -> Result<Option<ScraperUrl>> {
        let fragments = self
            .runner
            .run_no_throw(function, &ScraperUrl::new(), http, extras)
            .await?;
        if fragments.len() > 1 {
            warn!("{}: {} returned multiple results; using first", self.id(), function);
        }

        let Some(first) = fragments.first().filter(|f| !f.is_empty()) else {
            return Ok(None);
        };
        let mut url = ScraperUrl::new();
        url.parse_string(first);
        Ok(Some(url))
    }

    /// Episodes of a TV show
    pub async fn get_episode_list(
        &self,
        http: &dyn HttpFetcher,
        url: &ScraperUrl,
    ) -> Result<Vec<EpisodeGuideEntry>> {
        self.program().await?;
        let Some(first) = url.first_url() else {
            return Ok(Vec::new());
        };

        let extras = [first.to_string()];
        let fragments = self
            .runner
            .run_no_throw("GetEpisodeList", url, http, &extras)
            .await?;

        let mut episodes = Vec::new();
        for fragment in &fragments {
            let Ok(doc) = XmlDocument::parse(fragment) else {
                error!("{}: unable to parse episode list", self.id());
                continue;
            };
            if let Some(root) = doc.root() {
                check_scraper_error(root)?;
            }
            let Some(guide) = doc.first_child("episodeguide") else {
                continue;
            };
            episodes.extend(
                guide
                    .children_named("episode")
                    .filter_map(EpisodeGuideEntry::from_element),
            );
        }

        Ok(episodes)
    }

    /// Details of a movie (`movie = true`, also TV shows and music videos) or
    /// of an episode
    pub async fn get_video_details(
        &self,
        http: &dyn HttpFetcher,
        url: &ScraperUrl,
        movie: bool,
        details: &mut VideoDetails,
    ) -> Result<bool> {
        self.program().await?;
        *details = VideoDetails::default();

        let function = if movie { "GetDetails" } else { "GetEpisodeDetails" };
        let extras = [
            url.id.clone(),
            url.first_url().unwrap_or_default().to_string(),
        ];
        let fragments = self.runner.run_no_throw(function, url, http, &extras).await?;

        let mut loaded = false;
        for fragment in &fragments {
            let Ok(doc) = XmlDocument::parse(fragment) else {
                error!("{}: unable to parse {} output", self.id(), function);
                continue;
            };
            if let Some(root) = doc.root() {
                check_scraper_error(root)?;
            }
            let Some(root) = doc.first_child("details") else {
                error!("{}: invalid {} output (want <details>)", self.id(), function);
                continue;
            };
            details.load(root, true, false)?;
            loaded = true;
        }

        Ok(loaded)
    }

    /// Full details for an album search hit
    pub async fn get_album_details(
        &self,
        http: &dyn HttpFetcher,
        url: &ScraperUrl,
        album: &mut AlbumInfo,
    ) -> Result<bool> {
        self.program().await?;
        let fragments = self
            .runner
            .run_no_throw("GetAlbumDetails", url, http, &[])
            .await?;
        self.load_fragments(&fragments, album)
    }

    /// Full details for an artist search hit; `search_term` is passed on for
    /// chained lookups at other sites
    pub async fn get_artist_details(
        &self,
        http: &dyn HttpFetcher,
        url: &ScraperUrl,
        search_term: &str,
        artist: &mut ArtistInfo,
    ) -> Result<bool> {
        self.program().await?;
        if url.is_empty() {
            return Ok(false);
        }

        let extras = [urlencoding::encode(search_term).into_owned()];
        let fragments = self
            .runner
            .run_no_throw("GetArtistDetails", url, http, &extras)
            .await?;
        self.load_fragments(&fragments, artist)
    }

    /// Extra artwork for an item with a known unique id
    pub async fn get_artwork(&self, http: &dyn HttpFetcher, details: &mut VideoDetails) -> Result<bool> {
        self.program().await?;
        if details.unique_id.is_empty() {
            return Ok(false);
        }

        let extras = [details.unique_id.clone()];
        let fragments = self
            .runner
            .run_no_throw("GetArt", &ScraperUrl::new(), http, &extras)
            .await?;

        let mut loaded = false;
        for fragment in &fragments {
            let Some(root) = parse_root(fragment) else {
                error!("{}: unable to parse GetArt output", self.id());
                return Ok(false);
            };
            check_scraper_error(&root)?;
            details.load(&root, true, false)?;
            loaded = true;
        }
        Ok(loaded)
    }

    /// Load every fragment into `record`: the first resets it, the rest merge
    fn load_fragments<T: XmlLoadable>(&self, fragments: &[String], record: &mut T) -> Result<bool> {
        let mut loaded = false;
        for (index, fragment) in fragments.iter().enumerate() {
            let Some(root) = parse_root(fragment) else {
                error!("{}: unable to parse details", self.id());
                return Ok(false);
            };
            check_scraper_error(&root)?;
            record.load(&root, index > 0, false)?;
            loaded = true;
        }
        Ok(loaded)
    }
}

impl fmt::Debug for Scraper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scraper")
            .field("id", &self.id())
            .field("kind", &self.kind)
            .field("content", &self.content())
            .field("loaded", &self.runner.is_loaded())
            .finish()
    }
}

fn parse_root(fragment: &str) -> Option<XmlElement> {
    XmlDocument::parse(fragment).ok()?.roots.into_iter().next()
}

/// Convert a search term to the program's charset and percent-encode it
fn encode_search_term(program: &ScraperProgram, function: &str, term: &str) -> String {
    let label = program.search_string_encoding(function);
    let encoding = Encoding::for_label(label.as_bytes()).unwrap_or(UTF_8);
    let (bytes, _, _) = encoding.encode(term);
    urlencoding::encode_binary(&bytes).into_owned()
}

/// Build a ranked movie hit from a search `<entity>`
fn movie_candidate(entity: &XmlElement, query: &str, query_year: Option<i32>) -> Option<ScraperUrl> {
    let mut title = entity.child("title").and_then(XmlElement::first_text)?.to_string();
    entity.child("url").and_then(XmlElement::first_text)?;

    let mut hit = ScraperUrl::new();
    if let Some(id) = entity.child_text("id") {
        hit.id = id;
    }
    for link in entity.children_named("url") {
        if !hit.parse_element(link) {
            break;
        }
    }

    let year = entity.child_text("year").filter(|y| !y.is_empty());
    let candidate_year = year.as_deref().map(crate::scraper::types::leading_int);
    hit.relevance = Matcher::score(query, &title, query_year, candidate_year);

    if let Some(year) = year {
        title.push_str(&format!(" ({year})"));
    }
    if let Some(language) = entity.child_text("language").filter(|l| !l.is_empty()) {
        title.push_str(&format!(" ({language})"));
    }
    hit.title = title;

    Some(hit)
}

/// `<entity>` elements of the first `<results>` root of each fragment
fn search_entities(fragments: &[String]) -> Result<Vec<XmlElement>> {
    let mut entities = Vec::new();
    for fragment in fragments {
        let Ok(doc) = XmlDocument::parse(fragment) else {
            error!("Unable to parse search results");
            continue;
        };
        if let Some(root) = doc.root() {
            check_scraper_error(root)?;
        }
        if let Some(results) = doc.first_child("results") {
            entities.extend(results.children_named("entity").cloned());
        }
    }
    Ok(entities)
}

/// URLs of a search entity, falling back to the search URL itself when the
/// entity carries none (the search went straight to a detail page)
fn entity_urls(entity: &XmlElement, search_url: &ScraperUrl) -> ScraperUrl {
    let mut url = ScraperUrl::new();
    if entity.child("url").is_none() {
        url.parse_string(&search_url.to_xml());
        return url;
    }
    for link in entity.children_named("url") {
        if !url.parse_element(link) {
            break;
        }
    }
    url
}

/// `<relevance scale="n">` divided by its scale, 0 when absent
fn entity_relevance(entity: &XmlElement) -> f64 {
    let Some(relevance) = entity.child("relevance") else {
        return 0.0;
    };
    let Some(value) = relevance.first_text().and_then(|v| v.trim().parse::<f64>().ok()) else {
        return 0.0;
    };
    let scale = relevance
        .attr("scale")
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|s| *s != 0.0)
        .unwrap_or(1.0);
    value / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_round_trip() {
        for content in [
            ContentType::Albums,
            ContentType::Artists,
            ContentType::Movies,
            ContentType::TvShows,
            ContentType::MusicVideos,
        ] {
            assert_eq!(content.to_string().parse::<ContentType>().unwrap(), content);
        }
        assert_eq!("".parse::<ContentType>().unwrap(), ContentType::None);
        assert!("games".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_addon_kind_content() {
        assert_eq!(AddonKind::ScraperTvShows.content(), Some(ContentType::TvShows));
        assert_eq!(AddonKind::ScraperLibrary.content(), None);
    }

    #[test]
    fn test_entity_relevance_scale() {
        let doc = XmlDocument::parse(
            r#"<entity><title>X</title><relevance scale="100">85</relevance></entity>"#,
        )
        .unwrap();
        assert!((entity_relevance(doc.root().unwrap()) - 0.85).abs() < 1e-9);

        let doc = XmlDocument::parse("<entity><title>X</title></entity>").unwrap();
        assert_eq!(entity_relevance(doc.root().unwrap()), 0.0);
    }

    #[test]
    fn test_encode_search_term_charset() {
        let program = ScraperProgram::parse(
            r#"<scraper><CreateSearchUrl SearchStringEncoding="iso-8859-1"/><CreateAlbumSearchUrl/></scraper>"#,
        )
        .unwrap();
        assert_eq!(encode_search_term(&program, "CreateSearchUrl", "amélie"), "am%E9lie");
        assert_eq!(
            encode_search_term(&program, "CreateAlbumSearchUrl", "amélie"),
            "am%C3%A9lie"
        );
    }
}
