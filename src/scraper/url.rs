use crate::scraper::xml::{XmlDocument, XmlElement};
use serde::{Deserialize, Serialize};

/// Kind of a URL entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlKind {
    #[default]
    General,
    Season,
}

/// A single fetchable URL with its request hints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlEntry {
    pub url: String,
    /// Referrer sent with the request
    pub spoof: Option<String>,
    /// Send the query string as a POST body
    pub post: bool,
    /// Ask the server for gzip content
    pub gzip: bool,
    /// File name of the cached response inside the scraper cache directory
    pub cache: Option<String>,
    pub kind: UrlKind,
    /// Season number for season art, -1 when not set
    pub season: i32,
    pub aspect: Option<String>,
}

impl UrlEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            spoof: None,
            post: false,
            gzip: false,
            cache: None,
            kind: UrlKind::General,
            season: -1,
            aspect: None,
        }
    }

    fn from_element(element: &XmlElement) -> Option<Self> {
        let url = element.first_text()?;

        let mut entry = Self::new(url);
        entry.spoof = element.attr("spoof").filter(|s| !s.is_empty()).map(str::to_string);
        entry.post = element
            .attr("post")
            .is_some_and(|v| v.eq_ignore_ascii_case("yes"));
        entry.gzip = element
            .attr("gzip")
            .is_some_and(|v| v.eq_ignore_ascii_case("yes"));
        entry.cache = element.attr("cache").filter(|s| !s.is_empty()).map(str::to_string);
        entry.aspect = element.attr("aspect").filter(|s| !s.is_empty()).map(str::to_string);

        if element
            .attr("type")
            .is_some_and(|t| t.eq_ignore_ascii_case("season"))
        {
            entry.kind = UrlKind::Season;
            entry.season = element
                .attr("season")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(-1);
        }

        Some(entry)
    }

    fn to_element(&self) -> XmlElement {
        let mut element = XmlElement::new("url");
        if let Some(ref spoof) = self.spoof {
            element.set_attr("spoof", spoof.as_str());
        }
        if self.post {
            element.set_attr("post", "yes");
        }
        if self.gzip {
            element.set_attr("gzip", "yes");
        }
        if let Some(ref cache) = self.cache {
            element.set_attr("cache", cache.as_str());
        }
        if self.kind == UrlKind::Season {
            element.set_attr("type", "season");
            element.set_attr("season", self.season.to_string());
        }
        if let Some(ref aspect) = self.aspect {
            element.set_attr("aspect", aspect.as_str());
        }
        element.with_text(self.url.as_str())
    }
}

/// One or more URL entries plus the search-result data attached to them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScraperUrl {
    pub entries: Vec<UrlEntry>,
    /// Raw XML of every element parsed into this value
    pub xml: String,
    pub title: String,
    pub id: String,
    pub relevance: f64,
}

impl ScraperUrl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a single plain URL
    pub fn from_url(url: impl Into<String>) -> Self {
        let mut scraper_url = Self::new();
        scraper_url.add_entry(UrlEntry::new(url));
        scraper_url
    }

    /// Build from an XML element such as `<thumb>` or `<url>`
    pub fn from_element(element: &XmlElement) -> Self {
        let mut scraper_url = Self::new();
        scraper_url.parse_element(element);
        scraper_url
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Append an entry built in code
    pub fn add_entry(&mut self, entry: UrlEntry) {
        self.xml.push_str(&entry.to_element().to_xml_string());
        self.entries.push(entry);
    }

    /// Append an element and keep its XML. Elements without text are rejected.
    pub fn add_element(&mut self, element: &XmlElement) -> bool {
        self.parse_element(element)
    }

    /// Parse one URL element
    pub fn parse_element(&mut self, element: &XmlElement) -> bool {
        let Some(entry) = UrlEntry::from_element(element) else {
            return false;
        };

        self.xml.push_str(&element.to_xml_string());
        self.entries.push(entry);
        true
    }

    /// Parse either URL elements or a bare URL string.
    ///
    /// When the text is XML, every top-level element sharing the first
    /// element's tag is parsed. Anything else becomes one plain entry.
    pub fn parse_string(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }

        match XmlDocument::parse(text) {
            Ok(doc) => {
                let Some(tag) = doc.root().map(|r| r.name.clone()) else {
                    return false;
                };
                for element in doc.roots.iter().filter(|e| e.name == tag) {
                    self.parse_element(element);
                }
            }
            Err(_) => {
                self.entries.push(UrlEntry::new(text));
                self.xml = text.to_string();
            }
        }
        true
    }

    /// Parse `<episodeguide><url>..</url></episodeguide>`
    pub fn parse_episode_guide(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }

        let Ok(doc) = XmlDocument::parse(text) else {
            return false;
        };
        let Some(guide) = doc.first_child("episodeguide") else {
            return false;
        };

        let mut found = false;
        for url in guide.children_named("url") {
            found |= self.parse_element(url);
        }
        found
    }

    /// First URL string, if any
    pub fn first_url(&self) -> Option<&str> {
        self.entries.first().map(|e| e.url.as_str())
    }

    /// First general entry matching the aspect (empty or "thumb" matches all)
    pub fn first_thumb(&self, aspect: &str) -> Option<&UrlEntry> {
        self.entries.iter().find(|e| {
            e.kind == UrlKind::General && aspect_matches(e, aspect)
        })
    }

    /// First season entry for the given season and aspect
    pub fn season_thumb(&self, season: i32, aspect: &str) -> Option<&UrlEntry> {
        self.entries.iter().find(|e| {
            e.kind == UrlKind::Season && e.season == season && aspect_matches(e, aspect)
        })
    }

    /// Thumb URLs (with referrer suffix) filtered by aspect and season.
    ///
    /// `season == -1` selects general entries, anything else season entries.
    pub fn thumb_urls(&self, aspect: &str, season: i32) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| aspect_matches(e, aspect))
            .filter(|e| match e.kind {
                UrlKind::General => season == -1,
                UrlKind::Season => e.season == season,
            })
            .map(Self::thumb_url)
            .collect()
    }

    /// Image URL with the spoofed referrer appended as a protocol option
    pub fn thumb_url(entry: &UrlEntry) -> String {
        match entry.spoof {
            Some(ref spoof) => format!("{}|Referer={}", entry.url, urlencoding::encode(spoof)),
            None => entry.url.clone(),
        }
    }

    /// XML form of all entries
    pub fn to_xml(&self) -> String {
        if !self.xml.is_empty() || self.entries.is_empty() {
            return self.xml.clone();
        }
        self.entries
            .iter()
            .map(|e| e.to_element().to_xml_string())
            .collect()
    }

    /// Entries as `<url>` elements for saving
    pub(crate) fn to_elements(&self) -> Vec<XmlElement> {
        self.entries.iter().map(UrlEntry::to_element).collect()
    }
}

fn aspect_matches(entry: &UrlEntry, aspect: &str) -> bool {
    aspect.is_empty() || aspect == "thumb" || entry.aspect.as_deref() == Some(aspect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_with_attributes() {
        let mut url = ScraperUrl::new();
        assert!(url.parse_string(
            r#"<url spoof="http://ref/" post="yes" gzip="YES" cache="q.xml">http://x/search?q=a</url>"#
        ));

        let entry = &url.entries[0];
        assert_eq!(entry.url, "http://x/search?q=a");
        assert_eq!(entry.spoof.as_deref(), Some("http://ref/"));
        assert!(entry.post);
        assert!(entry.gzip);
        assert_eq!(entry.cache.as_deref(), Some("q.xml"));
        assert_eq!(entry.season, -1);
    }

    #[test]
    fn test_parse_string_plain_url() {
        let mut url = ScraperUrl::new();
        assert!(url.parse_string("http://example.com/find?q=alien&s=tt"));
        assert_eq!(url.first_url(), Some("http://example.com/find?q=alien&s=tt"));
        assert_eq!(url.to_xml(), "http://example.com/find?q=alien&s=tt");
    }

    #[test]
    fn test_parse_string_multiple_siblings() {
        let mut url = ScraperUrl::new();
        url.parse_string("<url>http://a/</url><url>http://b/</url><id>1</id>");
        assert_eq!(url.entries.len(), 2);
        assert_eq!(url.entries[1].url, "http://b/");
    }

    #[test]
    fn test_empty_element_rejected() {
        let mut url = ScraperUrl::new();
        assert!(!url.parse_element(&XmlElement::new("url")));
        assert!(url.is_empty());
    }

    #[test]
    fn test_season_and_aspect_lookup() {
        let mut url = ScraperUrl::new();
        url.parse_string(concat!(
            r#"<thumb aspect="poster">http://img/general.jpg</thumb>"#,
            r#"<thumb type="season" season="2" aspect="poster">http://img/s2.jpg</thumb>"#,
            r#"<thumb aspect="banner" spoof="http://ref/">http://img/banner.jpg</thumb>"#,
        ));

        assert_eq!(url.first_thumb("").unwrap().url, "http://img/general.jpg");
        assert_eq!(url.first_thumb("banner").unwrap().url, "http://img/banner.jpg");
        assert_eq!(url.season_thumb(2, "poster").unwrap().url, "http://img/s2.jpg");
        assert!(url.season_thumb(3, "").is_none());
        assert_eq!(url.thumb_urls("", 2), vec!["http://img/s2.jpg".to_string()]);

        let banner = url.first_thumb("banner").unwrap();
        assert_eq!(
            ScraperUrl::thumb_url(banner),
            "http://img/banner.jpg|Referer=http%3A%2F%2Fref%2F"
        );
    }

    #[test]
    fn test_episode_guide() {
        let mut url = ScraperUrl::new();
        assert!(url.parse_episode_guide(
            "<episodeguide><url cache=\"show.xml\">http://tv/1/all.zip</url></episodeguide>"
        ));
        assert_eq!(url.entries[0].cache.as_deref(), Some("show.xml"));
    }

    #[test]
    fn test_incremental_build_serializes() {
        let mut url = ScraperUrl::new();
        let mut entry = UrlEntry::new("http://x/1");
        entry.gzip = true;
        url.add_entry(entry);
        assert_eq!(url.to_xml(), r#"<url gzip="yes">http://x/1</url>"#);
    }
}
