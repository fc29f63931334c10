use super::{AlbumInfo, ArtistInfo, XmlLoadable, leading_int};
use crate::scraper::{
    Result,
    catalog::Scraper,
    matcher::Ranked,
    provider::HttpFetcher,
    url::ScraperUrl,
    xml::XmlElement,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One entry of a TV show's episode guide
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeGuideEntry {
    pub season: i32,
    pub episode: i32,
    /// Second part of an `N.M` episode number, 0 when absent
    pub sub_episode: i32,
    pub title: String,
    pub id: String,
    /// Only set for strict `YYYY-MM-DD` dates
    pub aired: Option<NaiveDate>,
    pub display_season: Option<i32>,
    pub display_episode: Option<i32>,
    pub url: ScraperUrl,
}

impl EpisodeGuideEntry {
    /// Build an entry from an `<episode>` element.
    ///
    /// Entries need a url, a season and a non-empty episode number.
    pub fn from_element(element: &XmlElement) -> Option<Self> {
        element.child("url")?;
        element.child("season")?;
        element.child_text("epnum").filter(|e| !e.trim().is_empty())?;

        let mut entry = Self::default();
        entry.load(element, false, false).ok()?;
        (!entry.url.is_empty()).then_some(entry)
    }

    fn parse_aired(text: &str) -> Option<NaiveDate> {
        let text = text.trim();
        if text.len() != 10 {
            return None;
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
    }
}

impl XmlLoadable for EpisodeGuideEntry {
    fn load(&mut self, element: &XmlElement, append: bool, _prioritise: bool) -> Result<()> {
        if !append {
            *self = Self::default();
        }

        if let Some(season) = element.child_text("season") {
            self.season = leading_int(&season);
        }
        if let Some(epnum) = element.child_text("epnum") {
            match epnum.split_once('.') {
                Some((episode, sub)) => {
                    self.episode = leading_int(episode);
                    self.sub_episode = leading_int(sub);
                }
                None => {
                    self.episode = leading_int(&epnum);
                    self.sub_episode = 0;
                }
            }
        }

        self.title = element
            .child_text("title")
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());
        if let Some(id) = element.child_text("id") {
            self.id = id;
        }
        if let Some(aired) = element.child_text("aired") {
            self.aired = Self::parse_aired(&aired);
        }
        if let Some(season) = element.child_text("displayseason") {
            self.display_season = season.trim().parse().ok();
        }
        if let Some(episode) = element.child_text("displayepisode") {
            self.display_episode = episode.trim().parse().ok();
        }
        for url in element.children_named("url") {
            self.url.parse_element(url);
        }

        Ok(())
    }

    fn save(&self, parent: &mut XmlElement, tag: &str) -> Result<()> {
        let mut episode = XmlElement::new(tag);
        episode.push_text_child("title", &self.title);
        episode.push_text_child("season", &self.season.to_string());
        let epnum = if self.sub_episode > 0 {
            format!("{}.{}", self.episode, self.sub_episode)
        } else {
            self.episode.to_string()
        };
        episode.push_text_child("epnum", &epnum);
        episode.push_text_child("id", &self.id);
        if let Some(aired) = self.aired {
            episode.push_text_child("aired", &aired.format("%Y-%m-%d").to_string());
        }
        if let Some(season) = self.display_season {
            episode.push_text_child("displayseason", &season.to_string());
        }
        if let Some(ep) = self.display_episode {
            episode.push_text_child("displayepisode", &ep.to_string());
        }
        for url in self.url.to_elements() {
            episode.push_child(url);
        }

        parent.push_child(episode);
        Ok(())
    }
}

/// An album search hit, loaded into a full [`AlbumInfo`] on demand
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlbumCandidate {
    pub title: String,
    pub artist: String,
    pub year: Option<i32>,
    pub url: ScraperUrl,
    pub relevance: f64,
    pub album: AlbumInfo,
    pub loaded: bool,
}

impl AlbumCandidate {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, url: ScraperUrl) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            url,
            ..Default::default()
        }
    }

    /// Builder pattern: set the release year
    #[must_use]
    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    /// Builder pattern: set the relevance
    #[must_use]
    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = relevance;
        self
    }

    /// "Artist - Title (year)"
    pub fn display_title(&self) -> String {
        let mut display = if self.artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.artist, self.title)
        };
        if let Some(year) = self.year {
            display.push_str(&format!(" ({year})"));
        }
        display
    }

    /// Fetch the full album details
    pub async fn load(&mut self, scraper: &Scraper, http: &dyn HttpFetcher) -> Result<bool> {
        self.loaded = scraper
            .get_album_details(http, &self.url, &mut self.album)
            .await?;

        if self.loaded && self.album.artists.is_empty() && !self.artist.is_empty() {
            self.album.artists.push(self.artist.clone());
        }
        Ok(self.loaded)
    }
}

impl Ranked for AlbumCandidate {
    fn relevance(&self) -> f64 {
        self.relevance
    }

    fn dedup_key(&self) -> (String, String) {
        (
            self.url.first_url().unwrap_or_default().to_string(),
            self.display_title(),
        )
    }
}

/// An artist search hit, loaded into a full [`ArtistInfo`] on demand
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtistCandidate {
    pub name: String,
    pub genre: String,
    pub born: String,
    pub url: ScraperUrl,
    pub relevance: f64,
    pub artist: ArtistInfo,
    pub loaded: bool,
}

impl ArtistCandidate {
    /// Candidate whose artist record is pre-filled from the search hit
    pub fn new(name: impl Into<String>, genre: impl Into<String>, born: impl Into<String>, url: ScraperUrl) -> Self {
        let name = name.into();
        let genre = genre.into();
        let born = born.into();

        let artist = ArtistInfo {
            name: name.clone(),
            genres: genre
                .split(super::ITEM_SEPARATOR)
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect(),
            born: born.clone(),
            ..Default::default()
        };

        Self {
            name,
            genre,
            born,
            url,
            relevance: 0.0,
            artist,
            loaded: false,
        }
    }

    /// Builder pattern: set the relevance
    #[must_use]
    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = relevance;
        self
    }

    /// Fetch the full artist details. `search_term` is the user's original query.
    pub async fn load(
        &mut self,
        scraper: &Scraper,
        http: &dyn HttpFetcher,
        search_term: &str,
    ) -> Result<bool> {
        self.loaded = scraper
            .get_artist_details(http, &self.url, search_term, &mut self.artist)
            .await?;
        Ok(self.loaded)
    }
}

impl Ranked for ArtistCandidate {
    fn relevance(&self) -> f64 {
        self.relevance
    }

    fn dedup_key(&self) -> (String, String) {
        (
            self.url.first_url().unwrap_or_default().to_string(),
            self.name.clone(),
        )
    }
}

impl Ranked for ScraperUrl {
    fn relevance(&self) -> f64 {
        self.relevance
    }

    fn dedup_key(&self) -> (String, String) {
        (
            self.first_url().unwrap_or_default().to_string(),
            self.title.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::xml::XmlDocument;

    fn element(xml: &str) -> XmlElement {
        XmlDocument::parse(xml).unwrap().roots.remove(0)
    }

    #[test]
    fn test_episode_sub_number_and_aired() {
        let entry = EpisodeGuideEntry::from_element(&element(concat!(
            "<episode><season>2</season><epnum>5.1</epnum><title>Pilot, Part 2</title>",
            "<aired>2004-09-22</aired><displayseason>0</displayseason>",
            "<url>http://tv/ep/25</url></episode>"
        )))
        .unwrap();

        assert_eq!(entry.season, 2);
        assert_eq!(entry.episode, 5);
        assert_eq!(entry.sub_episode, 1);
        assert_eq!(entry.aired, NaiveDate::from_ymd_opt(2004, 9, 22));
        assert_eq!(entry.display_season, Some(0));
        assert_eq!(entry.url.first_url(), Some("http://tv/ep/25"));
    }

    #[test]
    fn test_episode_defaults_and_loose_dates() {
        let entry = EpisodeGuideEntry::from_element(&element(
            "<episode><season>1</season><epnum>3</epnum><aired>2004-9-22</aired><url>http://tv/3</url></episode>",
        ))
        .unwrap();

        assert_eq!(entry.title, "Unknown");
        assert_eq!(entry.sub_episode, 0);
        assert_eq!(entry.aired, None);
    }

    #[test]
    fn test_episode_requires_fields() {
        for xml in [
            "<episode><season>1</season><epnum>1</epnum></episode>",
            "<episode><epnum>1</epnum><url>http://tv/1</url></episode>",
            "<episode><season>1</season><epnum></epnum><url>http://tv/1</url></episode>",
        ] {
            assert!(EpisodeGuideEntry::from_element(&element(xml)).is_none(), "{xml}");
        }
    }

    #[test]
    fn test_album_display_title() {
        let candidate = AlbumCandidate::new("OK Computer", "Radiohead", ScraperUrl::new())
            .with_year(Some(1997));
        assert_eq!(candidate.display_title(), "Radiohead - OK Computer (1997)");

        let bare = AlbumCandidate::new("Untitled", "", ScraperUrl::new());
        assert_eq!(bare.display_title(), "Untitled");
    }

    #[test]
    fn test_artist_candidate_prefills_record() {
        let candidate = ArtistCandidate::new("Portishead", "Trip Hop / Electronic", "1991", ScraperUrl::new());
        assert_eq!(candidate.artist.name, "Portishead");
        assert_eq!(candidate.artist.genres, vec!["Trip Hop", "Electronic"]);
        assert_eq!(candidate.artist.born, "1991");
    }
}
