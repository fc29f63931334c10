use super::{
    XmlLoadable, duration_seconds, leading_int, load_bool, load_list, load_opt_string,
    load_parsed, load_string, load_thumbs, push_list, push_thumbs,
};
use crate::scraper::{Result, url::ScraperUrl, xml::XmlElement};
use serde::{Deserialize, Serialize};

/// Album ratings are normalised to this scale
const ALBUM_RATING_MAX: f32 = 5.0;

/// A track on an album
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub position: i32,
    pub title: String,
    /// Duration in seconds
    pub duration: i32,
}

/// Album metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumInfo {
    pub title: String,
    pub artists: Vec<String>,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
    pub moods: Vec<String>,
    pub themes: Vec<String>,
    pub review: String,
    pub label: String,
    /// Album type (e.g. "Album", "Single", "EP")
    pub album_type: String,
    pub compilation: bool,
    pub year: Option<i32>,
    /// Rating on a 0-5 scale
    pub rating: Option<f32>,
    pub release_date: String,
    pub thumbs: ScraperUrl,
    pub tracks: Vec<TrackInfo>,
}

impl AlbumInfo {
    /// "Artist / Artist" as shown to the user
    pub fn artist_display(&self) -> String {
        self.artists.join(super::ITEM_SEPARATOR)
    }

    fn load_rating(&mut self, element: &XmlElement) {
        let Some(rating) = element.child("rating") else {
            return;
        };
        let Ok(value) = rating.text().trim().parse::<f32>() else {
            return;
        };

        let max = rating
            .attr("max")
            .and_then(|m| m.trim().parse::<f32>().ok())
            .filter(|m| *m > 0.0)
            .unwrap_or(ALBUM_RATING_MAX);
        self.rating = Some(value * ALBUM_RATING_MAX / max);
    }

    fn load_tracks(&mut self, element: &XmlElement) {
        let mut tracks: Vec<TrackInfo> = element
            .children_named("track")
            .map(|track| TrackInfo {
                position: track.child_text("position").map_or(0, |p| leading_int(&p)),
                title: track.child_text("title").unwrap_or_default(),
                duration: track.child_text("duration").map_or(0, |d| duration_seconds(&d)),
            })
            .collect();

        if tracks.is_empty() {
            return;
        }

        // Some sources number tracks from zero
        if tracks.iter().any(|t| t.position == 0) {
            for track in &mut tracks {
                track.position += 1;
            }
        }
        self.tracks = tracks;
    }
}

impl XmlLoadable for AlbumInfo {
    fn load(&mut self, element: &XmlElement, append: bool, prioritise: bool) -> Result<()> {
        if !append {
            *self = Self::default();
        }

        load_string(element, "title", &mut self.title);
        load_string(element, "review", &mut self.review);
        load_string(element, "label", &mut self.label);
        load_string(element, "type", &mut self.album_type);
        load_string(element, "releasedate", &mut self.release_date);
        load_bool(element, "compilation", &mut self.compilation);
        load_parsed(element, "year", &mut self.year);
        self.load_rating(element);

        load_list(element, "artist", &mut self.artists, prioritise);
        load_list(element, "genre", &mut self.genres, prioritise);
        load_list(element, "style", &mut self.styles, prioritise);
        load_list(element, "mood", &mut self.moods, prioritise);
        load_list(element, "theme", &mut self.themes, prioritise);

        load_thumbs(element, "thumb", &mut self.thumbs, prioritise);
        self.load_tracks(element);

        Ok(())
    }

    fn save(&self, parent: &mut XmlElement, tag: &str) -> Result<()> {
        let mut album = XmlElement::new(tag);
        album.push_text_child("title", &self.title);
        push_list(&mut album, "artist", &self.artists);
        push_list(&mut album, "genre", &self.genres);
        push_list(&mut album, "style", &self.styles);
        push_list(&mut album, "mood", &self.moods);
        push_list(&mut album, "theme", &self.themes);
        album.push_text_child("compilation", if self.compilation { "true" } else { "false" });
        album.push_text_child("review", &self.review);
        album.push_text_child("type", &self.album_type);
        album.push_text_child("releasedate", &self.release_date);
        album.push_text_child("label", &self.label);
        push_thumbs(&mut album, "thumb", &self.thumbs);
        if let Some(year) = self.year {
            album.push_text_child("year", &year.to_string());
        }
        if let Some(rating) = self.rating {
            album.push_child(
                XmlElement::new("rating")
                    .with_attr("max", ALBUM_RATING_MAX.to_string())
                    .with_text(rating.to_string()),
            );
        }

        for track in &self.tracks {
            let mut el = XmlElement::new("track");
            el.push_text_child("position", &track.position.to_string());
            el.push_text_child("title", &track.title);
            el.push_text_child(
                "duration",
                &format!("{}:{:02}", track.duration / 60, track.duration % 60),
            );
            album.push_child(el);
        }

        parent.push_child(album);
        Ok(())
    }
}

/// Artist metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtistInfo {
    pub name: String,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
    pub moods: Vec<String>,
    pub years_active: Vec<String>,
    pub instruments: Vec<String>,
    pub born: String,
    pub formed: String,
    pub biography: String,
    pub died: String,
    pub disbanded: String,
    pub thumbs: ScraperUrl,
    pub fanart: ScraperUrl,
    /// (album title, year) pairs
    pub discography: Vec<(String, String)>,
}

impl XmlLoadable for ArtistInfo {
    fn load(&mut self, element: &XmlElement, append: bool, prioritise: bool) -> Result<()> {
        if !append {
            *self = Self::default();
        }

        load_string(element, "name", &mut self.name);
        load_string(element, "born", &mut self.born);
        load_string(element, "formed", &mut self.formed);
        load_string(element, "biography", &mut self.biography);
        load_string(element, "died", &mut self.died);
        load_string(element, "disbanded", &mut self.disbanded);

        load_list(element, "genre", &mut self.genres, prioritise);
        load_list(element, "style", &mut self.styles, prioritise);
        load_list(element, "mood", &mut self.moods, prioritise);
        load_list(element, "yearsactive", &mut self.years_active, prioritise);
        load_list(element, "instruments", &mut self.instruments, prioritise);

        load_thumbs(element, "thumb", &mut self.thumbs, prioritise);
        load_fanart(element, &mut self.fanart);

        for album in element.children_named("album") {
            let title = album.child_text("title").unwrap_or_default();
            let year = album.child_text("year").unwrap_or_default();
            self.discography.push((title, year));
        }

        Ok(())
    }

    fn save(&self, parent: &mut XmlElement, tag: &str) -> Result<()> {
        let mut artist = XmlElement::new(tag);
        artist.push_text_child("name", &self.name);
        push_list(&mut artist, "genre", &self.genres);
        push_list(&mut artist, "style", &self.styles);
        push_list(&mut artist, "mood", &self.moods);
        push_list(&mut artist, "yearsactive", &self.years_active);
        push_list(&mut artist, "instruments", &self.instruments);
        artist.push_text_child("born", &self.born);
        artist.push_text_child("formed", &self.formed);
        artist.push_text_child("biography", &self.biography);
        artist.push_text_child("died", &self.died);
        artist.push_text_child("disbanded", &self.disbanded);
        push_thumbs(&mut artist, "thumb", &self.thumbs);
        save_fanart(&mut artist, &self.fanart);

        for (title, year) in &self.discography {
            let mut album = XmlElement::new("album");
            album.push_text_child("title", title);
            album.push_text_child("year", year);
            artist.push_child(album);
        }

        parent.push_child(artist);
        Ok(())
    }
}

/// A cast member of a movie or episode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    pub role: String,
    pub thumb: Option<String>,
    pub order: i32,
}

/// Movie, TV show, episode or music video details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoDetails {
    pub title: String,
    pub original_title: Option<String>,
    pub sort_title: Option<String>,
    /// Identifier at the scraped site
    pub unique_id: String,
    pub year: Option<i32>,
    pub plot: String,
    pub outline: String,
    pub tagline: String,
    /// Runtime in minutes
    pub runtime: Option<i32>,
    pub mpaa: String,
    pub premiered: String,
    /// Rating (0-10 scale)
    pub rating: Option<f32>,
    pub votes: Option<i32>,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
    pub writers: Vec<String>,
    pub studios: Vec<String>,
    pub countries: Vec<String>,
    pub cast: Vec<CastMember>,
    pub thumbs: ScraperUrl,
    pub fanart: ScraperUrl,
    pub episode_guide: ScraperUrl,
    pub season: Option<i32>,
    pub episode: Option<i32>,
    pub aired: String,
}

impl VideoDetails {
    fn load_cast(&mut self, element: &XmlElement, prioritise: bool) {
        let actors: Vec<CastMember> = element
            .children_named("actor")
            .filter_map(|actor| {
                let name = actor.child_text("name").filter(|n| !n.is_empty())?;
                Some(CastMember {
                    name,
                    role: actor.child_text("role").unwrap_or_default(),
                    thumb: actor.child_text("thumb").filter(|t| !t.is_empty()),
                    order: actor.child_text("order").map_or(0, |o| leading_int(&o)),
                })
            })
            .collect();

        if actors.is_empty() {
            return;
        }
        if prioritise {
            self.cast.clear();
        }
        for actor in actors {
            if !self.cast.iter().any(|c| c.name == actor.name) {
                self.cast.push(actor);
            }
        }
    }
}

impl XmlLoadable for VideoDetails {
    fn load(&mut self, element: &XmlElement, append: bool, prioritise: bool) -> Result<()> {
        if !append {
            *self = Self::default();
        }

        load_string(element, "title", &mut self.title);
        load_opt_string(element, "originaltitle", &mut self.original_title);
        load_opt_string(element, "sorttitle", &mut self.sort_title);
        load_string(element, "id", &mut self.unique_id);
        load_parsed(element, "year", &mut self.year);
        load_string(element, "plot", &mut self.plot);
        load_string(element, "outline", &mut self.outline);
        load_string(element, "tagline", &mut self.tagline);
        if let Some(runtime) = element.child_text("runtime") {
            self.runtime = Some(leading_int(&runtime)).filter(|r| *r > 0);
        }
        load_string(element, "mpaa", &mut self.mpaa);
        load_string(element, "premiered", &mut self.premiered);
        load_parsed(element, "rating", &mut self.rating);
        if let Some(votes) = element.child_text("votes") {
            let digits: String = votes.chars().filter(char::is_ascii_digit).collect();
            if let Ok(votes) = digits.parse() {
                self.votes = Some(votes);
            }
        }
        load_parsed(element, "season", &mut self.season);
        load_parsed(element, "episode", &mut self.episode);
        load_string(element, "aired", &mut self.aired);

        load_list(element, "genre", &mut self.genres, prioritise);
        load_list(element, "director", &mut self.directors, prioritise);
        load_list(element, "credits", &mut self.writers, prioritise);
        load_list(element, "studio", &mut self.studios, prioritise);
        load_list(element, "country", &mut self.countries, prioritise);
        self.load_cast(element, prioritise);

        load_thumbs(element, "thumb", &mut self.thumbs, prioritise);
        load_fanart(element, &mut self.fanart);
        if let Some(guide) = element.child("episodeguide") {
            for url in guide.children_named("url") {
                self.episode_guide.parse_element(url);
            }
        }

        Ok(())
    }

    fn save(&self, parent: &mut XmlElement, tag: &str) -> Result<()> {
        let mut details = XmlElement::new(tag);
        details.push_text_child("title", &self.title);
        details.push_text_child("originaltitle", self.original_title.as_deref().unwrap_or_default());
        details.push_text_child("sorttitle", self.sort_title.as_deref().unwrap_or_default());
        details.push_text_child("id", &self.unique_id);
        if let Some(year) = self.year {
            details.push_text_child("year", &year.to_string());
        }
        details.push_text_child("plot", &self.plot);
        details.push_text_child("outline", &self.outline);
        details.push_text_child("tagline", &self.tagline);
        if let Some(runtime) = self.runtime {
            details.push_text_child("runtime", &runtime.to_string());
        }
        details.push_text_child("mpaa", &self.mpaa);
        details.push_text_child("premiered", &self.premiered);
        if let Some(rating) = self.rating {
            details.push_text_child("rating", &rating.to_string());
        }
        if let Some(votes) = self.votes {
            details.push_text_child("votes", &votes.to_string());
        }
        if let Some(season) = self.season {
            details.push_text_child("season", &season.to_string());
        }
        if let Some(episode) = self.episode {
            details.push_text_child("episode", &episode.to_string());
        }
        details.push_text_child("aired", &self.aired);

        push_list(&mut details, "genre", &self.genres);
        push_list(&mut details, "director", &self.directors);
        push_list(&mut details, "credits", &self.writers);
        push_list(&mut details, "studio", &self.studios);
        push_list(&mut details, "country", &self.countries);

        for member in &self.cast {
            let mut actor = XmlElement::new("actor");
            actor.push_text_child("name", &member.name);
            actor.push_text_child("role", &member.role);
            actor.push_text_child("order", &member.order.to_string());
            actor.push_text_child("thumb", member.thumb.as_deref().unwrap_or_default());
            details.push_child(actor);
        }

        push_thumbs(&mut details, "thumb", &self.thumbs);
        save_fanart(&mut details, &self.fanart);
        if !self.episode_guide.is_empty() {
            let mut guide = XmlElement::new("episodeguide");
            push_thumbs(&mut guide, "url", &self.episode_guide);
            details.push_child(guide);
        }

        parent.push_child(details);
        Ok(())
    }
}

/// Read `<fanart url="base"><thumb>relative</thumb></fanart>` into `target`
fn load_fanart(element: &XmlElement, target: &mut ScraperUrl) {
    for fanart in element.children_named("fanart") {
        let base = fanart.attr("url").unwrap_or_default();
        for thumb in fanart.children_named("thumb") {
            let Some(relative) = thumb.first_text() else {
                continue;
            };
            let mut absolute = thumb.clone();
            absolute.children.clear();
            absolute = absolute.with_text(format!("{base}{relative}"));
            target.parse_element(&absolute);
        }
    }
}

fn save_fanart(parent: &mut XmlElement, fanart: &ScraperUrl) {
    if fanart.is_empty() {
        return;
    }
    let mut el = XmlElement::new("fanart");
    push_thumbs(&mut el, "thumb", fanart);
    parent.push_child(el);
}
