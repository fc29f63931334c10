mod media;
mod metadata;

pub use media::{AlbumCandidate, ArtistCandidate, EpisodeGuideEntry};
pub use metadata::{AlbumInfo, ArtistInfo, CastMember, TrackInfo, VideoDetails};

use crate::scraper::{Result, url::ScraperUrl, xml::XmlElement};
use std::str::FromStr;

/// Separator between several values packed into one element
pub(crate) const ITEM_SEPARATOR: &str = " / ";

/// Records that can be filled from, and written back to, scraper XML.
///
/// `append = false` resets the record before loading. With `append = true`
/// only the elements present in `element` change the record. `prioritise`
/// makes list values from `element` replace the current ones (and puts new
/// artwork first); otherwise they are appended.
pub trait XmlLoadable {
    fn load(&mut self, element: &XmlElement, append: bool, prioritise: bool) -> Result<()>;

    fn save(&self, parent: &mut XmlElement, tag: &str) -> Result<()>;
}

/// Overwrite `target` when the child element exists
pub(crate) fn load_string(element: &XmlElement, name: &str, target: &mut String) {
    if let Some(value) = element.child_text(name) {
        *target = value;
    }
}

pub(crate) fn load_opt_string(element: &XmlElement, name: &str, target: &mut Option<String>) {
    if let Some(value) = element.child_text(name) {
        *target = Some(value).filter(|v| !v.is_empty());
    }
}

/// Overwrite `target` when the child element exists and parses
pub(crate) fn load_parsed<T: FromStr>(element: &XmlElement, name: &str, target: &mut Option<T>) {
    if let Some(value) = element.child_text(name).and_then(|v| v.trim().parse().ok()) {
        *target = Some(value);
    }
}

pub(crate) fn load_bool(element: &XmlElement, name: &str, target: &mut bool) {
    if let Some(value) = element.child_text(name) {
        *target = matches!(value.trim().to_lowercase().as_str(), "true" | "yes" | "1");
    }
}

/// Collect every `name` child, splitting packed values.
///
/// Replaces the current list when `prioritise` is set and the element has at
/// least one such child; otherwise new values are appended without repeats.
pub(crate) fn load_list(element: &XmlElement, name: &str, target: &mut Vec<String>, prioritise: bool) {
    let values: Vec<String> = element
        .child_texts(name)
        .iter()
        .flat_map(|v| v.split(ITEM_SEPARATOR))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();

    if values.is_empty() {
        return;
    }

    if prioritise {
        target.clear();
    }
    for value in values {
        if !target.contains(&value) {
            target.push(value);
        }
    }
}

/// Add every `name` child as artwork; new entries go first when prioritised
pub(crate) fn load_thumbs(element: &XmlElement, name: &str, target: &mut ScraperUrl, prioritise: bool) {
    let existing = target.entries.len();
    let mut added_xml = String::new();
    for thumb in element.children_named(name) {
        if target.parse_element(thumb) {
            added_xml.push_str(&thumb.to_xml_string());
        }
    }

    if prioritise && existing > 0 && target.entries.len() > existing {
        target.entries.rotate_left(existing);
        let previous = target.xml[..target.xml.len() - added_xml.len()].to_string();
        target.xml = format!("{added_xml}{previous}");
    }
}

/// Leading integer of a string, 0 when there is none
pub(crate) fn leading_int(s: &str) -> i32 {
    let s = s.trim();
    let end = s
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse().unwrap_or(0)
}

/// Parse `mm:ss` or `hh:mm:ss` (or plain seconds) into seconds
pub(crate) fn duration_seconds(s: &str) -> i32 {
    s.trim()
        .split(':')
        .fold(0, |acc, part| acc * 60 + leading_int(part))
}

pub(crate) fn push_list(parent: &mut XmlElement, name: &str, values: &[String]) {
    for value in values {
        parent.push_text_child(name, value);
    }
}

pub(crate) fn push_thumbs(parent: &mut XmlElement, name: &str, thumbs: &ScraperUrl) {
    for mut thumb in thumbs.to_elements() {
        thumb.name = name.to_string();
        parent.push_child(thumb);
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
    fn test_leading_int() {
        assert_eq!(leading_int("12.5"), 12);
        assert_eq!(leading_int(" 7 "), 7);
        assert_eq!(leading_int("-3x"), -3);
        assert_eq!(leading_int("abc"), 0);
        assert_eq!(leading_int(""), 0);
    }

    #[test]
    fn test_duration_seconds() {
        assert_eq!(duration_seconds("3:25"), 205);
        assert_eq!(duration_seconds("1:02:03"), 3723);
        assert_eq!(duration_seconds("90"), 90);
    }

    #[test]
    fn test_load_list_split_and_prioritise() {
        let el = element("<a><genre>Rock / Pop</genre><genre>Jazz</genre></a>");

        let mut genres = vec!["Blues".to_string()];
        load_list(&el, "genre", &mut genres, false);
        assert_eq!(genres, vec!["Blues", "Rock", "Pop", "Jazz"]);

        load_list(&el, "genre", &mut genres, true);
        assert_eq!(genres, vec!["Rock", "Pop", "Jazz"]);
    }

    #[test]
    fn test_load_thumbs_prioritised_go_first() {
        let mut thumbs = ScraperUrl::from_url("http://img/old.jpg");
        let el = element("<a><thumb>http://img/new.jpg</thumb></a>");

        load_thumbs(&el, "thumb", &mut thumbs, true);

        assert_eq!(thumbs.entries[0].url, "http://img/new.jpg");
        assert_eq!(thumbs.entries[1].url, "http://img/old.jpg");
        assert!(thumbs.xml.starts_with("<thumb>"));
    }
}
