use regex::Regex;
use std::sync::LazyLock;

/// Extensions stripped from titles before searching
const MEDIA_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "mov", "wmv", "flv", "webm", "m4v", "iso", "rmvb", "ts", "m2ts", "mpg",
    "mpeg", "vob", "img", "nfo", "mp3", "flac", "ogg", "m4a", "wav",
];

/// Pre-compiled patterns for title cleaning
struct Patterns {
    /// Title followed by a release year
    year: Regex,
    /// Release tags; everything from the first match onwards is dropped
    tags: Vec<Regex>,
}

impl Patterns {
    fn new() -> Self {
        Self {
            year: Regex::new(
                r"(.*[^ _,.()\[\]\-])[ _.()\[\]\-]+((?:19|20)[0-9][0-9])(?:[ _,.()\[\]\-]|[^0-9]$)?",
            )
            .expect("Invalid year regex"),
            tags: vec![
                Regex::new(concat!(
                    r"(?i)[ _,.()\[\]\-](aka|ac3|dts|custom|dc|remastered|divx|divx5|dsr|dsrip|dutch|",
                    r"dvd|dvd5|dvd9|dvdrip|dvdscr|dvdscreener|screener|dvdivx|cam|fragment|fs|hdtv|",
                    r"hdrip|hdtvrip|internal|limited|multisubs|ntsc|ogg|ogm|pal|pdtv|proper|repack|",
                    r"rerip|retail|r3|r5|bd5|se|svcd|swedish|german|read\.nfo|nfofix|unrated|",
                    r"extended|ws|telesync|ts|telecine|tc|brrip|bdrip|480p|480i|576p|576i|720p|",
                    r"720i|1080p|1080i|2160p|3d|hrhd|hrhdtv|hddvd|bluray|x264|h264|x265|hevc|xvid|",
                    r"xvidvd|xxx|www\.www|cd[1-9]|\[.*\])(?:[ _,.()\[\]\-]|$)",
                ))
                .expect("Invalid tags regex"),
                Regex::new(r"(\[.*\])").expect("Invalid brackets regex"),
            ],
        }
    }
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(Patterns::new);

/// A search title split into its parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanedTitle {
    /// Title without year and release tags
    pub title: String,
    /// Title with ` (year)` appended when a year was found
    pub title_and_year: String,
    pub year: Option<i32>,
}

/// Cleans raw file names and user input into search titles
pub struct Parser;

impl Parser {
    /// Split a raw title or file name into title and year.
    ///
    /// `clean_chars` turns `_` into spaces, and `.` too when the name has no
    /// spaces (leading dots are kept).
    #[must_use]
    pub fn clean_title(raw: &str, remove_extension: bool, clean_chars: bool) -> CleanedTitle {
        if raw == ".." {
            return CleanedTitle {
                title: raw.to_string(),
                title_and_year: raw.to_string(),
                year: None,
            };
        }

        let mut title = if remove_extension {
            Self::strip_extension(raw)
        } else {
            raw.to_string()
        };

        let mut year = None;
        if let Some(caps) = PATTERNS.year.captures(&title) {
            year = caps.get(2).and_then(|m| m.as_str().parse().ok());
            title = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
        }

        for tag in &PATTERNS.tags {
            if let Some(m) = tag.find(&title)
                && m.start() > 0
            {
                title.truncate(m.start());
            }
        }

        if clean_chars {
            title = Self::clean_chars(&title);
        }

        let title = title.trim().to_string();
        let title_and_year = match year {
            Some(y) => format!("{title} ({y})"),
            None => title.clone(),
        };

        CleanedTitle {
            title,
            title_and_year,
            year,
        }
    }

    fn strip_extension(raw: &str) -> String {
        match raw.rsplit_once('.') {
            Some((stem, ext)) if MEDIA_EXTENSIONS.contains(&ext.to_lowercase().as_str()) => {
                stem.to_string()
            }
            _ => raw.to_string(),
        }
    }

    fn clean_chars(title: &str) -> String {
        let has_space = title.contains(' ');
        let mut initial_dots = true;
        title
            .chars()
            .map(|c| {
                if c != '.' {
                    initial_dots = false;
                }
                if c == '_' || (!has_space && !initial_dots && c == '.') {
                    ' '
                } else {
                    c
                }
            })
            .collect()
    }
}
