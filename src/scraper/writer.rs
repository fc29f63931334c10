use crate::scraper::{
    catalog::ContentType,
    types::{AlbumInfo, ArtistInfo, VideoDetails, XmlLoadable},
    xml::XmlElement,
};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// NFO sidecar writer for scraped records
pub struct Writer;

impl Writer {
    /// Write album NFO file
    pub async fn write_album_nfo(path: &Path, album: &AlbumInfo) -> Result<()> {
        Self::write_nfo(path, album, "album").await
    }

    /// Write artist NFO file
    pub async fn write_artist_nfo(path: &Path, artist: &ArtistInfo) -> Result<()> {
        Self::write_nfo(path, artist, "artist").await
    }

    /// Write a movie, TV show, episode or music video NFO file
    pub async fn write_video_nfo(path: &Path, details: &VideoDetails, content: ContentType) -> Result<()> {
        Self::write_nfo(path, details, Self::video_tag(details, content)).await
    }

    fn video_tag(details: &VideoDetails, content: ContentType) -> &'static str {
        match content {
            ContentType::TvShows if details.episode.is_some() => "episodedetails",
            ContentType::TvShows => "tvshow",
            ContentType::MusicVideos => "musicvideo",
            _ => "movie",
        }
    }

    async fn write_nfo<T: XmlLoadable>(path: &Path, record: &T, tag: &str) -> Result<()> {
        let mut holder = XmlElement::new("nfo");
        record
            .save(&mut holder, tag)
            .with_context(|| format!("Failed to serialize <{tag}>"))?;
        let xml: String = holder.elements().map(XmlElement::to_xml_string).collect();
        let content = format!("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n{xml}");

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(content.as_bytes()).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::xml::XmlDocument;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_album_nfo_reloads() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Music").join("album.nfo");
        let album = AlbumInfo {
            title: "Blue Train".to_string(),
            artists: vec!["John Coltrane".to_string()],
            label: "Blue Note".to_string(),
            ..Default::default()
        };

        Writer::write_album_nfo(&path, &album).await.unwrap();

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(text.starts_with("<?xml"));
        let doc = XmlDocument::parse(&text).unwrap();
        let root = doc.first_child("album").unwrap();

        let mut reloaded = AlbumInfo::default();
        reloaded.load(root, false, false).unwrap();
        assert_eq!(reloaded, album);
    }

    #[test]
    fn test_video_tag() {
        let movie = VideoDetails::default();
        let episode = VideoDetails {
            episode: Some(3),
            ..Default::default()
        };
        assert_eq!(Writer::video_tag(&movie, ContentType::Movies), "movie");
        assert_eq!(Writer::video_tag(&movie, ContentType::TvShows), "tvshow");
        assert_eq!(Writer::video_tag(&episode, ContentType::TvShows), "episodedetails");
        assert_eq!(Writer::video_tag(&movie, ContentType::MusicVideos), "musicvideo");
    }
}
