use crate::scraper::{AlbumCandidate, ArtistCandidate, HttpFetcher, Result, Scraper};
use futures::FutureExt;
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// How long [`MusicInfoScraper::completed`] waits for the worker
const COMPLETION_POLL: Duration = Duration::from_millis(10);

/// A queued unit of work
#[derive(Debug, Clone)]
enum Request {
    FindAlbums { album: String, artist: String },
    FindArtists { artist: String },
    LoadAlbum { index: usize },
    LoadArtist { index: usize, search_term: String },
}

/// Results shared between the job and its worker
#[derive(Debug, Default)]
struct JobState {
    albums: Vec<AlbumCandidate>,
    artists: Vec<ArtistCandidate>,
    succeeded: bool,
}

struct Worker {
    handle: JoinHandle<()>,
    token: CancellationToken,
}

/// Runs album and artist lookups for one scraper in the background.
///
/// Only one request runs at a time: a new request stops the running one and
/// waits for it before starting.
pub struct MusicInfoScraper {
    scraper: Arc<Scraper>,
    http: Arc<dyn HttpFetcher>,
    state: Arc<Mutex<JobState>>,
    canceled: Arc<AtomicBool>,
    worker: tokio::sync::Mutex<Option<Worker>>,
}

impl MusicInfoScraper {
    pub fn new(scraper: Arc<Scraper>, http: Arc<dyn HttpFetcher>) -> Self {
        Self {
            scraper,
            http,
            state: Arc::new(Mutex::new(JobState::default())),
            canceled: Arc::new(AtomicBool::new(false)),
            worker: tokio::sync::Mutex::new(None),
        }
    }

    pub fn scraper(&self) -> &Arc<Scraper> {
        &self.scraper
    }

    /// Search for albums in the background
    pub async fn find_album_info(&self, album: &str, artist: &str) {
        self.start(Request::FindAlbums {
            album: album.to_string(),
            artist: artist.to_string(),
        })
        .await;
    }

    /// Search for artists in the background
    pub async fn find_artist_info(&self, artist: &str) {
        self.start(Request::FindArtists {
            artist: artist.to_string(),
        })
        .await;
    }

    /// Load details of a previously found album; out-of-range indices do nothing
    pub async fn load_album_info(&self, index: usize) {
        self.start(Request::LoadAlbum { index }).await;
    }

    /// Load details of a previously found artist; out-of-range indices do nothing
    pub async fn load_artist_info(&self, index: usize, search_term: &str) {
        self.start(Request::LoadArtist {
            index,
            search_term: search_term.to_string(),
        })
        .await;
    }

    /// Abort the transfer in flight and mark the job canceled
    pub fn cancel(&self) {
        if self.canceled.swap(true, Ordering::SeqCst) {
            return;
        }
        self.http.cancel();
        self.http.reset();
    }

    /// Whether the worker has finished; waits briefly before answering
    pub async fn completed(&self) -> bool {
        let mut worker = self.worker.lock().await;
        let Some(running) = worker.as_mut() else {
            return true;
        };

        if !running.handle.is_finished()
            && tokio::time::timeout(COMPLETION_POLL, &mut running.handle)
                .await
                .is_err()
        {
            return false;
        }

        worker.take();
        true
    }

    /// Wait until the current request is done
    pub async fn wait(&self) {
        let running = self.worker.lock().await.take();
        if let Some(running) = running
            && let Err(e) = running.handle.await
        {
            error!("Scrape worker ended abnormally: {}", e);
        }
    }

    /// True when the last request produced data and the job was not canceled
    pub fn succeeded(&self) -> bool {
        !self.canceled.load(Ordering::SeqCst) && self.state.lock().succeeded
    }

    pub fn album_count(&self) -> usize {
        self.state.lock().albums.len()
    }

    pub fn artist_count(&self) -> usize {
        self.state.lock().artists.len()
    }

    pub fn album(&self, index: usize) -> Option<AlbumCandidate> {
        self.state.lock().albums.get(index).cloned()
    }

    pub fn artist(&self, index: usize) -> Option<ArtistCandidate> {
        self.state.lock().artists.get(index).cloned()
    }

    async fn start(&self, request: Request) {
        let mut worker = self.worker.lock().await;

        if let Some(previous) = worker.take() {
            previous.token.cancel();
            if let Err(e) = previous.handle.await {
                error!("Scrape worker ended abnormally: {}", e);
            }
        }

        self.state.lock().succeeded = false;
        self.canceled.store(false, Ordering::SeqCst);

        let token = CancellationToken::new();
        let stop = token.clone();
        let scraper = Arc::clone(&self.scraper);
        let http = Arc::clone(&self.http);
        let state = Arc::clone(&self.state);

        let handle = tokio::spawn(async move {
            debug!("Scrape worker started: {:?}", request);
            let work = AssertUnwindSafe(process(scraper, http, state, request)).catch_unwind();

            tokio::select! {
                () = stop.cancelled() => debug!("Scrape worker stopped"),
                outcome = work => match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => error!("Scrape worker failed: {}", e),
                    Err(_) => error!("Scrape worker panicked"),
                },
            }
        });

        *worker = Some(Worker { handle, token });
    }
}

impl Drop for MusicInfoScraper {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            worker.token.cancel();
        }
    }
}

async fn process(
    scraper: Arc<Scraper>,
    http: Arc<dyn HttpFetcher>,
    state: Arc<Mutex<JobState>>,
    request: Request,
) -> Result<()> {
    match request {
        Request::FindAlbums { album, artist } => {
            let albums = scraper.find_album(http.as_ref(), &album, &artist).await?;
            let mut state = state.lock();
            state.succeeded = !albums.is_empty();
            state.albums = albums;
        }
        Request::FindArtists { artist } => {
            let artists = scraper.find_artist(http.as_ref(), &artist).await?;
            let mut state = state.lock();
            state.succeeded = !artists.is_empty();
            state.artists = artists;
        }
        Request::LoadAlbum { index } => {
            let Some(mut candidate) = state.lock().albums.get(index).cloned() else {
                return Ok(());
            };
            candidate.album.artists.clear();

            let loaded = candidate.load(&scraper, http.as_ref()).await?;
            let mut state = state.lock();
            if let Some(slot) = state.albums.get_mut(index) {
                *slot = candidate;
            }
            state.succeeded |= loaded;
        }
        Request::LoadArtist { index, search_term } => {
            let Some(mut candidate) = state.lock().artists.get(index).cloned() else {
                return Ok(());
            };
            candidate.artist.name.clear();

            let loaded = candidate.load(&scraper, http.as_ref(), &search_term).await?;
            let mut state = state.lock();
            if let Some(slot) = state.artists.get_mut(index) {
                *slot = candidate;
            }
            state.succeeded |= loaded;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::tests::support::{Fixture, MockFetcher, SEARCH_PROGRAM, ScriptEngine, fixture};

    const ALBUM_RESULTS: &str = concat!(
        "<results><entity><title>OK Computer</title><artist>Radiohead</artist>",
        "<year>1997</year><url>http://music/1</url></entity></results>"
    );

    fn music_engine() -> ScriptEngine {
        ScriptEngine::new()
            .respond("CreateAlbumSearchUrl", "<url>http://music/albums</url>")
            .respond("GetAlbumSearchResults", ALBUM_RESULTS)
            .respond(
                "GetAlbumDetails",
                "<details><title>OK Computer</title><label>Parlophone</label></details>",
            )
            .respond("CreateArtistSearchUrl", "<url>http://music/artists</url>")
            .respond(
                "GetArtistSearchResults",
                "<results><entity><title>Radiohead</title><url>http://music/a/1</url></entity></results>",
            )
            .respond("GetArtistDetails", "<details><name>Radiohead</name><formed>1985</formed></details>")
    }

    fn music_fetcher() -> MockFetcher {
        MockFetcher::new()
            .serve("http://music/albums", "album-search")
            .serve("http://music/1", "album-page")
            .serve("http://music/artists", "artist-search")
            .serve("http://music/a/1", "artist-page")
    }

    fn job(fetcher: MockFetcher) -> (Fixture, Arc<MockFetcher>, MusicInfoScraper) {
        job_with(music_engine(), fetcher)
    }

    fn job_with(
        engine: ScriptEngine,
        fetcher: MockFetcher,
    ) -> (Fixture, Arc<MockFetcher>, MusicInfoScraper) {
        let fx = fixture(SEARCH_PROGRAM, engine);
        let http = Arc::new(fetcher);
        let scraper = Arc::new(fx.scraper.clone_for(fx.scraper.content()));
        let job = MusicInfoScraper::new(scraper, Arc::clone(&http) as Arc<dyn HttpFetcher>);
        (fx, http, job)
    }

    #[tokio::test]
    async fn test_find_then_load_album() {
        let (_fx, _http, job) = job(music_fetcher());

        job.find_album_info("OK Computer", "Radiohead").await;
        job.wait().await;

        assert!(job.succeeded());
        assert_eq!(job.album_count(), 1);
        assert!(!job.album(0).unwrap().loaded);

        job.load_album_info(0).await;
        job.wait().await;

        let album = job.album(0).unwrap();
        assert!(job.succeeded());
        assert!(album.loaded);
        assert_eq!(album.album.label, "Parlophone");
        assert_eq!(album.album.artists, vec!["Radiohead"]);
    }

    #[tokio::test]
    async fn test_find_then_load_artist() {
        let (_fx, _http, job) = job(music_fetcher());

        job.find_artist_info("Radiohead").await;
        job.wait().await;
        assert_eq!(job.artist_count(), 1);

        job.load_artist_info(0, "Radiohead").await;
        job.wait().await;

        let artist = job.artist(0).unwrap();
        assert!(artist.loaded);
        assert_eq!(artist.artist.formed, "1985");
    }

    #[tokio::test]
    async fn test_load_out_of_range_does_nothing() {
        let (fx, http, job) = job(music_fetcher());

        job.load_album_info(3).await;
        job.wait().await;

        assert!(!job.succeeded());
        assert!(http.requests().is_empty());
        assert!(fx.engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_marks_job_unsuccessful() {
        let (_fx, http, job) = job(music_fetcher().with_delay(Duration::from_millis(50)));

        job.find_album_info("OK Computer", "Radiohead").await;
        job.cancel();
        job.cancel();
        job.wait().await;

        assert!(!job.succeeded());
        assert_eq!(http.cancel_count(), 1);

        job.find_album_info("OK Computer", "Radiohead").await;
        job.wait().await;
        assert!(job.succeeded());
    }

    #[tokio::test]
    async fn test_completed_polls_worker() {
        let (_fx, _http, job) = job(music_fetcher().with_delay(Duration::from_millis(200)));
        assert!(job.completed().await);

        job.find_album_info("OK Computer", "Radiohead").await;
        assert!(!job.completed().await);

        job.wait().await;
        assert!(job.completed().await);
    }

    #[tokio::test]
    async fn test_new_request_replaces_running_one() {
        let (_fx, _http, job) = job(music_fetcher().with_delay(Duration::from_millis(100)));

        job.find_artist_info("Radiohead").await;
        job.find_album_info("OK Computer", "Radiohead").await;
        job.wait().await;

        assert_eq!(job.artist_count(), 0);
        assert_eq!(job.album_count(), 1);
        assert!(job.succeeded());
    }

    #[tokio::test]
    async fn test_worker_survives_panicking_engine() {
        let engine =
            music_engine().handle("GetAlbumSearchResults", |_| panic!("engine failure"));
        let (_fx, _http, job) = job_with(engine, music_fetcher());

        job.find_album_info("OK Computer", "Radiohead").await;
        job.wait().await;

        assert!(!job.succeeded());
        assert_eq!(job.album_count(), 0);
        assert!(job.completed().await);

        job.find_artist_info("Radiohead").await;
        job.wait().await;

        assert!(job.succeeded());
        assert_eq!(job.artist_count(), 1);
    }

    #[tokio::test]
    async fn test_worker_survives_user_visible_error() {
        let (_fx, http, job) = job(music_fetcher().refuse("http://music/albums"));

        job.find_album_info("OK Computer", "Radiohead").await;
        job.wait().await;

        assert!(!job.succeeded());
        assert_eq!(job.album_count(), 0);
        assert_eq!(http.requests(), vec!["http://music/albums"]);

        job.find_artist_info("Radiohead").await;
        job.wait().await;

        assert!(job.succeeded());
        assert_eq!(job.artist_count(), 1);
    }
}
