use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use card_binder_application::{ApplicationError, Thumbnail, ThumbnailEvent, ThumbnailLoader};
use image::{DynamicImage, ImageFormat};
use reqwest::blocking::Client;
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::http::ensure_success;

pub const THUMBNAIL_EDGE: u32 = 256;

pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ApplicationError>;
}

#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ApplicationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ApplicationError::Network(error.to_string()))?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ApplicationError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|error| ApplicationError::Network(error.to_string()))?;
        let bytes = ensure_success(response, url)?
            .bytes()
            .map_err(|error| ApplicationError::Network(error.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Card art shrunk to `THUMBNAIL_EDGE` and kept as PNG under
/// `<cache_root>/thumbs/<sha1(url)>.png`.
pub struct FsThumbnailCache {
    cache_root: PathBuf,
    fetcher: Arc<dyn ImageFetcher>,
}

impl FsThumbnailCache {
    pub fn new(cache_root: impl Into<PathBuf>, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            cache_root: cache_root.into(),
            fetcher,
        }
    }

    pub fn cache_path(&self, url: &str) -> PathBuf {
        let digest = Sha1::digest(url.as_bytes());
        self.cache_root
            .join("thumbs")
            .join(format!("{digest:x}.png"))
    }

    pub fn ensure_thumbnail(&self, url: &str) -> Result<Thumbnail, ApplicationError> {
        let thumb_path = self.cache_path(url);
        if thumb_path.exists() {
            let cached = image::open(&thumb_path)
                .map_err(|error| ApplicationError::Decode(error.to_string()))?;
            return Ok(to_thumbnail(url, &cached));
        }

        let bytes = self.fetcher.fetch(url)?;
        let image = image::load_from_memory(&bytes)
            .map_err(|error| ApplicationError::Decode(error.to_string()))?;
        let thumb = image.thumbnail(THUMBNAIL_EDGE, THUMBNAIL_EDGE);
        store_thumbnail(&thumb, &thumb_path)?;
        debug!(%url, path = %thumb_path.display(), "thumbnail cached");

        Ok(to_thumbnail(url, &thumb))
    }
}

fn store_thumbnail(thumb: &DynamicImage, thumb_path: &Path) -> Result<(), ApplicationError> {
    if let Some(parent) = thumb_path.parent() {
        fs::create_dir_all(parent).map_err(|error| ApplicationError::Io(error.to_string()))?;
    }
    thumb
        .to_rgba8()
        .save_with_format(thumb_path, ImageFormat::Png)
        .map_err(|error| ApplicationError::Io(error.to_string()))
}

fn to_thumbnail(url: &str, image: &DynamicImage) -> Thumbnail {
    let rgba = image.to_rgba8();
    Thumbnail {
        url: url.to_string(),
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    }
}

/// Loads thumbnails on a worker thread; results are polled from the UI loop.
pub struct BackgroundThumbnailLoader {
    submit_tx: mpsc::Sender<String>,
    result_rx: Mutex<mpsc::Receiver<ThumbnailEvent>>,
}

impl BackgroundThumbnailLoader {
    pub fn new(cache: FsThumbnailCache) -> Self {
        let (submit_tx, submit_rx) = mpsc::channel::<String>();
        let (result_tx, result_rx) = mpsc::channel::<ThumbnailEvent>();

        thread::spawn(move || {
            while let Ok(url) = submit_rx.recv() {
                let event = match cache.ensure_thumbnail(&url) {
                    Ok(thumbnail) => ThumbnailEvent::Ready(thumbnail),
                    Err(error) => {
                        debug!(%url, %error, "thumbnail unavailable");
                        ThumbnailEvent::Failed {
                            url,
                            reason: error.to_string(),
                        }
                    }
                };
                if result_tx.send(event).is_err() {
                    return;
                }
            }
        });

        Self {
            submit_tx,
            result_rx: Mutex::new(result_rx),
        }
    }
}

impl ThumbnailLoader for BackgroundThumbnailLoader {
    fn request_thumbnail(&self, url: &str) -> Result<(), ApplicationError> {
        self.submit_tx
            .send(url.to_string())
            .map_err(|error| ApplicationError::Io(format!("failed to enqueue thumbnail: {error}")))
    }

    fn try_receive_thumbnail(&self) -> Result<Option<ThumbnailEvent>, ApplicationError> {
        let receiver = self
            .result_rx
            .lock()
            .map_err(|_| ApplicationError::Io("thumbnail result lock poisoned".to_string()))?;

        match receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(ApplicationError::Io(
                "thumbnail result channel disconnected".to_string(),
            )),
        }
    }
}
