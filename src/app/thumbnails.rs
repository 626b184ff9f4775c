//! Lazy image loading for gallery cards
//!
//! Images are requested the first time their card becomes visible, fetched and
//! decoded off the UI thread, and turned into textures when the UI polls.

use crate::constants::{MAX_IMAGE_EDGE, MAX_IMAGE_FETCHES};
use eframe::egui;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("decode task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub enum ThumbnailSlot {
    Loading,
    Ready(egui::TextureHandle),
    Failed,
}

type Decoded = (String, Result<egui::ColorImage, ImageLoadError>);

pub struct ThumbnailLoader {
    slots: HashMap<String, ThumbnailSlot>,
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
    tx: mpsc::UnboundedSender<Decoded>,
    rx: mpsc::UnboundedReceiver<Decoded>,
}

impl ThumbnailLoader {
    pub fn new(client: reqwest::Client) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            slots: HashMap::new(),
            client,
            semaphore: Arc::new(Semaphore::new(MAX_IMAGE_FETCHES)),
            tx,
            rx,
        }
    }

    /// Current slot for `url`, starting a download if it was never requested
    pub fn get(
        &mut self,
        ctx: &egui::Context,
        runtime: &tokio::runtime::Handle,
        url: &str,
    ) -> &ThumbnailSlot {
        if !self.slots.contains_key(url) {
            self.spawn_fetch(ctx, runtime, url);
            self.slots.insert(url.to_string(), ThumbnailSlot::Loading);
        }
        &self.slots[url]
    }

    /// Turns finished downloads into textures
    pub fn poll(&mut self, ctx: &egui::Context) {
        while let Ok((url, result)) = self.rx.try_recv() {
            self.finish(ctx, url, result);
        }
    }

    fn finish(
        &mut self,
        ctx: &egui::Context,
        url: String,
        result: Result<egui::ColorImage, ImageLoadError>,
    ) {
        // Cleared by a refresh while in flight
        let Some(slot) = self.slots.get_mut(&url) else {
            debug!(url = %url, "Dropping image for a cleared gallery");
            return;
        };
        *slot = match result {
            Ok(image) => {
                ThumbnailSlot::Ready(ctx.load_texture(&url, image, egui::TextureOptions::LINEAR))
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Image failed to load");
                ThumbnailSlot::Failed
            }
        };
    }

    #[cfg(test)]
    async fn settle(&mut self, ctx: &egui::Context) {
        if let Some((url, result)) = self.rx.recv().await {
            self.finish(ctx, url, result);
        }
    }

    pub fn clear(&mut self) {
        debug!(count = self.slots.len(), "Clearing image cache");
        self.slots.clear();
    }

    fn spawn_fetch(&self, ctx: &egui::Context, runtime: &tokio::runtime::Handle, url: &str) {
        let client = self.client.clone();
        let semaphore = self.semaphore.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        let url = url.to_string();

        runtime.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let result = fetch_image(&client, &url).await;
            if tx.send((url, result)).is_ok() {
                ctx.request_repaint();
            }
        });
    }
}

async fn fetch_image(
    client: &reqwest::Client,
    url: &str,
) -> Result<egui::ColorImage, ImageLoadError> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(ImageLoadError::Status(response.status()));
    }
    let bytes = response.bytes().await?;
    tokio::task::spawn_blocking(move || decode_image(&bytes)).await?
}

/// Decodes any format the `image` crate knows, shrinking large images
pub fn decode_image(bytes: &[u8]) -> Result<egui::ColorImage, ImageLoadError> {
    let mut img = image::load_from_memory(bytes)?;
    if img.width() > MAX_IMAGE_EDGE || img.height() > MAX_IMAGE_EDGE {
        img = img.thumbnail(MAX_IMAGE_EDGE, MAX_IMAGE_EDGE);
    }
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 128, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn small_images_keep_their_size() {
        let image = decode_image(&png(64, 32)).unwrap();
        assert_eq!(image.size, [64, 32]);
        assert_eq!(image.pixels[0], egui::Color32::from_rgb(255, 0, 128));
    }

    #[test]
    fn large_images_are_shrunk_to_fit() {
        let image = decode_image(&png(MAX_IMAGE_EDGE * 2, MAX_IMAGE_EDGE)).unwrap();
        assert_eq!(image.size[0], MAX_IMAGE_EDGE as usize);
        assert!(image.size[1] <= MAX_IMAGE_EDGE as usize / 2 + 1);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ImageLoadError::Decode(_)));
    }

    #[tokio::test]
    async fn fetch_image_downloads_and_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/meme.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png(8, 8)))
            .mount(&server)
            .await;

        let image = fetch_image(&reqwest::Client::new(), &format!("{}/meme.png", server.uri()))
            .await
            .unwrap();
        assert_eq!(image.size, [8, 8]);
    }

    #[tokio::test]
    async fn fetch_image_rejects_missing_images() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetch_image(&reqwest::Client::new(), &format!("{}/gone.png", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageLoadError::Status(s) if s.as_u16() == 404));
    }

    async fn serve_png(server: &MockServer, route: &str, expected_hits: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png(8, 8)))
            .expect(expected_hits)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn repeated_get_downloads_once() {
        let server = MockServer::start().await;
        serve_png(&server, "/once.png", 1).await;
        let ctx = egui::Context::default();
        let runtime = tokio::runtime::Handle::current();
        let url = format!("{}/once.png", server.uri());

        let mut loader = ThumbnailLoader::new(reqwest::Client::new());
        for _ in 0..3 {
            assert!(matches!(loader.get(&ctx, &runtime, &url), ThumbnailSlot::Loading));
        }
        loader.settle(&ctx).await;

        assert!(matches!(loader.get(&ctx, &runtime, &url), ThumbnailSlot::Ready(_)));
        server.verify().await;
    }

    #[tokio::test]
    async fn failed_download_marks_slot_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let ctx = egui::Context::default();
        let runtime = tokio::runtime::Handle::current();
        let url = format!("{}/broken.png", server.uri());

        let mut loader = ThumbnailLoader::new(reqwest::Client::new());
        loader.get(&ctx, &runtime, &url);
        loader.settle(&ctx).await;

        assert!(matches!(loader.slots.get(&url), Some(ThumbnailSlot::Failed)));
    }

    #[tokio::test]
    async fn image_finishing_after_clear_is_dropped() {
        let server = MockServer::start().await;
        serve_png(&server, "/stale.png", 1).await;
        let ctx = egui::Context::default();
        let runtime = tokio::runtime::Handle::current();
        let url = format!("{}/stale.png", server.uri());

        let mut loader = ThumbnailLoader::new(reqwest::Client::new());
        loader.get(&ctx, &runtime, &url);
        loader.clear();
        loader.settle(&ctx).await;

        assert!(loader.slots.is_empty());
    }
}
