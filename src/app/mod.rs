//! App module - contains the main application state and logic

mod thumbnails;
mod views;

use crate::api::MemeApiClient;
use crate::constants::*;
use crate::gallery::{self, Gallery};
use crate::platform::DesktopPlatform;
use crate::settings::Settings;
use crate::theme;
use crate::types::{Meme, ShareOutcome};
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thumbnails::ThumbnailLoader;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    pub(crate) gallery: Gallery,
    pub(crate) thumbnails: ThumbnailLoader,
    pub(crate) platform: DesktopPlatform,
    pub(crate) settings: Settings,
    pub(crate) data_dir: PathBuf,
    pub(crate) started: bool,
    pub(crate) show_settings: bool,
    // Toast notification
    pub(crate) toast_message: Option<String>,
    pub(crate) toast_start: Option<Instant>,
    pub(crate) central_panel_rect: Option<egui::Rect>,
    // Window geometry
    pub(crate) window_pos: Option<egui::Pos2>,
    pub(crate) window_size: Option<egui::Vec2>,
    pub(crate) needs_center: bool,
    // Declared last: tasks spawned by the gallery and loader need it alive
    pub(crate) runtime: tokio::runtime::Runtime,
}

// ============================================================================
// APP INITIALIZATION & HELPERS
// ============================================================================

impl App {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: Settings,
        data_dir: PathBuf,
    ) -> Result<Self, StartupError> {
        cc.egui_ctx.set_theme(egui::Theme::Dark);

        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        theme::apply_visuals(&cc.egui_ctx);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("meme-gallery-net")
            .build()?;

        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout())
            .user_agent(format!("meme-gallery/{}", APP_VERSION))
            .build()?;

        let source = MemeApiClient::new(http.clone(), &settings.api_base_url, &settings.category);
        info!(endpoint = %source.endpoint(PAGE_SIZE), "Meme source configured");

        let ctx = cc.egui_ctx.clone();
        let gallery = Gallery::new(
            Arc::new(source),
            runtime.handle().clone(),
            Arc::new(move || ctx.request_repaint()),
        );

        Ok(Self {
            gallery,
            thumbnails: ThumbnailLoader::new(http),
            platform: DesktopPlatform::new(cc.egui_ctx.clone(), settings.share_via_clipboard),
            settings,
            data_dir,
            started: false,
            show_settings: false,
            toast_message: None,
            toast_start: None,
            central_panel_rect: None,
            window_pos: None,
            window_size: None,
            needs_center: false,
            runtime,
        })
    }

    /// Starts the first load once; later calls do nothing
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.gallery.load_initial();
    }

    /// Full reset: drops loaded memes and images, then loads from scratch
    pub fn refresh(&mut self) {
        self.thumbnails.clear();
        self.gallery.refresh();
    }

    pub fn share_meme(&mut self, meme: &Meme) {
        match gallery::share(&self.platform, meme) {
            ShareOutcome::Shared => self.show_toast("Link copied to clipboard"),
            ShareOutcome::OpenedExternally => {}
            ShareOutcome::Failed => self.show_toast("Couldn't share or open this meme"),
        }
    }

    pub fn open_meme_source(&mut self, meme: &Meme) {
        if !gallery::open_source(&self.platform, meme) {
            self.show_toast("Couldn't open the original post");
        }
    }

    pub fn show_toast(&mut self, msg: impl Into<String>) {
        self.toast_message = Some(msg.into());
        self.toast_start = Some(Instant::now());
    }

    pub fn set_share_via_clipboard(&mut self, enabled: bool) {
        self.settings.share_via_clipboard = enabled;
        self.platform.set_clipboard_share(enabled);
    }

    pub fn save_settings(&mut self) {
        self.settings.window_x = self.window_pos.map(|p| p.x);
        self.settings.window_y = self.window_pos.map(|p| p.y);
        self.settings.window_w = self.window_size.map(|s| s.x);
        self.settings.window_h = self.window_size.map(|s| s.y);
        self.settings.save(&self.data_dir);
    }
}
