//! Desktop capabilities used by the gallery: sharing and opening links

use crate::types::SharePayload;
use eframe::egui;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("share capability unavailable")]
    Unavailable,
    #[error("share failed: {0}")]
    Failed(String),
}

#[cfg_attr(test, mockall::automock)]
pub trait Platform {
    fn try_share(&self, payload: &SharePayload) -> Result<(), ShareError>;
    fn open_external(&self, url: &str) -> std::io::Result<()>;
}

/// Shares by copying to the clipboard when enabled, opens links with the
/// system handler.
pub struct DesktopPlatform {
    ctx: egui::Context,
    clipboard_share: bool,
}

impl DesktopPlatform {
    pub fn new(ctx: egui::Context, clipboard_share: bool) -> Self {
        Self {
            ctx,
            clipboard_share,
        }
    }

    pub fn set_clipboard_share(&mut self, enabled: bool) {
        self.clipboard_share = enabled;
    }
}

impl Platform for DesktopPlatform {
    fn try_share(&self, payload: &SharePayload) -> Result<(), ShareError> {
        if !self.clipboard_share {
            return Err(ShareError::Unavailable);
        }
        self.ctx.copy_text(payload.to_clipboard_text());
        debug!(url = %payload.url, "Share text copied to clipboard");
        Ok(())
    }

    fn open_external(&self, url: &str) -> std::io::Result<()> {
        debug!(url = %url, "Opening link");
        open::that(url)
    }
}
