//! Utility functions

use crate::constants::APP_NAME;
use chrono::{DateTime, Local};
use eframe::egui;
use std::path::PathBuf;

/// Get the app data directory (settings, logs)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// UV rect that crops an image of `image_size` to fill `target_size`
/// without stretching, keeping the center.
pub fn cover_uv(image_size: egui::Vec2, target_size: egui::Vec2) -> egui::Rect {
    let full = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    if image_size.x <= 0.0 || image_size.y <= 0.0 || target_size.x <= 0.0 || target_size.y <= 0.0
    {
        return full;
    }

    let image_aspect = image_size.x / image_size.y;
    let target_aspect = target_size.x / target_size.y;

    if image_aspect > target_aspect {
        // Wider than target: crop left/right
        let visible = target_aspect / image_aspect;
        let margin = (1.0 - visible) / 2.0;
        egui::Rect::from_min_max(egui::pos2(margin, 0.0), egui::pos2(1.0 - margin, 1.0))
    } else if image_aspect < target_aspect {
        // Taller: crop top/bottom
        let visible = image_aspect / target_aspect;
        let margin = (1.0 - visible) / 2.0;
        egui::Rect::from_min_max(egui::pos2(0.0, margin), egui::pos2(1.0, 1.0 - margin))
    } else {
        full
    }
}

/// Number of grid columns for the available width. Mirrors the 1/2/3 column
/// breakpoints; compact cards allow up to five.
pub fn grid_columns(available_width: f32, large_cards: bool) -> usize {
    let max = if large_cards { 3 } else { 5 };
    let min_card = if large_cards { 320.0 } else { 200.0 };
    ((available_width / min_card).floor() as usize).clamp(1, max)
}

/// Footer status line
pub fn format_status(count: usize, updated: Option<DateTime<Local>>) -> String {
    let memes = if count == 1 { "meme" } else { "memes" };
    match updated {
        Some(t) => format!("{} {} • updated {}", count, memes, t.format("%H:%M")),
        None => format!("{} {}", count, memes),
    }
}
