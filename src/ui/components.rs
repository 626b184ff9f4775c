//! Reusable UI components

use crate::theme;
use eframe::egui;
use egui::text::{LayoutJob, TextFormat, TextWrapping};

/// Round translucent icon button painted over an image
pub fn overlay_icon_button(
    ui: &mut egui::Ui,
    id_salt: impl std::hash::Hash,
    center: egui::Pos2,
    icon: &str,
    tooltip: &str,
) -> egui::Response {
    let rect = egui::Rect::from_center_size(
        center,
        egui::vec2(theme::OVERLAY_BUTTON_SIZE, theme::OVERLAY_BUTTON_SIZE),
    );
    let response = ui
        .interact(rect, ui.id().with(id_salt), egui::Sense::click())
        .on_hover_text(tooltip);

    let (fill, draw_rect) = theme::button_visual(&response, theme::OVERLAY_BUTTON, rect);
    let painter = ui.painter();
    painter.circle_filled(draw_rect.center(), draw_rect.width() / 2.0, fill);
    painter.text(
        draw_rect.center(),
        egui::Align2::CENTER_CENTER,
        icon,
        egui::FontId::proportional(theme::FONT_TITLE),
        theme::TEXT_PRIMARY,
    );
    response
}

/// Large accent pill that swaps its label for a spinner while `busy`.
/// Disabled while busy or when `enabled` is false.
pub fn action_button(
    ui: &mut egui::Ui,
    icon: &str,
    label: &str,
    busy: bool,
    enabled: bool,
) -> egui::Response {
    let text = if busy {
        String::new()
    } else {
        format!("{}  {}", icon, label)
    };
    let response = ui.add_enabled(enabled && !busy, theme::button_accent(text));
    if busy {
        ui.put(
            response.rect,
            egui::Spinner::new().size(theme::FONT_TITLE + 6.0).color(theme::TEXT_PRIMARY),
        );
    }
    response
}

/// Heading whose letters fade from rose through pink to purple
pub fn gradient_heading(text: &str, size: f32) -> LayoutJob {
    let mut job = LayoutJob::default();
    let count = text.chars().count().max(2);
    for (i, ch) in text.chars().enumerate() {
        let t = i as f32 / (count - 1) as f32;
        job.append(
            &ch.to_string(),
            0.0,
            TextFormat {
                font_id: egui::FontId::proportional(size),
                color: theme::gradient_at(t),
                ..Default::default()
            },
        );
    }
    job
}

/// Caption clamped to two lines, ending in an ellipsis when cut
pub fn caption_job(caption: &str, max_width: f32) -> LayoutJob {
    let mut job = LayoutJob::single_section(
        caption.to_owned(),
        TextFormat {
            font_id: egui::FontId::proportional(theme::FONT_BODY),
            color: theme::TEXT_SECONDARY,
            ..Default::default()
        },
    );
    job.wrap = TextWrapping {
        max_width,
        max_rows: 2,
        break_anywhere: false,
        overflow_character: Some('…'),
    };
    job
}
