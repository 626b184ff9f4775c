//! View rendering (loading, error, gallery grid, settings, toast)

use super::thumbnails::ThumbnailSlot;
use super::App;
use crate::constants::*;
use crate::theme;
use crate::types::{Meme, Phase};
use crate::ui::components::{
    action_button, caption_job, gradient_heading, overlay_icon_button,
};
use crate::utils::{cover_uv, format_status, grid_columns};
use eframe::egui;
use egui_phosphor::regular as icons;
use std::sync::Arc;

/// What the user did on a card this frame
pub(crate) enum CardAction {
    Share(Meme),
    OpenSource(Meme),
}

impl App {
    // ========================================================================
    // LOADING / ERROR
    // ========================================================================

    pub(crate) fn render_loading(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space((ui.available_height() / 2.0 - theme::SPINNER_LARGE).max(0.0));
            ui.add(
                egui::Spinner::new()
                    .size(theme::SPINNER_LARGE)
                    .color(theme::ACCENT),
            );
            ui.add_space(theme::SPACING_XL);
            ui.label(
                egui::RichText::new(LOADING_TEXT)
                    .size(theme::FONT_BODY)
                    .color(theme::TEXT_MUTED),
            );
        });
    }

    /// Returns true when "Try Again" was clicked
    pub(crate) fn render_error(&self, ui: &mut egui::Ui) -> bool {
        let message = self
            .gallery
            .state()
            .error_message()
            .unwrap_or(LOAD_ERROR_MESSAGE)
            .to_string();

        let mut retry = false;
        ui.vertical_centered(|ui| {
            ui.add_space((ui.available_height() / 2.0 - 100.0).max(0.0));
            ui.allocate_ui(egui::vec2(420.0, 200.0), |ui| {
                theme::card_frame().show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.label(
                            egui::RichText::new(icons::WARNING_CIRCLE)
                                .size(theme::SPINNER_LARGE)
                                .color(theme::STATUS_ERROR),
                        );
                        ui.add_space(theme::SPACING_MD);
                        ui.label(
                            egui::RichText::new(message)
                                .size(theme::FONT_BODY)
                                .color(theme::STATUS_ERROR),
                        );
                        ui.add_space(theme::SPACING_XL);
                        retry = action_button(
                            ui,
                            icons::ARROW_COUNTER_CLOCKWISE,
                            "Try Again",
                            false,
                            true,
                        )
                        .clicked();
                    });
                });
            });
        });
        retry
    }

    // ========================================================================
    // GALLERY
    // ========================================================================

    pub(crate) fn render_gallery(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let mut actions = Vec::new();
        let mut load_more = false;
        let mut refresh = false;

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .id_salt("gallery_scroll")
            .show(ui, |ui| {
                let full = ui.available_width();
                let width = full.min(theme::CONTENT_MAX_WIDTH) - theme::SPACING_XL * 2.0;
                let margin = ((full - width) / 2.0).max(0.0);

                ui.horizontal(|ui| {
                    ui.add_space(margin);
                    ui.vertical(|ui| {
                        ui.set_width(width);
                        self.render_header(ui);
                        actions = self.render_grid(ui, ctx);
                        ui.add_space(theme::SPACING_GRID * 2.0);
                        (load_more, refresh) = self.render_controls(ui);
                        self.render_footer(ui);
                    });
                });
            });

        for action in actions {
            match action {
                CardAction::Share(meme) => self.share_meme(&meme),
                CardAction::OpenSource(meme) => self.open_meme_source(&meme),
            }
        }
        if load_more {
            self.gallery.load_more();
        }
        if refresh {
            self.refresh();
        }
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.add_space(theme::SPACING_GRID);
        ui.horizontal(|ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let gear = theme::button(egui::RichText::new(icons::GEAR).size(theme::FONT_TITLE));
                if ui.add(gear).on_hover_text("Settings").clicked() {
                    self.show_settings = !self.show_settings;
                }
            });
        });
        ui.vertical_centered(|ui| {
            ui.label(gradient_heading(HEADER_TITLE, theme::FONT_HERO));
            ui.add_space(theme::SPACING_LG);
            ui.label(
                egui::RichText::new(HEADER_TAGLINE)
                    .size(theme::FONT_TITLE)
                    .color(theme::TEXT_MUTED),
            );
        });
        ui.add_space(theme::SPACING_GRID * 2.0);
    }

    fn render_grid(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) -> Vec<CardAction> {
        let spacing = theme::SPACING_GRID;
        let available = ui.available_width();
        let cols = grid_columns(available, self.settings.large_cards);
        let card_w = ((available - spacing * (cols as f32 - 1.0)) / cols as f32).floor();
        let card_h = card_w + theme::CARD_CAPTION_HEIGHT;

        // Clone to avoid borrowing the gallery while loading thumbnails
        let memes = self.gallery.state().items().to_vec();
        let handle = self.runtime.handle().clone();
        let mut actions = Vec::new();

        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing = egui::vec2(spacing, spacing);
            for (idx, meme) in memes.iter().enumerate() {
                let (rect, _) =
                    ui.allocate_exact_size(egui::vec2(card_w, card_h), egui::Sense::hover());

                // Only visible cards fetch their image
                if !ui.is_rect_visible(rect) {
                    continue;
                }

                let painter = ui.painter().clone();
                painter.rect_filled(rect, theme::RADIUS_CARD, theme::BG_ELEVATED);

                let image_rect = egui::Rect::from_min_size(rect.min, egui::vec2(card_w, card_w));
                let top_corners = egui::CornerRadius {
                    nw: theme::RADIUS_CARD as u8,
                    ne: theme::RADIUS_CARD as u8,
                    sw: 0,
                    se: 0,
                };

                match self.thumbnails.get(ctx, &handle, &meme.url) {
                    ThumbnailSlot::Ready(tex) => {
                        let brush = egui::epaint::Brush {
                            fill_texture_id: tex.id(),
                            uv: cover_uv(tex.size_vec2(), image_rect.size()),
                        };
                        let mut shape = egui::epaint::RectShape::filled(
                            image_rect,
                            top_corners,
                            egui::Color32::WHITE,
                        );
                        shape.brush = Some(Arc::new(brush));
                        painter.add(shape);
                    }
                    ThumbnailSlot::Loading => {
                        painter.rect_filled(image_rect, top_corners, theme::BG_SURFACE);
                        painter.text(
                            image_rect.center(),
                            egui::Align2::CENTER_CENTER,
                            icons::IMAGE,
                            egui::FontId::proportional(theme::SPINNER_LARGE),
                            theme::TEXT_DIM,
                        );
                    }
                    ThumbnailSlot::Failed => {
                        painter.rect_filled(image_rect, top_corners, theme::BG_SURFACE);
                        painter.text(
                            image_rect.center(),
                            egui::Align2::CENTER_CENTER,
                            icons::WARNING,
                            egui::FontId::proportional(theme::SPINNER_LARGE),
                            theme::ACCENT_MUTED,
                        );
                    }
                }

                // Caption (two lines max)
                let caption_pos = egui::pos2(
                    rect.min.x + theme::SPACING_XL,
                    image_rect.max.y + theme::SPACING_LG,
                );
                let galley = ui.fonts(|f| {
                    f.layout_job(caption_job(&meme.caption, card_w - theme::SPACING_XL * 2.0))
                });
                painter.galley(caption_pos, galley, theme::TEXT_SECONDARY);

                painter.rect_stroke(
                    rect,
                    theme::RADIUS_CARD,
                    egui::Stroke::new(theme::STROKE_DEFAULT, theme::BORDER_SUBTLE),
                    egui::StrokeKind::Outside,
                );

                // Hover overlay with share / open buttons
                if ui.rect_contains_pointer(image_rect) {
                    painter.rect_filled(
                        image_rect,
                        top_corners,
                        egui::Color32::from_black_alpha(90),
                    );

                    let inset = theme::SPACING_XL + theme::OVERLAY_BUTTON_SIZE / 2.0;
                    let share_center =
                        egui::pos2(image_rect.min.x + inset, image_rect.max.y - inset);
                    let open_center =
                        egui::pos2(image_rect.max.x - inset, image_rect.max.y - inset);

                    if overlay_icon_button(
                        ui,
                        ("share", idx),
                        share_center,
                        icons::SHARE_NETWORK,
                        "Share meme",
                    )
                    .clicked()
                    {
                        actions.push(CardAction::Share(meme.clone()));
                    }
                    if overlay_icon_button(
                        ui,
                        ("open", idx),
                        open_center,
                        icons::ARROW_SQUARE_OUT,
                        "View original",
                    )
                    .clicked()
                    {
                        actions.push(CardAction::OpenSource(meme.clone()));
                    }
                }
            }
        });

        actions
    }

    /// Returns (load_more_clicked, refresh_clicked)
    fn render_controls(&self, ui: &mut egui::Ui) -> (bool, bool) {
        let busy = self.gallery.state().is_loading_more();
        let mut load_more = false;
        let mut refresh = false;

        ui.vertical_centered(|ui| {
            load_more = action_button(ui, icons::ARROW_CLOCKWISE, "Load More Memes", busy, true)
                .clicked();
            ui.add_space(theme::SPACING_LG);
            refresh = action_button(ui, icons::ARROW_COUNTER_CLOCKWISE, "Refresh", false, !busy)
                .clicked();
        });

        (load_more, refresh)
    }

    fn render_footer(&self, ui: &mut egui::Ui) {
        ui.add_space(theme::SPACING_GRID * 2.0);
        ui.vertical_centered(|ui| {
            let state = self.gallery.state();
            ui.label(
                egui::RichText::new(format_status(state.items().len(), self.gallery.last_updated()))
                    .size(theme::FONT_SMALL)
                    .color(theme::TEXT_DIM),
            );
            ui.add_space(theme::SPACING_SM);
            ui.label(
                egui::RichText::new(format!("{}  {}", icons::HEART, FOOTER_TEXT))
                    .size(theme::FONT_LABEL)
                    .color(theme::TEXT_MUTED),
            );
        });
        ui.add_space(theme::SPACING_GRID * 2.0);
    }

    // ========================================================================
    // SETTINGS PANEL
    // ========================================================================

    pub(crate) fn render_settings_panel(&mut self, ctx: &egui::Context) {
        let open = settings_panel_visible(self.show_settings, self.gallery.state().phase());
        egui::SidePanel::right("settings_panel")
            .exact_width(theme::SETTINGS_PANEL_WIDTH)
            .resizable(false)
            .frame(theme::settings_frame())
            .show_animated(ctx, open, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new("Settings")
                            .size(theme::FONT_TITLE)
                            .color(theme::TEXT_PRIMARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.add(theme::button(icons::X)).clicked() {
                            self.show_settings = false;
                        }
                    });
                });
                ui.add_space(theme::SPACING_LG);

                if theme::settings_checkbox(ui, self.settings.large_cards, "Large cards") {
                    self.settings.large_cards = !self.settings.large_cards;
                }
                let clipboard = self.settings.share_via_clipboard;
                if theme::settings_checkbox(ui, clipboard, "Share by copying link") {
                    self.set_share_via_clipboard(!clipboard);
                }

                ui.add_space(theme::SPACING_XL);
                ui.label(
                    egui::RichText::new("Source")
                        .size(theme::FONT_LABEL)
                        .color(theme::TEXT_MUTED),
                );
                ui.label(
                    egui::RichText::new(format!(
                        "{}/{}",
                        self.settings.api_base_url.trim_end_matches('/'),
                        self.settings.category
                    ))
                    .size(theme::FONT_SMALL)
                    .color(theme::TEXT_DIM),
                );

                ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
                    ui.label(
                        egui::RichText::new(format!("{} v{}", APP_NAME, APP_VERSION))
                            .size(theme::FONT_SMALL)
                            .color(theme::TEXT_DIM),
                    );
                });
            });
    }

    // ========================================================================
    // TOAST
    // ========================================================================

    /// Bottom-right of the central panel, 3s visible then fade, pause on hover
    pub(crate) fn render_toast(&mut self, ctx: &egui::Context) {
        let (Some(msg), Some(panel_rect)) = (self.toast_message.clone(), self.central_panel_rect)
        else {
            return;
        };

        let visible_duration = 3.0;
        let fade_duration = 0.5;
        let total_duration = visible_duration + fade_duration;
        let margin = 12.0;

        let toast_pos = egui::pos2(panel_rect.right() - margin, panel_rect.bottom() - margin);
        let elapsed = self.toast_start.map(|t| t.elapsed().as_secs_f32()).unwrap_or(0.0);
        let alpha = if elapsed > visible_duration {
            ((total_duration - elapsed) / fade_duration).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let response = egui::Area::new(egui::Id::new("toast"))
            .fixed_pos(toast_pos)
            .pivot(egui::Align2::RIGHT_BOTTOM)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(theme::BG_ELEVATED.gamma_multiply(0.9 * alpha))
                    .stroke(egui::Stroke::new(
                        theme::STROKE_DEFAULT,
                        theme::ACCENT.gamma_multiply(0.4 * alpha),
                    ))
                    .corner_radius(theme::RADIUS_LARGE)
                    .inner_margin(egui::Margin::symmetric(16, 10))
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(msg)
                                .color(theme::TEXT_PRIMARY.gamma_multiply(alpha)),
                        );
                    });
            });

        if response.response.hovered() {
            self.toast_start = Some(std::time::Instant::now());
        }

        if elapsed >= total_duration {
            self.toast_message = None;
            self.toast_start = None;
        } else {
            ctx.request_repaint();
        }
    }
}

/// Loading and error screens take the whole window
fn settings_panel_visible(requested: bool, phase: Phase) -> bool {
    requested && phase == Phase::Ready
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(true, Phase::Ready, true)]
    #[case(true, Phase::Loading, false)]
    #[case(true, Phase::Error, false)]
    #[case(false, Phase::Ready, false)]
    fn settings_panel_only_shows_over_the_gallery(
        #[case] requested: bool,
        #[case] phase: Phase,
        #[case] visible: bool,
    ) {
        assert_eq!(settings_panel_visible(requested, phase), visible);
    }
}
