use eframe::egui;
use rfd::FileDialog;
use std::path::PathBuf;

use crate::localizations::Localizations;
use crate::models::{AppState, FormatKind};
use crate::theme::*;

fn section<R>(
    ui: &mut egui::Ui,
    title: String,
    add_contents: impl FnOnce(&mut egui::Ui) -> R,
) -> R {
    egui::Frame::group(ui.style())
        .fill(SECTION_BG)
        .rounding(ROUNDING_FRAME)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(egui::RichText::new(title).strong().color(SECTION_TITLE));
            add_contents(ui)
        })
        .inner
}

pub fn render_url_input(ui: &mut egui::Ui, state: &mut AppState, localizer: &Localizations) {
    section(ui, localizer.text("url-group"), |ui| {
        ui.add_sized(
            [ui.available_width(), INPUT_HEIGHT],
            egui::TextEdit::singleline(&mut state.url)
                .hint_text(localizer.text("url-placeholder"))
                .font(egui::FontId::proportional(16.0)),
        );
    });
}

/// Returns the directory the user picked, if any.
pub fn render_destination_selector(
    ui: &mut egui::Ui,
    state: &AppState,
    localizer: &Localizations,
) -> Option<PathBuf> {
    section(ui, localizer.text("destination-group"), |ui| {
        ui.horizontal(|ui| {
            // Read-only: the field only changes through the chooser.
            let mut shown = state.download_dir.as_str();
            ui.add_sized(
                [ui.available_width() - BROWSE_BUTTON_WIDTH - 8.0, INPUT_HEIGHT],
                egui::TextEdit::singleline(&mut shown),
            );

            let browse = egui::Button::new(localizer.text("browse-button"))
                .min_size(egui::vec2(BROWSE_BUTTON_WIDTH, INPUT_HEIGHT))
                .rounding(ROUNDING_FRAME);

            if ui.add_enabled(!state.is_downloading, browse).clicked() {
                FileDialog::new()
                    .set_title(&localizer.text("choose-directory"))
                    .set_directory(&state.download_dir)
                    .pick_folder()
            } else {
                None
            }
        })
        .inner
    })
}

fn format_label(format: FormatKind, localizer: &Localizations) -> String {
    localizer.text(format.label_key())
}

/// Renders the format and quality selectors. Returns the newly chosen
/// format so the caller can rebuild the quality choices.
pub fn render_format_selector(
    ui: &mut egui::Ui,
    state: &mut AppState,
    localizer: &Localizations,
) -> Option<FormatKind> {
    section(ui, localizer.text("format-group"), |ui| {
        let mut chosen = state.format;

        ui.horizontal(|ui| {
            ui.add_enabled_ui(!state.is_downloading, |ui| {
                ui.vertical(|ui| {
                    ui.label(localizer.text("format-label"));
                    egui::ComboBox::from_id_source("format-kind")
                        .selected_text(format_label(chosen, localizer))
                        .width(COMBO_WIDTH)
                        .show_ui(ui, |ui| {
                            for format in [FormatKind::Audio, FormatKind::Video] {
                                ui.selectable_value(
                                    &mut chosen,
                                    format,
                                    format_label(format, localizer),
                                );
                            }
                        });
                });

                ui.add_space(20.0);

                ui.vertical(|ui| {
                    ui.label(localizer.text("quality-label"));
                    egui::ComboBox::from_id_source("quality-label")
                        .selected_text(state.quality.as_str())
                        .width(COMBO_WIDTH)
                        .show_ui(ui, |ui| {
                            for label in &state.quality_options {
                                ui.selectable_value(&mut state.quality, label.to_string(), *label);
                            }
                        });
                });
            });
        });

        (chosen != state.format).then_some(chosen)
    })
}

pub fn render_progress(ui: &mut egui::Ui, state: &AppState, localizer: &Localizations) {
    section(ui, localizer.text("progress-group"), |ui| {
        let progress_bar = egui::ProgressBar::new(f32::from(state.progress) / 100.0)
            .show_percentage()
            .fill(PROGRESS_FILL);
        ui.add(progress_bar);
    });
}

pub fn render_log(ui: &mut egui::Ui, state: &AppState, localizer: &Localizations) {
    section(ui, localizer.text("log-group"), |ui| {
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in &state.log {
                    let text = egui::RichText::new(line).monospace();
                    if line.starts_with(&localizer.text("error-prefix")) {
                        ui.label(text.color(TEXT_ERROR));
                    } else {
                        ui.label(text.color(MAIN_TEXT));
                    }
                }
            });
    });
}
