use eframe::egui::{self, Stroke};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use crate::download::{start_download, Notifier};
use crate::localizations::Localizations;
use crate::models::{AppState, DownloadRequest, FormatKind, Notification};
use crate::quality::QualityTables;
use crate::settings::Settings;
use crate::theme::*;
use crate::ui;
use crate::ytdlp::YtDlp;

pub struct FetchApp {
    pub state: AppState,
    localizer: Localizations,
    tables: QualityTables,
    fetcher: YtDlp,
    status_sender: Sender<Notification>,
    status_receiver: Receiver<Notification>,
    worker: Option<JoinHandle<()>>,
}

impl FetchApp {
    pub fn new(settings: Settings) -> Self {
        let (tx, rx) = mpsc::channel();
        let localizer = Localizations::from_locale(settings.locale.as_deref());
        log::debug!("UI language: {}", localizer.language());
        let tables = QualityTables::default();

        let mut app = Self {
            state: AppState {
                download_dir: settings.default_download_dir.to_string_lossy().to_string(),
                ..Default::default()
            },
            localizer,
            tables,
            fetcher: YtDlp::new(settings.ytdlp),
            status_sender: tx,
            status_receiver: rx,
            worker: None,
        };
        app.select_format(FormatKind::Audio);
        let ready = app.localizer.text("status-ready");
        app.state.push_log(ready);
        app
    }

    /// Replaces the quality choices with the set for `format`; the
    /// previous selection is dropped.
    pub fn select_format(&mut self, format: FormatKind) {
        self.state.format = format;
        self.state.quality_options = self.tables.labels_for(format);
        self.state.quality = self
            .state
            .quality_options
            .first()
            .map(|s| s.to_string())
            .unwrap_or_default();
    }

    pub fn choose_directory(&mut self, dir: PathBuf) {
        self.state.download_dir = dir.to_string_lossy().to_string();
        let line = format!(
            "{} {}",
            self.localizer.text("selected-directory"),
            self.state.download_dir
        );
        self.state.push_log(line);
    }

    /// Validates the form and, if it passes, starts one worker.
    /// Returns whether a worker was started.
    pub fn start_download(&mut self, ctx: Option<&egui::Context>) -> bool {
        if self.state.is_downloading {
            return false;
        }

        let url = self.state.url.trim().to_string();
        if url.is_empty() {
            let line = self.localizer.text("error-no-url");
            self.state.push_log(line);
            return false;
        }

        let destination = PathBuf::from(&self.state.download_dir);
        if self.state.download_dir.is_empty() || !destination.is_dir() {
            log::warn!("Rejected destination {:?}", self.state.download_dir);
            let line = self.localizer.text("error-invalid-dir");
            self.state.push_log(line);
            return false;
        }

        let request = DownloadRequest {
            url,
            destination,
            format: self.state.format,
            quality: self.state.quality.clone(),
        };

        self.state.is_downloading = true;
        self.state.progress = 0;
        self.state.logged_milestones = [false; 11];

        let notifier = Notifier::new(self.status_sender.clone(), ctx.cloned());
        self.worker = Some(start_download(
            request,
            self.tables.clone(),
            self.localizer.clone(),
            self.fetcher.clone(),
            notifier,
        ));
        true
    }

    /// Drains everything the worker has sent so far, in order.
    pub fn process_status_updates(&mut self) {
        while let Ok(notification) = self.status_receiver.try_recv() {
            self.handle_notification(notification);
        }
    }

    pub fn handle_notification(&mut self, notification: Notification) {
        match notification {
            Notification::Progress(percentage) => {
                self.state.progress = percentage.min(100);
                if percentage % 10 == 0 {
                    let milestone = usize::from(percentage / 10).min(10);
                    if !self.state.logged_milestones[milestone] {
                        self.state.logged_milestones[milestone] = true;
                        let line =
                            format!("{} {}%", self.localizer.text("progress-line"), percentage);
                        self.state.push_log(line);
                    }
                }
            }
            Notification::Log(line) => self.state.push_log(line),
            Notification::Complete(message) => {
                self.state.push_log(message);
                let line = self.localizer.text("download-success");
                self.state.push_log(line);
                self.finish();
            }
            Notification::Error(message) => {
                let line = format!("{} {}", self.localizer.text("error-prefix"), message);
                self.state.push_log(line);
                self.finish();
            }
        }
    }

    fn finish(&mut self) {
        self.state.is_downloading = false;
        // Detach rather than join: the UI thread never waits on the worker.
        if let Some(handle) = self.worker.take() {
            log::debug!("Worker {:?} done", handle.thread().id());
        }
    }

    pub fn update_ui(&mut self, ctx: &egui::Context) {
        self.process_status_updates();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(self.localizer.text("app-title"));
            ui.add_space(10.0);

            ui::render_url_input(ui, &mut self.state, &self.localizer);
            ui.add_space(8.0);

            if let Some(dir) = ui::render_destination_selector(ui, &self.state, &self.localizer) {
                self.choose_directory(dir);
            }
            ui.add_space(8.0);

            if let Some(format) = ui::render_format_selector(ui, &mut self.state, &self.localizer)
            {
                self.select_format(format);
            }
            ui.add_space(10.0);

            self.render_download_button(ui, ctx);
            ui.add_space(10.0);

            ui::render_progress(ui, &self.state, &self.localizer);
            ui.add_space(8.0);

            ui::render_log(ui, &self.state, &self.localizer);
        });
    }

    fn render_download_button(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let download_button = egui::Button::new(
            egui::RichText::new(self.localizer.text("download-button"))
                .size(BUTTON_FONT_SIZE)
                .color(BUTTON_MAIN_TEXT),
        )
        .min_size(egui::vec2(ui.available_width(), MIN_SIZE_BUTTON.y))
        .fill(PRIMARY_BUTTON_BG)
        .rounding(ROUNDING_BUTTON)
        .stroke(Stroke::new(1.0, BORDER_COLOR));

        if ui
            .add_enabled(!self.state.is_downloading, download_button)
            .clicked()
        {
            self.start_download(Some(ctx));
        }
    }
}

impl eframe::App for FetchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_ui(ctx);
    }
}
