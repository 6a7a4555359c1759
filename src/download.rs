use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;

use eframe::egui;

use crate::localizations::Localizations;
use crate::models::{DownloadRequest, FormatKind, Notification};
use crate::quality::QualityTables;
use crate::ytdlp::{AudioExtraction, FetchOptions, MediaFetcher, ProgressReport, TransferStatus};

const UNKNOWN_TITLE: &str = "unknown_title";

/// Sending half of the worker → UI channel. Wakes the UI after every
/// message so it gets drained on the next frame.
pub struct Notifier {
    tx: Sender<Notification>,
    ctx: Option<egui::Context>,
}

impl Notifier {
    pub fn new(tx: Sender<Notification>, ctx: Option<egui::Context>) -> Self {
        Self { tx, ctx }
    }

    pub fn send(&self, notification: Notification) {
        if notification.is_terminal() {
            log::debug!("Worker finished with {:?}", notification);
        }
        if let Err(e) = self.tx.send(notification) {
            log::warn!("Failed to send notification, UI is gone: {}", e);
        }
        if let Some(ctx) = &self.ctx {
            ctx.request_repaint();
        }
    }

    fn log(&self, line: impl Into<String>) {
        self.send(Notification::Log(line.into()));
    }
}

/// Spawns the worker thread for one request.
pub fn start_download<F>(
    request: DownloadRequest,
    tables: QualityTables,
    localizer: Localizations,
    fetcher: F,
    notifier: Notifier,
) -> thread::JoinHandle<()>
where
    F: MediaFetcher + Send + 'static,
{
    thread::spawn(move || {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            run_download(&request, &tables, &localizer, &fetcher, &notifier)
        }));

        if let Err(payload) = outcome {
            let message = panic_message(payload.as_ref());
            log::error!("Download worker panicked: {}", message);
            notifier.send(Notification::Error(message));
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "Download worker stopped unexpectedly".to_string())
}

/// Runs one request to its terminal notification. Never retries.
pub fn run_download(
    request: &DownloadRequest,
    tables: &QualityTables,
    localizer: &Localizations,
    fetcher: &dyn MediaFetcher,
    notifier: &Notifier,
) {
    log::info!(
        "Starting {} download of {} into {}",
        request.format.name(),
        request.url,
        request.destination.display()
    );

    match fetch_media(request, tables, localizer, fetcher, notifier) {
        Ok(path) => {
            log::info!("Download finished: {}", path.display());
            notifier.send(Notification::Complete(format!(
                "{} {}",
                localizer.text("worker-saved"),
                path.display()
            )));
        }
        Err(e) => {
            log::error!("Download failed: {:?}", e);
            notifier.log(format!("{:?}", e));
            notifier.send(Notification::Error(e.to_string()));
        }
    }
}

fn fetch_media(
    request: &DownloadRequest,
    tables: &QualityTables,
    localizer: &Localizations,
    fetcher: &dyn MediaFetcher,
    notifier: &Notifier,
) -> anyhow::Result<PathBuf> {
    notifier.log(format!(
        "{} {}",
        localizer.text("worker-connecting"),
        request.url
    ));

    notifier.log(format!(
        "{} {}, {} {}",
        localizer.text("worker-preparing"),
        localizer.text(request.format.label_key()),
        localizer.text("quality-label"),
        request.quality
    ));
    let options = build_options(request, tables);

    let title = fetcher
        .resolve_title(&request.url)?
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    notifier.log(format!("{} {}", localizer.text("worker-found"), title));

    fetcher.fetch(&request.url, &options, &mut |report: ProgressReport| {
        on_progress(report, localizer, notifier)
    })?;

    Ok(expected_output_path(
        &request.destination,
        &title,
        request.format,
    ))
}

fn on_progress(report: ProgressReport, localizer: &Localizations, notifier: &Notifier) {
    match report.status {
        TransferStatus::Downloading => {
            if let Some(percentage) = progress_percentage(&report) {
                notifier.send(Notification::Progress(percentage));
            }
        }
        TransferStatus::Finished => notifier.log(localizer.text("worker-processing")),
        TransferStatus::Other => {}
    }
}

/// `floor(downloaded / total * 100)`, preferring the exact total over the
/// estimate. `None` when no usable total was reported.
pub fn progress_percentage(report: &ProgressReport) -> Option<u8> {
    let total = report
        .total_bytes
        .filter(|t| *t > 0)
        .or(report.total_bytes_estimate.filter(|t| *t > 0))?;
    let downloaded = report.downloaded_bytes.unwrap_or(0);

    // Estimates can undershoot the real size.
    let percentage = (u128::from(downloaded) * 100 / u128::from(total)).min(100);
    Some(percentage as u8)
}

pub fn build_options(request: &DownloadRequest, tables: &QualityTables) -> FetchOptions {
    let output_template = request.destination.join("%(title)s.%(ext)s");

    match request.format {
        FormatKind::Audio => FetchOptions {
            format_selector: "bestaudio/best".to_string(),
            audio: Some(AudioExtraction {
                codec: "mp3",
                quality: tables.audio.bitrate(&request.quality).to_string(),
            }),
            merge_container: None,
            output_template,
        },
        FormatKind::Video => {
            let format_selector = match tables.video.height_ceiling(&request.quality) {
                None => "bestvideo+bestaudio/best".to_string(),
                Some(h) => format!(
                    "bestvideo[height<={h}]+bestaudio/best[height<={h}]/best",
                    h = h
                ),
            };
            FetchOptions {
                format_selector,
                audio: None,
                merge_container: Some("mp4"),
                output_template,
            }
        }
    }
}

/// Best guess at where yt-dlp left the file. Advisory only: yt-dlp applies
/// its own filename templating and post-processors may change the name.
pub fn expected_output_path(destination: &Path, title: &str, format: FormatKind) -> PathBuf {
    let file_name = format!(
        "{}.{}",
        title.replace(['/', '\\'], "_"),
        format.extension()
    );
    destination.join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::{HD_720, HIGHEST, LOWEST, MEDIUM, SD_480};
    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::sync::mpsc::{self, Receiver};

    #[derive(Default)]
    struct FakeFetcher {
        title: Option<String>,
        resolve_error: Option<String>,
        reports: Vec<ProgressReport>,
        fetch_error: Option<String>,
        seen_options: RefCell<Option<FetchOptions>>,
    }

    impl MediaFetcher for FakeFetcher {
        fn resolve_title(&self, _url: &str) -> anyhow::Result<Option<String>> {
            match &self.resolve_error {
                Some(e) => Err(anyhow!(e.clone())),
                None => Ok(self.title.clone()),
            }
        }

        fn fetch(
            &self,
            _url: &str,
            options: &FetchOptions,
            on_progress: &mut dyn FnMut(ProgressReport),
        ) -> anyhow::Result<()> {
            *self.seen_options.borrow_mut() = Some(options.clone());
            for report in &self.reports {
                on_progress(*report);
            }
            match &self.fetch_error {
                Some(e) => Err(anyhow!(e.clone())),
                None => Ok(()),
            }
        }
    }

    fn downloading(downloaded: u64, total: Option<u64>, estimate: Option<u64>) -> ProgressReport {
        ProgressReport {
            status: TransferStatus::Downloading,
            downloaded_bytes: Some(downloaded),
            total_bytes: total,
            total_bytes_estimate: estimate,
        }
    }

    fn finished() -> ProgressReport {
        ProgressReport {
            status: TransferStatus::Finished,
            downloaded_bytes: Some(100),
            total_bytes: Some(100),
            total_bytes_estimate: None,
        }
    }

    fn request(format: FormatKind, quality: &str) -> DownloadRequest {
        DownloadRequest {
            url: "https://example.com/watch?v=abc".to_string(),
            destination: PathBuf::from("/downloads"),
            format,
            quality: quality.to_string(),
        }
    }

    fn run_in(
        lang: &str,
        request: &DownloadRequest,
        fetcher: &FakeFetcher,
    ) -> Vec<Notification> {
        let (tx, rx): (_, Receiver<Notification>) = mpsc::channel();
        let notifier = Notifier::new(tx, None);
        run_download(
            request,
            &QualityTables::default(),
            &Localizations::with_language(lang),
            fetcher,
            &notifier,
        );
        drop(notifier);
        rx.iter().collect()
    }

    fn run(request: &DownloadRequest, fetcher: &FakeFetcher) -> Vec<Notification> {
        run_in("en-US", request, fetcher)
    }

    fn terminal_count(notifications: &[Notification]) -> usize {
        notifications.iter().filter(|n| n.is_terminal()).count()
    }

    #[test]
    fn test_percentage_floors() {
        assert_eq!(progress_percentage(&downloading(1, Some(3), None)), Some(33));
        assert_eq!(progress_percentage(&downloading(999, Some(1000), None)), Some(99));
        assert_eq!(progress_percentage(&downloading(1000, Some(1000), None)), Some(100));
        assert_eq!(progress_percentage(&downloading(0, Some(1000), None)), Some(0));
    }

    #[test]
    fn test_percentage_prefers_exact_total() {
        assert_eq!(
            progress_percentage(&downloading(50, Some(100), Some(1000))),
            Some(50)
        );
        assert_eq!(progress_percentage(&downloading(50, None, Some(200))), Some(25));
    }

    #[test]
    fn test_percentage_ignores_unusable_totals() {
        assert_eq!(progress_percentage(&downloading(50, None, None)), None);
        assert_eq!(progress_percentage(&downloading(50, Some(0), None)), None);
        assert_eq!(progress_percentage(&downloading(50, Some(0), Some(0))), None);
    }

    #[test]
    fn test_percentage_stays_in_range() {
        for total in [1u64, 7, 100, 4096, u64::MAX] {
            for downloaded in [0u64, 1, total / 2, total, total.saturating_add(10), u64::MAX] {
                let pct = progress_percentage(&downloading(downloaded, None, Some(total)));
                assert!(pct.unwrap() <= 100);
            }
        }
    }

    #[test]
    fn test_audio_options() {
        let tables = QualityTables::default();
        let options = build_options(&request(FormatKind::Audio, HIGHEST), &tables);
        assert_eq!(options.format_selector, "bestaudio/best");
        assert_eq!(
            options.audio,
            Some(AudioExtraction {
                codec: "mp3",
                quality: "0".to_string()
            })
        );
        assert_eq!(options.merge_container, None);
        assert_eq!(
            options.output_template,
            PathBuf::from("/downloads").join("%(title)s.%(ext)s")
        );

        let medium = build_options(&request(FormatKind::Audio, MEDIUM), &tables);
        assert_eq!(medium.audio.unwrap().quality, "128");
        let lowest = build_options(&request(FormatKind::Audio, LOWEST), &tables);
        assert_eq!(lowest.audio.unwrap().quality, "64");
        let unknown = build_options(&request(FormatKind::Audio, "Studio"), &tables);
        assert_eq!(unknown.audio.unwrap().quality, "128");
    }

    #[test]
    fn test_video_options() {
        let tables = QualityTables::default();

        let best = build_options(&request(FormatKind::Video, HIGHEST), &tables);
        assert_eq!(best.format_selector, "bestvideo+bestaudio/best");
        assert_eq!(best.merge_container, Some("mp4"));
        assert!(best.audio.is_none());

        let hd = build_options(&request(FormatKind::Video, HD_720), &tables);
        assert_eq!(
            hd.format_selector,
            "bestvideo[height<=720]+bestaudio/best[height<=720]/best"
        );

        let sd = build_options(&request(FormatKind::Video, SD_480), &tables);
        assert_eq!(
            sd.format_selector,
            "bestvideo[height<=480]+bestaudio/best[height<=480]/best"
        );
    }

    #[test]
    fn test_expected_path_sanitizes_title() {
        let path = expected_output_path(Path::new("/downloads"), "AC/DC \\ Live", FormatKind::Audio);
        assert_eq!(path, Path::new("/downloads").join("AC_DC _ Live.mp3"));
    }

    #[test]
    fn test_audio_download_completes_with_mp3_path() {
        let fetcher = FakeFetcher {
            title: Some("Song".to_string()),
            reports: vec![
                downloading(0, Some(200), None),
                downloading(100, Some(200), None),
                downloading(200, Some(200), None),
                finished(),
            ],
            ..Default::default()
        };
        let notifications = run(&request(FormatKind::Audio, HIGHEST), &fetcher);

        assert_eq!(
            notifications.first(),
            Some(&Notification::Log(
                "Connecting to: https://example.com/watch?v=abc".to_string()
            ))
        );
        assert!(notifications.contains(&Notification::Log("Found video: Song".to_string())));
        assert!(notifications.contains(&Notification::Log(
            "Transfer finished, processing...".to_string()
        )));

        let progress: Vec<u8> = notifications
            .iter()
            .filter_map(|n| match n {
                Notification::Progress(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![0, 50, 100]);

        assert_eq!(terminal_count(&notifications), 1);
        match notifications.last() {
            Some(Notification::Complete(message)) => {
                assert!(message.ends_with(".mp3"), "{}", message);
                assert!(message.contains("Song"));
            }
            other => panic!("expected Complete, got {:?}", other),
        }

        let options = fetcher.seen_options.borrow().clone().unwrap();
        assert_eq!(options.audio.unwrap().quality, "0");
    }

    #[test]
    fn test_video_download_completes_with_mp4_path() {
        let fetcher = FakeFetcher {
            title: Some("Clip".to_string()),
            ..Default::default()
        };
        let notifications = run(&request(FormatKind::Video, HD_720), &fetcher);

        match notifications.last() {
            Some(Notification::Complete(message)) => assert!(message.ends_with("Clip.mp4")),
            other => panic!("expected Complete, got {:?}", other),
        }
        let options = fetcher.seen_options.borrow().clone().unwrap();
        assert!(options.format_selector.contains("bestvideo[height<=720]"));
        assert!(options.format_selector.contains("best[height<=720]"));
    }

    #[test]
    fn test_worker_lines_follow_ui_language() {
        let fetcher = FakeFetcher {
            title: Some("Piosenka".to_string()),
            reports: vec![downloading(50, Some(100), None), finished()],
            ..Default::default()
        };
        let notifications = run_in("pl-PL", &request(FormatKind::Video, HD_720), &fetcher);

        assert_eq!(
            notifications[0],
            Notification::Log("Łączenie z: https://example.com/watch?v=abc".to_string())
        );
        assert_eq!(
            notifications[1],
            Notification::Log("Przygotowanie do pobrania: Wideo (MP4), Jakość: 720p".to_string())
        );
        assert!(notifications.contains(&Notification::Log("Znaleziono film: Piosenka".to_string())));
        assert!(notifications.contains(&Notification::Log(
            "Pobieranie zakończone, trwa przetwarzanie...".to_string()
        )));
        match notifications.last() {
            Some(Notification::Complete(message)) => {
                assert!(message.starts_with("Plik został pobrany jako: "));
                assert!(message.ends_with("Piosenka.mp4"));
            }
            other => panic!("expected Complete, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_title_uses_placeholder() {
        let fetcher = FakeFetcher::default();
        let notifications = run(&request(FormatKind::Audio, MEDIUM), &fetcher);
        match notifications.last() {
            Some(Notification::Complete(message)) => {
                assert!(message.ends_with("unknown_title.mp3"))
            }
            other => panic!("expected Complete, got {:?}", other),
        }
    }

    #[test]
    fn test_reports_without_total_are_ignored() {
        let fetcher = FakeFetcher {
            title: Some("Song".to_string()),
            reports: vec![downloading(10, None, None), downloading(10, Some(0), None)],
            ..Default::default()
        };
        let notifications = run(&request(FormatKind::Audio, HIGHEST), &fetcher);
        assert!(!notifications
            .iter()
            .any(|n| matches!(n, Notification::Progress(_))));
    }

    #[test]
    fn test_regressing_progress_is_forwarded() {
        let fetcher = FakeFetcher {
            title: Some("Song".to_string()),
            reports: vec![
                downloading(60, None, Some(100)),
                downloading(60, Some(200), None),
            ],
            ..Default::default()
        };
        let notifications = run(&request(FormatKind::Audio, HIGHEST), &fetcher);
        let progress: Vec<u8> = notifications
            .iter()
            .filter_map(|n| match n {
                Notification::Progress(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![60, 30]);
    }

    #[test]
    fn test_transfer_failure_emits_single_error() {
        let fetcher = FakeFetcher {
            title: Some("Song".to_string()),
            reports: vec![downloading(10, Some(100), None)],
            fetch_error: Some("ERROR: connection reset by peer".to_string()),
            ..Default::default()
        };
        let notifications = run(&request(FormatKind::Video, HIGHEST), &fetcher);

        assert_eq!(terminal_count(&notifications), 1);
        assert_eq!(
            notifications.last(),
            Some(&Notification::Error(
                "ERROR: connection reset by peer".to_string()
            ))
        );
        assert!(!notifications
            .iter()
            .any(|n| matches!(n, Notification::Complete(_))));
    }

    #[test]
    fn test_resolve_failure_skips_transfer() {
        let fetcher = FakeFetcher {
            resolve_error: Some("ERROR: Unsupported URL".to_string()),
            ..Default::default()
        };
        let notifications = run(&request(FormatKind::Audio, HIGHEST), &fetcher);

        assert!(fetcher.seen_options.borrow().is_none());
        assert_eq!(terminal_count(&notifications), 1);
        assert_eq!(
            notifications.last(),
            Some(&Notification::Error("ERROR: Unsupported URL".to_string()))
        );
    }

    struct PanickingFetcher;

    impl MediaFetcher for PanickingFetcher {
        fn resolve_title(&self, _url: &str) -> anyhow::Result<Option<String>> {
            panic!("extractor exploded");
        }

        fn fetch(
            &self,
            _url: &str,
            _options: &FetchOptions,
            _on_progress: &mut dyn FnMut(ProgressReport),
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_worker_thread_reports_panics_as_errors() {
        let (tx, rx) = mpsc::channel();
        let handle = start_download(
            request(FormatKind::Audio, HIGHEST),
            QualityTables::default(),
            Localizations::default(),
            PanickingFetcher,
            Notifier::new(tx, None),
        );
        handle.join().unwrap();

        let notifications: Vec<Notification> = rx.iter().collect();
        assert_eq!(terminal_count(&notifications), 1);
        assert_eq!(
            notifications.last(),
            Some(&Notification::Error("extractor exploded".to_string()))
        );
    }
}
