use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Audio,
    Video,
}

impl Default for FormatKind {
    fn default() -> Self {
        Self::Audio
    }
}

impl FormatKind {
    /// Extension of the file yt-dlp leaves behind after post-processing.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Audio => "mp3",
            Self::Video => "mp4",
        }
    }

    /// Localization key of the selector label.
    pub fn label_key(self) -> &'static str {
        match self {
            Self::Audio => "format-audio",
            Self::Video => "format-video",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

/// Snapshot of the form taken when the download button is pressed.
/// Moved into the worker thread and never touched by the UI again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub destination: PathBuf,
    pub format: FormatKind,
    pub quality: String,
}

/// Messages pushed from the worker thread to the UI thread.
///
/// Every request ends with exactly one `Complete` or `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Progress(u8),
    Log(String),
    Complete(String),
    Error(String),
}

impl Notification {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Error(_))
    }
}

#[derive(Default)]
pub struct AppState {
    pub url: String,
    pub download_dir: String,
    pub format: FormatKind,
    pub quality: String,
    pub quality_options: Vec<&'static str>,
    pub is_downloading: bool,
    pub progress: u8,
    pub log: Vec<String>,
    /// Progress milestones (0, 10, ..., 100) already written to the log
    /// for the active request.
    pub logged_milestones: [bool; 11],
}

impl AppState {
    pub fn push_log(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::debug!("log panel: {}", line);
        self.log.push(line);
    }
}
