use std::env;
use std::path::PathBuf;

/// Environment variable pointing at a specific yt-dlp executable.
pub const YTDLP_PATH_VAR: &str = "YTDLP_PATH";

/// Startup configuration. Nothing here is persisted.
#[derive(Debug, Clone)]
pub struct Settings {
    pub ytdlp: Option<PathBuf>,
    pub default_download_dir: PathBuf,
    pub locale: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        let ytdlp = resolve_ytdlp(env::var_os(YTDLP_PATH_VAR).map(PathBuf::from));
        match &ytdlp {
            Some(path) => log::info!("Using yt-dlp at {}", path.display()),
            None => log::warn!("yt-dlp not found, downloads will fail until it is installed"),
        }

        Self {
            ytdlp,
            default_download_dir: default_download_dir(),
            locale: env::var("LANG").ok(),
        }
    }
}

fn resolve_ytdlp(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(|| which::which("yt-dlp").ok())
}

/// The user's Downloads folder, else the working directory.
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| env::current_dir().ok())
        .unwrap_or_default()
}
