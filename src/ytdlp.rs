use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;

const PROGRESS_MARKER: &str = "FETCH-PROGRESS";

/// Fields are `NA` when yt-dlp has no value for them.
const PROGRESS_TEMPLATE: &str = "download:FETCH-PROGRESS|%(progress.status)s|%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioExtraction {
    pub codec: &'static str,
    /// `"0"` for best, otherwise a bitrate in kbit/s.
    pub quality: String,
}

/// Everything yt-dlp needs to know to perform one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub format_selector: String,
    pub audio: Option<AudioExtraction>,
    pub merge_container: Option<&'static str>,
    pub output_template: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Downloading,
    Finished,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressReport {
    pub status: TransferStatus,
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    pub total_bytes_estimate: Option<u64>,
}

/// The external extraction capability the worker drives.
pub trait MediaFetcher {
    /// Looks the URL up without downloading anything.
    fn resolve_title(&self, url: &str) -> anyhow::Result<Option<String>>;

    fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
        on_progress: &mut dyn FnMut(ProgressReport),
    ) -> anyhow::Result<()>;
}

#[derive(Deserialize)]
struct VideoInfo {
    title: Option<String>,
}

/// Drives the `yt-dlp` executable as a child process.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(binary: Option<PathBuf>) -> Self {
        Self { binary }
    }

    fn binary(&self) -> anyhow::Result<&Path> {
        self.binary.as_deref().ok_or_else(|| {
            anyhow!("yt-dlp not found. Please install yt-dlp and make sure it's in your PATH.")
        })
    }
}

impl MediaFetcher for YtDlp {
    fn resolve_title(&self, url: &str) -> anyhow::Result<Option<String>> {
        let output = Command::new(self.binary()?)
            .args(metadata_args(url))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .context("Failed to run yt-dlp")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::debug!("yt-dlp metadata stderr: {}", stderr);
            return Err(failure_from_stderr(&stderr, &output.status.to_string()));
        }

        let info: VideoInfo = serde_json::from_slice(&output.stdout)
            .context("yt-dlp returned invalid metadata JSON")?;
        Ok(info.title)
    }

    fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
        on_progress: &mut dyn FnMut(ProgressReport),
    ) -> anyhow::Result<()> {
        let mut command = Command::new(self.binary()?);
        command
            .args(download_args(url, options))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        log::debug!("Command: {:?}", command);

        let mut child = command.spawn().context("Failed to start yt-dlp")?;

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                stop_child(&mut child);
                return Err(anyhow!("Failed to capture yt-dlp output"));
            }
        };

        // Read stderr in a separate thread to avoid deadlocks
        let stderr_reader = thread::spawn(move || {
            let mut lines = Vec::new();
            // Stop quietly on a read error; the exit status still tells success apart.
            let _ = for_each_line(stderr, |line| lines.push(line));
            lines
        });

        let read = for_each_line(stdout, |line| match parse_progress_line(&line) {
            Some(report) => on_progress(report),
            None => log::debug!("yt-dlp: {}", line),
        });

        if let Err(e) = read {
            stop_child(&mut child);
            let _ = stderr_reader.join();
            return Err(e).context("Failed to read yt-dlp output");
        }

        let status = child.wait().context("Failed to wait for yt-dlp")?;
        let stderr_lines = stderr_reader.join().unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            let stderr = stderr_lines.join("\n");
            log::debug!("yt-dlp stderr: {}", stderr);
            Err(failure_from_stderr(&stderr, &status.to_string()))
        }
    }
}

/// Don't leave a transfer running behind a request that already failed.
fn stop_child(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::warn!("Failed to kill yt-dlp: {}", e);
    }
    let _ = child.wait();
}

/// Splits raw output on newlines and decodes each line lossily: titles can
/// arrive in the console's locale encoding rather than UTF-8.
fn for_each_line(source: impl Read, mut f: impl FnMut(String)) -> io::Result<()> {
    let mut reader = BufReader::new(source);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        f(line.trim_end_matches(['\r', '\n']).to_string());
    }
}

/// Uses the last non-empty stderr line (yt-dlp's `ERROR: ...`) as the
/// description and keeps the whole stderr as context.
fn failure_from_stderr(stderr: &str, status: &str) -> anyhow::Error {
    let description = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Command failed with status: {}", status));

    let details = stderr.trim();
    if details.is_empty() || details == description {
        anyhow!(description)
    } else {
        anyhow!(details.to_string()).context(description)
    }
}

fn metadata_args(url: &str) -> Vec<OsString> {
    [
        "--dump-single-json",
        "--skip-download",
        "--no-playlist",
        "--no-warnings",
        url,
    ]
    .into_iter()
    .map(OsString::from)
    .collect()
}

pub fn download_args(url: &str, options: &FetchOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "--no-playlist",
        "--no-warnings",
        "--newline",
        "--progress",
        "--progress-template",
        PROGRESS_TEMPLATE,
        "-f",
        options.format_selector.as_str(),
        "-o",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(options.output_template.clone().into_os_string());

    if let Some(audio) = &options.audio {
        // yt-dlp reads bare numbers up to 10 as VBR levels, so bitrates get a unit.
        let quality = if audio.quality == "0" {
            audio.quality.clone()
        } else {
            format!("{}K", audio.quality)
        };
        args.extend(
            ["-x", "--audio-format", audio.codec, "--audio-quality"]
                .into_iter()
                .map(OsString::from),
        );
        args.push(quality.into());
    }

    if let Some(container) = options.merge_container {
        args.push("--merge-output-format".into());
        args.push(container.into());
    }

    args.push(url.into());
    args
}

pub fn parse_progress_line(line: &str) -> Option<ProgressReport> {
    let rest = line.trim().strip_prefix(PROGRESS_MARKER)?;
    let parts: Vec<&str> = rest.split('|').map(str::trim).collect();
    if parts.len() != 5 || !parts[0].is_empty() {
        return None;
    }

    let status = match parts[1] {
        "downloading" => TransferStatus::Downloading,
        "finished" => TransferStatus::Finished,
        _ => TransferStatus::Other,
    };

    Some(ProgressReport {
        status,
        downloaded_bytes: parse_bytes(parts[2]),
        total_bytes: parse_bytes(parts[3]),
        total_bytes_estimate: parse_bytes(parts[4]),
    })
}

/// Byte counts come through as integers, estimates as floats, or `NA`.
fn parse_bytes(value: &str) -> Option<u64> {
    value
        .parse::<u64>()
        .ok()
        .or_else(|| {
            value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64)
        })
}
