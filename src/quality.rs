//! Quality labels shown in the selector and the technical values yt-dlp
//! receives for them.

use crate::models::FormatKind;

pub const HIGHEST: &str = "Highest";
pub const MEDIUM: &str = "Medium";
pub const LOWEST: &str = "Lowest";
pub const HD_720: &str = "720p";
pub const SD_480: &str = "480p or lower";

/// Audio bitrate passed to the extractor, `"0"` meaning best available.
#[derive(Debug, Clone)]
pub struct AudioQualityTable {
    entries: Vec<(&'static str, &'static str)>,
    fallback: &'static str,
}

impl AudioQualityTable {
    pub fn bitrate(&self, label: &str) -> &'static str {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, spec)| *spec)
            .unwrap_or(self.fallback)
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(l, _)| *l).collect()
    }
}

/// Maximum video height, `None` meaning no ceiling.
#[derive(Debug, Clone)]
pub struct VideoQualityTable {
    entries: Vec<(&'static str, Option<u32>)>,
    fallback: Option<u32>,
}

impl VideoQualityTable {
    pub fn height_ceiling(&self, label: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, h)| *h)
            .unwrap_or(self.fallback)
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(l, _)| *l).collect()
    }
}

#[derive(Debug, Clone)]
pub struct QualityTables {
    pub audio: AudioQualityTable,
    pub video: VideoQualityTable,
}

impl Default for QualityTables {
    fn default() -> Self {
        Self {
            audio: AudioQualityTable {
                entries: vec![(HIGHEST, "0"), (MEDIUM, "128"), (LOWEST, "64")],
                fallback: "128",
            },
            // Unknown labels land on the most restrictive ceiling.
            video: VideoQualityTable {
                entries: vec![(HIGHEST, None), (HD_720, Some(720)), (SD_480, Some(480))],
                fallback: Some(480),
            },
        }
    }
}

impl QualityTables {
    pub fn labels_for(&self, format: FormatKind) -> Vec<&'static str> {
        match format {
            FormatKind::Audio => self.audio.labels(),
            FormatKind::Video => self.video.labels(),
        }
    }
}
