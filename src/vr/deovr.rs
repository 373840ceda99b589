//! DeoVR JSON documents: per-video files and the library catalog.

use serde::Serialize;

pub const STEREO_OFF: &str = "off";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VideoSource {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<u64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Encoding {
    pub name: String,
    pub video_sources: Vec<VideoSource>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Corrections {
    pub x: i32,
    pub y: i32,
    pub br: i32,
    pub cont: i32,
    pub sat: i32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimeStamp {
    pub ts: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeoVrVideo {
    pub encodings: Vec<Encoding>,
    pub title: String,
    pub id: u32,
    pub is3d: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_type: Option<String>,
    pub stereo_mode: String,
    pub skip_intro: u32,
    pub thumbnail_url: String,
    pub corrections: Corrections,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_stamps: Option<Vec<TimeStamp>>,
}

impl DeoVrVideo {
    /// A 180 degree side-by-side dome video with a single h264 source.
    pub fn new(title: &str, video_url: &str, thumbnail_url: &str) -> Self {
        Self {
            encodings: vec![Encoding {
                name: "h264".to_string(),
                video_sources: vec![VideoSource {
                    url: video_url.to_string(),
                    resolution: None,
                }],
            }],
            title: title.to_string(),
            id: 0,
            is3d: true,
            screen_type: Some("dome".to_string()),
            stereo_mode: "sbs".to_string(),
            skip_intro: 0,
            thumbnail_url: thumbnail_url.to_string(),
            corrections: Corrections::default(),
            video_preview: None,
            video_thumbnail: None,
            video_length: None,
            time_stamps: None,
        }
    }

    pub fn set_resolution(&mut self, resolution: u64) {
        if resolution == 0 {
            return;
        }
        if let Some(source) = self
            .encodings
            .first_mut()
            .and_then(|e| e.video_sources.first_mut())
        {
            source.resolution = Some(resolution);
        }
    }

    pub fn set_stereo_mode(&mut self, mode: &str) {
        self.stereo_mode = mode.to_string();
        if mode == STEREO_OFF {
            self.is3d = false;
        }
    }

    pub fn set_flat(&mut self) {
        self.set_stereo_mode(STEREO_OFF);
        self.screen_type = None;
    }
}

/// Catalog entry pointing at a per-video `.deovr` file.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IndexEntry {
    pub title: String,
    #[serde(rename = "thumbnailUrl")]
    pub thumbnail_url: String,
    pub video_url: String,
    #[serde(rename = "videoLength", skip_serializing_if = "Option::is_none")]
    pub video_length: Option<u64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Scene {
    pub name: String,
    pub list: Vec<IndexEntry>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Catalog {
    pub scenes: Vec<Scene>,
}
