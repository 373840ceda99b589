use std::fs;
use std::path::{Component, Path, PathBuf};

use log::warn;
use serde::Deserialize;
use serde_json::Value;

use super::deovr::{DeoVrVideo, TimeStamp};
use super::timecode;
use crate::error::Result;

pub const DESCRIPTOR_EXTENSION: &str = "desc";
pub const DEOVR_EXTENSION: &str = "deovr";

const THUMBNAIL_EXTENSION: &str = "jpg";
const VIDEO_EXTENSION: &str = "mp4";
const PREVIEW_SUFFIX: &str = "_preview.mp4";
const SEEK_SUFFIX: &str = "_seek.mp4";
const SCREEN_TYPE_2D: &str = "2D";

#[derive(Debug, Clone, Deserialize)]
pub struct RawTimeStamp {
    pub ts: Value,
    #[serde(default)]
    pub name: String,
}

/// Hand-written `.desc` file sitting next to a video.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub title: String,
    #[serde(default)]
    pub group: String,
    pub video: Option<String>,
    pub duration: Option<Value>,
    pub resolution: Option<u64>,
    #[serde(default)]
    pub time_stamps: Vec<RawTimeStamp>,
    #[serde(rename = "type")]
    pub screen_type: Option<String>,
    pub stereo: Option<String>,
}

/// A descriptor resolved against the library root.
#[derive(Debug, Clone)]
pub struct VideoEntry {
    pub group: String,
    pub deovr_path: PathBuf,
    pub deovr_url: String,
    pub video: DeoVrVideo,
}

/// Joins URL parts with single slashes, dropping trailing slashes.
pub fn url_join(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_end_matches('/'))
        .collect::<Vec<_>>()
        .join("/")
}

fn posix(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// `movies/beach.desc` belongs to group `Movies`.
pub fn group_from_relative_path(relative: &Path) -> String {
    let first = relative
        .components()
        .find_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_lowercase()),
            _ => None,
        })
        .unwrap_or_default();

    let mut chars = first.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn time_stamps(desc_path: &Path, raw: &[RawTimeStamp]) -> Vec<TimeStamp> {
    raw.iter()
        .filter_map(|stamp| match timecode::from_json(&stamp.ts) {
            Some(ts) => Some(TimeStamp {
                ts,
                name: stamp.name.clone(),
            }),
            None => {
                warn!(
                    "Invalid timecode ignored in {}: {}",
                    desc_path.display(),
                    stamp.ts
                );
                None
            }
        })
        .collect()
}

impl Descriptor {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Returns `None` when the video the descriptor points at is missing.
    pub fn resolve(&self, desc_path: &Path, root: &Path, base_url: &str) -> Option<VideoEntry> {
        let relative = desc_path.strip_prefix(root).unwrap_or(desc_path);
        let relative_dir = relative.parent().unwrap_or(Path::new(""));
        let stem = desc_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let sibling_url =
            |name: &str| url_join(&[base_url, posix(&relative_dir.join(name)).as_str()]);

        let video_name = self
            .video
            .clone()
            .unwrap_or_else(|| format!("{stem}.{VIDEO_EXTENSION}"));
        let video_path = desc_path.with_file_name(&video_name);
        if !video_path.exists() {
            warn!("Video file not found: {}", video_path.display());
            return None;
        }

        let thumbnail_url = sibling_url(&format!("{stem}.{THUMBNAIL_EXTENSION}"));
        let mut video = DeoVrVideo::new(&self.title, &sibling_url(&video_name), &thumbnail_url);

        let preview = format!("{stem}{PREVIEW_SUFFIX}");
        if desc_path.with_file_name(&preview).exists() {
            video.video_preview = Some(sibling_url(&preview));
        }
        let seek = format!("{stem}{SEEK_SUFFIX}");
        if desc_path.with_file_name(&seek).exists() {
            video.video_thumbnail = Some(sibling_url(&seek));
        }

        if let Some(duration) = &self.duration {
            match timecode::from_json(duration) {
                Some(seconds) if seconds > 0 => video.video_length = Some(seconds),
                Some(_) => {}
                None => warn!(
                    "{} has invalid time code: {duration}",
                    desc_path.display()
                ),
            }
        }
        if let Some(resolution) = self.resolution {
            video.set_resolution(resolution);
        }
        if !self.time_stamps.is_empty() {
            video.time_stamps = Some(time_stamps(desc_path, &self.time_stamps));
        }
        match self.screen_type.as_deref() {
            Some(SCREEN_TYPE_2D) => video.set_flat(),
            Some(screen_type) => video.screen_type = Some(screen_type.to_string()),
            None => {}
        }
        if let Some(stereo) = &self.stereo {
            video.set_stereo_mode(stereo);
        }

        let group = if self.group.is_empty() {
            group_from_relative_path(relative)
        } else {
            self.group.clone()
        };
        let deovr_name = format!("{stem}.{DEOVR_EXTENSION}");

        Some(VideoEntry {
            group,
            deovr_path: desc_path.with_file_name(&deovr_name),
            deovr_url: sibling_url(&deovr_name),
            video,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(json: &str) -> Descriptor {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_url_join_trims_trailing_slashes() {
        assert_eq!(
            url_join(&["http://host/vr/", "movies/", "a.mp4"]),
            "http://host/vr/movies/a.mp4"
        );
    }

    #[test]
    fn test_group_from_first_component() {
        assert_eq!(group_from_relative_path(Path::new("MOVIES/x/a.desc")), "Movies");
        assert_eq!(group_from_relative_path(Path::new("a.desc")), "A.desc");
    }

    #[test]
    fn test_resolve_builds_urls_and_group() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("travel");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("beach.mp4"), "").unwrap();
        fs::write(dir.join("beach_seek.mp4"), "").unwrap();
        let desc = descriptor(
            r#"{"title":"Beach","duration":"01:00","resolution":2880,
                "timeStamps":[{"ts":"00:10","name":"Waves"},{"ts":"00:","name":""}]}"#,
        );

        let entry = desc
            .resolve(&dir.join("beach.desc"), root.path(), "http://host/vr/")
            .unwrap();

        assert_eq!(entry.group, "Travel");
        assert_eq!(entry.deovr_url, "http://host/vr/travel/beach.deovr");
        assert_eq!(entry.deovr_path, dir.join("beach.deovr"));
        assert_eq!(entry.video.thumbnail_url, "http://host/vr/travel/beach.jpg");
        assert_eq!(
            entry.video.video_thumbnail.as_deref(),
            Some("http://host/vr/travel/beach_seek.mp4")
        );
        assert_eq!(entry.video.video_preview, None);
        assert_eq!(entry.video.video_length, Some(60));
        assert_eq!(
            entry.video.time_stamps,
            Some(vec![TimeStamp {
                ts: 10,
                name: "Waves".to_string()
            }])
        );
    }

    #[test]
    fn test_resolve_missing_video_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        let desc = descriptor(r#"{"title":"Ghost","video":"ghost.mp4"}"#);

        assert!(desc
            .resolve(&root.path().join("ghost.desc"), root.path(), "http://h/")
            .is_none());
    }

    #[test]
    fn test_2d_and_stereo_off() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("flat.mp4"), "").unwrap();
        let desc_path = root.path().join("flat.desc");

        let flat = descriptor(r#"{"title":"Flat","group":"Misc","type":"2D"}"#)
            .resolve(&desc_path, root.path(), "http://h")
            .unwrap();
        assert!(!flat.video.is3d);
        assert_eq!(flat.video.screen_type, None);
        assert_eq!(flat.group, "Misc");

        let fisheye = descriptor(r#"{"title":"Fish","type":"fisheye","stereo":"off"}"#)
            .resolve(&desc_path, root.path(), "http://h")
            .unwrap();
        assert!(!fisheye.video.is3d);
        assert_eq!(fisheye.video.screen_type.as_deref(), Some("fisheye"));
        assert_eq!(fisheye.video.stereo_mode, "off");
    }
}
