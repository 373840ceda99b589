use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, error, info, warn};

use super::deovr::{Catalog, IndexEntry, Scene};
use super::descriptor::{Descriptor, VideoEntry, DESCRIPTOR_EXTENSION};
use crate::error::{Result, WorkbenchError};

pub const CATALOG_FILE: &str = "deovr";

/// Videos grouped by scene, in the order groups were first seen.
#[derive(Debug, Default)]
pub struct VideoLibrary {
    groups: IndexMap<String, Vec<VideoEntry>>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub videos: usize,
    pub video_files_written: usize,
}

fn descriptor_paths(root: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/**/*.{DESCRIPTOR_EXTENSION}",
        glob::Pattern::escape(&root.to_string_lossy())
    );
    let paths = glob::glob(&pattern).map_err(|e| WorkbenchError::Config(e.to_string()))?;

    Ok(paths
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable path: {e}");
                None
            }
        })
        .collect())
}

impl VideoLibrary {
    pub fn scan(root: &Path, base_url: &str) -> Result<Self> {
        let mut library = Self::default();

        for desc_path in descriptor_paths(root)? {
            debug!("-> {}", desc_path.display());
            let descriptor = match Descriptor::load(&desc_path) {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    warn!("Skipping {}: {e}", desc_path.display());
                    continue;
                }
            };
            if let Some(entry) = descriptor.resolve(&desc_path, root, base_url) {
                library.add(entry);
            }
        }

        Ok(library)
    }

    pub fn add(&mut self, entry: VideoEntry) {
        self.groups.entry(entry.group.clone()).or_default().push(entry);
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn catalog(&self) -> Catalog {
        Catalog {
            scenes: self
                .groups
                .iter()
                .map(|(name, entries)| Scene {
                    name: name.clone(),
                    list: entries
                        .iter()
                        .map(|entry| IndexEntry {
                            title: entry.video.title.clone(),
                            thumbnail_url: entry.video.thumbnail_url.clone(),
                            video_url: entry.deovr_url.clone(),
                            video_length: entry.video.video_length,
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Writes the catalog and any per-video files that do not exist yet.
    pub fn write(&self, root: &Path) -> Result<usize> {
        let catalog_path = root.join(CATALOG_FILE);
        info!("Writing deovr index file at {}", catalog_path.display());
        fs::write(&catalog_path, serde_json::to_string_pretty(&self.catalog())?)?;

        let mut written = 0;
        for entry in self.groups.values().flatten() {
            if entry.deovr_path.exists() {
                continue;
            }
            fs::write(&entry.deovr_path, serde_json::to_string_pretty(&entry.video)?)?;
            written += 1;
        }
        Ok(written)
    }
}

pub fn index_library(root: &Path, base_url: &str) -> Result<Option<IndexSummary>> {
    if !root.is_dir() {
        error!("Folder '{}' does not exist.", root.display());
        return Ok(None);
    }

    info!("Scanning directories starting at {}", root.display());
    let library = VideoLibrary::scan(root, base_url)?;
    let video_files_written = library.write(root)?;

    info!(
        "Indexed {} videos, wrote {video_files_written} new video files",
        library.len()
    );
    Ok(Some(IndexSummary {
        videos: library.len(),
        video_files_written,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn add_video(root: &Path, rel_dir: &str, stem: &str, desc: &str) {
        let dir = root.join(rel_dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{stem}.mp4")), "").unwrap();
        fs::write(dir.join(format!("{stem}.desc")), desc).unwrap();
    }

    #[test]
    fn test_index_library_groups_and_writes() {
        let root = tempfile::tempdir().unwrap();
        add_video(root.path(), "travel", "alps", r#"{"title":"Alps","duration":90}"#);
        add_video(root.path(), "travel", "beach", r#"{"title":"Beach"}"#);
        add_video(root.path(), "music", "gig", r#"{"title":"Gig","group":"Live"}"#);
        fs::write(root.path().join("travel/beach.deovr"), "keep me").unwrap();
        fs::write(root.path().join("travel/broken.desc"), "{").unwrap();

        let summary = index_library(root.path(), "http://host/vr/").unwrap().unwrap();

        assert_eq!(
            summary,
            IndexSummary {
                videos: 3,
                video_files_written: 2
            }
        );
        assert_eq!(
            fs::read_to_string(root.path().join("travel/beach.deovr")).unwrap(),
            "keep me"
        );

        let catalog: Value =
            serde_json::from_str(&fs::read_to_string(root.path().join(CATALOG_FILE)).unwrap())
                .unwrap();
        assert_eq!(catalog["scenes"][0]["name"], "Live");
        assert_eq!(catalog["scenes"][1]["name"], "Travel");
        let alps = &catalog["scenes"][1]["list"][0];
        assert_eq!(alps["video_url"], "http://host/vr/travel/alps.deovr");
        assert_eq!(alps["thumbnailUrl"], "http://host/vr/travel/alps.jpg");
        assert_eq!(alps["videoLength"], 90);
        assert!(catalog["scenes"][1]["list"][1].get("videoLength").is_none());
    }

    #[test]
    fn test_index_library_missing_root() {
        let root = tempfile::tempdir().unwrap();
        assert!(index_library(&root.path().join("none"), "http://h/")
            .unwrap()
            .is_none());
    }
}
