//! DeoVR library indexing for a folder tree of VR videos.
//!
//! Each video is described by a `.desc` JSON file next to it. Indexing
//! writes a `deovr` catalog at the library root plus a `.deovr` file per
//! video, all pointing at URLs under the library's base URL.

mod deovr;
mod descriptor;
mod library;
mod timecode;

use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};

pub use library::{index_library, IndexSummary};

use crate::error::Result;
use descriptor::DESCRIPTOR_EXTENSION;

pub const DEFAULT_BASE_URL: &str = "http://192.168.0.4/vr/";

/// `my_great_video` becomes `My Great Video`.
pub fn title_from_stem(stem: &str) -> String {
    let mut title = String::with_capacity(stem.len());
    let mut previous_is_letter = false;

    for c in stem.replace('_', " ").chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                title.extend(c.to_lowercase());
            } else {
                title.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            title.push(c);
            previous_is_letter = false;
        }
    }
    title
}

fn template(title: &str) -> Result<String> {
    Ok(format!(
        r#"{{
    "title": {},
    "site": "Unknown",
    "duration": "00:00:00",
    "resolution": 1920,
    "group": "",
    "actors": ["Unknown"],
    "timeStamps": [
        {{"ts":"00:", "name":""}},
        {{"ts":"00:", "name":""}}
    ]
}}
"#,
        serde_json::to_string(title)?
    ))
}

/// Writes a starter descriptor next to `video`. Never overwrites.
pub fn write_template(video: &Path) -> Result<Option<PathBuf>> {
    if !video.exists() {
        error!("File not found: {}", video.display());
        return Ok(None);
    }

    let desc_path = video.with_extension(DESCRIPTOR_EXTENSION);
    if desc_path.exists() {
        error!("Descriptor already exists: {}", desc_path.display());
        return Ok(None);
    }

    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    fs::write(&desc_path, template(&title_from_stem(&stem))?)?;

    info!("Wrote {}", desc_path.display());
    Ok(Some(desc_path))
}
