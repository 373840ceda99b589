//! Copies the single video out of a download folder under a short name,
//! typed with completion over the parts of the folder name.

mod completion;
mod prompt;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use completion::Completer;

use crate::error::{Result, WorkbenchError};

pub const DEFAULT_EXTENSION: &str = "mp4";
pub const RSYNC: &str = "rsync";

/// The one `*.<extension>` file directly inside `dir`.
pub fn find_video(dir: &Path, extension: &str) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(WorkbenchError::Config(format!(
            "{} must point to a directory",
            dir.display()
        )));
    }

    let pattern = format!(
        "{}/*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        glob::Pattern::escape(extension)
    );
    let mut candidates: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| WorkbenchError::Config(e.to_string()))?
        .filter_map(std::result::Result::ok)
        .collect();

    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => Err(WorkbenchError::Config(format!(
            "no .{extension} file in {}",
            dir.display()
        ))),
        n => Err(WorkbenchError::Config(format!(
            "found {n} possible files to copy, can only copy one"
        ))),
    }
}

pub fn rsync_command(video: &Path, target_name: &str, extension: &str) -> Command {
    let mut command = Command::new(RSYNC);
    command
        .args(["-ah", "--progress"])
        .arg(video)
        .arg(format!("{target_name}.{extension}"));
    command
}

fn confirmed(mut input: impl BufRead) -> Result<bool> {
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim() == "y")
}

/// Asks for a name, then copies the video into the working folder after a
/// `y` confirmation. Returns the copy's file name, or `None` when cancelled.
pub fn run(dir: &Path, extension: &str) -> Result<Option<String>> {
    let video = find_video(dir, extension)?;
    let folder_name = dir
        .canonicalize()?
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let completer = Completer::from_folder_name(&folder_name);

    info!("Copying {}", video.display());
    debug!("Completions: {:?}", completer.parts());

    let Some(name) = prompt::read_name(&completer)? else {
        return Ok(None);
    };

    let mut command = rsync_command(&video, &name, extension);
    println!("{command:?}");
    print!("Proceed? (y/_)> ");
    io::stdout().flush()?;
    if !confirmed(io::stdin().lock())? {
        return Ok(None);
    }

    let status = command
        .status()
        .map_err(|e| WorkbenchError::Config(format!("could not start {RSYNC}: {e}")))?;
    if !status.success() {
        return Err(WorkbenchError::Config(format!("{RSYNC} exited with {status}")));
    }
    Ok(Some(format!("{name}.{extension}")))
}
