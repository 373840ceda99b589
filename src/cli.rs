use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::archive::{self, ArchiveOptions, SevenZip, DEFAULT_SEVEN_ZIP};
use crate::auth::Credentials;
use crate::ticket::{self, TicketClient};
use crate::{boq, exceptions, ledger, perf, prune, rename, tmx, vr};

/// Argument value that stands for "use the default", as the scripts accepted.
const DEFAULT_MARKER: &str = "-";

const ARCHIVE_DIR_ENV: &str = "WORKBENCH_ARCHIVE_DIR";

#[derive(Parser)]
#[command(name = "workbench")]
#[command(
    author,
    version,
    about = "Test-run reporting, file conversion and housekeeping tools",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Gather performance results from a test-run folder
    Perf {
        /// Test-run folder holding one sub-folder per test
        path: Option<String>,

        /// Suite label (defaults to the folder name)
        #[arg(short, long)]
        label: Option<String>,

        /// Build revision, overriding the one in the folder name
        #[arg(short, long)]
        revision: Option<u64>,

        /// Build version, overriding the one in the folder name
        #[arg(long = "version-string")]
        version_string: Option<String>,
    },

    /// Fill in missing build information in older JSON reports
    PerfConvert {
        source: Option<String>,
        target: Option<String>,
    },

    /// Expand a cut-bill BOQ file into readable text
    Boq {
        boq_file: Option<String>,
        out_file: Option<String>,
    },

    /// Convert a bank statement CSV into a ledger journal
    Ledger {
        csv: Option<String>,
        substitutions: Option<String>,
        out: Option<String>,
    },

    /// Build a TMX translation memory from resx resources
    Resx2tmx {
        language: Option<String>,
        resource_folder: Option<String>,
        out: Option<String>,
    },

    /// Archive old test-run folders and delete the originals
    Archive {
        source: Option<String>,

        #[arg(env = ARCHIVE_DIR_ENV)]
        dest: Option<String>,

        /// Minimum age in days before a folder is archived
        min_days: Option<String>,

        /// Maximum folders to archive in one run (0 for no limit)
        max_folders: Option<String>,

        /// Gather perf results first for folders without results.json
        #[arg(short, long, default_value_t = false)]
        gather: bool,

        /// 7-Zip executable
        #[arg(long, env = "WORKBENCH_7Z", default_value = DEFAULT_SEVEN_ZIP)]
        archiver: PathBuf,
    },

    /// Delete old files from a folder, except those marked "keep"
    Prune {
        path: PathBuf,

        /// Minimum age in days before a file is deleted
        min_days: Option<String>,
    },

    /// Copy the video in a download folder under a name typed with completion
    Rename {
        /// Folder holding exactly one video
        path: PathBuf,

        #[arg(default_value = rename::DEFAULT_EXTENSION)]
        extension: String,
    },

    /// DeoVR library tools
    Vr {
        #[command(subcommand)]
        command: VrCommands,
    },

    /// Print the status of Trac tickets
    Ticket {
        /// Ticket numbers
        #[arg(required = true)]
        ids: Vec<String>,

        /// JSON-RPC endpoint
        #[arg(short, long, env = "TICKET_RPC_URL")]
        url: String,

        #[arg(long, env = "TICKET_USER")]
        user: Option<String>,

        #[arg(long, env = "TICKET_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Compare two exception report exports
    ExceptionDiff {
        previous: PathBuf,
        current: PathBuf,
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum VrCommands {
    /// Write the DeoVR catalog and per-video files
    Index {
        /// Library root
        #[arg(env = "DEOVR_ROOT")]
        root: Option<PathBuf>,

        /// URL the library root is served from
        #[arg(short, long, env = "DEOVR_BASE_URL", default_value = vr::DEFAULT_BASE_URL)]
        base_url: String,
    },

    /// Write a starter .desc file next to a video
    Template { video: PathBuf },
}

fn path_or_default(arg: Option<&str>, default: &str) -> PathBuf {
    PathBuf::from(value_or_default(arg, default))
}

fn value_or_default<'a>(arg: Option<&'a str>, default: &'a str) -> &'a str {
    match arg {
        Some(value) if value != DEFAULT_MARKER => value,
        _ => default,
    }
}

fn number_or_default<T>(arg: Option<&str>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match arg {
        Some(value) if value != DEFAULT_MARKER => value
            .parse()
            .map_err(|e| anyhow!("invalid number '{value}': {e}")),
        _ => Ok(default),
    }
}

/// `-` falls back to the environment before the built-in default.
fn archive_dest(arg: Option<&str>) -> PathBuf {
    match arg {
        Some(value) if value != DEFAULT_MARKER => PathBuf::from(value),
        _ => {
            let from_env = std::env::var(ARCHIVE_DIR_ENV).ok();
            path_or_default(from_env.as_deref(), archive::DEFAULT_ARCHIVE_DIR)
        }
    }
}

/// The scripts reported a missing input and stopped without failing.
fn input_exists(path: &Path) -> bool {
    let exists = path.exists();
    if !exists {
        error!("File '{}' does not exist.", path.display());
    }
    exists
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Perf {
                path,
                label,
                revision,
                version_string,
            } => {
                let base_path = path_or_default(path.as_deref(), ".");
                if !input_exists(&base_path) {
                    return Ok(());
                }
                let options = perf::GatherOptions {
                    label: label.clone(),
                    revision: *revision,
                    version: version_string.clone(),
                };
                let output = perf::gather(&base_path, &options)?;
                for file in &output.files {
                    info!("Written: {}", file.display());
                }
            }

            Commands::PerfConvert { source, target } => {
                let source = path_or_default(source.as_deref(), perf::DEFAULT_SOURCE_DIR);
                let target = path_or_default(target.as_deref(), perf::DEFAULT_TARGET_DIR);
                if input_exists(&source) {
                    perf::convert_directory(&source, &target)?;
                }
            }

            Commands::Boq { boq_file, out_file } => {
                let boq_file = path_or_default(boq_file.as_deref(), boq::DEFAULT_BOQ_FILE);
                let out_file = path_or_default(out_file.as_deref(), boq::DEFAULT_OUT_FILE);
                if input_exists(&boq_file) {
                    boq::expand_file(&boq_file, &out_file)?;
                }
            }

            Commands::Ledger {
                csv,
                substitutions,
                out,
            } => {
                let csv = path_or_default(csv.as_deref(), ledger::DEFAULT_CSV_FILE);
                let substitutions = path_or_default(
                    substitutions.as_deref(),
                    ledger::DEFAULT_SUBSTITUTIONS_FILE,
                );
                let out = path_or_default(out.as_deref(), ledger::DEFAULT_LEDGER_FILE);
                if input_exists(&csv) {
                    ledger::convert_file(&csv, &substitutions, &out)?;
                }
            }

            Commands::Resx2tmx {
                language,
                resource_folder,
                out,
            } => {
                let language = value_or_default(language.as_deref(), tmx::DEFAULT_LANGUAGE);
                let folder =
                    path_or_default(resource_folder.as_deref(), tmx::DEFAULT_RESOURCE_FOLDER);
                let out = path_or_default(out.as_deref(), tmx::DEFAULT_OUTPUT_FILE);
                tmx::convert(language, &folder, &out)?;
            }

            Commands::Archive {
                source,
                dest,
                min_days,
                max_folders,
                gather,
                archiver,
            } => {
                let source = path_or_default(source.as_deref(), ".");
                let dest = archive_dest(dest.as_deref());
                let options = ArchiveOptions {
                    min_days: number_or_default(min_days.as_deref(), archive::DEFAULT_MIN_DAYS)?,
                    max_folders: number_or_default(
                        max_folders.as_deref(),
                        archive::DEFAULT_MAX_FOLDERS,
                    )?,
                    gather: *gather,
                };
                archive::archive_old_runs(&source, &dest, &options, &SevenZip::new(archiver))?;
            }

            Commands::Prune { path, min_days } => {
                let min_days = number_or_default(min_days.as_deref(), prune::DEFAULT_MIN_DAYS)?;
                let deleted = prune::prune_old_files(path, min_days)?;
                info!("Deleted {} files", deleted.len());
            }

            Commands::Rename { path, extension } => {
                if let Some(copied) = rename::run(path, extension)? {
                    info!("Copied to {copied}");
                }
            }

            Commands::Vr { command } => match command {
                VrCommands::Index { root, base_url } => {
                    let root = root.clone().unwrap_or_else(|| PathBuf::from("."));
                    vr::index_library(&root, base_url)?;
                }
                VrCommands::Template { video } => {
                    vr::write_template(video)?;
                }
            },

            Commands::Ticket {
                ids,
                url,
                user,
                password,
            } => {
                let credentials = user.as_ref().map(|user| {
                    Credentials::new(user.as_str(), password.clone().unwrap_or_default())
                });
                let client = TicketClient::new(url, credentials)?;

                let failures = ticket::print_statuses(&client, ids).await;
                if failures > 0 {
                    bail!("{failures} of {} ticket lookups failed", ids.len());
                }
            }

            Commands::ExceptionDiff {
                previous,
                current,
                out,
            } => {
                let totals = exceptions::diff_files(previous, current, out)?;
                println!("Prev total count: {}", totals.previous);
                println!("Curr total count: {}", totals.current);
                println!("Changed total count: {}", totals.changed);
            }
        }

        Ok(())
    }
}
