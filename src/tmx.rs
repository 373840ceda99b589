//! Translation memory (TMX 1.4) export from .NET resource files.
//!
//! The English strings live in `Resources.resx`; each translation sits next
//! to it as `Resources.<lang>.resx`. Only strings that were actually
//! translated (value differs from English) become translation units.

mod resx;

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::{error, info};
use quick_xml::escape::escape;

pub use resx::read_resx;

use crate::error::Result;

pub const DEFAULT_LANGUAGE: &str = "fr";
pub const DEFAULT_RESOURCE_FOLDER: &str = "./testdata";
pub const DEFAULT_OUTPUT_FILE: &str = "./testout/Translations.tmx";

pub const SOURCE_LANGUAGE: &str = "en";
const SOURCE_RESX: &str = "Resources.resx";
const TOOL_NAME: &str = "resx2tmx";
const TOOL_VERSION: &str = "0.2";
const CREATION_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    pub source_text: String,
    pub target_text: String,
}

pub fn target_resx_name(language: &str) -> String {
    format!("Resources.{language}.resx")
}

/// Units in target document order for keys whose translation differs.
pub fn translation_units(
    source: &IndexMap<String, String>,
    target: &IndexMap<String, String>,
) -> Vec<TranslationUnit> {
    target
        .iter()
        .filter_map(|(key, target_text)| {
            let source_text = source.get(key)?;
            (source_text != target_text).then(|| TranslationUnit {
                source_text: source_text.clone(),
                target_text: target_text.clone(),
            })
        })
        .collect()
}

pub fn render_tmx(
    units: &[TranslationUnit],
    language: &str,
    source_document: &Path,
    created: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<tmx version=\"1.4\">\n");
    let _ = writeln!(
        out,
        "  <header creationtool=\"{TOOL_NAME}\" creationtoolversion=\"{TOOL_VERSION}\" \
         datatype=\"plaintext\" segtype=\"sentence\" adminlang=\"{SOURCE_LANGUAGE}\" \
         srclang=\"{SOURCE_LANGUAGE}\" o-tmf=\"resx\" creationdate=\"{}\">",
        created.format(CREATION_DATE_FORMAT)
    );
    let _ = writeln!(
        out,
        "    <prop type=\"x-source-document\">{}</prop>",
        escape(&*source_document.to_string_lossy())
    );
    out.push_str("  </header>\n");
    out.push_str("  <body>\n");

    for unit in units {
        out.push_str("    <tu>\n");
        for (lang, text) in [
            (SOURCE_LANGUAGE, &unit.source_text),
            (language, &unit.target_text),
        ] {
            let _ = writeln!(
                out,
                "      <tuv xml:lang=\"{}\"><seg>{}</seg></tuv>",
                escape(lang),
                escape(text.as_str())
            );
        }
        out.push_str("    </tu>\n");
    }

    out.push_str("  </body>\n");
    out.push_str("</tmx>\n");
    out
}

/// Returns `None` when either resource file is missing.
pub fn convert(language: &str, resource_folder: &Path, out_file: &Path) -> Result<Option<usize>> {
    let source_resx = resource_folder.join(SOURCE_RESX);
    let target_resx = resource_folder.join(target_resx_name(language));

    info!(
        "Using {} to create a TMX file {}",
        target_resx.display(),
        out_file.display()
    );

    for path in [&source_resx, &target_resx] {
        if !path.exists() {
            error!("File '{}' does not exist.", path.display());
            return Ok(None);
        }
    }

    let units = translation_units(&read_resx(&source_resx)?, &read_resx(&target_resx)?);
    let source_document: PathBuf = target_resx.canonicalize().unwrap_or(target_resx);
    let tmx = render_tmx(&units, language, &source_document, Utc::now());

    if let Some(parent) = out_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(out_file, tmx)?;

    info!("Wrote {} translation units", units.len());
    Ok(Some(units.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn items(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_only_translated_keys_become_units() {
        let source = items(&[("Ok", "OK"), ("Cancel", "Cancel"), ("Yes", "Yes")]);
        let target = items(&[("Yes", "Oui"), ("Ok", "OK"), ("Extra", "Plus")]);

        let units = translation_units(&source, &target);

        assert_eq!(
            units,
            [TranslationUnit {
                source_text: "Yes".to_string(),
                target_text: "Oui".to_string(),
            }]
        );
    }

    #[test]
    fn test_render_tmx_escapes_segments() {
        let units = [TranslationUnit {
            source_text: "Save & <close>".to_string(),
            target_text: "Enregistrer & fermer".to_string(),
        }];
        let created = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();

        let tmx = render_tmx(&units, "fr", Path::new("/res/Resources.fr.resx"), created);

        assert!(tmx.contains("creationdate=\"20240305T140709Z\""));
        assert!(tmx.contains("creationtoolversion=\"0.2\""));
        assert!(tmx.contains("<tuv xml:lang=\"en\"><seg>Save &amp; &lt;close&gt;</seg></tuv>"));
        assert!(tmx.contains("<tuv xml:lang=\"fr\"><seg>Enregistrer &amp; fermer</seg></tuv>"));
    }

    #[test]
    fn test_convert_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let resx = |pairs: &str| format!("<root>{pairs}</root>");
        fs::write(
            dir.path().join("Resources.resx"),
            resx(r#"<data name="a"><value>Hello</value></data>"#),
        )
        .unwrap();
        fs::write(
            dir.path().join("Resources.de.resx"),
            resx(r#"<data name="a"><value>Hallo</value></data>"#),
        )
        .unwrap();
        let out = dir.path().join("out").join("Translations.tmx");

        let count = convert("de", dir.path(), &out).unwrap();

        assert_eq!(count, Some(1));
        assert!(fs::read_to_string(&out).unwrap().contains("<seg>Hallo</seg>"));
    }

    #[test]
    fn test_convert_missing_translation_returns_early() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Resources.resx"), "<root/>").unwrap();
        let out = dir.path().join("Translations.tmx");

        assert_eq!(convert("fr", dir.path(), &out).unwrap(), None);
        assert!(!out.exists());
    }
}
