use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Result, WorkbenchError};

const DATA: &[u8] = b"data";
const VALUE: &[u8] = b"value";
const KEY_ATTRIBUTE: &str = "name";

fn xml_error(path: &Path, error: impl std::fmt::Display) -> WorkbenchError {
    WorkbenchError::Xml {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

/// `<data name="..."><value>...</value></data>` pairs in document order.
/// A repeated key keeps its first position and its last value.
pub fn parse_resx(xml: &str, path: &Path) -> Result<IndexMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut items = IndexMap::new();

    let mut key: Option<String> = None;
    let mut value: Option<String> = None;

    loop {
        match reader.read_event().map_err(|e| xml_error(path, e))? {
            Event::Start(e) if e.local_name().as_ref() == DATA => {
                let name = e
                    .try_get_attribute(KEY_ATTRIBUTE)
                    .map_err(|e| xml_error(path, e))?
                    .map(|a| a.unescape_value().map(|v| v.into_owned()))
                    .transpose()
                    .map_err(|e| xml_error(path, e))?;
                key = name;
            }
            Event::Start(e) if key.is_some() && e.local_name().as_ref() == VALUE => {
                value = Some(String::new());
            }
            Event::Text(text) => {
                if let Some(value) = value.as_mut() {
                    value.push_str(&text.unescape().map_err(|e| xml_error(path, e))?);
                }
            }
            Event::CData(data) => {
                if let Some(value) = value.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(e) if e.local_name().as_ref() == VALUE => {
                if let (Some(key), Some(text)) = (key.as_ref(), value.take()) {
                    items.insert(key.clone(), text);
                }
            }
            Event::End(e) if e.local_name().as_ref() == DATA => {
                if let Some(key) = key.take() {
                    items.entry(key).or_default();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(items)
}

pub fn read_resx(path: &Path) -> Result<IndexMap<String, String>> {
    parse_resx(&fs::read_to_string(path)?, path)
}
