use crate::{
    editor::{EditorAction, EditorState},
    types::{DynamicSettings, Header},
};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MappingFile {
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
    #[serde(default)]
    pub mappings: BTreeMap<String, String>,
}

impl MappingFile {
    /// Renames run first so mapping keys can use the new array key names.
    /// Returns the mapping keys that are not fields of the template.
    pub fn apply_to(self, state: &mut EditorState) -> Result<Vec<String>> {
        for (name, key) in self.overrides {
            let index = state
                .variables
                .iter()
                .position(|v| v.name == name)
                .with_context(|| format!("No variable named {}", name))?;
            state.apply(EditorAction::RenameArrayKey { index, name: key });
        }
        let slots = state.slots();
        let mut unknown = vec![];
        for (key, text) in self.mappings {
            if !slots.contains(&key) {
                unknown.push(key.clone());
            }
            let caret = text.chars().count();
            state.apply(EditorAction::Input { key, text, caret });
        }
        Ok(unknown)
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SettingsFile {
    #[serde(flatten)]
    pub settings: DynamicSettings,
    #[serde(default)]
    pub headers: Vec<Header>,
}

pub fn read_text<P: AsRef<Path>>(path: P) -> Result<String>
where
    P: std::fmt::Debug,
{
    fs::read_to_string(path.as_ref()).with_context(|| format!("Failed to open file: {:?}", path))
}

pub fn open_json<P: AsRef<Path>>(path: P) -> Result<Value>
where
    P: std::fmt::Debug,
{
    let file = read_text(&path)?;
    serde_json::from_str(&file)
        .with_context(|| format!("Invalid JSON format in {:?}. Please check your JSON syntax.", path))
}

/// Accepts either `{ "overrides": .., "mappings": .. }` or a bare object of
/// composite key to mapping text.
pub fn open_mapping_file<P: AsRef<Path>>(path: P) -> Result<MappingFile>
where
    P: std::fmt::Debug,
{
    let file = read_text(&path)?;
    parse_mapping_file(&file)
}

fn parse_mapping_file(file: &str) -> Result<MappingFile> {
    match serde_json::from_str::<MappingFile>(file) {
        Ok(m) => Ok(m),
        _ => {
            let flat: Result<BTreeMap<String, String>, serde_json::error::Error> =
                serde_json::from_str(file);
            if let Ok(mappings) = flat {
                Ok(MappingFile {
                    overrides: BTreeMap::new(),
                    mappings,
                })
            } else {
                bail!("Failed to parse mapping file: {}", file)
            }
        }
    }
}

pub fn open_settings_file<P: AsRef<Path>>(path: P) -> Result<SettingsFile>
where
    P: std::fmt::Debug,
{
    let file = read_text(&path)?;
    serde_json::from_str(&file).with_context(|| format!("Failed to parse settings: {:?}", path))
}

pub fn write_text<P: AsRef<Path>>(path: P, text: &str) -> Result<()>
where
    P: std::fmt::Debug,
{
    fs::write(path.as_ref(), text).with_context(|| format!("Failed to write {:?}", path))
}

pub fn write_json<P: AsRef<Path>>(dir: P, file_name: &str, value: &Value) -> Result<PathBuf> {
    let path = dir.as_ref().join(file_name);
    write_text(&path, &serde_json::to_string_pretty(value)?)?;
    Ok(path)
}
