use crate::schema::FieldDescriptor;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Untyped handle → value map.
pub type Document = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Entry,
    Term,
    #[default]
    #[serde(other)]
    Other,
}

/// A localized content item and its source-language counterpart.
pub trait ContentItem {
    fn kind(&self) -> ItemKind;

    fn has_origin(&self) -> bool;

    /// Data of the source-language counterpart, if there is one.
    fn origin_data(&self) -> Option<&Document>;

    /// Locale id of this item, e.g. `fr_FR`.
    fn locale(&self) -> &str;

    fn data(&self) -> &Document;

    /// Replace the item's data. Nothing is persisted until [`ContentItem::save`].
    fn set_data(&mut self, data: Document);

    fn save(&mut self) -> Result<()>;

    fn blueprint(&self) -> &[FieldDescriptor];
}

#[derive(Deserialize)]
struct ItemFile {
    #[serde(default)]
    kind: ItemKind,
    locale: String,
    #[serde(default)]
    blueprint: Vec<FieldDescriptor>,
    #[serde(default)]
    origin: Option<Document>,
    #[serde(default)]
    data: Document,
}

/// An item stored as one JSON file:
///
/// ```json
/// {
///   "kind": "entry",
///   "locale": "fr_FR",
///   "blueprint": [{"handle": "title", "field": {"type": "text", "localizable": true}}],
///   "origin": {"title": "Hello"},
///   "data": {}
/// }
/// ```
///
/// Saving rewrites `data` and keeps every other key of the file as it was.
#[derive(Debug, Clone)]
pub struct JsonFileItem {
    path: PathBuf,
    raw: Document,
    kind: ItemKind,
    locale: String,
    blueprint: Vec<FieldDescriptor>,
    origin: Option<Document>,
    data: Document,
}

impl JsonFileItem {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read item file {}", path.display()))?;

        let raw: Document = serde_json::from_str(&contents)
            .with_context(|| format!("Item file {} is not a JSON object", path.display()))?;
        let file: ItemFile = serde_json::from_value(Value::Object(raw.clone()))
            .with_context(|| format!("Invalid item file {}", path.display()))?;

        debug!(
            "Loaded {:?} item {} ({} fields, locale {})",
            file.kind,
            path.display(),
            file.blueprint.len(),
            file.locale
        );

        Ok(Self {
            path: path.to_path_buf(),
            raw,
            kind: file.kind,
            locale: file.locale,
            blueprint: file.blueprint,
            origin: file.origin,
            data: file.data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ContentItem for JsonFileItem {
    fn kind(&self) -> ItemKind {
        self.kind
    }

    fn has_origin(&self) -> bool {
        self.origin.is_some()
    }

    fn origin_data(&self) -> Option<&Document> {
        self.origin.as_ref()
    }

    fn locale(&self) -> &str {
        &self.locale
    }

    fn data(&self) -> &Document {
        &self.data
    }

    fn set_data(&mut self, data: Document) {
        self.data = data;
    }

    fn save(&mut self) -> Result<()> {
        self.raw
            .insert("data".to_string(), Value::Object(self.data.clone()));

        let mut contents =
            serde_json::to_string_pretty(&self.raw).context("Failed to serialize item")?;
        contents.push('\n');

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write item file {}", self.path.display()))?;

        debug!("Saved item {}", self.path.display());
        Ok(())
    }

    fn blueprint(&self) -> &[FieldDescriptor] {
        &self.blueprint
    }
}

/// An item kept in memory. `save` only counts.
#[derive(Debug, Clone, Default)]
pub struct MemoryItem {
    pub kind: ItemKind,
    pub locale: String,
    pub blueprint: Vec<FieldDescriptor>,
    pub origin: Option<Document>,
    pub data: Document,
    pub saves: usize,
}

impl ContentItem for MemoryItem {
    fn kind(&self) -> ItemKind {
        self.kind
    }

    fn has_origin(&self) -> bool {
        self.origin.is_some()
    }

    fn origin_data(&self) -> Option<&Document> {
        self.origin.as_ref()
    }

    fn locale(&self) -> &str {
        &self.locale
    }

    fn data(&self) -> &Document {
        &self.data
    }

    fn set_data(&mut self, data: Document) {
        self.data = data;
    }

    fn save(&mut self) -> Result<()> {
        self.saves += 1;
        Ok(())
    }

    fn blueprint(&self) -> &[FieldDescriptor] {
        &self.blueprint
    }
}
