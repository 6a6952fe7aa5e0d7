use crate::config::UnknownVariantPolicy;
use crate::error::TranslateError;
use crate::gap::{handles_to_translate, missing_keys};
use crate::resolver::{EligibleNode, EligibleTree, VariantSets};
use crate::richtext::{self, Segment};
use crate::schema::FieldDescriptor;
use crate::translation::LeafTranslator;
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

/// Stand-in for an item that has no value at a handle.
static MISSING: Value = Value::Null;

pub struct FieldTranslator<'t> {
    leaf: &'t LeafTranslator,
    unknown_variant: UnknownVariantPolicy,
}

impl<'t> FieldTranslator<'t> {
    pub fn new(leaf: &'t LeafTranslator, unknown_variant: UnknownVariantPolicy) -> Self {
        Self {
            leaf,
            unknown_variant,
        }
    }

    /// Translate `handles` of `origin`, returning only the handles that
    /// produced a value.
    ///
    /// Handles whose origin value is missing or `null` are skipped, as are
    /// values whose shape does not match their field.
    pub fn translate_fields<'a>(
        &'a self,
        origin: &'a Map<String, Value>,
        item: &'a Value,
        tree: &'a EligibleTree<'a>,
        handles: &'a [&'a str],
    ) -> BoxFuture<'a, Result<Map<String, Value>, TranslateError>> {
        async move {
            let mut result = Map::new();

            for &handle in handles {
                let Some(node) = tree.get(handle) else {
                    continue;
                };

                let origin_value = match origin.get(handle) {
                    Some(value) if !value.is_null() => value,
                    _ => {
                        debug!("Skipping '{}': no origin value", handle);
                        self.leaf.metrics().record_skipped_value();
                        continue;
                    }
                };
                let item_value = item.get(handle).unwrap_or(&MISSING);

                if let Some(value) = self.translate_node(node, origin_value, item_value).await? {
                    result.insert(handle.to_string(), value);
                }
            }

            Ok(result)
        }
        .boxed()
    }

    async fn translate_node(
        &self,
        node: &EligibleNode<'_>,
        origin: &Value,
        item: &Value,
    ) -> Result<Option<Value>, TranslateError> {
        let field = node.field();
        debug!("Translating '{}' ({:?})", field.handle, field.kind());

        match node {
            EligibleNode::Text(_) => Ok(Some(self.leaf.translate_value(origin).await?)),
            EligibleNode::Group { fields, .. } => match origin.as_object() {
                Some(group) => Ok(Some(Value::Object(
                    self.translate_group(group, item, fields).await?,
                ))),
                None => Ok(self.shape_mismatch(field, "a map")),
            },
            EligibleNode::Grid { fields, .. } => match origin.as_array() {
                Some(rows) => Ok(Some(self.translate_grid(field, rows, item, fields).await?)),
                None => Ok(self.shape_mismatch(field, "a list of rows")),
            },
            EligibleNode::Array(_) => match origin.as_object() {
                Some(bag) => Ok(Some(Value::Object(self.translate_array(bag, item).await?))),
                None => Ok(self.shape_mismatch(field, "a map")),
            },
            EligibleNode::List(_) => match origin.as_array() {
                Some(values) => Ok(Some(self.translate_list(values).await?)),
                None => Ok(self.shape_mismatch(field, "a list")),
            },
            EligibleNode::Table(_) => match origin.as_array() {
                Some(rows) => Ok(Some(self.translate_table(rows).await?)),
                None => Ok(self.shape_mismatch(field, "a list of rows")),
            },
            EligibleNode::Replicator { sets, .. } => match origin.as_array() {
                Some(elements) => Ok(Some(
                    self.translate_replicator(field, elements, item, sets).await?,
                )),
                None => Ok(self.shape_mismatch(field, "a list of sets")),
            },
            EligibleNode::RichText { sets, .. } => {
                self.translate_rich_text(field, origin, item, sets.as_ref())
                    .await
            }
        }
    }

    fn shape_mismatch(&self, field: &FieldDescriptor, expected: &str) -> Option<Value> {
        warn!(
            "Skipping '{}': value is not {} as its {:?} field requires",
            field.handle,
            expected,
            field.kind()
        );
        self.leaf.metrics().record_skipped_value();
        None
    }

    /// Translate the missing fields of a group and lay them over the origin.
    async fn translate_group(
        &self,
        origin: &Map<String, Value>,
        item: &Value,
        fields: &EligibleTree<'_>,
    ) -> Result<Map<String, Value>, TranslateError> {
        let handles = handles_to_translate(fields, item);
        let translated = self.translate_fields(origin, item, fields, &handles).await?;

        let mut merged = origin.clone();
        merged.extend(translated);
        Ok(merged)
    }

    /// Every row is a group; rows keep their id or get a fresh one.
    async fn translate_grid(
        &self,
        field: &FieldDescriptor,
        rows: &[Value],
        item: &Value,
        fields: &EligibleTree<'_>,
    ) -> Result<Value, TranslateError> {
        let mut result = Vec::with_capacity(rows.len());

        for row in rows {
            let Some(row) = row.as_object() else {
                warn!("Copying a non-map row of '{}' untranslated", field.handle);
                result.push(row.clone());
                continue;
            };

            let mut translated = self.translate_group(row, item, fields).await?;
            translated.insert("id".to_string(), existing_or_new_id(row.get("id")));
            result.push(Value::Object(translated));
        }

        Ok(Value::Array(result))
    }

    /// Translate the keys of a key/value bag that the item does not have yet.
    async fn translate_array(
        &self,
        origin: &Map<String, Value>,
        item: &Value,
    ) -> Result<Map<String, Value>, TranslateError> {
        let mut result = Map::new();

        for key in missing_keys(origin.keys().map(String::as_str), item) {
            if let Some(value) = origin.get(key) {
                result.insert(key.to_string(), self.leaf.translate_value(value).await?);
            }
        }

        Ok(result)
    }

    async fn translate_list(&self, values: &[Value]) -> Result<Value, TranslateError> {
        let mut result = Vec::with_capacity(values.len());
        for value in values {
            result.push(self.leaf.translate_value(value).await?);
        }
        Ok(Value::Array(result))
    }

    /// Rows are rebuilt as `{ "cells": [...] }`.
    async fn translate_table(&self, rows: &[Value]) -> Result<Value, TranslateError> {
        let mut result = Vec::with_capacity(rows.len());

        for row in rows {
            let cells = match row.get("cells").and_then(Value::as_array) {
                Some(cells) => cells.as_slice(),
                None => {
                    warn!("Table row has no cells");
                    &[]
                }
            };

            let mut translated = Vec::with_capacity(cells.len());
            for cell in cells {
                translated.push(self.leaf.translate_value(cell).await?);
            }
            result.push(serde_json::json!({ "cells": translated }));
        }

        Ok(Value::Array(result))
    }

    async fn translate_replicator(
        &self,
        field: &FieldDescriptor,
        elements: &[Value],
        item: &Value,
        sets: &VariantSets<'_>,
    ) -> Result<Value, TranslateError> {
        let mut result = Vec::with_capacity(elements.len());

        for element in elements {
            match self.translate_set(field, element, item, sets).await? {
                Some(translated) => result.push(Value::Object(translated)),
                None => result.push(element.clone()),
            }
        }

        Ok(Value::Array(result))
    }

    /// Translate one set element against the variant its `type` names.
    ///
    /// The result carries the element's `type`, its `id` (or a new one) and
    /// its `enabled` flag (default `true`). `None` means the element could not
    /// be resolved and should be kept as it is.
    async fn translate_set(
        &self,
        field: &FieldDescriptor,
        element: &Value,
        item: &Value,
        sets: &VariantSets<'_>,
    ) -> Result<Option<Map<String, Value>>, TranslateError> {
        let Some(set) = element.as_object() else {
            warn!("Copying a non-map set of '{}' untranslated", field.handle);
            self.leaf.metrics().record_skipped_value();
            return Ok(None);
        };

        let variant = set.get("type").and_then(Value::as_str).unwrap_or_default();
        let Some(fields) = sets.get(variant) else {
            self.leaf.metrics().record_unresolved_variant();
            return match self.unknown_variant {
                UnknownVariantPolicy::Fail => Err(TranslateError::UnresolvableVariant {
                    field: field.handle.clone(),
                    variant: variant.to_string(),
                }),
                UnknownVariantPolicy::Keep => {
                    warn!(
                        "Field '{}' has no set named '{}', copying it untranslated",
                        field.handle, variant
                    );
                    Ok(None)
                }
            };
        };

        let mut result = self.translate_group(set, item, fields).await?;
        result.insert("type".to_string(), Value::String(variant.to_string()));
        result.insert("id".to_string(), existing_or_new_id(set.get("id")));
        result.insert(
            "enabled".to_string(),
            set.get("enabled")
                .filter(|enabled| !enabled.is_null())
                .cloned()
                .unwrap_or(Value::Bool(true)),
        );

        Ok(Some(result))
    }

    async fn translate_rich_text(
        &self,
        field: &FieldDescriptor,
        origin: &Value,
        item: &Value,
        sets: Option<&VariantSets<'_>>,
    ) -> Result<Option<Value>, TranslateError> {
        let nodes = match origin {
            // Stored HTML
            Value::String(_) => return Ok(Some(self.leaf.translate_value(origin).await?)),
            Value::Array(nodes) => nodes,
            _ => return Ok(self.shape_mismatch(field, "a rich-text document")),
        };

        let Some(sets) = sets else {
            let html = richtext::render_html(nodes);
            if html.is_empty() {
                return Ok(Some(Value::String(html)));
            }
            return Ok(Some(self.leaf.translate_value(&Value::String(html)).await?));
        };

        let mut result = Vec::new();

        for segment in richtext::segments(nodes) {
            match segment {
                Segment::Html(html) => {
                    let translated = self.leaf.translate(Some(&html)).await?.unwrap_or_default();
                    result.extend(richtext::parse_html(&translated));
                }
                Segment::Set { id, values } => {
                    let mut raw = Map::new();
                    raw.insert(
                        "id".to_string(),
                        id.map(Value::String).unwrap_or_else(new_id),
                    );
                    raw.insert(
                        "type".to_string(),
                        values.get("type").cloned().unwrap_or(Value::Null),
                    );
                    for (key, value) in values {
                        if !raw.contains_key(&key) {
                            raw.insert(key, value);
                        }
                    }

                    let raw = Value::Object(raw);
                    let mut translated = match self.translate_set(field, &raw, item, sets).await? {
                        Some(translated) => translated,
                        None => match raw {
                            Value::Object(raw) => raw,
                            _ => continue,
                        },
                    };

                    let id = translated.shift_remove("id").unwrap_or(Value::Null);
                    result.push(richtext::set_node(id, translated));
                }
            }
        }

        Ok(Some(Value::Array(result)))
    }
}

fn new_id() -> Value {
    Value::String(Uuid::new_v4().to_string())
}

fn existing_or_new_id(id: Option<&Value>) -> Value {
    id.filter(|id| !id.is_null())
        .cloned()
        .unwrap_or_else(new_id)
}
