use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::marker::PhantomData;

/// Declared type of a field.
///
/// The serialized names follow the blueprint vocabulary; the variant names
/// describe what the field holds. Unknown types deserialize to `Other` and
/// are never translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[serde(rename = "text")]
    PlainText,
    Code,
    Markdown,
    #[serde(rename = "textarea")]
    MultilineText,
    Slug,
    Array,
    List,
    Table,
    #[serde(rename = "taggable")]
    TagList,
    #[serde(rename = "bard")]
    RichText,
    Group,
    Grid,
    Replicator,
    #[serde(other)]
    Other,
}

/// One field of a blueprint.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDescriptor {
    pub handle: String,
    #[serde(rename = "field")]
    pub config: FieldConfig,
}

impl FieldDescriptor {
    pub fn kind(&self) -> FieldKind {
        self.config.kind
    }

    pub fn is_localizable(&self) -> bool {
        self.config.localizable
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    #[serde(rename = "type")]
    pub kind: FieldKind,

    #[serde(default)]
    pub localizable: bool,

    /// Child fields of `group` and `grid` fields.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,

    /// Set groups of `replicator` and `bard` fields, in declaration order.
    #[serde(default, deserialize_with = "deserialize_set_groups")]
    pub sets: Option<Vec<SetGroup>>,
}

/// A named group of variant sets.
#[derive(Debug, Clone)]
pub struct SetGroup {
    pub handle: String,
    pub display: Option<String>,
    pub sets: Vec<SetDefinition>,
}

/// One variant of a polymorphic field, selected by an element's `type`.
#[derive(Debug, Clone)]
pub struct SetDefinition {
    pub handle: String,
    pub display: Option<String>,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Deserialize)]
struct SetGroupBody {
    #[serde(default)]
    display: Option<String>,
    #[serde(default)]
    sets: OrderedMap<SetBody>,
}

#[derive(Deserialize)]
struct SetBody {
    #[serde(default)]
    display: Option<String>,
    #[serde(default)]
    fields: Vec<FieldDescriptor>,
}

fn deserialize_set_groups<'de, D>(deserializer: D) -> Result<Option<Vec<SetGroup>>, D::Error>
where
    D: Deserializer<'de>,
{
    let groups: Option<OrderedMap<SetGroupBody>> = Option::deserialize(deserializer)?;

    Ok(groups.map(|groups| {
        groups
            .0
            .into_iter()
            .map(|(handle, group)| SetGroup {
                handle,
                display: group.display,
                sets: group
                    .sets
                    .0
                    .into_iter()
                    .map(|(handle, set)| SetDefinition {
                        handle,
                        display: set.display,
                        fields: set.fields,
                    })
                    .collect(),
            })
            .collect()
    }))
}

/// JSON object read as a list of entries, keeping document order and
/// duplicate keys.
struct OrderedMap<T>(Vec<(String, T)>);

impl<T> Default for OrderedMap<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedMap<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedMapVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<T> {
            type Value = OrderedMap<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// Parse a blueprint field list from JSON.
pub fn parse_blueprint(json: &str) -> serde_json::Result<Vec<FieldDescriptor>> {
    serde_json::from_str(json)
}
