use crate::resolver::EligibleTree;
use serde_json::Value;

/// Handles of `tree` that are absent from `item`, in tree order.
///
/// An item that is not a map (missing, `null`, a list) has no keys, so
/// every handle is returned.
pub fn handles_to_translate<'a>(tree: &EligibleTree<'a>, item: &Value) -> Vec<&'a str> {
    missing_keys(tree.handles(), item)
}

/// Keys of `keys` that `item` does not have, in the given order.
pub fn missing_keys<'k>(keys: impl IntoIterator<Item = &'k str>, item: &Value) -> Vec<&'k str> {
    let present = item.as_object();
    keys.into_iter()
        .filter(|key| !present.is_some_and(|map| map.contains_key(*key)))
        .collect()
}
