use crate::schema::{FieldDescriptor, FieldKind};

/// Where the effective `localizable` flag of a field comes from.
///
/// Top-level fields use their own flag. Below a container the container's
/// effective flag is forced onto every descendant, whatever they declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionContext {
    #[default]
    Root,
    Inherited(bool),
}

impl ResolutionContext {
    pub fn effective_localizable(self, field: &FieldDescriptor) -> bool {
        match self {
            ResolutionContext::Root => field.is_localizable(),
            ResolutionContext::Inherited(localizable) => localizable,
        }
    }
}

/// A translatable field and the way its value is rebuilt.
#[derive(Debug, Clone)]
pub enum EligibleNode<'a> {
    /// Plain, code, markdown, multiline or slug text.
    Text(&'a FieldDescriptor),
    /// Unordered key/value bag of strings.
    Array(&'a FieldDescriptor),
    /// Ordered list of strings (lists and tag lists).
    List(&'a FieldDescriptor),
    /// Rows of `{ "cells": [...] }`.
    Table(&'a FieldDescriptor),
    /// Rich-text document, optionally with embedded variant sets.
    RichText {
        field: &'a FieldDescriptor,
        sets: Option<VariantSets<'a>>,
    },
    Group {
        field: &'a FieldDescriptor,
        fields: EligibleTree<'a>,
    },
    Grid {
        field: &'a FieldDescriptor,
        fields: EligibleTree<'a>,
    },
    Replicator {
        field: &'a FieldDescriptor,
        sets: VariantSets<'a>,
    },
}

/// Structural role of an eligible node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    Leaf,
    Container,
    Variants,
}

impl<'a> EligibleNode<'a> {
    pub fn field(&self) -> &'a FieldDescriptor {
        match self {
            EligibleNode::Text(field)
            | EligibleNode::Array(field)
            | EligibleNode::List(field)
            | EligibleNode::Table(field) => field,
            EligibleNode::RichText { field, .. }
            | EligibleNode::Group { field, .. }
            | EligibleNode::Grid { field, .. }
            | EligibleNode::Replicator { field, .. } => field,
        }
    }

    pub fn shape(&self) -> NodeShape {
        match self {
            EligibleNode::Text(_)
            | EligibleNode::Array(_)
            | EligibleNode::List(_)
            | EligibleNode::Table(_)
            | EligibleNode::RichText { sets: None, .. } => NodeShape::Leaf,
            EligibleNode::Group { .. } | EligibleNode::Grid { .. } => NodeShape::Container,
            EligibleNode::RichText { sets: Some(_), .. } | EligibleNode::Replicator { .. } => {
                NodeShape::Variants
            }
        }
    }
}

/// Handle-keyed tree of eligible fields, in blueprint order.
#[derive(Debug, Clone, Default)]
pub struct EligibleTree<'a> {
    entries: Vec<(&'a str, EligibleNode<'a>)>,
}

impl<'a> EligibleTree<'a> {
    pub fn get(&self, handle: &str) -> Option<&EligibleNode<'a>> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == handle)
            .map(|(_, node)| node)
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.get(handle).is_some()
    }

    pub fn handles(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.entries.iter().map(|(handle, _)| *handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &EligibleNode<'a>)> {
        self.entries.iter().map(|(handle, node)| (*handle, node))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, handle: &'a str, node: EligibleNode<'a>) {
        match self.entries.iter_mut().find(|(candidate, _)| *candidate == handle) {
            Some(entry) => entry.1 = node,
            None => self.entries.push((handle, node)),
        }
    }
}

/// Per-variant eligible trees of a polymorphic field.
///
/// Every declared variant is kept, even when nothing in it is translatable,
/// so that elements of that variant still resolve.
#[derive(Debug, Clone, Default)]
pub struct VariantSets<'a> {
    variants: Vec<(&'a str, EligibleTree<'a>)>,
}

impl<'a> VariantSets<'a> {
    pub fn get(&self, variant: &str) -> Option<&EligibleTree<'a>> {
        self.variants
            .iter()
            .find(|(name, _)| *name == variant)
            .map(|(_, tree)| tree)
    }

    pub fn names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.variants.iter().map(|(name, _)| *name)
    }

    /// True when at least one variant has something to translate.
    pub fn has_translatable(&self) -> bool {
        self.variants.iter().any(|(_, tree)| !tree.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// Resolve the translatable fields of `fields`.
pub fn resolve(fields: &[FieldDescriptor], context: ResolutionContext) -> EligibleTree<'_> {
    let mut tree = EligibleTree::default();

    for field in fields {
        let localizable = context.effective_localizable(field);
        let nested = ResolutionContext::Inherited(localizable);

        let node = match field.kind() {
            FieldKind::Group => {
                non_empty(resolve(&field.config.fields, nested))
                    .map(|fields| EligibleNode::Group { field, fields })
            }
            FieldKind::Grid => {
                non_empty(resolve(&field.config.fields, nested))
                    .map(|fields| EligibleNode::Grid { field, fields })
            }
            FieldKind::Replicator => {
                let sets = resolve_sets(field, nested);
                sets.has_translatable()
                    .then_some(EligibleNode::Replicator { field, sets })
            }
            FieldKind::RichText => match field.config.sets {
                Some(_) => {
                    let sets = resolve_sets(field, nested);
                    (localizable || sets.has_translatable()).then_some(EligibleNode::RichText {
                        field,
                        sets: Some(sets),
                    })
                }
                None => localizable.then_some(EligibleNode::RichText { field, sets: None }),
            },
            FieldKind::Array => localizable.then_some(EligibleNode::Array(field)),
            FieldKind::List | FieldKind::TagList => localizable.then_some(EligibleNode::List(field)),
            FieldKind::Table => localizable.then_some(EligibleNode::Table(field)),
            FieldKind::PlainText
            | FieldKind::Code
            | FieldKind::Markdown
            | FieldKind::MultilineText
            | FieldKind::Slug => localizable.then_some(EligibleNode::Text(field)),
            FieldKind::Other => None,
        };

        if let Some(node) = node {
            tree.insert(&field.handle, node);
        }
    }

    tree
}

/// Resolve every declared variant of a polymorphic field.
///
/// The first set declared under a given name wins; later sets with the same
/// name, in the same or another group, are ignored.
pub(crate) fn resolve_sets(
    field: &FieldDescriptor,
    context: ResolutionContext,
) -> VariantSets<'_> {
    let mut sets = VariantSets::default();

    for group in field.config.sets.iter().flatten() {
        for set in &group.sets {
            if sets.get(&set.handle).is_some() {
                continue;
            }
            sets.variants
                .push((set.handle.as_str(), resolve(&set.fields, context)));
        }
    }

    sets
}

fn non_empty(tree: EligibleTree<'_>) -> Option<EligibleTree<'_>> {
    (!tree.is_empty()).then_some(tree)
}
