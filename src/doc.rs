//! Document model: page elements, their properties, and the in-memory store.
//!
//! This module defines what sits on the canvas (`Element`, `Position`), the
//! id-less payload used for creation and the clipboard (`ElementDraft`), a
//! sparse-update type for incremental edits (`PartialElement`), a typed
//! accessor for the open-ended `properties` bag (`Props`), and the store
//! that owns all live elements of a page (`ElementStore`).
//!
//! The store is plain data. Async services wrap it in the page lock and
//! announce its `revision` to the history worker after every mutation.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::consts::DUPLICATE_OFFSET;
use crate::responsive::{self, Viewport};

/// Unique identifier for an element within a page.
pub type ElementId = String;

/// Canvas-local bounding box of an element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Same size, moved by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy, ..self }
    }

    /// Bottom edge in canvas coordinates.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// A placed element as stored in the page and on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique, stable identifier.
    pub id: ElementId,
    /// Element kind tag (`"button"`, `"heading"`, `"image"`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Content, style, interactions and responsive overrides.
    #[serde(default = "empty_properties")]
    pub properties: Value,
    pub position: Position,
}

impl Element {
    /// Copy of this element without its id.
    #[must_use]
    pub fn to_draft(&self) -> ElementDraft {
        ElementDraft { kind: self.kind.clone(), properties: self.properties.clone(), position: self.position }
    }

    #[must_use]
    pub fn props(&self) -> Props<'_> {
        Props::new(&self.properties)
    }
}

/// An element without an id: the input to `add` and the clipboard payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDraft {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "empty_properties")]
    pub properties: Value,
    pub position: Position,
}

impl ElementDraft {
    #[must_use]
    pub fn new(kind: impl Into<String>, properties: Value, position: Position) -> Self {
        Self { kind: kind.into(), properties, position }
    }

    /// Same payload, moved by `(dx, dy)`.
    #[must_use]
    pub fn offset(mut self, dx: f64, dy: f64) -> Self {
        self.position = self.position.offset(dx, dy);
        self
    }
}

/// Sparse update for the position. Only present fields are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialPosition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Sparse update for an element. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialElement {
    /// New kind tag, if being changed.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Position fields to overwrite.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<PartialPosition>,
    /// Property keys to merge or remove (null values delete keys).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
}

impl PartialElement {
    /// Update that moves the element to `(x, y)`.
    #[must_use]
    pub fn moved_to(x: f64, y: f64) -> Self {
        Self { position: Some(PartialPosition { x: Some(x), y: Some(y), ..PartialPosition::default() }), ..Self::default() }
    }

    /// Update that merges `properties` into the element's property bag.
    #[must_use]
    pub fn with_properties(properties: Value) -> Self {
        Self { properties: Some(properties), ..Self::default() }
    }
}

/// Typed access to common fields of an element's `properties` bag.
pub struct Props<'a> {
    value: &'a Value,
}

impl<'a> Props<'a> {
    #[must_use]
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    /// Text content. Empty string when absent.
    #[must_use]
    pub fn content(&self) -> &'a str {
        self.value
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Base style map, if any.
    #[must_use]
    pub fn style(&self) -> Option<&'a Map<String, Value>> {
        self.value
            .get(responsive::STYLE_KEY)
            .and_then(Value::as_object)
    }

    /// Raw interactions descriptor, if any.
    #[must_use]
    pub fn interactions(&self) -> Option<&'a Value> {
        self.value.get("interactions")
    }

    /// Effective visibility at `viewport` (defaults to visible).
    #[must_use]
    pub fn visible_at(&self, viewport: Viewport) -> bool {
        responsive::is_visible(self.value, viewport)
    }
}

fn empty_properties() -> Value {
    Value::Object(Map::new())
}

/// Generate a fresh element id.
///
/// Ids keep a readable kind prefix but are random, so two elements of the
/// same kind created in the same millisecond never collide.
#[must_use]
pub fn generate_id(kind: &str) -> ElementId {
    format!("{kind}-{}", Uuid::new_v4().simple())
}

/// Merge `incoming` property keys into `target`. Null values delete keys.
///
/// Returns false (and leaves `target` untouched) if `incoming` is not an object.
pub fn merge_properties(target: &mut Value, incoming: &Value) -> bool {
    let Some(incoming) = incoming.as_object() else {
        return false;
    };

    if !target.is_object() {
        *target = empty_properties();
    }

    if let Some(existing) = target.as_object_mut() {
        for (k, v) in incoming {
            if v.is_null() {
                existing.remove(k);
            } else {
                existing.insert(k.clone(), v.clone());
            }
        }
    }
    true
}

/// In-memory store of the elements placed on one page.
///
/// Elements keep insertion order, which is also paint order. `revision`
/// counts observable mutations; `replace_all` does not bump it because it
/// is only driven by undo/redo, which must not produce new snapshots.
#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    elements: Vec<Element>,
    selected: Option<ElementId>,
    revision: u64,
}

impl ElementStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store hydrated from persisted elements.
    #[must_use]
    pub fn from_elements(elements: Vec<Element>) -> Self {
        Self { elements, selected: None, revision: 0 }
    }

    /// Append a new element with a fresh id and return it.
    pub fn add(&mut self, draft: ElementDraft) -> Element {
        let mut id = generate_id(&draft.kind);
        while self.find(&id).is_some() {
            id = generate_id(&draft.kind);
        }
        let element = Element { id, kind: draft.kind, properties: draft.properties, position: draft.position };
        self.elements.push(element.clone());
        self.revision += 1;
        element
    }

    /// Apply a partial update. Returns false if the element doesn't exist or
    /// the properties patch is not an object; nothing is changed in that case.
    /// The revision only advances when the element actually changed.
    pub fn update(&mut self, id: &str, partial: &PartialElement) -> bool {
        if partial.properties.as_ref().is_some_and(|p| !p.is_object()) {
            return false;
        }
        let Some(element) = self.elements.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        let before = element.clone();

        if let Some(kind) = &partial.kind {
            element.kind.clone_from(kind);
        }
        if let Some(pos) = partial.position {
            if let Some(x) = pos.x {
                element.position.x = x;
            }
            if let Some(y) = pos.y {
                element.position.y = y;
            }
            if let Some(w) = pos.width {
                element.position.width = w;
            }
            if let Some(h) = pos.height {
                element.position.height = h;
            }
        }
        if let Some(props) = &partial.properties {
            merge_properties(&mut element.properties, props);
        }
        if *element != before {
            self.revision += 1;
        }
        true
    }

    /// Remove an element, clearing the selection if it pointed at it.
    pub fn delete(&mut self, id: &str) -> Option<Element> {
        let index = self.elements.iter().position(|e| e.id == id)?;
        let removed = self.elements.remove(index);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        self.revision += 1;
        Some(removed)
    }

    /// Clone an element under a new id, offset so the copy is visibly
    /// distinct, append it and select it.
    pub fn duplicate(&mut self, id: &str) -> Option<Element> {
        let draft = self
            .find(id)?
            .to_draft()
            .offset(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        let copy = self.add(draft);
        self.selected = Some(copy.id.clone());
        Some(copy)
    }

    /// Replace every element at once. Used by undo/redo only.
    pub fn replace_all(&mut self, elements: Vec<Element>) {
        self.elements = elements;
        if let Some(selected) = &self.selected
            && !self.elements.iter().any(|e| &e.id == selected)
        {
            self.selected = None;
        }
    }

    /// Write a single responsive override key for one viewport.
    pub fn set_responsive_override(&mut self, id: &str, viewport: Viewport, key: &str, value: Value) -> bool {
        let Some(element) = self.elements.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        responsive::set_override(&mut element.properties, viewport, key, value);
        self.revision += 1;
        true
    }

    /// Return a reference to an element by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// All elements in insertion order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Owned copy of all elements, as captured by a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Element> {
        self.elements.clone()
    }

    /// Select an element. Returns false if it doesn't exist.
    pub fn select(&mut self, id: &str) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        self.selected = Some(id.to_owned());
        true
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// The currently selected element, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&Element> {
        self.selected.as_deref().and_then(|id| self.find(id))
    }

    /// Lowest bottom edge over all elements (0 when empty).
    #[must_use]
    pub fn content_bottom(&self) -> f64 {
        self.elements
            .iter()
            .map(|e| e.position.bottom())
            .fold(0.0, f64::max)
    }

    /// Count of observable mutations since the store was created.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of elements currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the store contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
