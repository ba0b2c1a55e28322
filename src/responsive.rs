//! Responsive overrides: viewport tags, the fallback chain, and per-viewport
//! style cascades.
//!
//! Overrides live in `properties.responsive`, keyed by viewport tag. A key
//! missing at one viewport is inherited from the next wider one:
//! mobile → tablet → desktop → caller default. Tablet is never skipped.

#[cfg(test)]
#[path = "responsive_test.rs"]
mod responsive_test;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under `properties` that holds the per-viewport overrides.
pub const RESPONSIVE_KEY: &str = "responsive";

/// Key under `properties` that holds the base style map.
pub const STYLE_KEY: &str = "style";

/// Override key controlling whether an element renders at a viewport.
pub const VISIBLE_KEY: &str = "visible";

/// Viewport tag used to key responsive overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewport {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl Viewport {
    pub const ALL: [Viewport; 3] = [Viewport::Desktop, Viewport::Tablet, Viewport::Mobile];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Tablet => "tablet",
            Self::Mobile => "mobile",
        }
    }

    /// Parse a viewport tag. Unknown tags yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "desktop" => Some(Self::Desktop),
            "tablet" => Some(Self::Tablet),
            "mobile" => Some(Self::Mobile),
            _ => None,
        }
    }

    /// Lookup order when resolving a key at this viewport, most specific first.
    #[must_use]
    pub fn fallback_chain(self) -> &'static [Viewport] {
        match self {
            Self::Desktop => &[Viewport::Desktop],
            Self::Tablet => &[Viewport::Tablet, Viewport::Desktop],
            Self::Mobile => &[Viewport::Mobile, Viewport::Tablet, Viewport::Desktop],
        }
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve `key` at `viewport` by walking the fallback chain.
///
/// Returns `None` when no viewport in the chain sets the key; the caller
/// applies its own default. Explicit `null` counts as unset.
#[must_use]
pub fn resolve_responsive_value<'a>(properties: &'a Value, viewport: Viewport, key: &str) -> Option<&'a Value> {
    let overrides = properties.get(RESPONSIVE_KEY)?;
    viewport.fallback_chain().iter().find_map(|vp| {
        overrides
            .get(vp.as_str())
            .and_then(|patch| patch.get(key))
            .filter(|v| !v.is_null())
    })
}

/// Effective visibility at `viewport`. Elements are visible unless an
/// override in the chain says otherwise.
#[must_use]
pub fn is_visible(properties: &Value, viewport: Viewport) -> bool {
    resolve_responsive_value(properties, viewport, VISIBLE_KEY)
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

/// Write `key = value` into the override for `viewport` only.
///
/// Missing or non-object intermediate maps are replaced with empty objects;
/// other viewports are left untouched.
pub fn set_override(properties: &mut Value, viewport: Viewport, key: &str, value: Value) {
    if !properties.is_object() {
        *properties = Value::Object(Map::new());
    }
    let Some(props) = properties.as_object_mut() else {
        return;
    };

    let responsive = props
        .entry(RESPONSIVE_KEY)
        .or_insert_with(|| Value::Object(Map::new()));
    if !responsive.is_object() {
        *responsive = Value::Object(Map::new());
    }
    let Some(responsive) = responsive.as_object_mut() else {
        return;
    };

    let patch = responsive
        .entry(viewport.as_str())
        .or_insert_with(|| Value::Object(Map::new()));
    if !patch.is_object() {
        *patch = Value::Object(Map::new());
    }
    if let Some(patch) = patch.as_object_mut() {
        patch.insert(key.to_owned(), value);
    }
}

/// Style map an element renders with at `viewport`.
///
/// Starts from `properties.style`, then layers the desktop, tablet and
/// mobile overrides in that order, stopping at `viewport`. The visibility
/// flag is not a style property and is left out.
#[must_use]
pub fn effective_style(properties: &Value, viewport: Viewport) -> Map<String, Value> {
    let mut style = properties
        .get(STYLE_KEY)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let Some(overrides) = properties.get(RESPONSIVE_KEY) else {
        return style;
    };

    for vp in viewport.fallback_chain().iter().rev() {
        let Some(patch) = overrides.get(vp.as_str()).and_then(Value::as_object) else {
            continue;
        };
        for (k, v) in patch {
            if k == VISIBLE_KEY || v.is_null() {
                continue;
            }
            style.insert(k.clone(), v.clone());
        }
    }
    style
}
