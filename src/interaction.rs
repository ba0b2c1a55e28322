//! Interaction descriptors parsed from `properties.interactions`.
//!
//! The editor writes these as camelCase JSON. Each part (`hover`,
//! `animations`, `onClick`) is parsed on its own so a malformed animation
//! block never hides a valid click action. Within a part, fields are parsed
//! leniently: numbers may arrive as numeric strings, and a field of the
//! wrong type reads as unset instead of discarding its siblings.

#[cfg(test)]
#[path = "interaction_test.rs"]
mod interaction_test;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::doc::ElementId;
use crate::responsive::Viewport;

/// Click-triggered behavior kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Link,
    Scroll,
    Toggle,
    Chain,
    /// `none` and any unrecognized tag.
    #[default]
    #[serde(other)]
    None,
}

impl ActionKind {
    /// Parse an action tag. Unknown tags map to `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "link" => Self::Link,
            "scroll" => Self::Scroll,
            "toggle" => Self::Toggle,
            "chain" => Self::Chain,
            _ => Self::None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Scroll => "scroll",
            Self::Toggle => "toggle",
            Self::Chain => "chain",
            Self::None => "none",
        }
    }
}

/// Hover settings as authored in the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HoverConfig {
    #[serde(deserialize_with = "lenient::flag")]
    pub enabled: bool,
    #[serde(deserialize_with = "lenient::field")]
    pub background_color: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    pub text_color: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub scale: Option<f64>,
    #[serde(deserialize_with = "lenient::field")]
    pub shadow: Option<String>,
    /// Milliseconds.
    #[serde(deserialize_with = "lenient::number")]
    pub transition_duration: Option<f64>,
}

/// Entrance animation settings as authored in the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnimationConfig {
    #[serde(deserialize_with = "lenient::flag")]
    pub enabled: bool,
    #[serde(rename = "type", deserialize_with = "lenient::field")]
    pub kind: Option<String>,
    /// Milliseconds.
    #[serde(deserialize_with = "lenient::number")]
    pub duration: Option<f64>,
    /// Milliseconds.
    #[serde(deserialize_with = "lenient::number")]
    pub delay: Option<f64>,
    /// A count or the string `"infinite"`.
    pub iteration_count: Option<Value>,
    #[serde(deserialize_with = "lenient::field")]
    pub direction: Option<String>,
}

/// One step of a `chain` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainedAction {
    pub action: ActionKind,
    pub target_element_id: ElementId,
    /// Milliseconds after the chain was triggered. Defaults to 0.
    #[serde(default, deserialize_with = "lenient::number")]
    pub delay: Option<f64>,
}

impl ChainedAction {
    /// Delay in whole milliseconds; negative or missing delays are 0.
    #[must_use]
    pub fn delay_ms(&self) -> u64 {
        millis(self.delay.unwrap_or(0.0))
    }
}

/// Click behavior of an element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnClick {
    pub action: ActionKind,
    /// `link`: destination.
    #[serde(deserialize_with = "lenient::field")]
    pub url: Option<String>,
    /// `link`: open in a new browsing context.
    #[serde(deserialize_with = "lenient::flag")]
    pub new_tab: bool,
    /// `scroll`: DOM id to bring into view.
    #[serde(deserialize_with = "lenient::field")]
    pub target_id: Option<String>,
    /// `toggle`: element whose visibility flips.
    #[serde(deserialize_with = "lenient::field")]
    pub target_element_id: Option<ElementId>,
    /// `toggle`: viewport whose override is written. Defaults to desktop.
    #[serde(deserialize_with = "lenient::field")]
    pub target_viewport: Option<Viewport>,
    /// `chain`: steps in array order. Malformed steps are dropped.
    #[serde(deserialize_with = "lenient::list")]
    pub chained_actions: Vec<ChainedAction>,
}

/// Everything under `properties.interactions`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interactions {
    pub hover: Option<HoverConfig>,
    pub animations: Option<AnimationConfig>,
    pub on_click: Option<OnClick>,
}

impl Interactions {
    /// Parse the interactions block of an element's properties.
    ///
    /// Missing or malformed parts come back as `None`.
    #[must_use]
    pub fn from_properties(properties: &Value) -> Self {
        let Some(raw) = properties.get("interactions") else {
            return Self::default();
        };
        Self { hover: parse_part(raw, "hover"), animations: parse_part(raw, "animations"), on_click: parse_part(raw, "onClick") }
    }
}

fn parse_part<T: DeserializeOwned>(raw: &Value, key: &str) -> Option<T> {
    let value = raw.get(key).filter(|v| !v.is_null())?;
    lenient::decode(value.clone())
}

/// Field-level deserializers that degrade to "unset" instead of failing
/// the enclosing part.
mod lenient {
    use super::{Deserialize, DeserializeOwned, Deserializer, Value};

    /// Any value of type `T`, else `None`.
    pub fn field<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(decode(raw))
    }

    /// A finite number, given as a JSON number or a numeric string.
    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let parsed = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(n) => Some(n),
                Err(_) => None,
            },
            _ => None,
        };
        Ok(parsed.filter(|n| n.is_finite()))
    }

    /// `true` or `"true"`; anything else is false.
    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(b) => b,
            Value::String(s) => s == "true",
            _ => false,
        })
    }

    /// The decodable items of an array; a non-array is empty.
    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let Value::Array(items) = Value::deserialize(deserializer)? else {
            return Ok(Vec::new());
        };
        Ok(items.into_iter().filter_map(decode).collect())
    }

    pub(super) fn decode<T: DeserializeOwned>(raw: Value) -> Option<T> {
        serde_json::from_value(raw).ok()
    }
}

/// Convert a JSON millisecond value to whole milliseconds, clamping at 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn millis(raw: f64) -> u64 {
    if raw.is_finite() && raw > 0.0 { raw.round() as u64 } else { 0 }
}
