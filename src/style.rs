//! Interactive style resolution: hover bundles and animation descriptors.
//!
//! `resolve_styles` is a pure function of an element's properties. Hosts
//! either consume the typed descriptor or the CSS-like strings produced by
//! [`HoverStyle::transition`] and [`AnimationStyle::shorthand`].

#[cfg(test)]
#[path = "style_test.rs"]
mod style_test;

use serde::Serialize;
use serde_json::Value;

use crate::consts::{DEFAULT_ANIMATION_DURATION_MS, DEFAULT_HOVER_TRANSITION_MS};
use crate::doc::Element;
use crate::interaction::{AnimationConfig, HoverConfig, Interactions, millis};

/// Styles applied while the pointer is over the element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverStyle {
    pub background_color: Option<String>,
    pub color: Option<String>,
    /// `scale(n)` when a scale factor is set.
    pub transform: Option<String>,
    pub box_shadow: Option<String>,
    /// Transition duration in seconds.
    pub transition_secs: f64,
}

impl HoverStyle {
    /// CSS `transition` value.
    #[must_use]
    pub fn transition(&self) -> String {
        format!("all {}s ease", self.transition_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    Fade,
    Slide,
    Scale,
    Bounce,
    Flip,
    Rotate,
    Zoom,
}

impl AnimationKind {
    /// Parse an animation tag; unknown or missing tags fall back to fade.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("slide") => Self::Slide,
            Some("scale") => Self::Scale,
            Some("bounce") => Self::Bounce,
            Some("flip") => Self::Flip,
            Some("rotate") => Self::Rotate,
            Some("zoom") => Self::Zoom,
            _ => Self::Fade,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fade => "fade",
            Self::Slide => "slide",
            Self::Scale => "scale",
            Self::Bounce => "bounce",
            Self::Flip => "flip",
            Self::Rotate => "rotate",
            Self::Zoom => "zoom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationDirection {
    Normal,
    Reverse,
    Alternate,
    AlternateReverse,
}

impl AnimationDirection {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("reverse") => Self::Reverse,
            Some("alternate") => Self::Alternate,
            Some("alternate-reverse") => Self::AlternateReverse,
            _ => Self::Normal,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Reverse => "reverse",
            Self::Alternate => "alternate",
            Self::AlternateReverse => "alternate-reverse",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IterationCount {
    Finite(u32),
    Infinite,
}

impl IterationCount {
    /// Parse a count or `"infinite"`; anything else is a single run.
    #[must_use]
    pub fn parse(raw: Option<&Value>) -> Self {
        match raw {
            Some(Value::String(s)) if s == "infinite" => Self::Infinite,
            Some(Value::String(s)) => s.parse::<u32>().map_or(Self::Finite(1), Self::Finite),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map_or(Self::Finite(1), Self::Finite),
            _ => Self::Finite(1),
        }
    }
}

/// Entrance animation descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationStyle {
    pub kind: AnimationKind,
    pub duration_ms: u64,
    pub delay_ms: u64,
    pub iteration_count: IterationCount,
    pub direction: AnimationDirection,
}

impl AnimationStyle {
    /// CSS `animation` shorthand.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn shorthand(&self) -> String {
        let count = match self.iteration_count {
            IterationCount::Finite(n) => n.to_string(),
            IterationCount::Infinite => "infinite".to_owned(),
        };
        format!(
            "{} {}s ease {}s {} {} both",
            self.kind.as_str(),
            self.duration_ms as f64 / 1000.0,
            self.delay_ms as f64 / 1000.0,
            count,
            self.direction.as_str()
        )
    }
}

/// Resolved interactive styles for one element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleDescriptor {
    pub hover: Option<HoverStyle>,
    pub animation: Option<AnimationStyle>,
}

/// Compute hover and animation styles for an element.
#[must_use]
pub fn resolve_styles(element: &Element) -> StyleDescriptor {
    let interactions = Interactions::from_properties(&element.properties);
    StyleDescriptor {
        hover: interactions
            .hover
            .as_ref()
            .filter(|h| h.enabled)
            .map(hover_style),
        animation: interactions
            .animations
            .as_ref()
            .filter(|a| a.enabled)
            .map(animation_style),
    }
}

fn hover_style(config: &HoverConfig) -> HoverStyle {
    let transition_ms = config
        .transition_duration
        .unwrap_or(DEFAULT_HOVER_TRANSITION_MS);
    HoverStyle {
        background_color: config.background_color.clone(),
        color: config.text_color.clone(),
        transform: config.scale.map(|s| format!("scale({s})")),
        box_shadow: config.shadow.clone(),
        transition_secs: transition_ms.max(0.0) / 1000.0,
    }
}

fn animation_style(config: &AnimationConfig) -> AnimationStyle {
    AnimationStyle {
        kind: AnimationKind::parse(config.kind.as_deref()),
        duration_ms: millis(config.duration.unwrap_or(DEFAULT_ANIMATION_DURATION_MS)),
        delay_ms: millis(config.delay.unwrap_or(0.0)),
        iteration_count: IterationCount::parse(config.iteration_count.as_ref()),
        direction: AnimationDirection::parse(config.direction.as_deref()),
    }
}
