use serde_json::json;

use super::*;

// =============================================================
// Viewport
// =============================================================

#[test]
fn viewport_serde_uses_lowercase_tags() {
    assert_eq!(serde_json::to_string(&Viewport::Tablet).unwrap(), "\"tablet\"");
    let back: Viewport = serde_json::from_str("\"mobile\"").unwrap();
    assert_eq!(back, Viewport::Mobile);
}

#[test]
fn viewport_parse_rejects_unknown_tags() {
    assert_eq!(Viewport::parse("desktop"), Some(Viewport::Desktop));
    assert_eq!(Viewport::parse("watch"), None);
}

#[test]
fn fallback_chain_never_skips_tablet() {
    assert_eq!(
        Viewport::Mobile.fallback_chain(),
        &[Viewport::Mobile, Viewport::Tablet, Viewport::Desktop]
    );
    assert_eq!(Viewport::Tablet.fallback_chain(), &[Viewport::Tablet, Viewport::Desktop]);
    assert_eq!(Viewport::Desktop.fallback_chain(), &[Viewport::Desktop]);
}

#[test]
fn default_viewport_is_desktop() {
    assert_eq!(Viewport::default(), Viewport::Desktop);
}

// =============================================================
// resolve_responsive_value
// =============================================================

#[test]
fn mobile_inherits_desktop_when_only_desktop_is_set() {
    let props = json!({"responsive": {"desktop": {"fontSize": "24px"}}});
    assert_eq!(
        resolve_responsive_value(&props, Viewport::Mobile, "fontSize"),
        Some(&json!("24px"))
    );
}

#[test]
fn tablet_override_changes_mobile_without_touching_desktop() {
    let mut props = json!({"responsive": {"desktop": {"fontSize": "24px"}}});
    set_override(&mut props, Viewport::Tablet, "fontSize", json!("18px"));

    assert_eq!(
        resolve_responsive_value(&props, Viewport::Mobile, "fontSize"),
        Some(&json!("18px"))
    );
    assert_eq!(
        resolve_responsive_value(&props, Viewport::Desktop, "fontSize"),
        Some(&json!("24px"))
    );
}

#[test]
fn mobile_override_wins_over_tablet_and_desktop() {
    let props = json!({"responsive": {
        "desktop": {"padding": 32},
        "tablet": {"padding": 16},
        "mobile": {"padding": 8}
    }});
    assert_eq!(resolve_responsive_value(&props, Viewport::Mobile, "padding"), Some(&json!(8)));
    assert_eq!(resolve_responsive_value(&props, Viewport::Tablet, "padding"), Some(&json!(16)));
}

#[test]
fn desktop_does_not_read_narrower_overrides() {
    let props = json!({"responsive": {"mobile": {"padding": 8}}});
    assert_eq!(resolve_responsive_value(&props, Viewport::Desktop, "padding"), None);
    assert_eq!(resolve_responsive_value(&props, Viewport::Tablet, "padding"), None);
}

#[test]
fn null_override_is_treated_as_unset() {
    let props = json!({"responsive": {"desktop": {"color": "red"}, "tablet": {"color": null}}});
    assert_eq!(resolve_responsive_value(&props, Viewport::Tablet, "color"), Some(&json!("red")));
}

#[test]
fn missing_responsive_map_resolves_to_none() {
    assert_eq!(resolve_responsive_value(&json!({}), Viewport::Mobile, "color"), None);
}

// =============================================================
// Visibility
// =============================================================

#[test]
fn visibility_defaults_to_true() {
    assert!(is_visible(&json!({}), Viewport::Mobile));
}

#[test]
fn visibility_follows_the_chain() {
    let props = json!({"responsive": {"tablet": {"visible": false}}});
    assert!(is_visible(&props, Viewport::Desktop));
    assert!(!is_visible(&props, Viewport::Tablet));
    assert!(!is_visible(&props, Viewport::Mobile));
}

// =============================================================
// set_override
// =============================================================

#[test]
fn set_override_creates_missing_maps() {
    let mut props = json!({"content": "Hi"});
    set_override(&mut props, Viewport::Mobile, "visible", json!(false));
    assert_eq!(props["responsive"]["mobile"]["visible"], json!(false));
    assert_eq!(props["content"], "Hi");
}

#[test]
fn set_override_replaces_non_object_intermediates() {
    let mut props = json!({"responsive": "broken"});
    set_override(&mut props, Viewport::Tablet, "visible", json!(true));
    assert_eq!(props["responsive"], json!({"tablet": {"visible": true}}));

    let mut scalar = json!(7);
    set_override(&mut scalar, Viewport::Desktop, "visible", json!(false));
    assert_eq!(scalar, json!({"responsive": {"desktop": {"visible": false}}}));
}

#[test]
fn set_override_leaves_other_viewports_alone() {
    let mut props = json!({"responsive": {"desktop": {"visible": true, "color": "red"}}});
    set_override(&mut props, Viewport::Mobile, "visible", json!(false));
    assert_eq!(props["responsive"]["desktop"], json!({"visible": true, "color": "red"}));
    assert!(props["responsive"].get("tablet").is_none());
}

// =============================================================
// effective_style
// =============================================================

#[test]
fn effective_style_layers_overrides_up_to_viewport() {
    let props = json!({
        "style": {"color": "black", "fontSize": "20px", "margin": 0},
        "responsive": {
            "desktop": {"fontSize": "24px"},
            "tablet": {"fontSize": "18px", "visible": false},
            "mobile": {"color": "gray"}
        }
    });

    let desktop = effective_style(&props, Viewport::Desktop);
    assert_eq!(desktop["fontSize"], "24px");
    assert_eq!(desktop["color"], "black");

    let tablet = effective_style(&props, Viewport::Tablet);
    assert_eq!(tablet["fontSize"], "18px");
    assert!(!tablet.contains_key("visible"));

    let mobile = effective_style(&props, Viewport::Mobile);
    assert_eq!(mobile["fontSize"], "18px");
    assert_eq!(mobile["color"], "gray");
    assert_eq!(mobile["margin"], 0);
}

#[test]
fn effective_style_without_base_or_overrides_is_empty() {
    assert!(effective_style(&json!({}), Viewport::Mobile).is_empty());
}
