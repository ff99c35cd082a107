// Integration test utilities and fixture token sets for tokenlens.

use serde_json::{Value, json};

/// The breakpoints token value used across fixtures.
pub const BREAKPOINTS_VALUE: &str =
    r#"{"phone": "36em", "tablet": "48em", "laptop": "64em", "desktop": "80em"}"#;

/// One declaration as the extraction adapter emits it.
pub fn declaration(value: &str, selector: &str, media: Option<&str>) -> Value {
    match media {
        Some(media) => json!({"value": value, "selector": selector, "media": media}),
        None => json!({"value": value, "selector": selector}),
    }
}

/// A small but representative design-system token set: a `.dsa-button`
/// component with responsive declarations, a reference chain into core
/// spacing tokens, a reference cycle, and an unanchored stray cluster.
pub fn design_system_fixture() -> Value {
    json!({
        "--ks-breakpoints": [declaration(BREAKPOINTS_VALUE, ":root", None)],
        "--ks-spacing-base": [declaration("0.5rem", ":root", None)],

        // Component tokens, selector-scoped
        "--dsa-button--padding": [
            declaration("calc(var(--ks-spacing-base) * 2)", ".dsa-button", None),
            declaration("calc(var(--ks-spacing-base) * 3)", ".dsa-button",
                Some("(min-width: 64em)")),
        ],
        "--dsa-button--color": [declaration("var(--c-color-primary)", ".dsa-button", None)],
        "--c-color-primary": [declaration("#0294C1", ":root", None)],

        // Layout tokens with a reference cycle
        "--l-grid-gap": [declaration("var(--l-grid-unit)", ":root", None)],
        "--l-grid-unit": [declaration("var(--l-grid-gap)", ":root", None)],

        // Stray cluster: no design prefix anywhere in its component
        "--stray-a": [declaration("var(--stray-b)", ".legacy", None)],
        "--stray-b": [declaration("3px", ".legacy", None)],
    })
}

/// Write a fixture to `tokens.json` inside a fresh temp dir.
pub fn write_fixture(fixture: &Value) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("create tempdir");
    let path = dir.path().join("tokens.json");
    std::fs::write(&path, serde_json::to_string_pretty(fixture).expect("serialize"))
        .expect("write fixture");
    (dir, path)
}
