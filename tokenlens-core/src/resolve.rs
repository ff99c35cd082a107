// Effective-value resolution for a property at a responsive breakpoint.
//
// Declaration selection prefers an explicit bp-factor marker, then falls
// through the min-width cascade from the requested tier to coarser ones,
// then declaration 0. `var()` chains forward recursively, `calc()` values
// are substituted and evaluated.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::calc;
use crate::config::ResolverSection;
use crate::error::ResolveError;
use crate::graph::{TokenGraph, var_matches};
use crate::types::{Breakpoint, Breakpoints, Declaration};

/// Strips quoting from em widths in the breakpoints token value, so the
/// remainder parses as plain JSON numbers.
static QUOTED_EM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([0-9]+)em""#).expect("valid regex"));

/// Resolves property values against a built graph.
#[derive(Debug)]
pub struct Resolver<'g> {
    graph: &'g TokenGraph,
    breakpoints: Breakpoints,
    base_font_size_px: u32,
}

impl<'g> Resolver<'g> {
    /// Read the breakpoints token and set up a resolver.
    pub fn new(graph: &'g TokenGraph, config: &ResolverSection) -> Result<Self, ResolveError> {
        let token = &config.breakpoints_token;
        let value = graph
            .node(token)
            .and_then(|node| node.declarations.first())
            .map(|declaration| declaration.value.clone())
            .ok_or_else(|| {
                ResolveError::Breakpoints(format!("token {token} has no declarations"))
            })?;
        let breakpoints = parse_breakpoints(&value)?;
        Ok(Self {
            graph,
            breakpoints,
            base_font_size_px: config.base_font_size_px,
        })
    }

    pub fn breakpoints(&self) -> Breakpoints {
        self.breakpoints
    }

    /// Resolve a property's effective value at a breakpoint.
    pub fn resolve(&self, property: &str, breakpoint: Breakpoint) -> Result<String, ResolveError> {
        let mut stack = Vec::new();
        self.resolve_inner(property, breakpoint, &mut stack)
    }

    fn resolve_inner(
        &self,
        property: &str,
        breakpoint: Breakpoint,
        stack: &mut Vec<String>,
    ) -> Result<String, ResolveError> {
        if stack.iter().any(|seen| seen == property) {
            return Err(ResolveError::CyclicReference {
                property: property.to_string(),
                chain: format!("{} -> {property}", stack.join(" -> ")),
            });
        }
        stack.push(property.to_string());

        let declarations = self
            .graph
            .node(property)
            .map(|node| node.declarations.as_slice())
            .filter(|declarations| !declarations.is_empty())
            .ok_or_else(|| ResolveError::PropertyNotFound(property.to_string()))?;

        let index = if declarations.len() > 1 {
            self.select_index(declarations, breakpoint)
        } else {
            0
        };
        let value = &declarations[index].value;
        trace!(property, index, value, "Selected declaration");

        let resolved = if value.contains("calc(") {
            let substituted = self.substitute(value, breakpoint, stack)?;
            calc::reduce(&substituted)?
        } else if value.contains("var(") {
            // Bare reference: forward to the referenced property
            match var_matches(value).into_iter().next() {
                Some((_, target)) => self.resolve_inner(&target, breakpoint, stack)?,
                None => value.clone(),
            }
        } else {
            value.clone()
        };

        stack.pop();
        Ok(resolved)
    }

    /// Replace every `var()` occurrence with its resolved value.
    fn substitute(
        &self,
        value: &str,
        breakpoint: Breakpoint,
        stack: &mut Vec<String>,
    ) -> Result<String, ResolveError> {
        let matches = var_matches(value);
        let mut out = String::with_capacity(value.len());
        let mut cursor = 0usize;
        for (range, target) in matches {
            out.push_str(&value[cursor..range.start]);
            out.push_str(&self.resolve_inner(&target, breakpoint, stack)?);
            cursor = range.end;
        }
        out.push_str(&value[cursor..]);
        Ok(out)
    }

    /// Pick the declaration for a breakpoint.
    fn select_index(&self, declarations: &[Declaration], breakpoint: Breakpoint) -> usize {
        let marker = format!("bp-factor-{breakpoint}");
        if let Some(index) = declarations
            .iter()
            .position(|declaration| declaration.value.contains(&marker))
        {
            return index;
        }

        // Fall through the cascade from the requested tier to coarser ones
        let start = Breakpoint::CASCADE
            .iter()
            .position(|tier| *tier == breakpoint)
            .unwrap_or(0);
        for tier in &Breakpoint::CASCADE[start..] {
            let media = format!("(min-width: {}em)", self.breakpoints.threshold(*tier));
            if let Some(index) = declarations
                .iter()
                .position(|declaration| declaration.media.as_deref() == Some(media.as_str()))
            {
                return index;
            }
        }
        0
    }

    /// Pixel size of a rem value at the configured root font size,
    /// rounded up.
    pub fn px_size(&self, rem_value: &str) -> Result<u32, ResolveError> {
        let amount: f64 = rem_value
            .trim()
            .trim_end_matches("rem")
            .trim()
            .parse()
            .map_err(|_| ResolveError::Calc {
                expression: rem_value.to_string(),
                message: "not a rem value".to_string(),
            })?;
        Ok((amount * f64::from(self.base_font_size_px)).ceil() as u32)
    }
}

/// Parse the breakpoints token value into per-tier em thresholds.
///
/// Accepts the token's JSON-ish object form with single or double quotes
/// and `"<n>em"` widths.
pub fn parse_breakpoints(value: &str) -> Result<Breakpoints, ResolveError> {
    let normalized = value.replace('\'', "\"");
    let normalized = QUOTED_EM.replace_all(&normalized, "$1");
    serde_json::from_str(&normalized)
        .map_err(|error| ResolveError::Breakpoints(format!("cannot parse `{value}`: {error}")))
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeclarationMap;

    const BREAKPOINTS_VALUE: &str =
        r#"{"phone": "36em", "tablet": "48em", "laptop": "64em", "desktop": "80em"}"#;

    fn decl(value: &str) -> Declaration {
        Declaration {
            value: value.to_string(),
            selector: ":root".to_string(),
            media: None,
        }
    }

    fn decl_at(value: &str, media: &str) -> Declaration {
        Declaration {
            value: value.to_string(),
            selector: ":root".to_string(),
            media: Some(media.to_string()),
        }
    }

    fn graph_with(entries: &[(&str, Vec<Declaration>)]) -> TokenGraph {
        let mut map = DeclarationMap::new();
        map.insert(
            "--ks-breakpoints".to_string(),
            vec![decl(BREAKPOINTS_VALUE)],
        );
        for (key, declarations) in entries {
            map.insert((*key).to_string(), declarations.clone());
        }
        TokenGraph::build("full", &map).0
    }

    fn resolver(graph: &TokenGraph) -> Resolver<'_> {
        Resolver::new(graph, &ResolverSection::default()).unwrap()
    }

    #[test]
    fn parses_breakpoints_token() {
        let bps = parse_breakpoints(BREAKPOINTS_VALUE).unwrap();
        assert_eq!(bps.phone, 36);
        assert_eq!(bps.desktop, 80);
        // Single-quoted form normalizes the same way
        let bps = parse_breakpoints(
            "{'phone': '36em', 'tablet': '48em', 'laptop': '64em', 'desktop': '80em'}",
        )
        .unwrap();
        assert_eq!(bps.laptop, 64);
        assert!(parse_breakpoints("not breakpoints").is_err());
    }

    #[test]
    fn literal_value_returned_as_is() {
        let graph = graph_with(&[("--color", vec![decl("#ff0000")])]);
        assert_eq!(
            resolver(&graph).resolve("--color", Breakpoint::Desktop).unwrap(),
            "#ff0000"
        );
    }

    #[test]
    fn bare_var_forwards() {
        let graph = graph_with(&[
            ("--alias", vec![decl("var(--base)")]),
            ("--base", vec![decl("12px")]),
        ]);
        assert_eq!(
            resolver(&graph).resolve("--alias", Breakpoint::Desktop).unwrap(),
            "12px"
        );
    }

    #[test]
    fn calc_with_var_evaluates() {
        let graph = graph_with(&[
            ("--x", vec![decl("calc(var(--y) * 2)")]),
            ("--y", vec![decl("10")]),
        ]);
        assert_eq!(
            resolver(&graph).resolve("--x", Breakpoint::Desktop).unwrap(),
            "20"
        );
    }

    #[test]
    fn calc_preserves_units() {
        let graph = graph_with(&[
            ("--pad", vec![decl("calc(var(--unit) * 3)")]),
            ("--unit", vec![decl("0.5rem")]),
        ]);
        assert_eq!(
            resolver(&graph).resolve("--pad", Breakpoint::Desktop).unwrap(),
            "1.5rem"
        );
    }

    #[test]
    fn unknown_property_is_not_found() {
        let graph = graph_with(&[]);
        assert!(matches!(
            resolver(&graph).resolve("--nope", Breakpoint::Desktop),
            Err(ResolveError::PropertyNotFound(_))
        ));
    }

    #[test]
    fn referenced_only_node_is_not_found() {
        // --ghost exists as a node but has no declarations
        let graph = graph_with(&[("--a", vec![decl("var(--ghost)")])]);
        assert!(graph.contains("--ghost"));
        assert!(matches!(
            resolver(&graph).resolve("--ghost", Breakpoint::Desktop),
            Err(ResolveError::PropertyNotFound(_))
        ));
    }

    #[test]
    fn direct_cycle_fails() {
        let graph = graph_with(&[
            ("--a", vec![decl("var(--b)")]),
            ("--b", vec![decl("var(--a)")]),
        ]);
        assert!(matches!(
            resolver(&graph).resolve("--a", Breakpoint::Desktop),
            Err(ResolveError::CyclicReference { .. })
        ));
    }

    #[test]
    fn self_cycle_fails() {
        let graph = graph_with(&[("--loop", vec![decl("var(--loop)")])]);
        assert!(matches!(
            resolver(&graph).resolve("--loop", Breakpoint::Desktop),
            Err(ResolveError::CyclicReference { .. })
        ));
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let graph = graph_with(&[
            ("--x", vec![decl("calc(var(--b) + var(--c))")]),
            ("--b", vec![decl("var(--d)")]),
            ("--c", vec![decl("var(--d)")]),
            ("--d", vec![decl("2")]),
        ]);
        assert_eq!(
            resolver(&graph).resolve("--x", Breakpoint::Desktop).unwrap(),
            "4"
        );
    }

    #[test]
    fn bp_factor_marker_wins() {
        let graph = graph_with(&[
            (
                "--gap",
                vec![
                    decl("8px"),
                    decl("var(--ks-bp-factor-phone)"),
                ],
            ),
            ("--ks-bp-factor-phone", vec![decl("4px")]),
        ]);
        assert_eq!(
            resolver(&graph).resolve("--gap", Breakpoint::Phone).unwrap(),
            "4px"
        );
        // Other tiers ignore the phone marker and take declaration 0
        assert_eq!(
            resolver(&graph).resolve("--gap", Breakpoint::Desktop).unwrap(),
            "8px"
        );
    }

    #[test]
    fn desktop_request_falls_back_to_laptop_tier() {
        let graph = graph_with(&[(
            "--width",
            vec![
                decl("10rem"),
                decl_at("20rem", "(min-width: 64em)"), // laptop, no desktop entry
            ],
        )]);
        assert_eq!(
            resolver(&graph).resolve("--width", Breakpoint::Desktop).unwrap(),
            "20rem"
        );
    }

    #[test]
    fn exact_tier_match_preferred_over_coarser() {
        let graph = graph_with(&[(
            "--width",
            vec![
                decl_at("30rem", "(min-width: 80em)"),
                decl_at("20rem", "(min-width: 64em)"),
            ],
        )]);
        let r = resolver(&graph);
        assert_eq!(r.resolve("--width", Breakpoint::Desktop).unwrap(), "30rem");
        assert_eq!(r.resolve("--width", Breakpoint::Laptop).unwrap(), "20rem");
    }

    #[test]
    fn no_media_match_defaults_to_first_declaration() {
        let graph = graph_with(&[(
            "--width",
            vec![decl("1rem"), decl_at("2rem", "(min-width: 120em)")],
        )]);
        assert_eq!(
            resolver(&graph).resolve("--width", Breakpoint::Phone).unwrap(),
            "1rem"
        );
    }

    #[test]
    fn phone_request_does_not_take_wider_tiers() {
        // Cascade starts at the requested tier; wider entries are skipped
        let graph = graph_with(&[(
            "--width",
            vec![decl("1rem"), decl_at("3rem", "(min-width: 80em)")],
        )]);
        assert_eq!(
            resolver(&graph).resolve("--width", Breakpoint::Phone).unwrap(),
            "1rem"
        );
    }

    #[test]
    fn px_size_rounds_up() {
        let graph = graph_with(&[]);
        let r = resolver(&graph);
        assert_eq!(r.px_size("2.5rem").unwrap(), 40);
        assert_eq!(r.px_size("0.3rem").unwrap(), 5);
        assert!(r.px_size("huge").is_err());
    }

    #[test]
    fn missing_breakpoints_token_fails_setup() {
        let (graph, _) = TokenGraph::build("full", &DeclarationMap::new());
        assert!(matches!(
            Resolver::new(&graph, &ResolverSection::default()),
            Err(ResolveError::Breakpoints(_))
        ));
    }
}
