// Color plumbing for the highlight layer: hex parsing, source-over
// compositing against the canvas background, and the deterministic
// categorical palette used by the community/component menus.

use std::collections::BTreeMap;

/// Opaque canvas background the renderer draws on.
pub const BACKGROUND: Rgb = Rgb {
    r: 2,
    g: 53,
    b: 66,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse a `#rgb` or `#rrggbb` hex color.
    pub fn parse(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        let (r, g, b) = match hex.len() {
            3 => {
                let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|d| d * 17);
                (digit(0)?, digit(1)?, digit(2)?)
            }
            6 => (
                u8::from_str_radix(&hex[0..2], 16).ok()?,
                u8::from_str_radix(&hex[2..4], 16).ok()?,
                u8::from_str_radix(&hex[4..6], 16).ok()?,
            ),
            _ => return None,
        };
        Some(Self { r, g, b })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Composite `hex` at `alpha` over the opaque background (source-over)
/// and return the flattened `#rrggbb` string.
///
/// Out-of-range alphas are clamped; an unparseable color falls back to
/// the background itself.
pub fn blend_over_background(hex: &str, alpha: f64) -> String {
    let Some(fg) = Rgb::parse(hex) else {
        return BACKGROUND.to_hex();
    };
    let a = alpha.clamp(0.0, 1.0);
    let channel = |f: u8, b: u8| -> u8 {
        let blended = f64::from(f) * a + f64::from(b) * (1.0 - a);
        blended.round().clamp(0.0, 255.0) as u8
    };
    Rgb {
        r: channel(fg.r, BACKGROUND.r),
        g: channel(fg.g, BACKGROUND.g),
        b: channel(fg.b, BACKGROUND.b),
    }
    .to_hex()
}

/// Deterministic categorical palette: one visually spread color per key,
/// assigned in the order given. Golden-angle hue stepping keeps adjacent
/// entries apart without any randomness.
pub fn categorical_palette(keys: &[String]) -> BTreeMap<String, String> {
    keys.iter()
        .enumerate()
        .map(|(i, key)| {
            let hue = (i as f64 * 137.508) % 360.0;
            (key.clone(), hsl_to_hex(hue, 0.65, 0.55))
        })
        .collect()
}

fn hsl_to_hex(h: f64, s: f64, l: f64) -> String {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;
    let (r1, g1, b1) = match h as u32 {
        0..=59 => (c, x, 0.0),
        60..=119 => (x, c, 0.0),
        120..=179 => (0.0, c, x),
        180..=239 => (0.0, x, c),
        240..=299 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb {
        r: to_channel(r1),
        g: to_channel(g1),
        b: to_channel(b1),
    }
    .to_hex()
}
