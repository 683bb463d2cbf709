use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

use bike_panda::data::model::FieldValue;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = 200.0 + (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.5);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Series colours: split value → Color32
// ---------------------------------------------------------------------------

/// Maps the split values of a grouped chart to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<Option<FieldValue>, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map over the given split values.
    pub fn new<'a>(keys: impl IntoIterator<Item = &'a Option<FieldValue>>) -> Self {
        let keys: Vec<Option<FieldValue>> = keys.into_iter().copied().collect();
        let palette = generate_palette(keys.len());
        ColorMap {
            mapping: keys.into_iter().zip(palette).collect(),
            default_color: Color32::LIGHT_BLUE,
        }
    }

    pub fn color_for(&self, key: &Option<FieldValue>) -> Color32 {
        self.mapping.get(key).copied().unwrap_or(self.default_color)
    }
}

// ---------------------------------------------------------------------------
// Diverging scale for the correlation heatmap
// ---------------------------------------------------------------------------

/// Blue (−1) → white (0) → red (+1).
pub fn diverging(r: f64) -> Color32 {
    let cold: LinSrgb = Srgb::new(0.23, 0.30, 0.75).into_linear();
    let white: LinSrgb = Srgb::new(0.87, 0.87, 0.87).into_linear();
    let warm: LinSrgb = Srgb::new(0.71, 0.02, 0.15).into_linear();

    let t = r.clamp(-1.0, 1.0) as f32;
    let mixed = if t < 0.0 {
        white.mix(cold, -t)
    } else {
        white.mix(warm, t)
    };
    to_color32(Srgb::from_linear(mixed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(3);
        assert_eq!(p.len(), 3);
        assert_ne!(p[0], p[1]);
    }

    #[test]
    fn diverging_endpoints_differ() {
        let neg = diverging(-1.0);
        let pos = diverging(1.0);
        assert!(neg.b() > neg.r());
        assert!(pos.r() > pos.b());
    }
}
