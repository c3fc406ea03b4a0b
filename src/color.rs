use std::collections::BTreeMap;

use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

use crate::config::Era;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            // start at 210° so two eras come out blue and orange
            let hue = 210.0 + (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.5);
            let rgb: Srgb = hsl.into_color();
            RGBColor(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: era → RGBColor
// ---------------------------------------------------------------------------

/// Fixed colour per era, shared by every chart so the legends agree.
#[derive(Debug, Clone)]
pub struct EraColors {
    mapping: BTreeMap<Era, RGBColor>,
    default_color: RGBColor,
}

impl Default for EraColors {
    fn default() -> Self {
        let mapping = Era::ALL
            .iter()
            .copied()
            .zip(generate_palette(Era::ALL.len()))
            .collect();
        EraColors {
            mapping,
            default_color: RGBColor(128, 128, 128),
        }
    }
}

impl EraColors {
    pub fn color_for(&self, era: Era) -> RGBColor {
        self.mapping.get(&era).copied().unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_are_distinct() {
        let colours = generate_palette(4);
        assert_eq!(colours.len(), 4);
        for (i, a) in colours.iter().enumerate() {
            for b in &colours[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn every_era_has_its_own_colour() {
        let colors = EraColors::default();
        assert_ne!(
            colors.color_for(Era::PreBarrett),
            colors.color_for(Era::PostBarrett)
        );
    }
}
