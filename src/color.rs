use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::story::{CategoryColor, StoryError};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Parse `#rrggbb` / `#rgb` (leading `#` optional).
pub fn parse_hex(hex: &str) -> Result<Color32, StoryError> {
    let rgb = Srgb::<u8>::from_str(hex.trim())
        .map_err(|_| StoryError::InvalidColor(hex.to_string()))?;
    Ok(Color32::from_rgb(rgb.red, rgb.green, rgb.blue))
}

// ---------------------------------------------------------------------------
// Color mapping: brand group → Color32
// ---------------------------------------------------------------------------

/// Maps brand groups to colours.
///
/// Configured categories keep their configured colour and order. Groups
/// present in the data but missing from the configuration get generated
/// hues appended after them.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    order: Vec<String>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from the configured palette and the observed groups.
    pub fn new(
        configured: &[CategoryColor],
        observed: &BTreeSet<String>,
        neutral: Color32,
    ) -> Result<Self, StoryError> {
        let mut mapping = BTreeMap::new();
        let mut order = Vec::with_capacity(configured.len());

        for entry in configured {
            mapping.insert(entry.name.clone(), parse_hex(&entry.color)?);
            order.push(entry.name.clone());
        }

        let extra: Vec<&String> = observed
            .iter()
            .filter(|g| !mapping.contains_key(g.as_str()))
            .collect();
        if !extra.is_empty() {
            log::warn!("no palette colour configured for {extra:?}, generating hues");
        }
        let generated = generate_palette(extra.len());
        for (group, color) in extra.into_iter().zip(generated) {
            mapping.insert(group.clone(), color);
            order.push(group.clone());
        }

        Ok(ColorMap {
            mapping,
            order,
            default_color: neutral,
        })
    }

    /// Look up the colour for a brand group; `None` gets the neutral colour.
    pub fn color_for(&self, category: Option<&str>) -> Color32 {
        category
            .and_then(|c| self.mapping.get(c))
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Return the legend entries (label → colour) in palette order.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.order
            .iter()
            .map(|name| (name.clone(), self.color_for(Some(name.as_str()))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> Vec<CategoryColor> {
        vec![
            CategoryColor::new("USA", "#1f77b4"),
            CategoryColor::new("Japan", "#2ca02c"),
        ]
    }

    #[test]
    fn parses_hex_colours() {
        assert_eq!(parse_hex("#1f77b4").unwrap(), Color32::from_rgb(0x1f, 0x77, 0xb4));
        assert_eq!(parse_hex("fff").unwrap(), Color32::from_rgb(255, 255, 255));
        assert!(matches!(parse_hex("#zzzzzz"), Err(StoryError::InvalidColor(_))));
    }

    #[test]
    fn configured_colours_win_and_keep_order() {
        let observed: BTreeSet<String> = ["Japan".to_string()].into();
        let map = ColorMap::new(&palette(), &observed, Color32::GRAY).unwrap();
        assert_eq!(map.color_for(Some("Japan")), Color32::from_rgb(0x2c, 0xa0, 0x2c));
        let names: Vec<String> = map.legend_entries().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["USA", "Japan"]);
    }

    #[test]
    fn unconfigured_groups_get_generated_colours() {
        let observed: BTreeSet<String> = ["Japan".to_string(), "Mars".to_string()].into();
        let map = ColorMap::new(&palette(), &observed, Color32::GRAY).unwrap();
        assert_ne!(map.color_for(Some("Mars")), Color32::GRAY);
        assert_eq!(map.legend_entries().len(), 3);
    }

    #[test]
    fn missing_category_uses_neutral() {
        let map = ColorMap::new(&palette(), &BTreeSet::new(), Color32::GRAY).unwrap();
        assert_eq!(map.color_for(None), Color32::GRAY);
        assert_eq!(map.color_for(Some("Atlantis")), Color32::GRAY);
    }

    #[test]
    fn generated_palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        assert_eq!(generate_palette(5).len(), 5);
    }
}
