//! Planet Descriptors
//!
//! The compact parametric description of a planet surface, plus a JSON preset
//! book for user-authored planets. Missing fields are filled in here, at the
//! boundary; the rasterizer takes descriptors exactly as given.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::util::{hsv_to_rgb, Rng};

const DEFAULT_WATER: [u8; 3] = [0, 31, 102]; // navy
const DEFAULT_LAND: [u8; 3] = [34, 139, 64]; // green

fn default_water_color() -> [u8; 3] {
    DEFAULT_WATER
}

fn default_land_color() -> [u8; 3] {
    DEFAULT_LAND
}

/// A missing seed gets a fresh random value; every other default is fixed.
fn default_seed() -> f32 {
    Rng::from_entropy().range_f32(-1000.0, 1000.0)
}

fn default_min_height() -> f32 {
    0.0
}

fn default_max_height() -> f32 {
    10.0
}

fn default_ocean_level() -> f32 {
    4.0
}

/// Everything that makes a planet look like itself.
///
/// Expected shape is `min_terrain_height ≤ ocean_height_level ≤
/// max_terrain_height`, but it is not enforced: out-of-order values bias the
/// surface toward all-water or all-land rather than failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetDescriptor {
    #[serde(default = "default_water_color")]
    pub water_color: [u8; 3],
    #[serde(default = "default_land_color")]
    pub land_color: [u8; 3],
    #[serde(default = "default_seed")]
    pub continent_seed: f32,
    #[serde(default = "default_min_height")]
    pub min_terrain_height: f32,
    #[serde(default = "default_max_height")]
    pub max_terrain_height: f32,
    #[serde(default = "default_ocean_level")]
    pub ocean_height_level: f32,
}

impl Default for PlanetDescriptor {
    fn default() -> Self {
        Self {
            water_color: default_water_color(),
            land_color: default_land_color(),
            continent_seed: default_seed(),
            min_terrain_height: default_min_height(),
            max_terrain_height: default_max_height(),
            ocean_height_level: default_ocean_level(),
        }
    }
}

impl PlanetDescriptor {
    /// Roll a fresh random planet: hue-separated water/land palettes and an
    /// ocean level somewhere in the middle of the terrain range.
    pub fn random(rng: &mut Rng) -> Self {
        let water_hue = rng.range_f32(180.0, 260.0);
        let land_hue = rng.range_f32(20.0, 140.0);
        let (wr, wg, wb) = hsv_to_rgb(
            water_hue,
            rng.range_f32(0.6, 0.9),
            rng.range_f32(0.45, 0.7),
        );
        let (lr, lg, lb) = hsv_to_rgb(
            land_hue,
            rng.range_f32(0.4, 0.8),
            rng.range_f32(0.45, 0.75),
        );

        let max_height = rng.range_f32(6.0, 14.0);
        let ocean = rng.range_f32(max_height * 0.25, max_height * 0.6);

        Self {
            water_color: [wr, wg, wb],
            land_color: [lr, lg, lb],
            continent_seed: rng.range_f32(-1000.0, 1000.0),
            min_terrain_height: 0.0,
            max_terrain_height: max_height,
            ocean_height_level: ocean,
        }
    }
}

/// A named collection of planet presets, persisted as pretty JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanetBook {
    pub name: String,
    pub planets: Vec<PlanetDescriptor>,
}

impl PlanetBook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            planets: Vec::new(),
        }
    }

    pub fn add(&mut self, planet: PlanetDescriptor) {
        self.planets.push(planet);
    }

    /// Save the book to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Load a book from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let json = fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_json::from_str(&json).map_err(|e| e.to_string())
    }
}

impl Default for PlanetBook {
    fn default() -> Self {
        Self::new("untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_fills_all_defaults() {
        let p: PlanetDescriptor = serde_json::from_str("{}").unwrap();
        assert_eq!(p.water_color, DEFAULT_WATER);
        assert_eq!(p.land_color, DEFAULT_LAND);
        assert_eq!(p.min_terrain_height, 0.0);
        assert_eq!(p.max_terrain_height, 10.0);
        assert_eq!(p.ocean_height_level, 4.0);
    }

    #[test]
    fn test_partial_json_keeps_given_fields() {
        let p: PlanetDescriptor =
            serde_json::from_str(r#"{"continent_seed": 0.42, "ocean_height_level": 2.0}"#)
                .unwrap();
        assert_eq!(p.continent_seed, 0.42);
        assert_eq!(p.ocean_height_level, 2.0);
        assert_eq!(p.water_color, DEFAULT_WATER);
    }

    #[test]
    fn test_book_round_trip() {
        let mut book = PlanetBook::new("survey");
        let mut rng = Rng::new(7);
        book.add(PlanetDescriptor::random(&mut rng));
        book.add(PlanetDescriptor::random(&mut rng));

        let json = serde_json::to_string_pretty(&book).unwrap();
        let back: PlanetBook = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "survey");
        assert_eq!(back.planets, book.planets);
    }

    #[test]
    fn test_random_planets_keep_ocean_inside_range() {
        let mut rng = Rng::new(99);
        for _ in 0..50 {
            let p = PlanetDescriptor::random(&mut rng);
            assert!(p.min_terrain_height <= p.ocean_height_level);
            assert!(p.ocean_height_level <= p.max_terrain_height);
        }
    }
}
