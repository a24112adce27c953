//! Planet Rasterizer
//!
//! Orthographic sphere projection driving a per-pixel terrain synthesis loop:
//! each destination pixel inside the planet disk is mapped to a point on the
//! unit sphere, unrotated into the planet's own frame, and shaded from the
//! seeded noise field. Rotation never touches the noise; only the sampling
//! coordinate moves.

use crate::display::PixelBuffer;
use crate::math3d::{Quat, Vec3};
use crate::noise::Perlin;
use crate::planet::PlanetDescriptor;

/// Fraction of the half-extent the planet disk occupies by default
const DEFAULT_RADIUS_SCALE: f32 = 0.9;

/// How strongly mountain detail perturbs the continental shape
const RELIEF_STRENGTH: f32 = 0.4;

/// Water brightness ripple depth: multiplier stays in [1 - v, 1 + v]
const WATER_RIPPLE_DEPTH: f32 = 0.15;

/// Darkest land shade; elevation lifts it toward full brightness
const LAND_SHADE_FLOOR: f32 = 0.7;

// ============================================================================
// Surface presets
// ============================================================================

/// One fractal parameterization of the shared noise field.
///
/// Three presets cover the whole surface: broad continental shape, finer
/// relief on top of it, and a cheap high-frequency ripple reserved for water
/// so oceans get their own texture without inheriting mountain detail.
struct SurfacePreset {
    frequency: f32,
    octaves: u32,
    persistence: f32,
    lacunarity: f32,
}

impl SurfacePreset {
    #[inline]
    fn sample(&self, field: &Perlin, p: Vec3) -> f32 {
        field.fractal(
            p.x * self.frequency,
            p.y * self.frequency,
            p.z * self.frequency,
            self.octaves,
            self.persistence,
            self.lacunarity,
        )
    }
}

const CONTINENTS: SurfacePreset = SurfacePreset {
    frequency: 1.8,
    octaves: 4,
    persistence: 0.5,
    lacunarity: 2.0,
};

const RELIEF: SurfacePreset = SurfacePreset {
    frequency: 6.0,
    octaves: 5,
    persistence: 0.5,
    lacunarity: 2.0,
};

const RIPPLE: SurfacePreset = SurfacePreset {
    frequency: 14.0,
    octaves: 3,
    persistence: 0.3,
    lacunarity: 2.5,
};

// ============================================================================
// Rasterizer
// ============================================================================

/// Default planet radius for a destination surface
#[inline]
pub fn default_radius(width: u32, height: u32) -> f32 {
    width.min(height) as f32 / 2.0 * DEFAULT_RADIUS_SCALE
}

#[inline]
fn scale_channel(base: u8, factor: f32) -> u8 {
    (base as f32 * factor).clamp(0.0, 255.0) as u8
}

/// Render one complete planet frame into `buffer`.
///
/// Synchronous and non-preemptible: the loop visits every destination pixel
/// before returning, so coalescing of superseded requests happens between
/// frames, never within one. Pixels outside the planet disk are left fully
/// transparent.
pub fn render_planet(
    descriptor: &PlanetDescriptor,
    rotation: Quat,
    radius_override: Option<f32>,
    field: &Perlin,
    buffer: &mut PixelBuffer,
) {
    let width = buffer.width();
    let height = buffer.height();
    buffer.clear_transparent();

    let radius = radius_override.unwrap_or_else(|| default_radius(width, height));
    if radius <= 0.0 {
        return;
    }
    let radius_sq = radius * radius;
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;

    // Conjugate of a unit rotation is its inverse: view ray → planet frame
    let unrotate = rotation.conjugate();

    let height_span = descriptor.max_terrain_height - descriptor.min_terrain_height;
    let land_span = descriptor.max_terrain_height - descriptor.ocean_height_level;
    let [wr, wg, wb] = descriptor.water_color;
    let [lr, lg, lb] = descriptor.land_color;

    for j in 0..height {
        let y = j as f32 - cy;
        let y_sq = y * y;

        for i in 0..width {
            let x = i as f32 - cx;
            let dist_sq = x * x + y_sq;
            if dist_sq > radius_sq {
                continue; // outside the disk, stays transparent
            }

            // Orthographic hit: exactly one visible surface point per pixel
            let z = (radius_sq - dist_sq).sqrt();
            let view = Vec3::new(x / radius, y / radius, z / radius);
            let p = unrotate.rotate(view);

            // Continental shape, remapped from [-1, 1]
            let c = 0.5 * (CONTINENTS.sample(field, p) + 1.0);
            // Relief scaled by continent shape: mountains grow on land-leaning
            // samples, never as speckle over open ocean
            let m = 0.5 * (RELIEF.sample(field, p) + 1.0);
            let h = (c + (m - 0.5) * RELIEF_STRENGTH * c).clamp(0.0, 1.0);

            let elevation = descriptor.min_terrain_height + h * height_span;

            let (r, g, b) = if elevation <= descriptor.ocean_height_level {
                let ripple = RIPPLE.sample(field, p);
                let brightness = 1.0 + ripple * WATER_RIPPLE_DEPTH;
                (
                    scale_channel(wr, brightness),
                    scale_channel(wg, brightness),
                    scale_channel(wb, brightness),
                )
            } else {
                let lift = if land_span > 0.0 {
                    ((elevation - descriptor.ocean_height_level) / land_span).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                let shade = LAND_SHADE_FLOOR + (1.0 - LAND_SHADE_FLOOR) * lift;
                (
                    scale_channel(lr, shade),
                    scale_channel(lg, shade),
                    scale_channel(lb, shade),
                )
            };

            buffer.set_pixel(i as i32, j as i32, r, g, b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_descriptor() -> PlanetDescriptor {
        PlanetDescriptor {
            water_color: [0x00, 0x00, 0xFF],
            land_color: [0x00, 0x80, 0x00],
            continent_seed: 0.42,
            min_terrain_height: 0.0,
            max_terrain_height: 10.0,
            ocean_height_level: 2.0,
        }
    }

    fn render(descriptor: &PlanetDescriptor, rotation: Quat, size: u32) -> PixelBuffer {
        let field = Perlin::new(descriptor.continent_seed);
        let mut buffer = PixelBuffer::with_size(size, size);
        render_planet(descriptor, rotation, None, &field, &mut buffer);
        buffer
    }

    #[test]
    fn test_disk_mask() {
        let buffer = render(&reference_descriptor(), Quat::identity(), 100);
        let radius = default_radius(100, 100);
        assert_eq!(radius, 45.0);

        let (cx, cy) = (50.0, 50.0);
        for j in 0..100 {
            for i in 0..100 {
                let dist = ((i as f32 - cx).powi(2) + (j as f32 - cy).powi(2)).sqrt();
                let (_, _, _, a) = buffer.get_pixel_rgba(i, j).unwrap();
                if dist > radius + 1.0 {
                    assert_eq!(a, 0, "pixel ({}, {}) should be transparent", i, j);
                } else if dist < radius - 1.0 {
                    assert_eq!(a, 255, "pixel ({}, {}) should be opaque", i, j);
                }
            }
        }
        // Center pixel sits at zero offset
        assert_eq!(buffer.get_pixel_rgba(50, 50).unwrap().3, 255);
    }

    #[test]
    fn test_ocean_at_floor_means_no_water() {
        let descriptor = PlanetDescriptor {
            ocean_height_level: 0.0, // equal to min_terrain_height
            ..reference_descriptor()
        };
        let buffer = render(&descriptor, Quat::identity(), 64);
        for j in 0..64 {
            for i in 0..64 {
                let (_, g, b, a) = buffer.get_pixel_rgba(i, j).unwrap();
                if a == 255 {
                    assert_eq!(b, 0, "water pixel at ({}, {})", i, j);
                    assert!(g > 0, "land pixel must carry green at ({}, {})", i, j);
                }
            }
        }
    }

    #[test]
    fn test_ocean_above_ceiling_means_all_water() {
        let descriptor = PlanetDescriptor {
            ocean_height_level: 11.0, // above max_terrain_height
            ..reference_descriptor()
        };
        let buffer = render(&descriptor, Quat::identity(), 64);
        for j in 0..64 {
            for i in 0..64 {
                let (_, g, b, a) = buffer.get_pixel_rgba(i, j).unwrap();
                if a == 255 {
                    assert_eq!(g, 0, "land pixel at ({}, {})", i, j);
                    assert!(b > 0);
                }
            }
        }
    }

    #[test]
    fn test_end_to_end_reference_planet() {
        let buffer = render(&reference_descriptor(), Quat::identity(), 64);
        assert_eq!(buffer.as_bytes().len(), 64 * 64 * 4);

        let expected_radius = default_radius(64, 64);
        assert!((expected_radius - 28.8).abs() < 1e-4);

        let (cx, cy) = (32.0, 32.0);
        let mut water = 0;
        let mut land = 0;
        for j in 0..64 {
            for i in 0..64 {
                let dist = ((i as f32 - cx).powi(2) + (j as f32 - cy).powi(2)).sqrt();
                let (r, g, b, a) = buffer.get_pixel_rgba(i, j).unwrap();
                if dist > expected_radius + 1.0 {
                    assert_eq!(a, 0);
                    continue;
                }
                if dist < expected_radius - 1.0 {
                    assert_eq!(a, 255);
                }
                if a == 255 {
                    // Every opaque pixel is water-family or land-family,
                    // never a blend of both
                    assert_eq!(r, 0);
                    assert!(
                        (b > 0 && g == 0) || (g > 0 && b == 0),
                        "blended pixel at ({}, {}): ({}, {}, {})",
                        i,
                        j,
                        r,
                        g,
                        b
                    );
                    if b > 0 {
                        water += 1;
                    } else {
                        land += 1;
                    }
                }
            }
        }
        assert!(water > 0, "reference planet has oceans");
        assert!(land > 0, "reference planet has continents");
    }

    #[test]
    fn test_rotation_round_trip_reproduces_image() {
        let descriptor = reference_descriptor();
        let q = Quat::from_axis_angle(Vec3::new(0.2, 1.0, 0.4), 0.8);
        let round_trip = q * q.conjugate();

        let unrotated = render(&descriptor, Quat::identity(), 64);
        let restored = render(&descriptor, round_trip, 64);
        assert_eq!(unrotated.as_bytes(), restored.as_bytes());
    }

    #[test]
    fn test_rotated_image_differs_from_unrotated() {
        let descriptor = reference_descriptor();
        let q = Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), 1.2);
        let unrotated = render(&descriptor, Quat::identity(), 64);
        let rotated = render(&descriptor, q, 64);
        assert_ne!(unrotated.as_bytes(), rotated.as_bytes());
    }

    #[test]
    fn test_radius_override_shrinks_disk() {
        let descriptor = reference_descriptor();
        let field = Perlin::new(descriptor.continent_seed);
        let mut buffer = PixelBuffer::with_size(64, 64);
        render_planet(&descriptor, Quat::identity(), Some(10.0), &field, &mut buffer);

        for j in 0..64 {
            for i in 0..64 {
                let dist = ((i as f32 - 32.0).powi(2) + (j as f32 - 32.0).powi(2)).sqrt();
                let (_, _, _, a) = buffer.get_pixel_rgba(i, j).unwrap();
                if dist > 11.0 {
                    assert_eq!(a, 0);
                } else if dist < 9.0 {
                    assert_eq!(a, 255);
                }
            }
        }
    }

    #[test]
    fn test_same_seed_renders_identically() {
        let descriptor = reference_descriptor();
        let a = render(&descriptor, Quat::identity(), 48);
        let b = render(&descriptor, Quat::identity(), 48);
        assert_eq!(a.as_bytes(), b.as_bytes());
    }
}
