//! Pixel shading kernels.
//!
//! The partitioning core treats shading as an opaque deterministic function
//! from an image coordinate to an RGB triple; everything here sits behind the
//! [`Shader`] trait so strategies never know which kernel is active. Two
//! kernels are built in: a two-axis gradient (cheap, exactly predictable —
//! the one the tests use) and a small procedural sphere tracer that gives the
//! binary something worth looking at.

use glam::Vec3;
use serde::Deserialize;

use crate::SceneConfig;

/// A pure, deterministic pixel kernel. `row`/`col` are image coordinates
/// (row 0 is the top of the image); the result is linear RGB in [0, 1].
///
/// Implementations must be side-effect free: strategies call this from
/// whichever rank owns the pixel and rely on every rank computing the same
/// value for the same coordinate.
pub trait Shader: Send + Sync {
    fn shade(&self, row: u32, col: u32) -> [f32; 3];
}

/// Shader settings as they appear in the scene file. Opaque to the
/// partitioning core.
#[derive(Debug, Deserialize, Clone)]
pub struct ShaderSection {
    /// Kernel name: `gradient` or `spheres`.
    #[serde(default = "ShaderSection::default_kind")]
    pub kind: String,
}

impl ShaderSection {
    fn default_kind() -> String {
        "spheres".to_string()
    }
}

impl Default for ShaderSection {
    fn default() -> Self {
        Self {
            kind: Self::default_kind(),
        }
    }
}

/// Instantiate the kernel named by the scene. Unrecognized names fall back
/// to the gradient, mirroring the lenient partition-mode resolution.
pub fn build_shader(scene: &SceneConfig) -> Box<dyn Shader> {
    match scene.shader.kind.as_str() {
        "spheres" => Box::new(SphereShader::new(scene.width, scene.height)),
        "gradient" => Box::new(GradientShader::new(scene.width, scene.height)),
        other => {
            tracing::warn!(target: "scene", kind = other, "unknown_shader_kind_using_gradient");
            Box::new(GradientShader::new(scene.width, scene.height))
        }
    }
}

/// Linear ramp over both axes: red follows the column, green the row, blue
/// stays zero. Pixel (x, y) shades to (x/W, y/H, 0).
#[derive(Debug, Clone, Copy)]
pub struct GradientShader {
    width: u32,
    height: u32,
}

impl GradientShader {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Shader for GradientShader {
    fn shade(&self, row: u32, col: u32) -> [f32; 3] {
        [
            col as f32 / self.width as f32,
            row as f32 / self.height as f32,
            0.0,
        ]
    }
}

struct Sphere {
    center: Vec3,
    radius: f32,
    albedo: Vec3,
}

/// Minimal whitted-less tracer: lambertian spheres on a ground plane sphere,
/// one directional light, gradient sky on miss. Pinhole camera at the origin
/// looking down −Z.
pub struct SphereShader {
    width: f32,
    height: f32,
    spheres: Vec<Sphere>,
    light_dir: Vec3,
}

impl SphereShader {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            spheres: vec![
                Sphere {
                    center: Vec3::new(0.0, 0.0, -3.0),
                    radius: 1.0,
                    albedo: Vec3::new(0.9, 0.3, 0.25),
                },
                Sphere {
                    center: Vec3::new(1.6, -0.4, -2.4),
                    radius: 0.5,
                    albedo: Vec3::new(0.25, 0.45, 0.9),
                },
                Sphere {
                    center: Vec3::new(-1.4, -0.3, -2.2),
                    radius: 0.6,
                    albedo: Vec3::new(0.3, 0.8, 0.35),
                },
                // Ground: a huge sphere well below the others.
                Sphere {
                    center: Vec3::new(0.0, -101.0, -3.0),
                    radius: 100.0,
                    albedo: Vec3::new(0.6, 0.6, 0.6),
                },
            ],
            light_dir: Vec3::new(-0.5, 1.0, 0.6).normalize(),
        }
    }

    fn hit(&self, origin: Vec3, dir: Vec3) -> Option<(f32, &Sphere)> {
        let mut nearest: Option<(f32, &Sphere)> = None;
        for sphere in &self.spheres {
            let oc = origin - sphere.center;
            let b = oc.dot(dir);
            let c = oc.dot(oc) - sphere.radius * sphere.radius;
            let disc = b * b - c;
            if disc <= 0.0 {
                continue;
            }
            let t = -b - disc.sqrt();
            if t <= 1e-3 {
                continue;
            }
            if nearest.is_none_or(|(best, _)| t < best) {
                nearest = Some((t, sphere));
            }
        }
        nearest
    }

    fn sky(dir: Vec3) -> Vec3 {
        let t = 0.5 * (dir.y + 1.0);
        Vec3::splat(1.0).lerp(Vec3::new(0.45, 0.65, 1.0), t)
    }
}

impl Shader for SphereShader {
    fn shade(&self, row: u32, col: u32) -> [f32; 3] {
        let aspect = self.width / self.height;
        let u = ((col as f32 + 0.5) / self.width * 2.0 - 1.0) * aspect;
        let v = 1.0 - (row as f32 + 0.5) / self.height * 2.0;
        let origin = Vec3::ZERO;
        let dir = Vec3::new(u, v, -1.6).normalize();

        let color = match self.hit(origin, dir) {
            Some((t, sphere)) => {
                let point = origin + dir * t;
                let normal = (point - sphere.center).normalize();
                let diffuse = normal.dot(self.light_dir).max(0.0);
                // Shadow ray toward the light.
                let lit = self.hit(point + normal * 1e-3, self.light_dir).is_none();
                let direct = if lit { diffuse } else { 0.0 };
                sphere.albedo * (0.15 + 0.85 * direct)
            }
            None => Self::sky(dir),
        };
        [color.x, color.y, color.z]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_matches_closed_form() {
        let g = GradientShader::new(8, 8);
        assert_eq!(g.shade(0, 0), [0.0, 0.0, 0.0]);
        assert_eq!(g.shade(4, 2), [2.0 / 8.0, 4.0 / 8.0, 0.0]);
    }

    #[test]
    fn sphere_shader_is_deterministic() {
        let s = SphereShader::new(64, 48);
        for (row, col) in [(0, 0), (24, 32), (47, 63)] {
            assert_eq!(s.shade(row, col), s.shade(row, col));
        }
    }

    #[test]
    fn sphere_shader_output_in_unit_range() {
        let s = SphereShader::new(32, 32);
        for row in 0..32 {
            for col in 0..32 {
                let px = s.shade(row, col);
                for channel in px {
                    assert!((0.0..=1.0).contains(&channel), "{channel} at ({row},{col})");
                }
            }
        }
    }

    #[test]
    fn unknown_kind_builds_gradient() {
        let mut scene = crate::SceneConfig::default();
        scene.shader.kind = "mandelbrot".into();
        // Gradient at (0,0) is exactly black; the sphere scene never is.
        let shader = build_shader(&scene);
        assert_eq!(shader.shade(0, 0), [0.0, 0.0, 0.0]);
    }
}
