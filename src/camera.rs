// src/camera.rs
use glam::{Mat4, Vec2, Vec3, Vec4};
use glam::{Vec3Swizzles, Vec4Swizzles};
use bytemuck::{Pod, Zeroable};

use crate::config::FieldConfig;

// Uniform shared by the node, line and label pipelines.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub group: [[f32; 4]; 4],      // rotation of the node group
    pub eye: [f32; 4],
    pub fog: [f32; 4],             // rgb = linear fog color, w = density
    pub viewport: [f32; 4],        // xy = surface size in pixels
    pub needs_srgb_output_conversion: u32, // 0 for false, 1 for true
    pub _padding: [u32; 3],
}

/// A world-space ray with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_y: f32, // radians
    pub near: f32,
    pub far: f32,
    pub aspect_ratio: f32,    // width / height
    pub viewport_size: Vec2,  // pixels
}

impl Camera {
    pub fn new(config: &FieldConfig, viewport_width: u32, viewport_height: u32) -> Self {
        let mut camera = Self {
            eye: Vec3::new(0.0, 0.0, config.camera_distance),
            target: Vec3::ZERO,
            fov_y: config.camera_fov_deg.to_radians(),
            near: config.camera_near,
            far: config.camera_far,
            aspect_ratio: 1.0,
            viewport_size: Vec2::ONE,
        };
        camera.update_aspect_ratio(viewport_width, viewport_height);
        camera
    }

    /// Called on resize. Zero-sized viewports are ignored.
    pub fn update_aspect_ratio(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
            self.viewport_size = Vec2::new(width as f32, height as f32);
        }
    }

    pub fn build_view_projection_matrix(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.near, self.far);
        proj * view
    }

    /// Ray from the eye through a point given in normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inv = self.build_view_projection_matrix().inverse();
        // wgpu depth range is [0, 1]
        let near = inv * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let far = inv * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        let near = near.xyz() / near.w;
        let far = far.xyz() / far.w;
        Ray { origin: self.eye, direction: (far - near).normalize() }
    }

    /// Projects a world point to NDC. `None` when the point lies outside the
    /// near/far range or behind the eye.
    pub fn world_to_ndc(&self, world: Vec3) -> Option<Vec3> {
        let clip = self.build_view_projection_matrix() * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        (0.0..=1.0).contains(&ndc.z).then_some(ndc)
    }

    /// Projects a world point to pixel coordinates, origin top-left.
    pub fn world_to_screen(&self, world: Vec3) -> Option<Vec2> {
        let ndc = self.world_to_ndc(world)?;
        Some(ndc_to_screen(ndc.xy(), self.viewport_size))
    }
}

pub fn ndc_to_screen(ndc: Vec2, viewport_size: Vec2) -> Vec2 {
    let screen_x = (ndc.x * 0.5 + 0.5) * viewport_size.x;
    // NDC y points up, screen y points down
    let screen_y = (1.0 - (ndc.y * 0.5 + 0.5)) * viewport_size.y;
    Vec2::new(screen_x, screen_y)
}

pub fn screen_to_ndc(screen: Vec2, viewport_size: Vec2) -> Vec2 {
    if viewport_size.x <= 0.0 || viewport_size.y <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(
        (screen.x / viewport_size.x) * 2.0 - 1.0,
        1.0 - (screen.y / viewport_size.y) * 2.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(&FieldConfig::default(), 800, 600)
    }

    #[test]
    fn center_ray_points_at_origin() {
        let ray = camera().ray_from_ndc(Vec2::ZERO);
        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, 30.0));
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn projection_and_ray_agree() {
        let camera = camera();
        let point = Vec3::new(4.0, -3.0, 2.0);
        let ndc = camera.world_to_ndc(point).unwrap();
        let ray = camera.ray_from_ndc(ndc.xy());
        let to_point = (point - ray.origin).normalize();
        assert!((to_point - ray.direction).length() < 1e-4);
    }

    #[test]
    fn points_behind_eye_do_not_project() {
        assert!(camera().world_to_ndc(Vec3::new(0.0, 0.0, 40.0)).is_none());
    }

    #[test]
    fn screen_round_trip_at_corners() {
        let size = Vec2::new(800.0, 600.0);
        assert_eq!(screen_to_ndc(Vec2::ZERO, size), Vec2::new(-1.0, 1.0));
        assert_eq!(ndc_to_screen(Vec2::new(1.0, -1.0), size), size);
    }

    #[test]
    fn zero_resize_is_ignored() {
        let mut camera = camera();
        camera.update_aspect_ratio(0, 100);
        assert!((camera.aspect_ratio - 800.0 / 600.0).abs() < 1e-6);
    }
}
