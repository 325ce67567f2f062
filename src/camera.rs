//! Orbit camera around the tree.

use crate::config::CameraConfig;
use glam::{Mat4, Vec2, Vec3};

const NEAR: f32 = 0.1;
const FAR: f32 = 200.0;
const PITCH_LIMIT: f32 = 1.5;

/// Orbit camera looking at `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    /// Yaw speed while auto-rotating, radians per second.
    pub auto_rotate_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Camera {
    /// Camera placed at `config.position`, looking at the origin.
    pub fn from_config(config: &CameraConfig) -> Self {
        let offset = Vec3::from(config.position);
        let distance = offset.length().max(1.0);
        Self {
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            distance,
            target: Vec3::ZERO,
            fov_deg: config.fov_deg,
            auto_rotate_speed: config.auto_rotate_speed,
            min_distance: 10.0,
            max_distance: 50.0,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_deg.to_radians(), aspect.max(1e-3), NEAR, FAR)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }

    /// Mouse drag by `delta` pixels.
    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw -= delta.x * 0.005;
        self.pitch = (self.pitch + delta.y * 0.005).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Scroll by `lines`; positive moves closer.
    pub fn zoom(&mut self, lines: f32) {
        self.distance = (self.distance - lines * 1.5).clamp(self.min_distance, self.max_distance);
    }

    pub fn auto_rotate(&mut self, dt: f32) {
        self.yaw += self.auto_rotate_speed * dt;
    }

    /// World-space ray through `cursor` (pixels, origin top-left).
    pub fn ray_through(&self, cursor: Vec2, viewport: Vec2) -> (Vec3, Vec3) {
        let ndc = Vec2::new(
            cursor.x / viewport.x.max(1.0) * 2.0 - 1.0,
            1.0 - cursor.y / viewport.y.max(1.0) * 2.0,
        );
        let inverse = self.view_proj(viewport.x / viewport.y.max(1.0)).inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        let origin = self.position();
        (origin, (far - near).normalize_or_zero())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_matches_position() {
        let camera = Camera::default();
        let pos = camera.position();
        assert!((pos - Vec3::new(0.0, 4.0, 25.0)).length() < 1e-3);
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = Camera::default();
        let (origin, dir) = camera.ray_through(Vec2::new(400.0, 300.0), Vec2::new(800.0, 600.0));
        let to_target = (camera.target - origin).normalize();
        assert!(dir.dot(to_target) > 0.999);
    }

    #[test]
    fn test_zoom_and_pitch_are_clamped() {
        let mut camera = Camera::default();
        camera.zoom(100.0);
        assert_eq!(camera.distance, camera.min_distance);
        camera.zoom(-100.0);
        assert_eq!(camera.distance, camera.max_distance);
        camera.orbit(Vec2::new(0.0, 10_000.0));
        assert_eq!(camera.pitch, PITCH_LIMIT);
    }

    #[test]
    fn test_auto_rotate_advances_yaw() {
        let mut camera = Camera::default();
        camera.auto_rotate(2.0);
        assert!((camera.yaw - 1.0).abs() < 1e-6);
    }
}
