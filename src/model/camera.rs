use glam::{Mat4, Vec3};

/// Pitch limit, slightly less than π/2 to keep `look_at_rh` well defined.
pub const MAX_PITCH: f32 = 1.5533;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            eye: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            up: Vec3::Y,
            fov_y: 75f32.to_radians(),
            aspect: aspect_of(width, height),
            z_near: 0.1,
            z_far: 1000.0,
        }
    }

    pub fn forward(&self) -> Vec3 {
        let cy = self.yaw;
        let cp = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);
        Vec3::new(cy.cos() * cp.cos(), cp.sin(), cy.sin() * cp.cos()).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize()
    }

    pub fn target(&self) -> Vec3 {
        self.eye + self.forward()
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = aspect_of(width, height);
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target(), self.up)
    }

    pub fn view_proj(&self) -> Mat4 {
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far);
        proj * self.view()
    }

    /// Orient the camera so that `forward()` points at `target`.
    pub fn set_look_at(&mut self, target: Vec3) {
        let dir = (target - self.eye).normalize_or_zero();
        if dir == Vec3::ZERO {
            return;
        }
        self.yaw = dir.z.atan2(dir.x);
        self.pitch = dir.y.asin().clamp(-MAX_PITCH, MAX_PITCH);
    }
}

fn aspect_of(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_points_forward_at_target() {
        let mut cam = Camera::new(800, 600);
        cam.eye = Vec3::new(-25.0, 50.0, -25.0);
        cam.set_look_at(Vec3::ZERO);
        let expected = (Vec3::ZERO - cam.eye).normalize();
        assert!((cam.forward() - expected).length() < 1e-5);
    }

    #[test]
    fn look_at_own_eye_keeps_orientation() {
        let mut cam = Camera::new(800, 600);
        cam.yaw = 0.3;
        cam.set_look_at(cam.eye);
        assert_eq!(cam.yaw, 0.3);
    }

    #[test]
    fn zero_height_does_not_divide_by_zero() {
        let mut cam = Camera::new(800, 0);
        assert!(cam.aspect.is_finite());
        cam.set_aspect(1280, 720);
        assert!((cam.aspect - 1280.0 / 720.0).abs() < 1e-6);
    }
}
