//! Fixed viewpoint and projection math for the cube.

use glam::{Mat4, Vec3, Vec4};

/// Near clip distance of the cube projection.
pub const NEAR: f32 = 0.5;

/// Far clip distance of the cube projection.
pub const FAR: f32 = 1000.0;

/// A fixed look-at camera.
///
/// The default eye sits just inside the cube, looking down -Z, so the viewer
/// sees the inside faces like a panorama.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Eye position in world space.
    pub eye: Vec3,
    /// Point the eye looks at.
    pub target: Vec3,
    /// Up direction of the view.
    pub up: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, -0.5),
            target: Vec3::new(0.0, 0.0, -5.0),
            up: Vec3::Y,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.eye = Vec3::new(x, y, z);
        self
    }

    pub fn looking_at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.target = Vec3::new(x, y, z);
        self
    }

    /// Right-handed view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Projection for a drawable area: horizontal extent follows the aspect
    /// ratio, vertical extent is fixed at ±1.
    ///
    /// Returns `None` for a zero-sized area (minimized window).
    pub fn projection_for(width: u32, height: u32) -> Option<Mat4> {
        if width == 0 || height == 0 {
            return None;
        }
        let ratio = width as f32 / height as f32;
        Some(frustum(-ratio, ratio, -1.0, 1.0, NEAR, FAR))
    }
}

/// Right-handed perspective frustum with a `0..1` depth range, as wgpu
/// expects.
pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = near - far;

    Mat4::from_cols(
        Vec4::new(2.0 * near / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / height, 0.0, 0.0),
        Vec4::new(
            (right + left) / width,
            (top + bottom) / height,
            far / depth,
            -1.0,
        ),
        Vec4::new(0.0, 0.0, near * far / depth, 0.0),
    )
}

/// `projection · (view · model)`.
///
/// View and model combine first; the grouping is kept explicit so the
/// result is bit-stable across frames.
pub fn compute_mvp(projection: Mat4, view: Mat4, model: Mat4) -> Mat4 {
    let model_view = view * model;
    projection * model_view
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_frustum_matches_perspective() {
        let aspect = 16.0 / 9.0;
        let ours = frustum(-aspect, aspect, -1.0, 1.0, NEAR, FAR);
        // top = 1 at near = 0.5 gives a vertical fov of 2·atan(2).
        let fov = 2.0 * (1.0_f32 / NEAR).atan();
        let reference = Mat4::perspective_rh(fov, aspect, NEAR, FAR);
        assert!(ours.abs_diff_eq(reference, 1e-5));
    }

    #[test]
    fn near_and_far_planes_map_to_depth_range() {
        let proj = frustum(-1.0, 1.0, -1.0, 1.0, NEAR, FAR);
        let near = proj.project_point3(Vec3::new(0.0, 0.0, -NEAR));
        let far = proj.project_point3(Vec3::new(0.0, 0.0, -FAR));
        assert!(near.z.abs() < 1e-5);
        assert!((far.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn zero_sized_surface_has_no_projection() {
        assert!(Camera::projection_for(0, 600).is_none());
        assert!(Camera::projection_for(800, 0).is_none());
        assert!(Camera::projection_for(800, 600).is_some());
    }

    #[test]
    fn mvp_with_identity_model_is_projection_times_view() {
        let view = Camera::new().at(0.0, 0.0, 3.0).looking_at(0.0, 0.0, 0.0).view_matrix();
        let projection = Camera::projection_for(1280, 720).unwrap();

        let mvp = compute_mvp(projection, view, Mat4::IDENTITY);
        assert_eq!(mvp, projection * view);
        // Guard against the operands being swapped.
        assert!(!mvp.abs_diff_eq(view * projection, 1e-3));
    }

    #[test]
    fn default_camera_looks_down_negative_z() {
        let view = Camera::new().view_matrix();
        // A point straight ahead of the eye stays on the view axis.
        let ahead = view.transform_point3(Vec3::new(0.0, 0.0, -2.0));
        assert!(ahead.x.abs() < 1e-6 && ahead.y.abs() < 1e-6);
        assert!(ahead.z < 0.0);
    }
}
