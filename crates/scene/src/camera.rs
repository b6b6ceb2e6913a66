//! First-person camera and its controller.
//!
//! [`FpsCamera`] owns a placement [`Transform`] and a perspective
//! projection. The projection matrix and its inverse are rebuilt eagerly
//! whenever fov, aspect or clip planes change, so querying them is a plain
//! copy.
//!
//! [`FpsController`] turns per-frame movement and look input into camera
//! placement updates. It knows nothing about keyboards or mice; the caller
//! fills a [`CameraInput`] from whatever input system it uses.

use std::f32::consts::{FRAC_PI_2, PI};
use std::time::Duration;

use glam::{Mat4, Quat, Vec2, Vec3};

use crate::error::{SceneError, SceneResult, ensure_finite, ensure_finite_vec3};
use crate::transform::Transform;

/// Perspective camera placed in the world by a [`Transform`].
#[derive(Clone, Debug)]
pub struct FpsCamera {
    /// Camera placement in world space
    pub world: Transform,
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
    projection: Mat4,
    projection_inverse: Mat4,
}

impl Default for FpsCamera {
    fn default() -> Self {
        let (fov, aspect, near, far) = (45.0_f32.to_radians(), 16.0 / 9.0, 0.01, 1000.0);
        let projection = Mat4::perspective_rh_gl(fov, aspect, near, far);
        Self {
            world: Transform::default(),
            fov,
            aspect,
            near,
            far,
            projection,
            projection_inverse: projection.inverse(),
        }
    }
}

impl FpsCamera {
    /// Create a camera at the origin looking down `-Z`.
    ///
    /// `fov` is the vertical field of view in radians.
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> SceneResult<Self> {
        let mut camera = Self::default();
        camera.set_projection(fov, aspect, near, far)?;
        Ok(camera)
    }

    /// Replace all projection parameters at once.
    pub fn set_projection(
        &mut self,
        fov: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> SceneResult<()> {
        validate_fov(fov)?;
        validate_aspect(aspect)?;
        validate_clip_planes(near, far)?;

        self.fov = fov;
        self.aspect = aspect;
        self.near = near;
        self.far = far;
        self.rebuild_projection();
        Ok(())
    }

    /// Change the vertical field of view; must lie in (0, π).
    pub fn set_fov(&mut self, fov: f32) -> SceneResult<()> {
        self.fov = validate_fov(fov)?;
        self.rebuild_projection();
        Ok(())
    }

    /// Change the aspect ratio (width / height); must be positive.
    pub fn set_aspect(&mut self, aspect: f32) -> SceneResult<()> {
        self.aspect = validate_aspect(aspect)?;
        self.rebuild_projection();
        Ok(())
    }

    /// Change the clip planes; requires `0 < near < far`.
    pub fn set_clip_planes(&mut self, near: f32, far: f32) -> SceneResult<()> {
        validate_clip_planes(near, far)?;
        self.near = near;
        self.far = far;
        self.rebuild_projection();
        Ok(())
    }

    /// Vertical field of view in radians.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Aspect ratio (width / height).
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Near clip plane distance.
    pub fn near(&self) -> f32 {
        self.near
    }

    /// Far clip plane distance.
    pub fn far(&self) -> f32 {
        self.far
    }

    /// Camera position in world space.
    pub fn position(&self) -> Vec3 {
        self.world.translation()
    }

    /// Projection matrix (view space to clip space).
    pub fn view_to_clip(&self) -> Mat4 {
        self.projection
    }

    /// Inverse projection matrix.
    pub fn clip_to_view(&self) -> Mat4 {
        self.projection_inverse
    }

    /// Camera placement matrix (view space to world space).
    pub fn view_to_world(&self) -> Mat4 {
        self.world.matrix()
    }

    /// View matrix: inverse of the placement matrix.
    ///
    /// A degenerate placement scale is ignored rather than producing NaNs.
    pub fn world_to_view(&self) -> Mat4 {
        self.world.inverse_matrix().unwrap_or_else(|| {
            Mat4::from_quat(self.world.rotation().conjugate())
                * Mat4::from_translation(-self.world.translation())
        })
    }

    /// Combined view-projection matrix.
    pub fn world_to_clip(&self) -> Mat4 {
        self.projection * self.world_to_view()
    }

    /// Inverse of [`FpsCamera::world_to_clip`].
    pub fn clip_to_world(&self) -> Mat4 {
        self.view_to_world() * self.projection_inverse
    }

    /// Unproject a normalized-device-coordinate point into world space.
    pub fn ndc_to_world(&self, ndc: Vec3) -> Vec3 {
        self.clip_to_world().project_point3(ndc)
    }

    /// Unproject a normalized-device-coordinate point into view space.
    pub fn ndc_to_view(&self, ndc: Vec3) -> Vec3 {
        self.projection_inverse.project_point3(ndc)
    }

    fn rebuild_projection(&mut self) {
        self.projection = Mat4::perspective_rh_gl(self.fov, self.aspect, self.near, self.far);
        self.projection_inverse = self.projection.inverse();
    }
}

fn validate_fov(fov: f32) -> SceneResult<f32> {
    if fov.is_finite() && fov > 0.0 && fov < PI {
        Ok(fov)
    } else {
        Err(SceneError::invalid("field of view", fov))
    }
}

fn validate_aspect(aspect: f32) -> SceneResult<f32> {
    if aspect.is_finite() && aspect > 0.0 {
        Ok(aspect)
    } else {
        Err(SceneError::invalid("aspect ratio", aspect))
    }
}

fn validate_clip_planes(near: f32, far: f32) -> SceneResult<()> {
    if near.is_finite() && far.is_finite() && near > 0.0 && far > near {
        Ok(())
    } else {
        Err(SceneError::invalid("clip planes", (near, far)))
    }
}

/// Per-frame camera input, already mapped from raw devices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraInput {
    /// Desired movement in camera space: x right, y up, z forward.
    /// Components are usually in `[-1, 1]`.
    pub movement: Vec3,
    /// Look delta since the last frame, in pointer units.
    pub look_delta: Vec2,
    /// Multiplier applied to the movement speed (e.g. sprint).
    pub speed_multiplier: f32,
}

impl Default for CameraInput {
    fn default() -> Self {
        Self {
            movement: Vec3::ZERO,
            look_delta: Vec2::ZERO,
            speed_multiplier: 1.0,
        }
    }
}

/// Yaw/pitch first-person controller.
#[derive(Clone, Debug)]
pub struct FpsController {
    /// Movement speed in units per second, per camera axis
    pub movement_speed: Vec3,
    /// Radians per pointer unit, for yaw (x) and pitch (y)
    pub mouse_sensitivity: Vec2,
    yaw: f32,
    pitch: f32,
}

impl Default for FpsController {
    fn default() -> Self {
        Self {
            movement_speed: Vec3::splat(3.0),
            mouse_sensitivity: Vec2::splat(0.003),
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

impl FpsController {
    /// Largest pitch magnitude; keeps the camera from flipping over.
    pub const MAX_PITCH: f32 = FRAC_PI_2 - 0.01;

    /// Create a controller whose yaw and pitch match the camera's current
    /// orientation.
    pub fn from_camera(camera: &FpsCamera) -> Self {
        let front = camera.world.front();
        Self {
            yaw: (-front.x).atan2(-front.z),
            pitch: front.y.clamp(-1.0, 1.0).asin(),
            ..Self::default()
        }
    }

    /// Current yaw in radians (rotation about world Y).
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Current pitch in radians.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Apply one frame of input to `camera`.
    ///
    /// Input is validated before anything is changed.
    pub fn update(
        &mut self,
        camera: &mut FpsCamera,
        input: &CameraInput,
        dt: Duration,
    ) -> SceneResult<()> {
        let movement = ensure_finite_vec3("camera movement", input.movement)?;
        let multiplier = ensure_finite("speed multiplier", input.speed_multiplier)?;
        if !input.look_delta.is_finite() {
            return Err(SceneError::invalid("look delta", input.look_delta));
        }

        let yaw = self.yaw - input.look_delta.x * self.mouse_sensitivity.x;
        let pitch = (self.pitch - input.look_delta.y * self.mouse_sensitivity.y)
            .clamp(-Self::MAX_PITCH, Self::MAX_PITCH);
        let rotation = Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch);

        let step = movement * self.movement_speed * multiplier * dt.as_secs_f32();
        let offset = rotation * Vec3::X * step.x + rotation * Vec3::Y * step.y
            + rotation * Vec3::NEG_Z * step.z;

        let mut world = camera.world;
        world.set_rotation_quat(rotation)?;
        world.translate(offset)?;

        camera.world = world;
        self.yaw = yaw.rem_euclid(std::f32::consts::TAU);
        self.pitch = pitch;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn bits(m: Mat4) -> [u32; 16] {
        m.to_cols_array().map(f32::to_bits)
    }

    #[test]
    fn test_projection_is_cached_bit_identical() {
        let mut camera = FpsCamera::default();
        camera.set_fov(60.0_f32.to_radians()).unwrap();
        camera.set_aspect(16.0 / 9.0).unwrap();

        let first = camera.view_to_clip();
        let second = camera.view_to_clip();
        assert_eq!(bits(first), bits(second));
    }

    #[test]
    fn test_projection_follows_parameters() {
        let mut camera = FpsCamera::new(FRAC_PI_2, 1.0, 0.1, 100.0).unwrap();
        let expected = Mat4::perspective_rh_gl(FRAC_PI_2, 1.0, 0.1, 100.0);
        assert_eq!(camera.view_to_clip(), expected);

        camera.set_aspect(2.0).unwrap();
        assert_eq!(
            camera.view_to_clip(),
            Mat4::perspective_rh_gl(FRAC_PI_2, 2.0, 0.1, 100.0)
        );
        assert_abs_diff_eq!(
            camera.view_to_clip() * camera.clip_to_view(),
            Mat4::IDENTITY,
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        let mut camera = FpsCamera::default();
        let before = camera.view_to_clip();

        for fov in [0.0, -1.0, PI, 4.0, f32::NAN] {
            assert!(matches!(camera.set_fov(fov), Err(SceneError::InvalidValue { .. })));
        }
        for aspect in [0.0, -1.5, f32::INFINITY, f32::NAN] {
            assert!(camera.set_aspect(aspect).is_err());
        }
        assert!(camera.set_clip_planes(0.0, 10.0).is_err());
        assert!(camera.set_clip_planes(10.0, 1.0).is_err());
        assert!(camera.set_projection(1.0, 1.0, 0.1, f32::NAN).is_err());
        assert!(FpsCamera::new(1.0, 0.0, 0.1, 10.0).is_err());

        assert_eq!(camera.view_to_clip(), before);
        assert_eq!(camera.aspect(), 16.0 / 9.0);
    }

    #[test]
    fn test_view_is_inverse_of_placement() {
        let mut camera = FpsCamera::default();
        camera.world.set_translation(Vec3::new(0.0, 0.0, 6.0)).unwrap();
        camera.world.look_at(Vec3::new(1.0, 0.0, 0.0), Vec3::Y).unwrap();

        assert_abs_diff_eq!(
            camera.world_to_view() * camera.view_to_world(),
            Mat4::IDENTITY,
            epsilon = 1e-5
        );

        // The camera position maps to the view-space origin
        let origin = camera.world_to_view().transform_point3(camera.position());
        assert_abs_diff_eq!(origin, Vec3::ZERO, epsilon = 1e-5);
    }

    #[test]
    fn test_ndc_round_trip() {
        let mut camera = FpsCamera::new(1.0, 16.0 / 9.0, 0.1, 100.0).unwrap();
        camera.world.set_translation(Vec3::new(1.0, 2.0, 10.0)).unwrap();

        let point = Vec3::new(0.5, -0.25, 0.0);
        let ndc = camera.world_to_clip().project_point3(point);
        assert_abs_diff_eq!(camera.ndc_to_world(ndc), point, epsilon = 1e-3);
    }

    #[test]
    fn test_controller_moves_along_front() {
        let mut camera = FpsCamera::default();
        camera.world.set_translation(Vec3::new(0.0, 0.0, 6.0)).unwrap();
        let mut controller = FpsController::from_camera(&camera);

        let input = CameraInput {
            movement: Vec3::new(0.0, 0.0, 1.0),
            ..CameraInput::default()
        };
        controller
            .update(&mut camera, &input, Duration::from_secs(1))
            .unwrap();

        assert_abs_diff_eq!(camera.position(), Vec3::new(0.0, 0.0, 3.0), epsilon = 1e-5);
    }

    #[test]
    fn test_controller_look_right_and_clamped_pitch() {
        let mut camera = FpsCamera::default();
        let mut controller = FpsController::default();

        let look_right = CameraInput {
            look_delta: Vec2::new(100.0, 0.0),
            ..CameraInput::default()
        };
        controller
            .update(&mut camera, &look_right, Duration::from_millis(16))
            .unwrap();
        assert!(camera.world.front().x > 0.0);

        let look_up = CameraInput {
            look_delta: Vec2::new(0.0, -10_000.0),
            ..CameraInput::default()
        };
        controller
            .update(&mut camera, &look_up, Duration::from_millis(16))
            .unwrap();
        assert_eq!(controller.pitch(), FpsController::MAX_PITCH);
        assert!(camera.world.front().y > 0.99);
    }

    #[test]
    fn test_controller_rejects_bad_input() {
        let mut camera = FpsCamera::default();
        let mut controller = FpsController::default();
        let before = camera.world;

        let input = CameraInput {
            movement: Vec3::new(f32::NAN, 0.0, 0.0),
            ..CameraInput::default()
        };
        assert!(controller.update(&mut camera, &input, Duration::from_secs(1)).is_err());
        assert_eq!(camera.world, before);
    }
}
