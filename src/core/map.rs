//! Boundary to the rendering engine
//!
//! The engine only ever reads the camera and writes camera changes through
//! [`CameraHost`]. [`HeadlessMap`] is a self-contained host used by tests, the
//! demo binary and integrators that render elsewhere.

use crate::camera::state::{CameraOptions, CameraState};
use crate::core::config::CameraBoundsOptions;
use crate::core::geo::Point;
use crate::core::projection::Projection;

/// The map that owns the camera
pub trait CameraHost {
    /// Current camera
    fn camera_state(&self) -> CameraState;

    /// Applies the set fields of `camera`; out-of-range values are clamped
    fn set_camera(&mut self, camera: &CameraOptions);

    /// Size of the map view in screen points
    fn size(&self) -> Point;

    fn camera_bounds(&self) -> CameraBoundsOptions;

    /// Camera described by the loaded style, empty when there is none
    fn style_default_camera(&self) -> CameraOptions {
        CameraOptions::default()
    }

    fn projection(&self) -> Projection {
        Projection::new(&self.camera_state(), self.size())
    }
}

/// A map without a renderer
#[derive(Debug, Clone)]
pub struct HeadlessMap {
    camera: CameraState,
    size: Point,
    bounds: CameraBoundsOptions,
    style_default: CameraOptions,
    commits: usize,
}

impl HeadlessMap {
    pub fn new(camera: CameraState, size: Point) -> Self {
        Self {
            camera,
            size,
            bounds: CameraBoundsOptions::default(),
            style_default: CameraOptions::default(),
            commits: 0,
        }
    }

    pub fn with_bounds(mut self, bounds: CameraBoundsOptions) -> Self {
        self.bounds = bounds.sanitized();
        self.camera.zoom = self.bounds.clamp_zoom(self.camera.zoom);
        self.camera.pitch = self.bounds.clamp_pitch(self.camera.pitch);
        self
    }

    pub fn with_style_default_camera(mut self, camera: CameraOptions) -> Self {
        self.style_default = camera;
        self
    }

    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    /// Number of `set_camera` calls so far
    pub fn commit_count(&self) -> usize {
        self.commits
    }
}

impl CameraHost for HeadlessMap {
    fn camera_state(&self) -> CameraState {
        self.camera
    }

    fn set_camera(&mut self, camera: &CameraOptions) {
        self.commits += 1;
        let previous = self.camera;
        let mut next = previous;

        if let Some(padding) = camera.padding {
            next.padding = padding.sanitized();
        }
        if let Some(zoom) = camera.zoom.filter(|z| z.is_finite()) {
            next.zoom = self.bounds.clamp_zoom(zoom);
        }
        if let Some(bearing) = camera.bearing.filter(|b| b.is_finite()) {
            next.bearing = crate::camera::state::normalize_bearing(bearing);
        }
        if let Some(pitch) = camera.pitch.filter(|p| p.is_finite()) {
            next.pitch = self.bounds.clamp_pitch(pitch);
        }

        match (camera.center, camera.anchor) {
            (Some(center), _) => {
                if center.lat.is_finite() && center.lng.is_finite() {
                    next.center = center.normalized();
                }
                next.anchor = None;
            }
            (None, Some(anchor)) => {
                // keep the coordinate under the anchor fixed
                let pinned = Projection::new(&previous, self.size).screen_to_coordinate(&anchor);
                next.center = Projection::new(&next, self.size)
                    .center_for_anchor(&anchor, &pinned)
                    .normalized();
                next.anchor = Some(anchor);
            }
            (None, None) => next.anchor = None,
        }

        self.camera = next;
    }

    fn size(&self) -> Point {
        self.size
    }

    fn camera_bounds(&self) -> CameraBoundsOptions {
        self.bounds
    }

    fn style_default_camera(&self) -> CameraOptions {
        self.style_default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;

    fn map() -> HeadlessMap {
        HeadlessMap::new(CameraState::new(LatLng::new(40.0, -74.0), 10.0), Point::new(400.0, 300.0))
    }

    #[test]
    fn test_set_camera_clamps() {
        let mut map = map().with_bounds(CameraBoundsOptions {
            min_zoom: 2.0,
            max_zoom: 16.0,
            min_pitch: 0.0,
            max_pitch: 60.0,
        });
        map.set_camera(&CameraOptions::new().with_zoom(30.0).with_pitch(80.0).with_bearing(-30.0));
        let camera = map.camera_state();
        assert_eq!(camera.zoom, 16.0);
        assert_eq!(camera.pitch, 60.0);
        assert_eq!(camera.bearing, 330.0);
        assert_eq!(map.commit_count(), 1);
    }

    #[test]
    fn test_anchor_stays_fixed_while_zooming() {
        let mut map = map();
        let anchor = Point::new(50.0, 80.0);
        let pinned = map.projection().screen_to_coordinate(&anchor);
        map.set_camera(&CameraOptions::new().with_zoom(12.5).with_anchor(anchor));
        let after = map.projection().coordinate_to_screen(&pinned);
        assert!((after.x - anchor.x).abs() < 1e-6);
        assert!((after.y - anchor.y).abs() < 1e-6);
        assert_eq!(map.camera_state().anchor, Some(anchor));
    }

    #[test]
    fn test_center_wins_over_anchor() {
        let mut map = map();
        let center = LatLng::new(1.0, 2.0);
        map.set_camera(
            &CameraOptions::new()
                .with_center(center)
                .with_zoom(4.0)
                .with_anchor(Point::new(0.0, 0.0)),
        );
        assert_eq!(map.camera_state().center, center);
        assert_eq!(map.camera_state().anchor, None);
    }
}
