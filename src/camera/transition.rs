use crate::camera::state::{CameraOptions, CameraState};
use crate::core::geo::Point;
use crate::core::projection::Projection;

/// Working copy handed to an animator each tick
///
/// `camera` starts as the camera the host holds right now, so changes other
/// animators committed earlier in the same tick are visible. Only the fields
/// that end up different from that seed are committed.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraTransition {
    /// Camera when the animator first ran
    from: CameraState,
    seed: CameraState,
    pub camera: CameraState,
    anchor: Option<Point>,
    /// Progress after the timing curve, in [0, 1]
    pub fraction_complete: f64,
    size: Point,
}

impl CameraTransition {
    pub fn new(from: CameraState, current: CameraState, fraction_complete: f64, size: Point) -> Self {
        Self {
            from,
            seed: current,
            camera: current,
            anchor: None,
            fraction_complete,
            size,
        }
    }

    pub fn from(&self) -> &CameraState {
        &self.from
    }

    /// Camera at the start of this tick
    pub fn current(&self) -> &CameraState {
        &self.seed
    }

    pub fn size(&self) -> Point {
        self.size
    }

    /// Projection of the camera at the start of this tick
    pub fn projection(&self) -> Projection {
        Projection::new(&self.seed, self.size)
    }

    /// Writes the set fields of `options` into the working camera
    pub fn apply(&mut self, options: &CameraOptions) {
        self.camera = self.camera.merged(options);
        self.anchor = options.anchor.or(self.anchor);
    }

    /// Fields that differ from the seed, plus the pivot if one was set
    pub fn changes(&self) -> CameraOptions {
        fn changed<T: PartialEq + Copy>(seed: T, value: T) -> Option<T> {
            (seed != value).then_some(value)
        }

        CameraOptions {
            center: changed(self.seed.center, self.camera.center),
            zoom: changed(self.seed.zoom, self.camera.zoom),
            bearing: changed(self.seed.bearing, self.camera.bearing),
            pitch: changed(self.seed.pitch, self.camera.pitch),
            padding: changed(self.seed.padding, self.camera.padding),
            anchor: self.anchor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;

    #[test]
    fn test_changes_only_report_modified_fields() {
        let state = CameraState::new(LatLng::new(1.0, 2.0), 4.0);
        let mut transition = CameraTransition::new(state, state, 0.5, Point::new(100.0, 100.0));
        assert!(transition.changes().is_empty());

        transition.apply(&CameraOptions::new().with_zoom(5.0).with_center(LatLng::new(1.0, 2.0)));
        let changes = transition.changes();
        assert_eq!(changes.zoom, Some(5.0));
        assert_eq!(changes.center, None);
    }

    #[test]
    fn test_anchor_is_carried() {
        let state = CameraState::default();
        let mut transition = CameraTransition::new(state, state, 0.0, Point::new(100.0, 100.0));
        transition.apply(&CameraOptions::new().with_zoom(1.0).with_anchor(Point::new(5.0, 5.0)));
        assert_eq!(transition.changes().anchor, Some(Point::new(5.0, 5.0)));
    }
}
