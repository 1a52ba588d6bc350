use crate::camera::state::{normalize_bearing, CameraOptions};
use crate::core::geo::{EdgeInsets, LatLng, Point};

/// Values that can be smoothly transitioned
pub trait Interpolatable {
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

/// Interpolation helpers
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two f64 values
    pub fn linear(start: f64, end: f64, t: f64) -> f64 {
        start + (end - start) * t
    }

    /// Interpolates an angle in degrees along the shorter arc, result in [0, 360)
    pub fn direction(start: f64, end: f64, t: f64) -> f64 {
        let delta = (end - start + 180.0).rem_euclid(360.0) - 180.0;
        normalize_bearing(start + delta * t)
    }

    /// Interpolates a coordinate, crossing the antimeridian when that is shorter
    pub fn coordinate(start: &LatLng, end: &LatLng, t: f64) -> LatLng {
        let lng = start.lng + start.shortest_lng_delta(end) * t;
        LatLng::new(Self::linear(start.lat, end.lat, t), LatLng::wrap_lng(lng))
    }
}

impl Interpolatable for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Interpolation::linear(*self, *other, t)
    }
}

impl Interpolatable for Point {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Point::new(
            Interpolation::linear(self.x, other.x, t),
            Interpolation::linear(self.y, other.y, t),
        )
    }
}

impl Interpolatable for EdgeInsets {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        EdgeInsets::new(
            self.top.lerp(&other.top, t),
            self.left.lerp(&other.left, t),
            self.bottom.lerp(&other.bottom, t),
            self.right.lerp(&other.right, t),
        )
    }
}

/// Produces intermediate cameras between two partial cameras
///
/// A field is interpolated only when both ends set it; otherwise it is left
/// unset so the camera keeps its current value. The anchor is not
/// interpolated; only the target's anchor is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraOptionsInterpolator;

impl CameraOptionsInterpolator {
    pub fn interpolate(from: &CameraOptions, to: &CameraOptions, fraction: f64) -> CameraOptions {
        fn both<T: Copy>(a: Option<T>, b: Option<T>, f: impl Fn(T, T) -> T) -> Option<T> {
            match (a, b) {
                (Some(a), Some(b)) => Some(f(a, b)),
                _ => None,
            }
        }

        CameraOptions {
            center: both(from.center, to.center, |a, b| {
                Interpolation::coordinate(&a, &b, fraction)
            }),
            zoom: both(from.zoom, to.zoom, |a, b| a.lerp(&b, fraction)),
            bearing: both(from.bearing, to.bearing, |a, b| {
                Interpolation::direction(a, b, fraction)
            }),
            pitch: both(from.pitch, to.pitch, |a, b| a.lerp(&b, fraction)),
            padding: both(from.padding, to.padding, |a, b| a.lerp(&b, fraction)),
            anchor: to.anchor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> CameraOptions {
        CameraOptions::new()
            .with_center(LatLng::new(52.5, 13.4))
            .with_zoom(11.0)
            .with_bearing(123.0)
            .with_pitch(45.0)
            .with_padding(EdgeInsets::new(10.0, 20.0, 30.0, 40.0))
    }

    #[test]
    fn test_interpolating_to_itself_is_identity() {
        let x = camera();
        for step in 0..=10 {
            let f = step as f64 / 10.0;
            assert_eq!(CameraOptionsInterpolator::interpolate(&x, &x, f), x);
        }
    }

    #[test]
    fn test_bearing_takes_shortest_path() {
        let from = CameraOptions::new().with_bearing(350.0);
        let to = CameraOptions::new().with_bearing(10.0);
        let mid = CameraOptionsInterpolator::interpolate(&from, &to, 0.5);
        assert!(mid.bearing.unwrap().abs() < 1e-9);
        let quarter = CameraOptionsInterpolator::interpolate(&from, &to, 0.25);
        assert!((quarter.bearing.unwrap() - 355.0).abs() < 1e-9);
    }

    #[test]
    fn test_center_crosses_antimeridian() {
        let from = LatLng::new(0.0, 170.0);
        let to = LatLng::new(10.0, -170.0);
        let mid = Interpolation::coordinate(&from, &to, 0.5);
        assert!((mid.lat - 5.0).abs() < 1e-9);
        assert!((mid.lng.abs() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_fields_stay_unset() {
        let from = CameraOptions::new().with_zoom(2.0);
        let to = CameraOptions::new().with_zoom(10.0).with_pitch(40.0);
        let mid = CameraOptionsInterpolator::interpolate(&from, &to, 0.5);
        assert_eq!(mid.zoom, Some(6.0));
        assert_eq!(mid.pitch, None);
    }

    #[test]
    fn test_only_target_anchor_is_used() {
        let from = CameraOptions::new().with_zoom(2.0).with_anchor(Point::new(70.0, 60.0));
        let to = CameraOptions::new().with_zoom(4.0);
        assert_eq!(CameraOptionsInterpolator::interpolate(&from, &to, 0.5).anchor, None);
        let to = to.with_anchor(Point::new(10.0, 10.0));
        assert_eq!(
            CameraOptionsInterpolator::interpolate(&from, &to, 0.5).anchor,
            Some(Point::new(10.0, 10.0))
        );
    }

    #[test]
    fn test_linear_interpolation() {
        assert_eq!(Interpolation::linear(0.0, 10.0, 0.5), 5.0);
        assert_eq!(Interpolation::linear(0.0, 10.0, 0.0), 0.0);
        assert_eq!(Interpolation::linear(0.0, 10.0, 1.0), 10.0);
    }
}
