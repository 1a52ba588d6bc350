//! Fly-to path after van Wijk and Nuij, "Smooth and efficient zooming and panning"
//!
//! The camera zooms out while travelling and back in on arrival, following
//! the path that minimizes perceived motion for a given curvature.

use crate::camera::interpolation::{Interpolatable, Interpolation};
use crate::camera::state::{CameraOptions, CameraState};
use crate::core::config::CameraBoundsOptions;
use crate::core::constants::{FLY_TO_DEFAULT_SPEED, FLY_TO_RHO};
use crate::core::geo::{EdgeInsets, LatLng, Point};
use crate::core::projection::Projection;

/// Precomputed fly-to trajectory between two cameras
#[derive(Debug, Clone, PartialEq)]
pub struct FlyToInterpolator {
    start_zoom: f64,
    end_zoom: f64,
    start_bearing: f64,
    end_bearing: f64,
    start_pitch: f64,
    end_pitch: f64,
    start_padding: EdgeInsets,
    end_padding: EdgeInsets,
    /// Start and end centers in world points at `start_zoom`
    start_point: Point,
    end_point: Point,
    w0: f64,
    u1: f64,
    r0: f64,
    /// Zoom direction when the path has no travel
    zoom_only: Option<f64>,
    /// Total path length
    s: f64,
}

impl FlyToInterpolator {
    pub fn new(
        from: &CameraState,
        to: &CameraOptions,
        size: Point,
        bounds: &CameraBoundsOptions,
    ) -> Self {
        let target = from.merged(to);
        let start_zoom = from.zoom;
        let end_zoom = bounds.clamp_zoom(target.zoom);
        let end_pitch = bounds.clamp_pitch(target.pitch);

        let start_point = Projection::project(&from.center, start_zoom);
        let mut end_point = Projection::project(&target.center, start_zoom);
        // travel the short way around the antimeridian
        let world = Projection::world_size(start_zoom);
        end_point.x -= world * ((end_point.x - start_point.x) / world).round();

        let rho = FLY_TO_RHO;
        let rho2 = rho * rho;
        let w0 = (size.x - from.padding.horizontal())
            .max(size.y - from.padding.vertical())
            .max(1.0);
        let scale = 2_f64.powf(end_zoom - start_zoom);
        let w1 = w0 / scale;
        let u1 = start_point.distance_to(&end_point);

        let r = |i: i32| {
            let wi = if i == 0 { w0 } else { w1 };
            let sign = if i == 0 { 1.0 } else { -1.0 };
            let b = (w1 * w1 - w0 * w0 + sign * rho2 * rho2 * u1 * u1) / (2.0 * wi * rho2 * u1);
            ((b * b + 1.0).sqrt() - b).ln()
        };

        let mut r0 = 0.0;
        let mut zoom_only = None;
        let mut s = if u1 > 1e-6 {
            r0 = r(0);
            (r(1) - r0) / rho
        } else {
            f64::NAN
        };

        if !s.is_finite() {
            // no travel: pure zoom, or nothing at all
            if (w0 - w1).abs() < 1e-6 {
                s = 0.0;
                zoom_only = Some(0.0);
            } else {
                let k = if w1 < w0 { -1.0 } else { 1.0 };
                s = (w1 / w0).ln().abs() / rho;
                zoom_only = Some(k);
            }
        }

        Self {
            start_zoom,
            end_zoom,
            start_bearing: from.bearing,
            end_bearing: target.bearing,
            start_pitch: from.pitch,
            end_pitch,
            start_padding: from.padding,
            end_padding: target.padding,
            start_point,
            end_point,
            w0,
            u1,
            r0,
            zoom_only,
            s,
        }
    }

    /// Path length in screenfuls
    pub fn path_length(&self) -> f64 {
        self.s
    }

    /// Duration at the default speed, in seconds
    pub fn default_duration(&self) -> f64 {
        self.s / FLY_TO_DEFAULT_SPEED
    }

    /// Visible span relative to the start, at path distance `s`
    fn w(&self, s: f64) -> f64 {
        match self.zoom_only {
            Some(k) => (k * FLY_TO_RHO * s).exp(),
            None => self.r0.cosh() / (self.r0 + FLY_TO_RHO * s).cosh(),
        }
    }

    /// Distance travelled, as a fraction of the total, at path distance `s`
    fn u(&self, s: f64) -> f64 {
        match self.zoom_only {
            Some(_) => 0.0,
            None => {
                let rho2 = FLY_TO_RHO * FLY_TO_RHO;
                self.w0 * (self.r0.cosh() * (self.r0 + FLY_TO_RHO * s).tanh() - self.r0.sinh())
                    / rho2
                    / self.u1
            }
        }
    }

    /// Camera at `fraction` of the way along the path
    pub fn camera(&self, fraction: f64) -> CameraOptions {
        let fraction = fraction.clamp(0.0, 1.0);
        let (zoom, center) = if fraction >= 1.0 {
            (self.end_zoom, self.end_point)
        } else {
            let s = fraction * self.s;
            let zoom = self.start_zoom + (1.0 / self.w(s)).log2();
            let travelled = self.start_point.lerp(&self.end_point, self.u(s));
            (zoom, travelled)
        };
        let center: LatLng = Projection::unproject(&center, self.start_zoom).normalized();

        CameraOptions::new()
            .with_center(center)
            .with_zoom(zoom)
            .with_bearing(Interpolation::direction(self.start_bearing, self.end_bearing, fraction))
            .with_pitch(self.start_pitch.lerp(&self.end_pitch, fraction))
            .with_padding(self.start_padding.lerp(&self.end_padding, fraction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size() -> Point {
        Point::new(400.0, 400.0)
    }

    #[test]
    fn test_path_ends_at_target() {
        let from = CameraState::new(LatLng::new(37.77, -122.42), 12.0);
        let to = CameraOptions::new()
            .with_center(LatLng::new(40.71, -74.0))
            .with_zoom(14.0)
            .with_bearing(30.0);
        let fly = FlyToInterpolator::new(&from, &to, size(), &CameraBoundsOptions::default());
        let end = fly.camera(1.0);
        let center = end.center.unwrap();
        assert!((center.lat - 40.71).abs() < 1e-6);
        assert!((center.lng + 74.0).abs() < 1e-6);
        assert_eq!(end.zoom, Some(14.0));
        assert!((end.bearing.unwrap() - 30.0).abs() < 1e-9);

        let start = fly.camera(0.0);
        assert!((start.zoom.unwrap() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_long_flight_zooms_out_midway() {
        let from = CameraState::new(LatLng::new(37.77, -122.42), 12.0);
        let to = CameraOptions::new()
            .with_center(LatLng::new(40.71, -74.0))
            .with_zoom(12.0);
        let fly = FlyToInterpolator::new(&from, &to, size(), &CameraBoundsOptions::default());
        assert!(fly.camera(0.5).zoom.unwrap() < 8.0);
        assert!(fly.default_duration() > 0.0);
    }

    #[test]
    fn test_zoom_only_path() {
        let from = CameraState::new(LatLng::new(10.0, 10.0), 3.0);
        let to = CameraOptions::new().with_zoom(7.0);
        let fly = FlyToInterpolator::new(&from, &to, size(), &CameraBoundsOptions::default());
        let mid = fly.camera(0.5);
        assert!((mid.zoom.unwrap() - 5.0).abs() < 1e-6);
        assert!((mid.center.unwrap().lat - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_target_zoom_is_clamped() {
        let from = CameraState::new(LatLng::new(0.0, 0.0), 3.0);
        let to = CameraOptions::new().with_zoom(40.0);
        let fly = FlyToInterpolator::new(&from, &to, size(), &CameraBoundsOptions::default());
        assert_eq!(fly.camera(1.0).zoom, Some(22.0));
    }

    #[test]
    fn test_same_camera_has_empty_path() {
        let from = CameraState::new(LatLng::new(0.0, 0.0), 3.0);
        let fly = FlyToInterpolator::new(&from, &CameraOptions::new(), size(), &CameraBoundsOptions::default());
        assert_eq!(fly.path_length(), 0.0);
        assert_eq!(fly.default_duration(), 0.0);
    }
}
