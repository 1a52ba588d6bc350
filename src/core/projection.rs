//! Web Mercator projection for camera math
//!
//! World coordinates are in screen points, with a world of `TILE_SIZE * 2^zoom`
//! points across. Pitch is not taken into account: drag and anchor math treat
//! the map as seen from straight above.

use std::f64::consts::PI;

use crate::camera::state::{CameraOptions, CameraState};
use crate::core::constants::TILE_SIZE;
use crate::core::geo::{EdgeInsets, LatLng, Point};

/// Converts between coordinates, world points and screen points for one camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    camera: CameraState,
    size: Point,
}

impl Projection {
    pub fn new(camera: &CameraState, size: Point) -> Self {
        Self {
            camera: *camera,
            size,
        }
    }

    /// Width of the world in points at `zoom`
    pub fn world_size(zoom: f64) -> f64 {
        TILE_SIZE * 2_f64.powf(zoom)
    }

    /// Projects a coordinate to world points at `zoom`
    pub fn project(lat_lng: &LatLng, zoom: f64) -> Point {
        let world = Self::world_size(zoom);
        let lat = LatLng::clamp_lat(lat_lng.lat).to_radians();
        let x = (lat_lng.lng + 180.0) / 360.0 * world;
        let y = (1.0 - (PI / 4.0 + lat / 2.0).tan().ln() / PI) / 2.0 * world;
        Point::new(x, y)
    }

    /// Inverse of [`Projection::project`]; longitude is left unwrapped
    pub fn unproject(point: &Point, zoom: f64) -> LatLng {
        let world = Self::world_size(zoom);
        let lng = point.x / world * 360.0 - 180.0;
        let n = PI - 2.0 * PI * point.y / world;
        let lat = n.sinh().atan().to_degrees();
        LatLng::new(lat, lng)
    }

    /// Screen point the camera center is drawn at, inside the padding
    pub fn screen_center(&self) -> Point {
        padded_center(self.size, &self.camera.padding)
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn size(&self) -> Point {
        self.size
    }

    pub fn screen_to_coordinate(&self, point: &Point) -> LatLng {
        let zoom = self.camera.zoom;
        let offset = point.subtract(&self.screen_center()).rotate(self.camera.bearing);
        let world = Self::project(&self.camera.center, zoom).add(&offset);
        Self::unproject(&world, zoom)
    }

    pub fn coordinate_to_screen(&self, lat_lng: &LatLng) -> Point {
        let zoom = self.camera.zoom;
        let world = Self::world_size(zoom);
        let mut offset = Self::project(lat_lng, zoom).subtract(&Self::project(&self.camera.center, zoom));
        // pick the copy of the world closest to the center
        offset.x -= world * (offset.x / world).round();
        self.screen_center().add(&offset.rotate(-self.camera.bearing))
    }

    /// Camera change that moves the map content under `from` to `to`
    pub fn drag(&self, from: &Point, to: &Point) -> CameraOptions {
        let zoom = self.camera.zoom;
        let delta = to.subtract(from).rotate(self.camera.bearing);
        let world = Self::project(&self.camera.center, zoom).subtract(&delta);
        CameraOptions::new().with_center(Self::unproject(&world, zoom).normalized())
    }

    /// Center that puts `lat_lng` under the screen point `anchor` for this camera
    pub fn center_for_anchor(&self, anchor: &Point, lat_lng: &LatLng) -> LatLng {
        let zoom = self.camera.zoom;
        let offset = anchor.subtract(&self.screen_center()).rotate(self.camera.bearing);
        let world = Self::project(lat_lng, zoom).subtract(&offset);
        Self::unproject(&world, zoom)
    }
}

/// Center of the area left inside `padding`
pub fn padded_center(size: Point, padding: &EdgeInsets) -> Point {
    Point::new(
        (padding.left + size.x - padding.right) / 2.0,
        (padding.top + size.y - padding.bottom) / 2.0,
    )
}

/// Parameters for fitting a set of coordinates on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Camera padding of the result
    pub padding: EdgeInsets,
    /// Extra room kept between the coordinates and the padded area
    pub geometry_padding: EdgeInsets,
    pub bearing: f64,
    pub pitch: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

/// Camera that shows every coordinate, rotated by `options.bearing`
///
/// Returns `None` for an empty coordinate list.
pub fn camera_for_coordinates(
    coordinates: &[LatLng],
    size: Point,
    options: &FitOptions,
) -> Option<CameraOptions> {
    if coordinates.is_empty() {
        return None;
    }
    // Work at zoom 0 in the rotated screen frame.
    let first = Projection::project(&coordinates[0], 0.0);
    let rotated: Vec<Point> = coordinates
        .iter()
        .map(|c| {
            let mut world = Projection::project(c, 0.0);
            // keep every point on the same world copy as the first one
            world.x -= TILE_SIZE * ((world.x - first.x) / TILE_SIZE).round();
            world.rotate(-options.bearing)
        })
        .collect();

    let (mut min, mut max) = (rotated[0], rotated[0]);
    for p in &rotated[1..] {
        min = Point::new(min.x.min(p.x), min.y.min(p.y));
        max = Point::new(max.x.max(p.x), max.y.max(p.y));
    }
    let extent = max.subtract(&min);

    let inset = options.padding.add(&options.geometry_padding);
    let available = Point::new(
        (size.x - inset.horizontal()).max(1.0),
        (size.y - inset.vertical()).max(1.0),
    );
    let scale_x = if extent.x > 0.0 { available.x / extent.x } else { f64::INFINITY };
    let scale_y = if extent.y > 0.0 { available.y / extent.y } else { f64::INFINITY };
    let scale = scale_x.min(scale_y);
    let zoom = if scale.is_finite() {
        scale.log2().clamp(options.min_zoom, options.max_zoom)
    } else {
        options.max_zoom
    };

    // Shift for uneven geometry padding, converted to zoom 0 points.
    let gp = &options.geometry_padding;
    let shift = Point::new((gp.left - gp.right) / 2.0, (gp.top - gp.bottom) / 2.0)
        .multiply(1.0 / 2_f64.powf(zoom));
    let box_center = min.add(&max).multiply(0.5).subtract(&shift);
    let center = Projection::unproject(&box_center.rotate(options.bearing), 0.0).normalized();

    Some(
        CameraOptions::new()
            .with_center(center)
            .with_zoom(zoom)
            .with_bearing(options.bearing)
            .with_pitch(options.pitch)
            .with_padding(options.padding),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{} != {}", a, b);
    }

    #[test]
    fn test_project_unproject() {
        let coordinate = LatLng::new(37.7749, -122.4194);
        let back = Projection::unproject(&Projection::project(&coordinate, 7.5), 7.5);
        assert_close(back.lat, coordinate.lat);
        assert_close(back.lng, coordinate.lng);
    }

    #[test]
    fn test_screen_center_maps_to_camera_center() {
        let camera = CameraState::new(LatLng::new(48.0, 11.0), 10.0).with_bearing(40.0);
        let projection = Projection::new(&camera, Point::new(400.0, 300.0));
        let c = projection.screen_to_coordinate(&Point::new(200.0, 150.0));
        assert_close(c.lat, 48.0);
        assert_close(c.lng, 11.0);
    }

    #[test]
    fn test_screen_round_trip_with_bearing() {
        let camera = CameraState::new(LatLng::new(-33.0, 151.0), 12.0).with_bearing(135.0);
        let projection = Projection::new(&camera, Point::new(400.0, 300.0));
        let point = Point::new(37.0, 260.0);
        let back = projection.coordinate_to_screen(&projection.screen_to_coordinate(&point));
        assert_close(back.x, point.x);
        assert_close(back.y, point.y);
    }

    #[test]
    fn test_drag_moves_content_with_finger() {
        let camera = CameraState::new(LatLng::new(0.0, 0.0), 3.0);
        let projection = Projection::new(&camera, Point::new(400.0, 400.0));
        let from = Point::new(200.0, 200.0);
        let to = Point::new(250.0, 200.0);
        let grabbed = projection.screen_to_coordinate(&from);
        let dragged = camera.merged(&projection.drag(&from, &to));
        let after = Projection::new(&dragged, Point::new(400.0, 400.0)).coordinate_to_screen(&grabbed);
        assert_close(after.x, to.x);
        assert_close(after.y, to.y);
        // dragging right moves the camera west
        assert!(dragged.center.lng < 0.0);
    }

    #[test]
    fn test_camera_for_coordinates() {
        let coordinates = [LatLng::new(-10.0, -10.0), LatLng::new(10.0, 10.0)];
        let options = FitOptions {
            padding: EdgeInsets::zero(),
            geometry_padding: EdgeInsets::zero(),
            bearing: 0.0,
            pitch: 0.0,
            min_zoom: 0.0,
            max_zoom: 22.0,
        };
        let camera = camera_for_coordinates(&coordinates, Point::new(512.0, 512.0), &options).unwrap();
        let center = camera.center.unwrap();
        assert_close(center.lat, 0.0);
        assert_close(center.lng, 0.0);
        // 20 degrees of longitude span 512/18 points at zoom 0
        let expected = (512.0_f64 / (512.0 * 20.0 / 360.0)).log2();
        assert!(camera.zoom.unwrap() <= expected + 1e-9);

        let single = camera_for_coordinates(&coordinates[..1], Point::new(512.0, 512.0), &options).unwrap();
        assert_eq!(single.zoom, Some(22.0));
        assert!(camera_for_coordinates(&[], Point::new(512.0, 512.0), &options).is_none());
    }
}
