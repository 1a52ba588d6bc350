//! Viewport states and their target camera streams
//!
//! A state turns into a [`TargetStream`]: a channel of cameras the viewport
//! should move to. Fixed cameras, overviews and the style default emit once;
//! a follow-target state emits every time the tracked location moves; idle
//! never emits.

use crossbeam_channel::{Receiver, Sender};
use geo::BoundingRect;
use geo_types::Geometry;
use serde::{Deserialize, Serialize};

use crate::camera::state::CameraOptions;
use crate::core::geo::{EdgeInsets, LatLng, LatLngBounds};
use crate::core::map::CameraHost;
use crate::core::projection::{camera_for_coordinates, FitOptions};
use crate::{MotionError, Result};

/// Where the bearing of a follow-target camera comes from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowBearing {
    Constant(f64),
    /// Direction the tracked device is pointing
    Heading,
    /// Direction the tracked device is moving
    Course,
}

impl Default for FollowBearing {
    fn default() -> Self {
        FollowBearing::Heading
    }
}

/// A position update of the tracked subject
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub coordinate: LatLng,
    pub heading: Option<f64>,
    pub course: Option<f64>,
}

impl Location {
    pub fn new(coordinate: LatLng) -> Self {
        Self {
            coordinate,
            heading: None,
            course: None,
        }
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn with_course(mut self, course: f64) -> Self {
        self.course = Some(course);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowTargetOptions {
    pub zoom: f64,
    pub bearing: FollowBearing,
    pub pitch: f64,
    pub padding: EdgeInsets,
}

impl Default for FollowTargetOptions {
    fn default() -> Self {
        Self {
            zoom: 16.35,
            bearing: FollowBearing::default(),
            pitch: 45.0,
            padding: EdgeInsets::zero(),
        }
    }
}

impl FollowTargetOptions {
    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_bearing(mut self, bearing: FollowBearing) -> Self {
        self.bearing = bearing;
        self
    }

    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_padding(mut self, padding: EdgeInsets) -> Self {
        self.padding = padding;
        self
    }

    /// Camera centered on `location`; the bearing is left out when the
    /// location lacks the value the bearing mode reads
    pub fn camera_for(&self, location: &Location) -> CameraOptions {
        let mut camera = CameraOptions::new()
            .with_center(location.coordinate)
            .with_zoom(self.zoom)
            .with_pitch(self.pitch)
            .with_padding(self.padding);
        camera.bearing = match self.bearing {
            FollowBearing::Constant(bearing) => Some(bearing),
            FollowBearing::Heading => location.heading,
            FollowBearing::Course => location.course,
        };
        camera
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverviewOptions {
    pub geometry: Geometry<f64>,
    /// Room kept between the geometry and the padded area
    pub geometry_padding: EdgeInsets,
    pub padding: EdgeInsets,
    pub bearing: f64,
    pub pitch: f64,
    pub max_zoom: Option<f64>,
}

impl OverviewOptions {
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: geometry.into(),
            geometry_padding: EdgeInsets::zero(),
            padding: EdgeInsets::zero(),
            bearing: 0.0,
            pitch: 0.0,
            max_zoom: None,
        }
    }

    pub fn with_geometry_padding(mut self, padding: EdgeInsets) -> Self {
        self.geometry_padding = padding;
        self
    }

    pub fn with_padding(mut self, padding: EdgeInsets) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = bearing;
        self
    }

    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_max_zoom(mut self, max_zoom: f64) -> Self {
        self.max_zoom = Some(max_zoom);
        self
    }

    /// Camera fitting the bounding box of the geometry
    pub fn camera(&self, host: &dyn CameraHost) -> Result<CameraOptions> {
        let rect = self.geometry.bounding_rect().ok_or(MotionError::EmptyGeometry)?;
        let (min, max) = (rect.min(), rect.max());
        let corners = LatLngBounds::from_coords(min.y, min.x, max.y, max.x).corners();
        let bounds = host.camera_bounds();
        let fit = FitOptions {
            padding: self.padding,
            geometry_padding: self.geometry_padding,
            bearing: self.bearing,
            pitch: bounds.clamp_pitch(self.pitch),
            min_zoom: bounds.min_zoom,
            max_zoom: self
                .max_zoom
                .map_or(bounds.max_zoom, |zoom| bounds.clamp_zoom(zoom)),
        };
        camera_for_coordinates(&corners, host.size(), &fit).ok_or(MotionError::EmptyGeometry)
    }
}

/// What the viewport is showing, or about to show
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportState {
    /// A fixed camera
    Camera(CameraOptions),
    Overview(OverviewOptions),
    FollowTarget(FollowTargetOptions),
    /// The camera described by the loaded style
    StyleDefault,
    /// Leave the camera where it is
    Idle,
}

impl ViewportState {
    /// Stream of target cameras for this state
    pub fn make_target_stream(&self, host: &dyn CameraHost, hub: &mut LocationHub) -> Result<TargetStream> {
        match self {
            ViewportState::Camera(camera) => Ok(TargetStream::once(*camera)),
            ViewportState::Overview(options) => Ok(TargetStream::once(options.camera(host)?)),
            ViewportState::FollowTarget(options) => Ok(hub.subscribe(*options)),
            ViewportState::StyleDefault => Ok(TargetStream::once(host.style_default_camera())),
            ViewportState::Idle => Ok(TargetStream::empty()),
        }
    }

    /// Whether new targets keep arriving after the first
    pub fn is_continuous(&self) -> bool {
        matches!(self, ViewportState::FollowTarget(_))
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ViewportState::Idle)
    }
}

/// Receiving end of a state's target cameras
#[derive(Debug)]
pub struct TargetStream {
    receiver: Option<Receiver<CameraOptions>>,
}

impl TargetStream {
    /// Stream over targets produced elsewhere
    pub fn from_receiver(receiver: Receiver<CameraOptions>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    /// Stream that yields `camera` and ends
    pub fn once(camera: CameraOptions) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        // capacity is one and the receiver is alive
        let _ = sender.send(camera);
        Self::from_receiver(receiver)
    }

    /// Stream that never yields
    pub fn empty() -> Self {
        let (_, receiver) = crossbeam_channel::bounded(0);
        Self::from_receiver(receiver)
    }

    /// Newest pending target, skipping older ones
    pub fn latest(&mut self) -> Option<CameraOptions> {
        self.receiver.as_ref()?.try_iter().last()
    }

    /// Stops the stream; a follow-target subscription is dropped by the hub on its next update
    pub fn cancel(&mut self) {
        self.receiver = None;
    }

    pub fn is_cancelled(&self) -> bool {
        self.receiver.is_none()
    }
}

struct Subscriber {
    options: FollowTargetOptions,
    sender: Sender<CameraOptions>,
}

/// Fans tracked-location updates out to follow-target streams
#[derive(Default)]
pub struct LocationHub {
    latest: Option<Location>,
    subscribers: Vec<Subscriber>,
}

impl LocationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<&Location> {
        self.latest.as_ref()
    }

    /// Stream that emits a camera for the latest location and every update after it
    pub fn subscribe(&mut self, options: FollowTargetOptions) -> TargetStream {
        let (sender, receiver) = crossbeam_channel::unbounded();
        if let Some(location) = &self.latest {
            let _ = sender.send(options.camera_for(location));
        }
        self.subscribers.push(Subscriber { options, sender });
        TargetStream::from_receiver(receiver)
    }

    /// Publishes a location, dropping subscribers whose stream was cancelled
    pub fn update(&mut self, location: Location) {
        self.latest = Some(location);
        self.subscribers
            .retain(|subscriber| subscriber.sender.send(subscriber.options.camera_for(&location)).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::state::CameraState;
    use crate::core::geo::Point;
    use crate::core::map::HeadlessMap;
    use geo_types::{line_string, point, GeometryCollection};

    fn map() -> HeadlessMap {
        HeadlessMap::new(CameraState::new(LatLng::new(0.0, 0.0), 2.0), Point::new(400.0, 400.0))
    }

    #[test]
    fn test_fixed_camera_emits_once() {
        let mut hub = LocationHub::new();
        let state = ViewportState::Camera(CameraOptions::new().with_zoom(5.0));
        let mut stream = state.make_target_stream(&map(), &mut hub).unwrap();
        assert_eq!(stream.latest(), Some(CameraOptions::new().with_zoom(5.0)));
        assert_eq!(stream.latest(), None);
    }

    #[test]
    fn test_idle_never_emits() {
        let mut hub = LocationHub::new();
        let mut stream = ViewportState::Idle.make_target_stream(&map(), &mut hub).unwrap();
        assert_eq!(stream.latest(), None);
    }

    #[test]
    fn test_follow_target_reemits() {
        let mut hub = LocationHub::new();
        hub.update(Location::new(LatLng::new(1.0, 1.0)).with_heading(90.0));
        let state = ViewportState::FollowTarget(FollowTargetOptions::default().with_zoom(15.0));
        let mut stream = state.make_target_stream(&map(), &mut hub).unwrap();
        let first = stream.latest().unwrap();
        assert_eq!(first.center, Some(LatLng::new(1.0, 1.0)));
        assert_eq!(first.bearing, Some(90.0));

        hub.update(Location::new(LatLng::new(2.0, 2.0)));
        hub.update(Location::new(LatLng::new(3.0, 3.0)));
        let latest = stream.latest().unwrap();
        assert_eq!(latest.center, Some(LatLng::new(3.0, 3.0)));
        assert_eq!(latest.bearing, None);

        stream.cancel();
        hub.update(Location::new(LatLng::new(4.0, 4.0)));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_overview_fits_geometry() {
        let line = line_string![(x: -10.0, y: -10.0), (x: 10.0, y: 10.0)];
        let camera = OverviewOptions::new(line)
            .with_max_zoom(20.0)
            .camera(&map())
            .unwrap();
        let center = camera.center.unwrap();
        assert!(center.lat.abs() < 1e-6 && center.lng.abs() < 1e-6);
        assert!(camera.zoom.unwrap() > 0.0);

        let single = OverviewOptions::new(point!(x: 5.0, y: 5.0)).with_max_zoom(12.0);
        assert_eq!(single.camera(&map()).unwrap().zoom, Some(12.0));
    }

    #[test]
    fn test_overview_of_empty_geometry() {
        let empty = OverviewOptions::new(Geometry::GeometryCollection(GeometryCollection(Vec::new())));
        assert!(matches!(empty.camera(&map()), Err(MotionError::EmptyGeometry)));
    }
}
