use serde::{Deserialize, Serialize};

use crate::core::geo::{EdgeInsets, LatLng, Point};

/// A complete camera pose
///
/// Values are replaced wholesale, never patched in place: use
/// [`CameraState::merged`] to derive the next state from a [`CameraOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub center: LatLng,
    pub zoom: f64,
    /// Degrees clockwise from north, in [0, 360)
    pub bearing: f64,
    pub pitch: f64,
    pub padding: EdgeInsets,
    /// Screen point used instead of the center as zoom and rotation pivot
    pub anchor: Option<Point>,
}

impl CameraState {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            ..Self::default()
        }
    }

    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = normalize_bearing(bearing);
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

    /// Returns a new state where every field set in `options` overrides this one
    pub fn merged(&self, options: &CameraOptions) -> CameraState {
        CameraState {
            center: options.center.unwrap_or(self.center),
            zoom: options.zoom.unwrap_or(self.zoom),
            bearing: options.bearing.map(normalize_bearing).unwrap_or(self.bearing),
            pitch: options.pitch.unwrap_or(self.pitch),
            padding: options.padding.unwrap_or(self.padding),
            anchor: options.anchor.or(self.anchor),
        }
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            center: LatLng::default(),
            zoom: 0.0,
            bearing: 0.0,
            pitch: 0.0,
            padding: EdgeInsets::zero(),
            anchor: None,
        }
    }
}

/// A partial camera: only the fields that are set get applied
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraOptions {
    pub center: Option<LatLng>,
    pub zoom: Option<f64>,
    pub bearing: Option<f64>,
    pub pitch: Option<f64>,
    pub padding: Option<EdgeInsets>,
    pub anchor: Option<Point>,
}

impl CameraOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_center(mut self, center: LatLng) -> Self {
        self.center = Some(center);
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = Some(bearing);
        self
    }

    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn with_padding(mut self, padding: EdgeInsets) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn with_anchor(mut self, anchor: Point) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields() == CameraFields::default()
    }

    /// Overlays the set fields of `other` onto this one
    pub fn merge(&mut self, other: &CameraOptions) {
        self.center = other.center.or(self.center);
        self.zoom = other.zoom.or(self.zoom);
        self.bearing = other.bearing.or(self.bearing);
        self.pitch = other.pitch.or(self.pitch);
        self.padding = other.padding.or(self.padding);
        self.anchor = other.anchor.or(self.anchor);
    }

    /// Which fields are set
    pub fn fields(&self) -> CameraFields {
        CameraFields {
            center: self.center.is_some(),
            zoom: self.zoom.is_some(),
            bearing: self.bearing.is_some(),
            pitch: self.pitch.is_some(),
            padding: self.padding.is_some(),
            anchor: self.anchor.is_some(),
        }
    }
}

impl From<&CameraState> for CameraOptions {
    fn from(state: &CameraState) -> Self {
        Self {
            center: Some(state.center),
            zoom: Some(state.zoom),
            bearing: Some(state.bearing),
            pitch: Some(state.pitch),
            padding: Some(state.padding),
            anchor: state.anchor,
        }
    }
}

impl From<CameraState> for CameraOptions {
    fn from(state: CameraState) -> Self {
        Self::from(&state)
    }
}

/// The set of fields present in a [`CameraOptions`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CameraFields {
    pub center: bool,
    pub zoom: bool,
    pub bearing: bool,
    pub pitch: bool,
    pub padding: bool,
    pub anchor: bool,
}

/// Wraps a bearing into [0, 360)
pub fn normalize_bearing(bearing: f64) -> f64 {
    let wrapped = bearing.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_only_overwrites_set_fields() {
        let state = CameraState::new(LatLng::new(10.0, 20.0), 5.0).with_pitch(30.0);
        let merged = state.merged(&CameraOptions::new().with_zoom(8.0));
        assert_eq!(merged.zoom, 8.0);
        assert_eq!(merged.center, state.center);
        assert_eq!(merged.pitch, 30.0);
    }

    #[test]
    fn test_merge_normalizes_bearing() {
        let state = CameraState::default();
        assert_eq!(state.merged(&CameraOptions::new().with_bearing(-90.0)).bearing, 270.0);
        assert_eq!(state.merged(&CameraOptions::new().with_bearing(720.0)).bearing, 0.0);
    }

    #[test]
    fn test_options_overlay() {
        let mut base = CameraOptions::new().with_zoom(3.0).with_pitch(10.0);
        base.merge(&CameraOptions::new().with_zoom(4.0).with_bearing(90.0));
        assert_eq!(base.zoom, Some(4.0));
        assert_eq!(base.pitch, Some(10.0));
        assert_eq!(base.bearing, Some(90.0));
    }

    #[test]
    fn test_fields() {
        assert!(CameraOptions::new().is_empty());
        let fields = CameraOptions::new().with_zoom(1.0).fields();
        assert!(fields.zoom);
        assert!(!fields.center);
    }
}
