use mapmotion::prelude::*;
use std::sync::{Arc, Mutex};

/// Touch sequences driven through the gesture manager
#[cfg(test)]
mod gesture_tests {
    use super::*;

    fn setup() -> (GestureManager, HeadlessMap, CameraAnimatorsRunner) {
        (
            GestureManager::default(),
            HeadlessMap::new(CameraState::new(LatLng::new(0.0, 0.0), 4.0), Point::new(400.0, 400.0)),
            CameraAnimatorsRunner::new(),
        )
    }

    /// Second finger placed `length` points away at `degrees` from horizontal
    fn pair(degrees: f64, dy: f64) -> Vec<TouchPoint> {
        let length = 100.0;
        let radians = degrees.to_radians();
        vec![
            TouchPoint::new(1, 150.0, 150.0 + dy),
            TouchPoint::new(2, 150.0 + length * radians.cos(), 150.0 + length * radians.sin() + dy),
        ]
    }

    fn two_finger_drag(degrees: f64) -> (Vec<GestureEvent>, GestureManager, HeadlessMap) {
        let (mut manager, mut map, mut runner) = setup();
        let t0 = Instant::now();
        let mut events = manager.handle_touch(&TouchEvent::start(pair(degrees, 0.0), t0), &mut map, &mut runner);
        events.extend(manager.handle_touch(
            &TouchEvent::moved(pair(degrees, 20.0), t0 + Duration::from_millis(16)),
            &mut map,
            &mut runner,
        ));
        (events, manager, map)
    }

    #[test]
    fn test_gentle_two_finger_drag_pitches() {
        let (events, manager, _) = two_finger_drag(30.0);
        assert_eq!(events, vec![GestureEvent::Began(GestureType::Pitch)]);
        assert_eq!(manager.active_gestures(), vec![GestureType::Pitch]);
        assert_eq!(manager.recognizer_state(GestureType::Pan), Some(RecognizerState::Failed));
    }

    #[test]
    fn test_steep_two_finger_drag_pans() {
        let (events, manager, map) = two_finger_drag(50.0);
        assert_eq!(events, vec![GestureEvent::Began(GestureType::Pan)]);
        assert_eq!(manager.recognizer_state(GestureType::Pitch), Some(RecognizerState::Failed));
        assert_eq!(map.camera_state().pitch, 0.0);
    }

    #[test]
    fn test_pitch_follows_vertical_drag() {
        let (mut manager, mut map, mut runner) = setup();
        let t0 = Instant::now();
        let step = |ms: u64| t0 + Duration::from_millis(ms);
        manager.handle_touch(&TouchEvent::start(pair(0.0, 0.0), t0), &mut map, &mut runner);
        manager.handle_touch(&TouchEvent::moved(pair(0.0, -20.0), step(16)), &mut map, &mut runner);
        manager.handle_touch(&TouchEvent::moved(pair(0.0, -60.0), step(32)), &mut map, &mut runner);
        // dragging up tilts the map
        assert!(map.camera_state().pitch > 0.0);
        let events = manager.handle_touch(&TouchEvent::end(pair(0.0, -60.0), step(48)), &mut map, &mut runner);
        assert_eq!(
            events,
            vec![GestureEvent::Ended {
                gesture: GestureType::Pitch,
                will_animate: false
            }]
        );
        assert!(!manager.is_gesture_active());
    }

    #[test]
    fn test_fling_hands_over_to_deceleration() {
        let (mut manager, mut map, mut runner) = setup();
        let t0 = Instant::now();
        let touch = |x: f64| vec![TouchPoint::new(7, x, 200.0)];
        let step = |ms: u64| t0 + Duration::from_millis(ms);
        manager.handle_touch(&TouchEvent::start(touch(100.0), t0), &mut map, &mut runner);
        manager.handle_touch(&TouchEvent::moved(touch(120.0), step(10)), &mut map, &mut runner);
        manager.handle_touch(&TouchEvent::moved(touch(140.0), step(20)), &mut map, &mut runner);
        let events = manager.handle_touch(&TouchEvent::end(touch(140.0), step(30)), &mut map, &mut runner);
        assert_eq!(
            events,
            vec![GestureEvent::Ended {
                gesture: GestureType::Pan,
                will_animate: true
            }]
        );
        assert_eq!(runner.active_count(), 1);

        let center = map.camera_state().center;
        runner.update(&mut map, step(40));
        runner.update(&mut map, step(56));
        assert!(map.camera_state().center.lng < center.lng);

        runner.cancel_animations_with_owners(&[AnimationOwner::GESTURE_DECELERATION]);
        assert!(runner.is_empty());
        assert_eq!(
            manager.update(step(60)),
            vec![GestureEvent::AnimationEnded(GestureType::Pan)]
        );
    }

    #[test]
    fn test_listener_sees_every_event() {
        let (mut manager, mut map, mut runner) = setup();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        manager.on_event(move |event| sink.lock().unwrap().push(*event));

        let t0 = Instant::now();
        let touch = |y: f64| vec![TouchPoint::new(1, 200.0, y)];
        manager.handle_touch(&TouchEvent::start(touch(200.0), t0), &mut map, &mut runner);
        manager.handle_touch(&TouchEvent::moved(touch(240.0), t0 + Duration::from_millis(16)), &mut map, &mut runner);
        manager.handle_touch(&TouchEvent::end(touch(240.0), t0 + Duration::from_millis(500)), &mut map, &mut runner);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first(), Some(&GestureEvent::Began(GestureType::Pan)));
        assert!(matches!(
            seen.last(),
            Some(GestureEvent::Ended {
                gesture: GestureType::Pan,
                ..
            })
        ));
    }

    #[test]
    fn test_vertical_only_scrolling() {
        let options = GestureOptions {
            scrolling_mode: PanScrollingMode::Vertical,
            ..GestureOptions::default()
        };
        let mut manager = GestureManager::new(options);
        let (_, mut map, mut runner) = setup();
        let t0 = Instant::now();
        let touch = |x: f64, y: f64| vec![TouchPoint::new(1, x, y)];
        manager.handle_touch(&TouchEvent::start(touch(100.0, 100.0), t0), &mut map, &mut runner);
        manager.handle_touch(&TouchEvent::moved(touch(130.0, 100.0), t0 + Duration::from_millis(16)), &mut map, &mut runner);
        manager.handle_touch(&TouchEvent::moved(touch(160.0, 130.0), t0 + Duration::from_millis(32)), &mut map, &mut runner);
        let center = map.camera_state().center;
        assert!(center.lat > 0.0);
        assert!(center.lng.abs() < 1e-9);
    }

    /// Two touches `radius` points from (200, 200), on a line `degrees` from horizontal
    fn spun(degrees: f64, radius: f64) -> Vec<TouchPoint> {
        let (sin, cos) = degrees.to_radians().sin_cos();
        vec![
            TouchPoint::new(1, 200.0 - radius * cos, 200.0 - radius * sin),
            TouchPoint::new(2, 200.0 + radius * cos, 200.0 + radius * sin),
        ]
    }

    fn restricted_rotation() -> GestureManager {
        GestureManager::new(GestureOptions {
            rotation_min_zoom: 10.0,
            ..GestureOptions::default()
        })
    }

    #[test]
    fn test_quick_zoom_waits_for_double_tap_and_blocks_pan() {
        let (mut manager, mut map, mut runner) = setup();
        let t0 = Instant::now();
        let step = |ms: u64| t0 + Duration::from_millis(ms);
        let touch = |y: f64| vec![TouchPoint::new(1, 200.0, y)];
        manager.handle_touch(&TouchEvent::start(touch(200.0), t0), &mut map, &mut runner);
        manager.handle_touch(&TouchEvent::end(touch(200.0), step(80)), &mut map, &mut runner);

        let events = manager.handle_touch(&TouchEvent::start(touch(200.0), step(160)), &mut map, &mut runner);
        assert!(events.is_empty());
        assert_eq!(manager.recognizer_state(GestureType::DOUBLE_TAP), Some(RecognizerState::Possible));
        assert_eq!(manager.recognizer_state(GestureType::QuickZoom), Some(RecognizerState::Possible));

        // moving past the tap slop fails the double tap, which frees quick zoom
        let events = manager.handle_touch(&TouchEvent::moved(touch(230.0), step(176)), &mut map, &mut runner);
        assert_eq!(events, vec![GestureEvent::Began(GestureType::QuickZoom)]);
        assert_eq!(manager.recognizer_state(GestureType::DOUBLE_TAP), Some(RecognizerState::Failed));
        assert_eq!(manager.recognizer_state(GestureType::Pan), Some(RecognizerState::Failed));

        manager.handle_touch(&TouchEvent::moved(touch(305.0), step(192)), &mut map, &mut runner);
        assert!((map.camera_state().zoom - 5.0).abs() < 1e-9);
        assert_eq!(manager.active_gestures(), vec![GestureType::QuickZoom]);

        let events = manager.handle_touch(&TouchEvent::end(touch(305.0), step(208)), &mut map, &mut runner);
        assert_eq!(
            events,
            vec![GestureEvent::Ended {
                gesture: GestureType::QuickZoom,
                will_animate: false
            }]
        );
    }

    #[test]
    fn test_second_tap_without_drag_is_a_double_tap() {
        let (mut manager, mut map, mut runner) = setup();
        let t0 = Instant::now();
        let step = |ms: u64| t0 + Duration::from_millis(ms);
        let touch = || vec![TouchPoint::new(1, 200.0, 200.0)];
        manager.handle_touch(&TouchEvent::start(touch(), t0), &mut map, &mut runner);
        manager.handle_touch(&TouchEvent::end(touch(), step(80)), &mut map, &mut runner);
        manager.handle_touch(&TouchEvent::start(touch(), step(160)), &mut map, &mut runner);
        let events = manager.handle_touch(&TouchEvent::end(touch(), step(240)), &mut map, &mut runner);

        assert_eq!(
            events,
            vec![
                GestureEvent::Began(GestureType::DOUBLE_TAP),
                GestureEvent::Ended {
                    gesture: GestureType::DOUBLE_TAP,
                    will_animate: true
                },
            ]
        );
        assert_eq!(manager.recognizer_state(GestureType::QuickZoom), Some(RecognizerState::Failed));
        assert_eq!(runner.active_count(), 1);
    }

    #[test]
    fn test_restricted_rotation_is_clamped_and_snaps_back() {
        let mut manager = restricted_rotation();
        let (_, mut map, mut runner) = setup();
        let t0 = Instant::now();
        let step = |ms: u64| t0 + Duration::from_millis(ms);
        manager.handle_touch(&TouchEvent::start(spun(0.0, 50.0), t0), &mut map, &mut runner);
        let events = manager.handle_touch(&TouchEvent::moved(spun(10.0, 50.0), step(16)), &mut map, &mut runner);
        assert_eq!(events, vec![GestureEvent::Began(GestureType::Rotate)]);

        // 60 degrees of finger rotation, limited to 30
        manager.handle_touch(&TouchEvent::moved(spun(70.0, 50.0), step(32)), &mut map, &mut runner);
        assert!((map.camera_state().bearing - 330.0).abs() < 1e-9);

        let events = manager.handle_touch(&TouchEvent::end(spun(70.0, 50.0), step(48)), &mut map, &mut runner);
        assert_eq!(
            events,
            vec![GestureEvent::Ended {
                gesture: GestureType::Rotate,
                will_animate: true
            }]
        );
        runner.update(&mut map, step(60));
        runner.update(&mut map, step(400));
        assert!(runner.is_empty());
        assert!(map.camera_state().bearing.abs() < 1e-9);
        assert_eq!(
            manager.update(step(410)),
            vec![GestureEvent::AnimationEnded(GestureType::Rotate)]
        );
    }

    #[test]
    fn test_large_pinch_lifts_rotation_limit() {
        let mut manager = restricted_rotation();
        let (_, mut map, mut runner) = setup();
        let t0 = Instant::now();
        let step = |ms: u64| t0 + Duration::from_millis(ms);
        manager.handle_touch(&TouchEvent::start(spun(0.0, 10.0), t0), &mut map, &mut runner);
        let events = manager.handle_touch(&TouchEvent::moved(spun(10.0, 20.0), step(16)), &mut map, &mut runner);
        assert_eq!(
            events,
            vec![
                GestureEvent::Began(GestureType::Pinch),
                GestureEvent::Began(GestureType::Rotate),
            ]
        );

        // fingers spread 12.5 times their distance at the start of the pinch
        manager.handle_touch(&TouchEvent::moved(spun(70.0, 250.0), step(32)), &mut map, &mut runner);
        let camera = map.camera_state();
        assert!(camera.zoom < 10.0);
        assert!((camera.bearing - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_pinch_without_scrolling_keeps_its_focus() {
        let mut manager = GestureManager::new(GestureOptions {
            scroll_enabled: false,
            ..GestureOptions::default()
        });
        let (_, mut map, mut runner) = setup();
        let t0 = Instant::now();
        let step = |ms: u64| t0 + Duration::from_millis(ms);
        let fingers = |left: f64, right: f64| vec![TouchPoint::new(1, left, 200.0), TouchPoint::new(2, right, 200.0)];
        let focus = Point::new(240.0, 200.0);
        let pinned = map.projection().screen_to_coordinate(&focus);

        manager.handle_touch(&TouchEvent::start(fingers(150.0, 250.0), t0), &mut map, &mut runner);
        let events = manager.handle_touch(&TouchEvent::moved(fingers(170.0, 310.0), step(16)), &mut map, &mut runner);
        assert_eq!(events, vec![GestureEvent::Began(GestureType::Pinch)]);

        // the fingers drift right while spreading
        manager.handle_touch(&TouchEvent::moved(fingers(190.0, 390.0), step(32)), &mut map, &mut runner);
        assert!(map.camera_state().zoom > 4.0);
        let on_screen = map.projection().coordinate_to_screen(&pinned);
        assert!((on_screen.x - focus.x).abs() < 1e-6);
        assert!((on_screen.y - focus.y).abs() < 1e-6);
    }

    #[test]
    fn test_gesture_begin_cancels_animations() {
        let (mut manager, mut map, mut runner) = setup();
        let stopped = Arc::new(Mutex::new(None));
        let sink = stopped.clone();
        let id = runner.add(
            CameraAnimator::simple(CameraOptions::new().with_bearing(90.0), 1.0, TimingCurve::Linear)
                .with_owner(AnimationOwner::PROGRAMMATIC)
                .with_completion(move |position| *sink.lock().unwrap() = Some(position)),
        );
        runner.start(id);

        let t0 = Instant::now();
        let touch = |x: f64| vec![TouchPoint::new(1, x, 200.0)];
        manager.handle_touch(&TouchEvent::start(touch(200.0), t0), &mut map, &mut runner);
        assert!(runner.contains(id));
        manager.handle_touch(&TouchEvent::moved(touch(240.0), t0 + Duration::from_millis(16)), &mut map, &mut runner);
        assert!(!runner.contains(id));
        assert_eq!(*stopped.lock().unwrap(), Some(AnimatingPosition::Current));
    }
}
