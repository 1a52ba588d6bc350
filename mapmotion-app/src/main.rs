use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use mapmotion::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    Ease,
    Fling,
    Follow,
    All,
}

#[derive(Debug, Parser)]
#[clap(name = "mapmotion-app", version)]
struct Cli {
    #[arg(long, value_enum, default_value_t = Scenario::All, help = "Scripted session to play back")]
    scenario: Scenario,

    #[arg(long, help = "JSON engine configuration")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 60, help = "Display refresh rate driving the engine")]
    fps: u32,
}

/// Headless playback of scripted camera sessions
fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    let map = HeadlessMap::new(
        CameraState::new(LatLng::new(37.7749, -122.4194), 12.0),
        Point::new(1200.0, 800.0),
    )
    .with_bounds(config.camera_bounds);
    let mut session = Session::new(CameraEngine::with_config(map, config), cli.fps.max(1));

    if matches!(cli.scenario, Scenario::Ease | Scenario::All) {
        session.ease();
    }
    if matches!(cli.scenario, Scenario::Fling | Scenario::All) {
        session.fling();
    }
    if matches!(cli.scenario, Scenario::Follow | Scenario::All) {
        session.follow()?;
    }
    Ok(())
}

/// Engine plus a synthetic clock
struct Session {
    engine: CameraEngine<HeadlessMap>,
    start: Instant,
    frame: u64,
    fps: u32,
}

impl Session {
    fn new(engine: CameraEngine<HeadlessMap>, fps: u32) -> Self {
        Self {
            engine,
            start: Instant::now(),
            frame: 0,
            fps,
        }
    }

    fn now(&self) -> Instant {
        self.start + Duration::from_secs_f64(self.frame as f64 / self.fps as f64)
    }

    fn tick(&mut self) {
        self.frame += 1;
        let now = self.now();
        for event in self.engine.update(now) {
            log::info!("{:?}", event);
        }
    }

    fn run_for(&mut self, seconds: f64) {
        let frames = (seconds * self.fps as f64).ceil() as u64;
        for _ in 0..frames {
            self.tick();
        }
    }

    fn report(&self, label: &str) {
        let camera = self.engine.camera_state();
        println!(
            "{:<24} center ({:.5}, {:.5}) zoom {:.2} bearing {:.1} pitch {:.1}",
            label, camera.center.lat, camera.center.lng, camera.zoom, camera.bearing, camera.pitch
        );
    }

    fn touch(&mut self, event: TouchEvent) {
        for event in self.engine.handle_touch(&event) {
            log::info!("{:?}", event);
        }
    }

    /// An ease cut short by a pan
    fn ease(&mut self) {
        self.report("ease: start");
        let handle = self.engine.ease(
            CameraOptions::new().with_zoom(15.0).with_bearing(30.0),
            1.0,
            TimingCurve::EaseInOut,
            Some(AnimationOwner::PROGRAMMATIC),
        );
        self.engine.on_completion(handle, |position| {
            println!("ease: finished {}", position.did_finish());
        });
        self.run_for(0.5);
        self.report("ease: half way");

        let finger = |x: f64| vec![TouchPoint::new(1, x, 400.0)];
        self.touch(TouchEvent::start(finger(600.0), self.now()));
        self.frame += 1;
        self.touch(TouchEvent::moved(finger(640.0), self.now()));
        self.frame += 1;
        self.touch(TouchEvent::moved(finger(700.0), self.now()));
        self.frame += 30;
        self.touch(TouchEvent::end(finger(700.0), self.now()));
        self.report("ease: after pan");
    }

    /// A quick pan released into a deceleration
    fn fling(&mut self) {
        self.report("fling: start");
        let finger = |y: f64| vec![TouchPoint::new(2, 600.0, y)];
        self.touch(TouchEvent::start(finger(600.0), self.now()));
        for step in 1..=4 {
            self.frame += 1;
            self.touch(TouchEvent::moved(finger(600.0 - 40.0 * step as f64), self.now()));
        }
        self.touch(TouchEvent::end(finger(440.0), self.now()));
        self.run_for(3.0);
        self.report("fling: at rest");
    }

    /// A follow-target viewport chasing a moving puck
    fn follow(&mut self) -> mapmotion::Result<()> {
        let options = FollowTargetOptions::default().with_bearing(FollowBearing::Course);
        let mut location = LatLng::new(37.7793, -122.4193);
        self.engine
            .update_location(Location::new(location).with_course(90.0));
        self.engine.with_viewport_animation(
            ViewportAnimation::default(),
            |viewport| *viewport = Viewport::follow_target(options),
            Some(|finished: bool| println!("follow: transition finished {}", finished)),
        )?;
        for _ in 0..5 {
            self.run_for(1.0);
            location = LatLng::new(location.lat, location.lng + 0.0005);
            self.engine
                .update_location(Location::new(location).with_course(90.0));
            self.report("follow: tracking");
        }
        self.run_for(1.0);
        println!("follow: {:?}", self.engine.viewport_status());
        Ok(())
    }
}
