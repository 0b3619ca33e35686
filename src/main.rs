//! Rider Sim entry point
//!
//! Headless runner: simulates a track and prints one JSON object per frame
//! with the rider state, center and camera viewport.
//!
//! Usage: `rider-sim [--frames N] [--track lines.json] [--settings settings.json] [--seed S]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::io::{self, BufWriter, Write};
    use std::path::PathBuf;

    use clap::Parser;
    use glam::DVec2;
    use serde::Serialize;

    use rider_sim::sim::RiderState;
    use rider_sim::{Camera, Playback, Settings, Timeline, Track};

    const DEMO_SEGMENTS: usize = 40;

    /// Simulate a track and print one JSON object per frame
    #[derive(Parser, Debug)]
    #[command(name = "rider-sim", version, about)]
    struct Args {
        /// Number of frames to play forward
        #[arg(long, default_value_t = 400)]
        frames: usize,

        /// Track JSON (a list of line records); a demo track is generated if absent
        #[arg(long)]
        track: Option<PathBuf>,

        /// Settings JSON
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Seed for the demo track
        #[arg(long, default_value_t = 1)]
        seed: u64,
    }

    #[derive(Serialize)]
    struct FrameReport {
        frame: usize,
        state: RiderState,
        center: DVec2,
        ppf: f64,
        zoom: f64,
        viewport_origin: DVec2,
        viewport_size: DVec2,
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let args = Args::parse();

        let settings = match &args.settings {
            Some(path) => Settings::load_from(path)?,
            None => Settings::default(),
        };
        let track = match &args.track {
            Some(path) => Track::load(path)?,
            None => {
                log::info!("No track given, generating demo track (seed {})", args.seed);
                Track::demo(args.seed, DEMO_SEGMENTS)
            }
        };

        let mut timeline = Timeline::new(track, settings.physics.clone())?;
        let mut camera = Camera::from_settings(&settings.camera);
        let mut playback = Playback::new(settings.camera.zoom);

        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        let mut crashed_at = None;

        for _ in 0..args.frames {
            let frame = playback.advance(&mut timeline).clone();
            let index = playback.frame();
            for event in playback.drain_events() {
                log::info!("Trigger {} fired at frame {}", event.line_id, event.frame);
            }
            if frame.rider.is_crashed() && crashed_at.is_none() {
                crashed_at = Some(index);
            }
            let viewport = camera.viewport(&mut timeline, index, playback.zoom(), settings.camera.viewport);
            let report = FrameReport {
                frame: index,
                state: frame.rider.state,
                center: frame.camera.rider_center,
                ppf: frame.camera.ppf,
                zoom: playback.zoom(),
                viewport_origin: viewport.origin,
                viewport_size: viewport.size,
            };
            serde_json::to_writer(&mut out, &report)?;
            writeln!(out)?;
        }
        out.flush()?;

        match crashed_at {
            Some(frame) => log::info!("Simulated {} frames, crashed at frame {}", args.frames, frame),
            None => log::info!("Simulated {} frames, rider still riding", args.frames),
        }
        Ok(())
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Rider Sim starting...");

    if let Err(e) = native::run() {
        log::error!("{}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is the wasm surface; there is no headless runner there
}
