//! Platform Sim headless runner
//!
//! Builds a small demo level (or loads one from JSON), runs it for a number
//! of frames and logs what happened. Useful to check determinism and to
//! profile the frame step without a renderer.
//!
//! Usage: `platform-sim [level.json] [--settings settings.json] [--frames N]`

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use glam::Vec2;

use platform_sim::renderer::build_quads;
use platform_sim::settings::Settings;
use platform_sim::sim::actions::{Direction, FollowPath, Platform, Spawner, Walker};
use platform_sim::sim::graphics::{
    AnimationData, FrameData, GraphicData, Graphics, Pixel, full_sprite, solid_image,
};
use platform_sim::sim::{
    Action, ActionKind, Fixed, KeyStrokes, Level, Mask, Object, Path, Placement, Point, Spot,
    StateObject, compute, render_list,
};

#[derive(Parser)]
#[command(name = "platform-sim")]
#[command(about = "Run a platform level headless and report the final state")]
struct Args {
    /// Level JSON to run; the built-in demo level when omitted
    level: Option<PathBuf>,

    /// Settings JSON replacing the level's seed and physics tuning
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 600)]
    frames: u32,
}

/// Ground tiles, a lift on a back-and-forth path, and a nest releasing
/// walkers that fall onto the ground and pace along it
fn demo_level(settings: Settings) -> Level {
    let ground = Pixel {
        rgba: [110, 80, 40, 255],
        masks: Mask::Ground.bit() | Mask::Wall.bit(),
        depth: 0,
    };
    let body = Pixel {
        rgba: [200, 60, 60, 255],
        masks: 0,
        depth: 1,
    };
    let actor_frame = |sprite| {
        FrameData::new(sprite)
            .with_spot(Spot::Feet, Point::from_ints(8, 16))
            .with_spot(Spot::FallLeft, Point::from_ints(-1, 16))
            .with_spot(Spot::FallRight, Point::from_ints(16, 16))
            .with_spot(Spot::WallLeft, Point::from_ints(-1, 8))
            .with_spot(Spot::WallRight, Point::from_ints(16, 8))
    };
    let single = |frame| GraphicData {
        animations: vec![AnimationData {
            frames: vec![frame],
            looped: true,
        }],
    };
    let graphics = Graphics::new(
        vec![solid_image(16, ground), solid_image(16, body)],
        vec![full_sprite(0, 16), full_sprite(1, 16)],
        vec![single(FrameData::new(0)), single(actor_frame(1))],
    );

    let mut lift_path = Path::new(Vec::new(), true, false);
    lift_path.add_segment_from(
        Point::from_ints(200, 120),
        Point::from_ints(280, 120),
        Fixed::from_int(2),
    );

    let walker = Walker {
        speed: Fixed::ONE,
        fall: true,
        gravity_coeff: Fixed::ONE,
        direction: Direction::Random,
    };
    let nest = Spawner {
        timestamps: vec![0],
        interval: 90,
        delay: 30,
        obj: 1,
        max_nb_elts: 4,
        max_spawn: 0,
        offset: Point::from_ints(0, 16),
    };
    let lift = FollowPath {
        path: 0,
        speed: Fixed::ONE,
        relative: false,
    };

    let mut lift_object = Object::new(
        "lift",
        3,
        0,
        vec![
            Action::new("move", 0, ActionKind::FollowPath(lift)),
            Action::new("carry", 1, ActionKind::Platform(Platform {})),
        ],
    );
    lift_object.is_platform = true;

    let floor = (0..20).map(|i| StateObject::new(0, None, Point::from_ints(i * 16, 200)));
    let walls = [Point::from_ints(-16, 184), Point::from_ints(320, 184)]
        .into_iter()
        .map(|pos| StateObject::new(0, None, pos));

    Level {
        settings,
        graphics,
        paths: vec![lift_path],
        objects: vec![
            Object::new("ground", 0, 0, Vec::new()),
            Object::new(
                "walker",
                1,
                1,
                vec![Action::new("walk", 0, ActionKind::Walker(walker))],
            ),
            Object::new(
                "nest",
                2,
                1,
                vec![Action::new("spawn", 0, ActionKind::Spawner(nest))],
            ),
            lift_object,
        ],
        static_objects: floor.chain(walls).collect(),
        placements: vec![
            Placement {
                object: 2,
                pos: Point::from_ints(80, 40),
            },
            Placement {
                object: 3,
                pos: Point::ZERO,
            },
        ],
        ..Level::new(Settings::default())
    }
}

fn load_level(args: &Args) -> Result<Level, Box<dyn std::error::Error>> {
    let settings = match &args.settings {
        Some(path) => Some(Settings::load(path)?),
        None => None,
    };
    let level = match &args.level {
        Some(path) => {
            let mut level = Level::from_json(&std::fs::read_to_string(path)?)?;
            if let Some(settings) = settings {
                level.settings = settings;
            }
            level
        }
        None => {
            let level = demo_level(settings.unwrap_or_default());
            level.validate()?;
            level
        }
    };
    Ok(level)
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Platform Sim (headless) starting...");

    let args = Args::parse();
    let level = match load_level(&args) {
        Ok(level) => level,
        Err(err) => {
            log::error!("Failed to load level: {err}");
            return ExitCode::FAILURE;
        }
    };
    let frames = args.frames;

    let mut st = level.initial_state();
    let inputs = [KeyStrokes::NONE];
    let mut peak = st.live_count();
    for _ in 0..frames {
        st = compute(&level, &st, &inputs);
        peak = peak.max(st.live_count());
        if st.timestamp % 60 == 0 {
            log::debug!("Frame {}: {} live objects", st.timestamp, st.live_count());
        }
    }

    let list = render_list(&level, &st);
    let screen = Vec2::new(
        level.settings.screen_width as f32,
        level.settings.screen_height as f32,
    );
    let batch = build_quads(&level.graphics, &list, st.camera(), screen);
    let checksum = st
        .to_bytes()
        .iter()
        .fold(0u32, |acc, &b| acc.rotate_left(5) ^ u32::from(b));
    log::info!(
        "Ran {} frames: {} live objects (peak {}), {} quads, state checksum {:08x}",
        frames,
        st.live_count(),
        peak,
        batch.vertices.len() / 4,
        checksum
    );
    ExitCode::SUCCESS
}
