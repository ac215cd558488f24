use std::{
    path::PathBuf,
    process::ExitCode,
    time::{Duration, Instant},
};

use clap::Parser;
use engine::scene::{Scene, SceneError};
use game::{
    animation::{BoneIndex, MatrixMode},
    asset::SkinnedModel,
    mesh::SkinWeightLayout,
    scene::{SceneConfig, SkinnedCubeScene, program_descriptor},
};
use renderer::HeadlessRenderer;
use tracing::{error, info, warn};

mod engine;
mod game;

#[derive(clap::Parser)]
struct Opts {
    /// Path to the exported model (e.g. "geometries/skeleton.json").
    path: PathBuf,

    /// Index of the animation to play.
    #[arg(long, default_value_t = 0)]
    animation: usize,

    /// Only animate these bones (e.g. "1,3"). Defaults to every bone with key frames.
    #[arg(long, value_delimiter = ',')]
    bones: Option<Vec<BoneIndex>>,

    /// Override the clip length in seconds. Playback wraps at this time.
    #[arg(long)]
    duration: Option<f32>,

    /// Amount of frames to render.
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Frames per second.
    #[arg(long, default_value_t = 60.0)]
    fps: f32,

    /// Pace frames against the wall clock instead of simulating time.
    #[arg(long)]
    realtime: bool,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Amount of floats per vertex in the exported skin weight stream.
    #[arg(long, default_value_t = 4)]
    weight_stride: usize,

    /// Amount of bone weights per vertex read by the shader.
    #[arg(long, default_value_t = 4)]
    weight_influences: usize,

    /// Which matrices are uploaded for each bone.
    #[arg(long, value_enum, default_value_t = MatrixMode::World)]
    matrix_mode: MatrixMode,
}

impl Opts {
    fn scene_config(&self) -> SceneConfig {
        SceneConfig {
            animation: self.animation,
            bones: self.bones.clone(),
            duration: self.duration,
            weights: SkinWeightLayout {
                source_stride: self.weight_stride,
                influences: self.weight_influences,
            },
            mode: self.matrix_mode,
            width: self.width,
            height: self.height,
        }
    }
}

/// Time between frames, or `None` when `fps` does not give a representable frame time.
fn frame_duration(fps: f32) -> Option<Duration> {
    if !fps.is_finite() || fps <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f32(1.0 / fps).ok()
}

fn run(opts: &Opts, frame_duration: Duration) -> Result<(), SceneError> {
    let model = SkinnedModel::load(&opts.path)?;
    info!(
        "Model has {} bones and {} animations",
        model.bone_count(),
        model.animation_count()
    );

    let mut renderer = HeadlessRenderer::new(program_descriptor());
    let mut scene = SkinnedCubeScene::new(&mut renderer, &model, &opts.scene_config())?;
    scene.resize(opts.width, opts.height);

    let mut last_frame_time = Instant::now();

    info!("Scene initialized!");

    for frame in 0..opts.frames {
        let delta_time = if opts.realtime {
            let now = Instant::now();
            let last_frame_duration = now - last_frame_time;
            last_frame_time = now;
            last_frame_duration.as_secs_f32()
        } else {
            frame_duration.as_secs_f32()
        };

        scene.update(delta_time);
        scene.render(&mut renderer)?;

        if (frame + 1) % (opts.fps.round().max(1.0) as u64) == 0 {
            info!(
                "Rendered {} frames, clip time {:.3}s",
                frame + 1,
                scene.driver().playback_time(scene.elapsed())
            );
        }

        if opts.realtime {
            let spent = last_frame_time.elapsed();
            if let Some(remaining) = frame_duration.checked_sub(spent) {
                std::thread::sleep(remaining);
            }
        }
    }

    let draw_calls = renderer.draw_calls().len();
    if draw_calls as u64 != opts.frames {
        warn!("Expected {} draw calls, got {}", opts.frames, draw_calls);
    }

    info!(
        "Done: {} frames, {} bones, {:.3}s elapsed",
        scene.frame_index(),
        scene.driver().skeleton().bone_count(),
        scene.elapsed()
    );

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().init();

    let opts = Opts::parse();

    let Some(frame_time) = frame_duration(opts.fps) else {
        error!("Invalid frames per second: {}", opts.fps);
        return ExitCode::FAILURE;
    };

    match run(&opts, frame_time) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Could not run skinned cube scene! - {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_duration_rejects_unusable_rates() {
        let frame = frame_duration(50.0).unwrap();
        assert!(frame.abs_diff(Duration::from_millis(20)) < Duration::from_micros(1));

        assert_eq!(frame_duration(0.0), None);
        assert_eq!(frame_duration(-60.0), None);
        assert_eq!(frame_duration(f32::NAN), None);
        assert_eq!(frame_duration(f32::INFINITY), None);
        // Subnormal rates overflow the frame time.
        assert_eq!(frame_duration(1e-40), None);
    }
}
