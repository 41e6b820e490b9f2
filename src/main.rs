//! Headless demo: a spinning parent carrying a mesh child, plus a short-lived
//! marker that removes itself

use std::process::ExitCode;
use std::time::Duration;

use scene_engine::prelude::*;

/// Spins its node around the world Y axis
struct Spinner {
    radians_per_second: f32,
}

impl Component for Spinner {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let angle = self.radians_per_second * ctx.delta_seconds();
        ctx.transform_mut()
            .rotate(Quat::from_rotation_y(angle), Space::World);
    }
}

/// Destroys its node once `remaining` runs out
struct Lifetime {
    remaining: f32,
}

impl Component for Lifetime {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.remaining -= ctx.delta_seconds();
        if self.remaining <= 0.0 {
            let node = ctx.node_id();
            log::info!("Node {node} expired");
            ctx.commands().destroy_node(node);
        }
    }
}

fn build_demo(scene: &mut Scene, camera: &CameraSlot) -> Result<(), SceneError> {
    let eye = scene.make_tagged_node(None, "camera")?;
    scene.set_world_position(eye, Vec3::new(0.0, 4.0, -12.0))?;
    let view = Camera::default().with_clear_color(Color::from_rgba8(30, 30, 40, 255));
    camera.set_current(scene.add_component(eye, view)?);

    let pivot = scene.make_tagged_node(None, "pivot")?;
    scene.set_world_position(pivot, Vec3::new(10.0, 0.0, 0.0))?;
    scene.add_component(
        pivot,
        Spinner {
            radians_per_second: std::f32::consts::FRAC_PI_2,
        },
    )?;

    let crate_node = scene.make_tagged_node(Some(pivot), "crate")?;
    scene
        .node_mut(crate_node)
        .ok_or(SceneError::UnknownNode(crate_node))?
        .transform_mut()
        .set_local_position(Vec3::new(0.0, 5.0, 0.0));
    scene.add_component(crate_node, MeshFilter::new(MeshHandle::new(1, 36)))?;
    scene.add_component(
        crate_node,
        MeshRenderer::new(Material::unlit("crate", Color::from_rgba8(160, 110, 60, 255))),
    )?;

    let marker = scene.make_tagged_node(Some(pivot), "marker")?;
    scene.add_component(marker, MeshFilter::new(MeshHandle::new(2, 6)))?;
    scene.add_component(marker, MeshRenderer::new(Material::unlit("marker", Color::RED)))?;
    scene.add_component(marker, Lifetime { remaining: 0.25 })?;
    Ok(())
}

fn run(config: EngineConfig) -> Result<(), EngineError> {
    let mut engine = Engine::new(config, HeadlessBackend::new());
    engine.add_scene("demo", build_demo)?;
    engine.enter_scene("demo")?;

    for _ in 0..30 {
        engine.tick(Duration::from_millis(16))?;
    }

    if let Some(scene) = engine.scene() {
        if let Some(position) = scene
            .find_by_tag("crate")
            .and_then(|id| scene.global_transform(id))
            .map(|global| global.position())
        {
            log::info!("Crate world position: {position}");
        }
        log::info!("{} live nodes", scene.node_count());
    }
    log::info!("{}", engine.frame_stats().format_stats());
    log::info!(
        "{} frames, {} draw calls",
        engine.frame_stats().total_frames(),
        engine.frame_stats().total_draw_calls()
    );
    Ok(())
}

fn main() -> ExitCode {
    let config = match std::env::args().nth(1) {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Cannot load config {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default().with_title("Scene Engine Demo"),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .init();

    if let Err(e) = run(config) {
        log::error!("Engine error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
