//! Core Engine struct and frame driver

use std::fmt;
use std::time::Duration;

use rustc_hash::FxHashMap;

use super::config::EngineConfig;
use super::debug::FrameStats;
use super::scene_manager::SceneManager;
use super::time::{FixedTimestep, Time};
use crate::input::Input;
use crate::renderer::{CameraSlot, RenderBackend, RenderError, RenderModule, RenderStats};
use crate::scene::{ComponentHandle, Scene, SceneError};
use crate::update::{UpdateModule, UpdateStats};

/// What one frame did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub update: UpdateStats,
    pub render: RenderStats,
}

/// Drives the active scene: one update pass, then one render pass, per frame
pub struct Engine<B: RenderBackend> {
    config: EngineConfig,
    scenes: SceneManager,
    camera: CameraSlot,
    /// Current camera of each scene while it is not active
    scene_cameras: FxHashMap<String, ComponentHandle>,
    update: UpdateModule,
    render: RenderModule<B>,
    time: Time,
    input: Input,
    timestep: FixedTimestep,
    stats: FrameStats,
}

impl<B: RenderBackend> Engine<B> {
    /// Create an engine drawing through `backend`
    pub fn new(config: EngineConfig, backend: B) -> Self {
        let camera = CameraSlot::new();
        let timestep = FixedTimestep::new(f64::from(config.target_ups));
        log::info!(
            "Starting engine: {} ({} updates/s)",
            config.title,
            config.target_ups
        );
        Self {
            render: RenderModule::new(backend, camera.clone()),
            camera,
            scene_cameras: FxHashMap::default(),
            config,
            scenes: SceneManager::new(),
            update: UpdateModule::new(),
            time: Time::new(),
            input: Input::new(),
            timestep,
            stats: FrameStats::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    /// The current-camera slot shared with the render module
    #[must_use]
    pub fn camera_slot(&self) -> &CameraSlot {
        &self.camera
    }

    #[must_use]
    pub fn time(&self) -> &Time {
        &self.time
    }

    #[must_use]
    pub fn input(&self) -> &Input {
        &self.input
    }

    /// Input state for the host to feed key and mouse events into
    pub fn input_mut(&mut self) -> &mut Input {
        &mut self.input
    }

    #[must_use]
    pub fn frame_stats(&self) -> &FrameStats {
        &self.stats
    }

    #[must_use]
    pub fn render_module(&self) -> &RenderModule<B> {
        &self.render
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        self.render.backend()
    }

    /// The active scene
    #[must_use]
    pub fn scene(&self) -> Option<&Scene> {
        self.scenes.current()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scenes.current_mut()
    }

    /// Build a scene and register it under `name`.
    ///
    /// `build` receives the empty scene and the camera slot, so it can make
    /// one of its cameras current. That choice is remembered for the new
    /// scene and the slot goes back to the active scene's camera.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or `build` fails
    pub fn add_scene<F>(&mut self, name: &str, build: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut Scene, &CameraSlot) -> Result<(), SceneError>,
    {
        if self.scenes.contains(name) {
            return Err(EngineError::DuplicateScene(name.to_owned()));
        }
        let mut scene = Scene::new(name);
        let active = self.camera.replace(None);
        let built = build(&mut scene, &self.camera);
        let chosen = self.camera.replace(active);
        built?;

        self.scenes.add(scene)?;
        if let Some(camera) = chosen {
            self.scene_cameras.insert(name.to_owned(), camera);
        }
        Ok(())
    }

    /// Make `name` the active scene and hand it to the render module.
    ///
    /// The camera slot is stashed for the scene being left and set to the
    /// entered scene's own camera, so handles never resolve against the
    /// wrong scene.
    ///
    /// # Errors
    ///
    /// Returns an error if no scene has that name
    pub fn enter_scene(&mut self, name: &str) -> Result<(), EngineError> {
        if !self.scenes.contains(name) {
            return Err(EngineError::UnknownScene(name.to_owned()));
        }
        if let Some(leaving) = self.scenes.current_name().map(str::to_owned) {
            match self.camera.current() {
                Some(camera) => self.scene_cameras.insert(leaving, camera),
                None => self.scene_cameras.remove(&leaving),
            };
        }

        let scene = self.scenes.enter(name)?;
        self.camera.replace(self.scene_cameras.remove(name));
        self.render.on_enter_scene(scene);
        self.timestep.reset();
        Ok(())
    }

    /// Run one frame of length `delta`
    ///
    /// # Errors
    ///
    /// Returns an error if there is no active scene, or if either pass fails
    pub fn frame(&mut self, delta: Duration) -> Result<FrameReport, EngineError> {
        let scene = self.scenes.current_mut().ok_or(EngineError::NoActiveScene)?;
        self.time.advance(delta);

        let update = self.update.update(scene, &self.time, &mut self.input);
        self.input.update();
        let update = update?;
        let render = self.render.render(scene)?;

        self.stats.record(delta, update, render);
        Ok(FrameReport { update, render })
    }

    /// Feed real elapsed time to the fixed-step clock and run every frame
    /// that is due, up to `max_frames_per_tick`. Returns the frames run.
    ///
    /// # Errors
    ///
    /// Stops at the first failing frame
    pub fn tick(&mut self, elapsed: Duration) -> Result<u32, EngineError> {
        self.timestep.accumulate(elapsed);
        let step = self.timestep.step_duration();

        let mut frames = 0;
        while frames < self.config.max_frames_per_tick && self.timestep.step() {
            self.frame(step)?;
            frames += 1;
        }

        if frames == self.config.max_frames_per_tick && self.timestep.step() {
            log::warn!("Running behind: dropped accumulated time after {frames} frames");
            self.timestep.reset();
        }
        Ok(frames)
    }

    /// Interpolation factor between the last two fixed frames
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.timestep.alpha()
    }
}

/// Errors surfaced by the engine driver
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    Scene(SceneError),
    Render(RenderError),
    UnknownScene(String),
    DuplicateScene(String),
    NoActiveScene,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scene(e) => write!(f, "Scene error: {e}"),
            Self::Render(e) => write!(f, "Render error: {e}"),
            Self::UnknownScene(name) => write!(f, "Unknown scene '{name}'"),
            Self::DuplicateScene(name) => write!(f, "Scene '{name}' already exists"),
            Self::NoActiveScene => write!(f, "No active scene"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Scene(e) => Some(e),
            Self::Render(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SceneError> for EngineError {
    fn from(e: SceneError) -> Self {
        Self::Scene(e)
    }
}

impl From<RenderError> for EngineError {
    fn from(e: RenderError) -> Self {
        Self::Render(e)
    }
}
