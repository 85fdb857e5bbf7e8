//! The engine: configuration, the per-frame sequence and the hooks game code
//! plugs into.
//!
//! A frame runs in this order:
//!
//!   1. `FrameClock::begin_frame()` -- measure the delta
//!   2. console commands posted since the last frame
//!   3. timers whose delay elapsed
//!   4. canvas cleared, then the main callback (by default: fill white and
//!      run the active scene)
//!   5. scene switch, save and load requests made during the frame
//!   6. debug text (FPS and mouse position) when debug is on
//!
//! `NovaApp` drives this from winit; tests call `step_frame` directly.

use crate::app::NovaApp;
use crate::console::{Console, ConsoleCommand, HELP};
use crate::context::Context;
use crate::scene::{Scene, SceneManager};
use crate::sound::default_backend;
use glam::Vec2;
use nova_core::{AttributeError, AttributeRegistry, Color, SaveError, SaveManager, Scheduler, TaskId};
use nova_platform::PlatformConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use winit::event_loop::{ControlFlow, EventLoop};

pub const ENGINE_VERSION: &str = concat!("V", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub app_name: String,
    pub width: u32,
    pub height: u32,
    pub icon: Option<PathBuf>,
    /// Frame cap; 0 runs unpaced.
    pub fps: u32,
    pub debug: bool,
    /// Read developer commands from stdin.
    pub console: bool,
    pub resizable: bool,
    pub vsync: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_name: "Game".to_string(),
            width: 500,
            height: 500,
            icon: None,
            fps: 60,
            debug: false,
            console: true,
            resizable: false,
            vsync: false,
        }
    }
}

impl EngineConfig {
    pub fn title(&self) -> String {
        format!("{} | Running with NovaEngine {}", self.app_name, ENGINE_VERSION)
    }

    pub fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            title: self.title(),
            width: self.width,
            height: self.height,
            icon_path: self.icon.clone(),
            resizable: self.resizable,
        }
    }
}

/// Missing fields take their defaults.
pub fn load_config_from_path(path: &Path) -> Result<EngineConfig, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("{0}")]
    Window(String),
    #[error("GPU setup failed: {0}")]
    Gpu(String),
    #[error("scene '{0}' is not registered")]
    UnknownScene(String),
    #[error(transparent)]
    Save(#[from] SaveError),
}

pub type TimerCallback<S> = Box<dyn FnMut(&mut Frame<'_, S>)>;
pub type MainCallback<S> = Box<dyn FnMut(&mut SceneManager<S>, &mut Frame<'_, S>)>;

/// Everything a callback may touch during one frame.
pub struct Frame<'a, S> {
    pub ctx: &'a mut Context,
    pub state: &'a mut S,
    pub attributes: &'a AttributeRegistry<S>,
    pub scheduler: &'a mut Scheduler<TimerCallback<S>>,
}

impl<S> Frame<'_, S> {
    pub fn after(&mut self, delay: Duration, f: impl FnOnce(&mut Frame<'_, S>) + 'static) -> TaskId {
        self.scheduler.after(delay, once(f))
    }

    pub fn every(&mut self, interval: Duration, f: impl FnMut(&mut Frame<'_, S>) + 'static) -> TaskId {
        self.scheduler.every(interval, Box::new(f))
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.scheduler.cancel(id)
    }
}

fn once<S>(f: impl FnOnce(&mut Frame<'_, S>) + 'static) -> TimerCallback<S> {
    let mut f = Some(f);
    Box::new(move |frame: &mut Frame<'_, S>| {
        if let Some(f) = f.take() {
            f(frame);
        }
    })
}

fn default_main<S>() -> MainCallback<S> {
    Box::new(|scenes: &mut SceneManager<S>, frame: &mut Frame<'_, S>| {
        frame.ctx.fill(Color::WHITE);
        scenes.run_active(frame);
    })
}

pub struct Engine<S> {
    config: EngineConfig,
    pub ctx: Context,
    pub state: S,
    scenes: SceneManager<S>,
    attributes: AttributeRegistry<S>,
    scheduler: Scheduler<TimerCallback<S>>,
    save_manager: Option<SaveManager>,
    console: Option<Console>,
    main: MainCallback<S>,
}

impl<S> Engine<S> {
    pub fn new(config: EngineConfig, state: S) -> Self {
        let mut ctx = Context::new(config.width, config.height, config.fps);
        ctx.debug = config.debug;
        Self {
            config,
            ctx,
            state,
            scenes: SceneManager::new(),
            attributes: AttributeRegistry::new(),
            scheduler: Scheduler::new(),
            save_manager: None,
            console: None,
            main: default_main(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scene(&mut self, scene: Scene<S>) -> &mut Self {
        self.scenes.add(scene);
        self
    }

    pub fn scenes(&self) -> &SceneManager<S> {
        &self.scenes
    }

    pub fn scenes_mut(&mut self) -> &mut SceneManager<S> {
        &mut self.scenes
    }

    /// Replace the per-frame callback.
    pub fn set_main(&mut self, main: impl FnMut(&mut SceneManager<S>, &mut Frame<'_, S>) + 'static) {
        self.main = Box::new(main);
    }

    pub fn attributes(&self) -> &AttributeRegistry<S> {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeRegistry<S> {
        &mut self.attributes
    }

    pub fn set_save_manager(&mut self, manager: SaveManager) {
        self.save_manager = Some(manager);
    }

    pub fn save_manager(&self) -> Option<&SaveManager> {
        self.save_manager.as_ref()
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler<TimerCallback<S>> {
        &mut self.scheduler
    }

    pub fn after(&mut self, delay: Duration, f: impl FnOnce(&mut Frame<'_, S>) + 'static) -> TaskId {
        self.scheduler.after(delay, once(f))
    }

    pub fn every(&mut self, interval: Duration, f: impl FnMut(&mut Frame<'_, S>) + 'static) -> TaskId {
        self.scheduler.every(interval, Box::new(f))
    }

    pub fn set_console(&mut self, console: Console) {
        self.console = Some(console);
    }

    pub fn quit(&mut self) {
        self.ctx.quit();
    }

    pub fn is_running(&self) -> bool {
        self.ctx.is_running()
    }

    /// Sprites in the active scene, groups included.
    pub fn sprite_count(&self) -> usize {
        self.scenes.active().map_or(0, Scene::sprite_count)
    }

    pub fn step_frame(&mut self) {
        self.ctx.clock.begin_frame();
        self.run_console();
        self.run_timers();

        self.ctx.canvas.clear();
        let mut frame = Frame {
            ctx: &mut self.ctx,
            state: &mut self.state,
            attributes: &self.attributes,
            scheduler: &mut self.scheduler,
        };
        (self.main)(&mut self.scenes, &mut frame);

        if let Some(name) = self.ctx.take_scene_request() {
            if let Err(e) = self.scenes.switch_to(&name) {
                log::error!(target: "SceneManager", "{}", e);
            }
        }
        if self.ctx.take_load_request() {
            self.load();
        }
        if self.ctx.take_save_request() {
            self.save();
        }

        if self.ctx.debug {
            let fps = format!("{:.2}", self.ctx.clock.smoothed_fps);
            self.ctx.render_text(fps, Vec2::new(20.0, 20.0), 16.0, Color::BLACK, true);
            let mouse = self.ctx.mouse_pos();
            self.ctx.render_text(
                format!("({:.0}, {:.0})", mouse.x, mouse.y),
                mouse,
                10.0,
                Color::BLACK,
                true,
            );
        }
    }

    /// Clear per-frame input once the frame has been presented.
    pub fn end_frame(&mut self) {
        self.ctx.input.end_frame();
    }

    pub fn apply_command(&mut self, command: ConsoleCommand) {
        match command {
            ConsoleCommand::Quit => self.ctx.quit(),
            ConsoleCommand::Restart => self.ctx.restart(),
            ConsoleCommand::Get(path) => match self.attributes.read(&path, &self.state) {
                Some(value) => log::info!(target: "Console", "{} = {}", path, value),
                None => log::error!(target: "Console", "{}", AttributeError::Unresolved(path)),
            },
            ConsoleCommand::Set(path, value) => {
                match self.attributes.write(&path, &mut self.state, &value) {
                    Ok(()) => log::info!(target: "Console", "{} = {}", path, value),
                    Err(e) => log::error!(target: "Console", "{}", e),
                }
            }
            ConsoleCommand::Save => self.save(),
            ConsoleCommand::Load => self.load(),
            ConsoleCommand::Debug(on) => self.ctx.set_debug(on),
            ConsoleCommand::Scene(name) => {
                if let Err(e) = self.scenes.switch_to(&name) {
                    log::error!(target: "Console", "{}", e);
                }
            }
            ConsoleCommand::Help => log::info!(target: "Console", "{}", HELP),
        }
    }

    /// Write the save set. Without a save manager this does nothing.
    pub fn save(&mut self) {
        let Some(manager) = &self.save_manager else {
            return;
        };
        if let Err(e) = manager.save(&self.attributes, &self.state) {
            log::error!(target: "SaveManager", "{}", e);
        }
    }

    pub fn load(&mut self) {
        let Some(manager) = &self.save_manager else {
            return;
        };
        if let Err(e) = manager.load(&self.attributes, &mut self.state) {
            log::error!(target: "SaveManager", "{}", e);
        }
    }

    /// Open the window and run until quit. The save file is loaded before
    /// the first frame and written after the last.
    pub fn run(mut self, first_scene: Option<&str>) -> Result<(), EngineError> {
        match first_scene {
            Some(name) => self.scenes.switch_to(name)?,
            None => {
                let first = self.scenes.names().next().map(str::to_string);
                if let Some(name) = first {
                    self.scenes.switch_to(&name)?;
                }
            }
        }

        if self.config.console && self.console.is_none() {
            match Console::spawn() {
                Ok(console) => self.console = Some(console),
                Err(e) => log::warn!(target: "Console", "Console unavailable: {}", e),
            }
        }

        self.load();
        self.ctx.sound.set_backend(default_backend());

        log::info!("{}", self.config.title());
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        let mut app = NovaApp::new(self);
        event_loop.run_app(&mut app)?;
        let (mut engine, error) = app.finish();

        engine.save();
        engine.ctx.sound.stop_all();
        if engine.ctx.restart_requested() {
            relaunch();
        }
        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn run_console(&mut self) {
        let commands = match &self.console {
            Some(console) => console.drain(),
            None => return,
        };
        for command in commands {
            self.apply_command(command);
        }
    }

    fn run_timers(&mut self) {
        for mut task in self.scheduler.take_fired() {
            let mut frame = Frame {
                ctx: &mut self.ctx,
                state: &mut self.state,
                attributes: &self.attributes,
                scheduler: &mut self.scheduler,
            };
            (task.payload)(&mut frame);
            self.scheduler.finish(task);
        }
    }
}

fn relaunch() {
    let exe = match std::env::current_exe() {
        Ok(exe) => exe,
        Err(e) => {
            log::error!("Cannot restart: {}", e);
            return;
        }
    };
    match std::process::Command::new(&exe)
        .args(std::env::args_os().skip(1))
        .spawn()
    {
        Ok(child) => log::info!("Restarted as process {}", child.id()),
        Err(e) => log::error!("Cannot restart {}: {}", exe.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::Sprite;
    use nova_core::SaveLocation;
    use nova_render::DrawCommand;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::thread;

    #[derive(Default)]
    struct Game {
        hp: i32,
        ticks: u32,
    }

    fn headless() -> EngineConfig {
        EngineConfig {
            console: false,
            ..EngineConfig::default()
        }
    }

    fn engine() -> Engine<Game> {
        let mut engine = Engine::new(headless(), Game::default());
        engine
            .attributes_mut()
            .field("game.hp", |g: &Game| Some(&g.hp), |g: &mut Game| Some(&mut g.hp))
            .expect("register");
        engine
    }

    #[test]
    fn title_carries_engine_version() {
        let config = EngineConfig {
            app_name: "Pong".into(),
            ..EngineConfig::default()
        };
        assert_eq!(config.title(), format!("Pong | Running with NovaEngine {ENGINE_VERSION}"));
        assert!(ENGINE_VERSION.starts_with('V'));
    }

    #[test]
    fn config_file_fills_missing_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "app_name": "Demo", "fps": 30 }"#).expect("write");
        let config = load_config_from_path(&path).expect("config");
        assert_eq!(config.app_name, "Demo");
        assert_eq!(config.fps, 30);
        assert_eq!(config.width, 500);

        std::fs::write(&path, "{ nope").expect("write");
        assert!(load_config_from_path(&path).unwrap_err().starts_with("Failed to parse"));
    }

    #[test]
    fn default_main_fills_white_and_runs_active_scene() {
        let mut engine = engine();
        let mut scene = Scene::new("level");
        scene.add_sprite(Sprite::blank(5.0, 5.0, false).with_fill(Color::RED));
        engine.scene(scene);
        engine.scenes_mut().switch_to("level").expect("scene");

        engine.step_frame();
        let commands = engine.ctx.canvas.commands();
        assert_eq!(commands[0], DrawCommand::Fill(Color::WHITE));
        assert_eq!(commands.len(), 2);
        assert_eq!(engine.sprite_count(), 1);
    }

    #[test]
    fn scene_switch_requests_apply_after_the_frame() {
        let mut engine = engine();
        let mut menu = Scene::new("menu");
        menu.set_logic(|_, frame| frame.ctx.switch_scene("game"));
        engine.scene(menu).scene(Scene::new("game"));
        engine.scenes_mut().switch_to("menu").expect("scene");

        engine.step_frame();
        assert_eq!(engine.scenes().active_name(), Some("game"));
    }

    #[test]
    fn custom_main_sees_state() {
        let mut engine = engine();
        engine.set_main(|_, frame| frame.state.ticks += 1);
        engine.step_frame();
        engine.step_frame();
        assert_eq!(engine.state.ticks, 2);
    }

    #[test]
    fn timers_run_on_the_frame_thread() {
        let mut engine = engine();
        let fired = Rc::new(Cell::new(0));
        let seen = fired.clone();
        engine.after(Duration::from_millis(1), move |frame| {
            frame.state.hp = 9;
            seen.set(seen.get() + 1);
        });

        for _ in 0..200 {
            engine.step_frame();
            if fired.get() > 0 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(fired.get(), 1);
        assert_eq!(engine.state.hp, 9);
        assert!(engine.scheduler_mut().is_empty());
    }

    #[test]
    fn console_commands_edit_state_and_flags() {
        let mut engine = engine();
        engine.apply_command(ConsoleCommand::Set("game.hp".into(), serde_json::json!(55)));
        assert_eq!(engine.state.hp, 55);
        engine.apply_command(ConsoleCommand::Set("game.hp".into(), serde_json::json!("lots")));
        assert_eq!(engine.state.hp, 55);

        engine.apply_command(ConsoleCommand::Debug(true));
        assert!(engine.ctx.debug);
        engine.apply_command(ConsoleCommand::Quit);
        assert!(!engine.is_running());
    }

    #[test]
    fn console_reader_feeds_the_frame() {
        let mut engine = engine();
        let console = Console::spawn_reader(std::io::Cursor::new("game.hp = 12\n")).expect("spawn");
        engine.set_console(console);
        for _ in 0..200 {
            engine.step_frame();
            if engine.state.hp == 12 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(engine.state.hp, 12);
    }

    #[test]
    fn save_request_writes_and_load_restores() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut engine = engine();
        let mut manager = SaveManager::new(
            "Demo",
            SaveLocation::Directory(dir.path().to_path_buf()),
            "slot",
        )
        .expect("manager");
        manager.set_vars(["game.hp"]);
        engine.set_save_manager(manager);

        engine.state.hp = 40;
        engine.set_main(|_, frame| frame.ctx.request_save());
        engine.step_frame();

        engine.state.hp = 1;
        engine.load();
        assert_eq!(engine.state.hp, 40);
    }

    #[test]
    fn debug_mode_draws_fps_and_mouse() {
        let mut engine = engine();
        engine.ctx.set_debug(true);
        engine.step_frame();
        let texts: Vec<_> = engine.ctx.canvas.texts().collect();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].pos, Vec2::new(20.0, 20.0));
        assert_eq!(texts[1].size, 10.0);
    }
}
