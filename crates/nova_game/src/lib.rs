//! NovaEngine: a small 2D game engine.
//!
//! Game code builds [`Scene`]s out of [`Sprite`]s, hands them to an
//! [`Engine`] and calls [`Engine::run`]. Every callback receives a [`Frame`]
//! with the [`Context`] (input, time, canvas, sound) and the game state.

pub mod app;
pub mod console;
pub mod context;
pub mod engine;
pub mod movement;
pub mod projectile;
pub mod scene;
pub mod sound;
pub mod sprite;
pub mod widgets;

pub use console::{parse_command, Console, ConsoleCommand};
pub use context::Context;
pub use engine::{
    load_config_from_path, Engine, EngineConfig, EngineError, Frame, MainCallback, TimerCallback,
    ENGINE_VERSION,
};
pub use movement::{MoveIntent, PlatformerMovement, SimpleTopDown, TopDownMovement};
pub use projectile::Projectile;
pub use scene::{Scene, SceneLogic, SceneManager};
pub use sound::{default_backend, AudioBackend, SilentAudio, SoundManager};
#[cfg(feature = "audio")]
pub use sound::RodioAudio;
pub use sprite::{Group, Sprite, SpriteId, UpdateHook};
pub use widgets::{Button, CheckBox, ProgressBar, TextInput, TextLabel, ToggleButton};
