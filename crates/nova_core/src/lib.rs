pub mod animation;
pub mod attributes;
pub mod color;
pub mod geometry;
pub mod input;
pub mod saves;
pub mod scheduler;
pub mod time;

pub use attributes::{AttributeError, AttributePath, AttributeRegistry, AttributeStore, PersistedRecord};
pub use color::Color;
pub use geometry::Rect;
pub use input::{InputState, Key, MouseBtn};
pub use saves::{SaveError, SaveLocation, SaveManager};
pub use scheduler::{Fired, Scheduler, TaskId};
pub use time::{Cooldown, FrameClock};
