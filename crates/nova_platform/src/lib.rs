pub mod window;

pub use window::{create_window, load_icon, PlatformConfig};
