//! Platform layer: window and input

pub mod input;
pub mod window;

pub use input::{InputManager, KeyCode, MouseButton};
pub use window::{HeadlessWindow, ScriptedKey, Window};
