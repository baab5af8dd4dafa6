//! Window interface
//!
//! The engine only needs three things from a window: pump its event queue
//! into the input manager, say whether the loop should stop, and present the
//! finished frame.

use super::input::{InputManager, KeyCode};

/// Platform window driving the main loop
pub trait Window {
    /// Feed pending platform events into `input`
    fn poll_events(&mut self, input: &mut InputManager);

    /// Check if the window should close
    fn should_close(&self) -> bool;

    /// Present the rendered frame
    fn present(&mut self);

    /// Ask the window to close at the end of the current tick
    fn request_close(&mut self);
}

/// A scripted key event, delivered when the given frame is polled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedKey {
    /// Frame (number of presents so far) at which the event fires
    pub frame: u64,
    /// Key affected
    pub key: KeyCode,
    /// Pressed or released
    pub pressed: bool,
}

/// Window with no surface, for tests and batch runs
///
/// Closes after a fixed number of presented frames (if any) and replays a
/// script of key events.
#[derive(Debug, Default)]
pub struct HeadlessWindow {
    max_frames: Option<u64>,
    frames: u64,
    close_requested: bool,
    script: Vec<ScriptedKey>,
}

impl HeadlessWindow {
    /// Window that stays open until [`Window::request_close`] is called
    pub fn new() -> Self {
        Self::default()
    }

    /// Window that closes after `frames` presents
    pub fn with_frame_limit(frames: u64) -> Self {
        Self { max_frames: Some(frames), ..Self::default() }
    }

    /// Press `key` when frame `frame` is polled
    #[must_use]
    pub fn press_at(mut self, frame: u64, key: KeyCode) -> Self {
        self.script.push(ScriptedKey { frame, key, pressed: true });
        self
    }

    /// Release `key` when frame `frame` is polled
    #[must_use]
    pub fn release_at(mut self, frame: u64, key: KeyCode) -> Self {
        self.script.push(ScriptedKey { frame, key, pressed: false });
        self
    }

    /// Number of frames presented so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Window for HeadlessWindow {
    fn poll_events(&mut self, input: &mut InputManager) {
        for event in self.script.iter().filter(|event| event.frame == self.frames) {
            log::trace!("Scripted {:?} {}", event.key, if event.pressed { "down" } else { "up" });
            input.handle_key_input(event.key, event.pressed);
        }
    }

    fn should_close(&self) -> bool {
        self.close_requested || self.max_frames.is_some_and(|max| self.frames >= max)
    }

    fn present(&mut self) {
        self.frames += 1;
    }

    fn request_close(&mut self) {
        self.close_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_limit_closes_window() {
        let mut window = HeadlessWindow::with_frame_limit(2);
        assert!(!window.should_close());
        window.present();
        window.present();
        assert!(window.should_close());
    }

    #[test]
    fn test_request_close() {
        let mut window = HeadlessWindow::new();
        window.request_close();
        assert!(window.should_close());
    }

    #[test]
    fn test_script_replays_on_its_frame() {
        let mut input = InputManager::new();
        input.bind("fire", &[KeyCode::Space]);
        let mut window = HeadlessWindow::new()
            .press_at(1, KeyCode::Space)
            .release_at(2, KeyCode::Space);

        window.poll_events(&mut input);
        input.update();
        assert!(input.is_key_up("fire"));

        window.present();
        window.poll_events(&mut input);
        input.update();
        assert!(input.is_key_pressed("fire"));

        window.present();
        window.poll_events(&mut input);
        input.update();
        assert!(input.is_key_released("fire"));
    }
}
