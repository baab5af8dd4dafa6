//! Input state tracking
//!
//! Raw key and mouse events are fed in by the window as they arrive. Named
//! actions map to one or more keys; their state is snapshotted once per tick
//! by [`InputManager::update`], which is what makes the pressed/released
//! edges observable for exactly one tick.

use std::collections::HashSet;

use crate::foundation::math::Vec2;

/// A named action and the keys that trigger it
#[derive(Debug, Clone)]
struct Action {
    name: String,
    keys: Vec<KeyCode>,
    down: bool,
    was_down: bool,
}

/// Input manager
#[derive(Debug, Default)]
pub struct InputManager {
    actions: Vec<Action>,
    held_keys: HashSet<KeyCode>,
    held_buttons: HashSet<MouseButton>,
    mouse_position: Vec2,
}

impl InputManager {
    /// Create a new input manager with no bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind keys to a named action
    ///
    /// Binding an existing name adds the keys to it rather than replacing.
    pub fn bind(&mut self, name: &str, keys: &[KeyCode]) {
        let index = match self.actions.iter().position(|action| action.name == name) {
            Some(index) => index,
            None => {
                self.actions.push(Action {
                    name: name.to_owned(),
                    keys: Vec::new(),
                    down: false,
                    was_down: false,
                });
                self.actions.len() - 1
            }
        };

        let action = &mut self.actions[index];
        for key in keys {
            if !action.keys.contains(key) {
                action.keys.push(*key);
            }
        }
        log::debug!("Input action '{name}' bound to {:?}", action.keys);
    }

    /// True if an action with this name exists
    pub fn has_action(&self, name: &str) -> bool {
        self.action(name).is_some()
    }

    /// Snapshot action states for the new tick
    pub fn update(&mut self) {
        for action in &mut self.actions {
            action.was_down = action.down;
            action.down = action.keys.iter().any(|key| self.held_keys.contains(key));
        }
    }

    /// Handle key input
    pub fn handle_key_input(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.held_keys.insert(key);
        } else {
            self.held_keys.remove(&key);
        }
    }

    /// Handle mouse button input
    pub fn handle_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            self.held_buttons.insert(button);
        } else {
            self.held_buttons.remove(&button);
        }
    }

    /// Handle mouse movement
    #[allow(clippy::cast_possible_truncation)]
    pub fn handle_mouse_move(&mut self, x: f64, y: f64) {
        self.mouse_position = Vec2::new(x as f32, y as f32);
    }

    /// True while the raw key is held
    pub fn is_raw_key_held(&self, key: KeyCode) -> bool {
        self.held_keys.contains(&key)
    }

    /// True while the mouse button is held
    pub fn is_mouse_button_held(&self, button: MouseButton) -> bool {
        self.held_buttons.contains(&button)
    }

    /// Last reported cursor position in window coordinates
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// True while any key of the action is down (as of the last update)
    pub fn is_key_down(&self, name: &str) -> bool {
        self.action(name).is_some_and(|action| action.down)
    }

    /// True while no key of the action is down; false for unknown actions
    pub fn is_key_up(&self, name: &str) -> bool {
        self.action(name).is_some_and(|action| !action.down)
    }

    /// True on the tick the action went from up to down
    pub fn is_key_pressed(&self, name: &str) -> bool {
        self.action(name).is_some_and(|action| action.down && !action.was_down)
    }

    /// True on the tick the action went from down to up
    pub fn is_key_released(&self, name: &str) -> bool {
        self.action(name).is_some_and(|action| !action.down && action.was_down)
    }

    fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|action| action.name == name)
    }
}

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A key
    A,
    /// B key
    B,
    /// C key
    C,
    /// D key
    D,
    /// E key
    E,
    /// F key
    F,
    /// G key
    G,
    /// H key
    H,
    /// I key
    I,
    /// J key
    J,
    /// K key
    K,
    /// L key
    L,
    /// M key
    M,
    /// N key
    N,
    /// O key
    O,
    /// P key
    P,
    /// Q key
    Q,
    /// R key
    R,
    /// S key
    S,
    /// T key
    T,
    /// U key
    U,
    /// V key
    V,
    /// W key
    W,
    /// X key
    X,
    /// Y key
    Y,
    /// Z key
    Z,
    /// Space key
    Space,
    /// Enter key
    Enter,
    /// Escape key
    Escape,
    /// Tab key
    Tab,
    /// Left shift
    LeftShift,
    /// Left control
    LeftControl,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jump_input() -> InputManager {
        let mut input = InputManager::new();
        input.bind("jump", &[KeyCode::Space]);
        input.bind("jump", &[KeyCode::W, KeyCode::Space]);
        input
    }

    #[test]
    fn test_bind_extends_existing_action() {
        let input = jump_input();
        assert_eq!(input.action("jump").unwrap().keys, vec![KeyCode::Space, KeyCode::W]);
    }

    #[test]
    fn test_unknown_action_is_neither_up_nor_down() {
        let input = InputManager::new();
        assert!(!input.is_key_down("fire"));
        assert!(!input.is_key_up("fire"));
        assert!(!input.is_key_pressed("fire"));
    }

    #[test]
    fn test_press_and_release_edges() {
        let mut input = jump_input();
        input.update();
        assert!(input.is_key_up("jump"));

        input.handle_key_input(KeyCode::W, true);
        input.update();
        assert!(input.is_key_down("jump"));
        assert!(input.is_key_pressed("jump"));

        input.update();
        assert!(input.is_key_down("jump"));
        assert!(!input.is_key_pressed("jump"));

        input.handle_key_input(KeyCode::W, false);
        input.update();
        assert!(input.is_key_released("jump"));

        input.update();
        assert!(!input.is_key_released("jump"));
    }

    #[test]
    fn test_state_changes_only_on_update() {
        let mut input = jump_input();
        input.handle_key_input(KeyCode::Space, true);
        assert!(!input.is_key_down("jump"));
        assert!(input.is_raw_key_held(KeyCode::Space));
    }

    #[test]
    fn test_mouse_tracking() {
        let mut input = InputManager::new();
        input.handle_mouse_button(MouseButton::Left, true);
        input.handle_mouse_move(10.0, 20.0);
        assert!(input.is_mouse_button_held(MouseButton::Left));
        assert_eq!(input.mouse_position(), Vec2::new(10.0, 20.0));
    }
}
