/// Platform-agnostic input handling system
use std::borrow::Cow;
use std::collections::HashSet;

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events
    KeyDown(String),
    KeyUp(String),

    // Pointer events
    PointerDown(MouseButton),
    PointerUp(MouseButton),
    PointerMove { x: f32, y: f32 },

    // Window events
    Resize { width: u32, height: u32 },
    FocusLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Back,
    Forward,
    Other(u16),
}

impl MouseButton {
    pub fn from_web_button(button: i16) -> Self {
        match button {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            3 => MouseButton::Back,
            4 => MouseButton::Forward,
            other => MouseButton::Other(other as u16),
        }
    }
}

/// How held keys are compared against queried key names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMatch {
    #[default]
    CaseSensitive,
    CaseInsensitive,
}

/// Set of currently held keys.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    held: HashSet<String>,
    matching: KeyMatch,
}

impl KeyboardState {
    pub fn new(matching: KeyMatch) -> Self {
        Self { held: HashSet::new(), matching }
    }

    /// Stored form of a key name; folded to lowercase when case is ignored.
    fn normalize<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match self.matching {
            KeyMatch::CaseSensitive => Cow::Borrowed(key),
            KeyMatch::CaseInsensitive => Cow::Owned(key.to_lowercase()),
        }
    }

    /// Returns `true` if the key was not already held.
    pub fn on_key_down(&mut self, key: &str) -> bool {
        let key = self.normalize(key);
        if self.held.contains(key.as_ref()) {
            return false;
        }
        self.held.insert(key.into_owned())
    }

    /// A shifted release (`W` after pressing `w`) still releases the key
    /// when case is ignored.
    pub fn on_key_up(&mut self, key: &str) {
        let key = self.normalize(key);
        self.held.remove(key.as_ref());
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held.contains(self.normalize(key).as_ref())
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }
}

/// Held mouse buttons plus the latest pointer position.
#[derive(Debug, Clone, Default)]
pub struct MouseState {
    held: HashSet<MouseButton>,
    position: Option<(f32, f32)>,
}

impl MouseState {
    pub fn on_button_down(&mut self, button: MouseButton) {
        self.held.insert(button);
    }

    pub fn on_button_up(&mut self, button: MouseButton) {
        self.held.remove(&button);
    }

    pub fn is_held(&self, button: MouseButton) -> bool {
        self.held.contains(&button)
    }

    /// Overwrites the previous position; only the latest one matters.
    pub fn on_move(&mut self, x: f32, y: f32) {
        self.position = Some((x, y));
    }

    /// `None` until the first move event.
    pub fn position(&self) -> Option<(f32, f32)> {
        self.position
    }

    pub fn clear_buttons(&mut self) {
        self.held.clear();
    }
}

/// Unified input state, mutated by raw events and read once per frame.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub keyboard: KeyboardState,
    pub mouse: MouseState,
    /// Keys that went down since the last [`InputState::take_pressed`].
    pressed: Vec<String>,
    /// Latest viewport size reported since the last [`InputState::take_resize`].
    resize: Option<(u32, u32)>,
}

impl InputState {
    pub fn new(matching: KeyMatch) -> Self {
        Self {
            keyboard: KeyboardState::new(matching),
            ..Default::default()
        }
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                if self.keyboard.on_key_down(key) {
                    self.pressed.push(key.clone());
                }
            }
            InputEvent::KeyUp(key) => self.keyboard.on_key_up(key),
            InputEvent::PointerDown(button) => self.mouse.on_button_down(*button),
            InputEvent::PointerUp(button) => self.mouse.on_button_up(*button),
            InputEvent::PointerMove { x, y } => self.mouse.on_move(*x, *y),
            InputEvent::Resize { width, height } => self.resize = Some((*width, *height)),
            InputEvent::FocusLost => {
                self.keyboard.clear();
                self.mouse.clear_buttons();
            }
        }
    }

    pub fn is_key_pressed(&self, key: &str) -> bool {
        self.keyboard.is_held(key)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.mouse.is_held(button)
    }

    pub fn pointer(&self) -> Option<(f32, f32)> {
        self.mouse.position()
    }

    /// Drain keys newly pressed since the last call, in press order.
    pub fn take_pressed(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pressed)
    }

    pub fn take_resize(&mut self) -> Option<(u32, u32)> {
        self.resize.take()
    }
}

/// Discrete actions triggered by a single key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    FollowPlayer,
    /// 1-based index into the spinning cubes.
    FollowCube(usize),
    /// Stop following and return the camera to its default pose.
    Unfollow,
    /// Switch held-key routing between the player and the camera.
    ToggleControl,
    ToggleDebug,
    LogState,
}

/// Key mapping configuration
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBindings {
    pub forward: String,
    pub backward: String,
    pub left: String,
    pub right: String,
    pub follow_player: String,
    pub unfollow: String,
    pub toggle_control: String,
    pub toggle_debug: String,
    pub log_state: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: "w".to_string(),
            backward: "s".to_string(),
            left: "a".to_string(),
            right: "d".to_string(),
            follow_player: "m".to_string(),
            unfollow: "0".to_string(),
            toggle_control: "c".to_string(),
            toggle_debug: "`".to_string(),
            log_state: "l".to_string(),
        }
    }
}

/// High-level input processor
#[derive(Debug, Clone, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn is_moving_forward(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.forward) || input.is_key_pressed("ArrowUp")
    }

    pub fn is_moving_backward(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.backward) || input.is_key_pressed("ArrowDown")
    }

    pub fn is_turning_left(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.left) || input.is_key_pressed("ArrowLeft")
    }

    pub fn is_turning_right(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.right) || input.is_key_pressed("ArrowRight")
    }

    pub fn command_for(&self, key: &str) -> Option<Command> {
        let b = &self.bindings;
        if key.eq_ignore_ascii_case(&b.follow_player) {
            Some(Command::FollowPlayer)
        } else if key == b.unfollow {
            Some(Command::Unfollow)
        } else if key.eq_ignore_ascii_case(&b.toggle_control) {
            Some(Command::ToggleControl)
        } else if key == b.toggle_debug {
            Some(Command::ToggleDebug)
        } else if key.eq_ignore_ascii_case(&b.log_state) {
            Some(Command::LogState)
        } else {
            match key {
                "1" => Some(Command::FollowCube(1)),
                "2" => Some(Command::FollowCube(2)),
                "3" => Some(Command::FollowCube(3)),
                _ => None,
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::*;
    use web_sys::{KeyboardEvent, MouseEvent};

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        let key = e.key();
        if is_down {
            InputEvent::KeyDown(key)
        } else {
            InputEvent::KeyUp(key)
        }
    }

    pub fn mouse_button_to_input(e: &MouseEvent, is_down: bool) -> InputEvent {
        let button = MouseButton::from_web_button(e.button());
        if is_down {
            InputEvent::PointerDown(button)
        } else {
            InputEvent::PointerUp(button)
        }
    }

    pub fn mouse_move_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::PointerMove {
            x: e.client_x() as f32,
            y: e.client_y() as f32,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub mod native {
    use super::*;
    use winit::event::{ElementState, KeyEvent};
    use winit::keyboard::{Key, NamedKey};

    /// Name a logical key the way the browser's `KeyboardEvent.key` does.
    pub fn key_name(key: &Key) -> Option<String> {
        match key {
            Key::Character(s) => Some(s.to_string()),
            Key::Named(NamedKey::Space) => Some(" ".to_string()),
            Key::Named(named) => {
                let name = match named {
                    NamedKey::ArrowUp => "ArrowUp",
                    NamedKey::ArrowDown => "ArrowDown",
                    NamedKey::ArrowLeft => "ArrowLeft",
                    NamedKey::ArrowRight => "ArrowRight",
                    NamedKey::Escape => "Escape",
                    NamedKey::Shift => "Shift",
                    NamedKey::Control => "Control",
                    NamedKey::Alt => "Alt",
                    NamedKey::Enter => "Enter",
                    NamedKey::Tab => "Tab",
                    NamedKey::Backspace => "Backspace",
                    _ => return None,
                };
                Some(name.to_string())
            }
            _ => None,
        }
    }

    pub fn key_event_to_input(event: &KeyEvent) -> Option<InputEvent> {
        let key = key_name(&event.logical_key)?;
        Some(match event.state {
            ElementState::Pressed => InputEvent::KeyDown(key),
            ElementState::Released => InputEvent::KeyUp(key),
        })
    }

    pub fn mouse_button_to_input(
        button: winit::event::MouseButton,
        state: ElementState,
    ) -> InputEvent {
        use winit::event::MouseButton as W;
        let button = match button {
            W::Left => MouseButton::Left,
            W::Middle => MouseButton::Middle,
            W::Right => MouseButton::Right,
            W::Back => MouseButton::Back,
            W::Forward => MouseButton::Forward,
            W::Other(code) => MouseButton::Other(code),
        };
        match state {
            ElementState::Pressed => InputEvent::PointerDown(button),
            ElementState::Released => InputEvent::PointerUp(button),
        }
    }
}
