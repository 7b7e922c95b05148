use minifb::Key;

/// Pointer state sampled once per tick, in screen-space pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerState {
    /// Current position, `None` while the pointer is off the surface.
    pub position: Option<(f64, f64)>,
    /// Movement since the previous tick.
    pub delta: (f64, f64),
    /// Primary button held (paints velocity).
    pub primary: bool,
    /// Secondary button held (paints density).
    pub secondary: bool,
}

/// Everything the core consumes from the input source for one tick.
/// The boolean events are edges: true only on the tick the key went down.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputFrame {
    pub toggle_run: bool,
    pub toggle_slow: bool,
    pub reset_velocity: bool,
    pub reset_density: bool,
    pub pointer: PointerState,
}

/// Derives per-tick pointer movement from successive position samples.
#[derive(Clone, Debug, Default)]
pub struct PointerTracker {
    last: Option<(f64, f64)>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record this tick's position and return the delta since the last one.
    /// Yields (0, 0) on the first sample and while the pointer is off-surface.
    pub fn update(&mut self, pos: Option<(f64, f64)>) -> (f64, f64) {
        let delta = match (self.last, pos) {
            (Some((lx, ly)), Some((x, y))) => (x - lx, y - ly),
            _ => (0.0, 0.0),
        };
        self.last = pos;
        delta
    }
}

/// Resolved key bindings for the window host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyBindings {
    pub toggle_run: Key,
    pub toggle_slow: Key,
    pub reset_velocity: Key,
    pub reset_density: Key,
    pub cycle_view: Key,
    pub quit: Key,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            toggle_run: Key::Space,
            toggle_slow: Key::S,
            reset_velocity: Key::V,
            reset_density: Key::D,
            cycle_view: Key::Tab,
            quit: Key::Escape,
        }
    }
}

/// Parse a key name from the config file (case-insensitive).
pub fn key_from_name(name: &str) -> Option<Key> {
    let lower = name.trim().to_ascii_lowercase();
    let key = match lower.as_str() {
        "space" => Key::Space,
        "escape" | "esc" => Key::Escape,
        "tab" => Key::Tab,
        "enter" | "return" => Key::Enter,
        "backspace" => Key::Backspace,
        "up" => Key::Up,
        "down" => Key::Down,
        "left" => Key::Left,
        "right" => Key::Right,
        "comma" | "," => Key::Comma,
        "period" | "." => Key::Period,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        s if s.len() == 1 => return key_from_char(s.as_bytes()[0]),
        _ => return None,
    };
    Some(key)
}

fn key_from_char(c: u8) -> Option<Key> {
    const LETTERS: [Key; 26] = [
        Key::A, Key::B, Key::C, Key::D, Key::E, Key::F, Key::G, Key::H, Key::I,
        Key::J, Key::K, Key::L, Key::M, Key::N, Key::O, Key::P, Key::Q, Key::R,
        Key::S, Key::T, Key::U, Key::V, Key::W, Key::X, Key::Y, Key::Z,
    ];
    const DIGITS: [Key; 10] = [
        Key::Key0, Key::Key1, Key::Key2, Key::Key3, Key::Key4,
        Key::Key5, Key::Key6, Key::Key7, Key::Key8, Key::Key9,
    ];
    match c {
        b'a'..=b'z' => Some(LETTERS[(c - b'a') as usize]),
        b'0'..=b'9' => Some(DIGITS[(c - b'0') as usize]),
        _ => None,
    }
}
