//! Keyboard-to-controller mapping for the windowed runner.

use winit::keyboard::KeyCode;

use crate::input::NesButton;

/// Map a physical key to a controller-1 button.
///
/// Z/X are A/B, arrows are the D-pad, Enter is Start and right Shift is
/// Select.
#[must_use]
pub fn map_keycode(keycode: KeyCode) -> Option<NesButton> {
    match keycode {
        KeyCode::KeyZ => Some(NesButton::A),
        KeyCode::KeyX => Some(NesButton::B),
        KeyCode::ShiftRight => Some(NesButton::Select),
        KeyCode::Enter => Some(NesButton::Start),
        KeyCode::ArrowUp => Some(NesButton::Up),
        KeyCode::ArrowDown => Some(NesButton::Down),
        KeyCode::ArrowLeft => Some(NesButton::Left),
        KeyCode::ArrowRight => Some(NesButton::Right),
        _ => None,
    }
}
