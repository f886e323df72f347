//! Input handling.
//!
//! Two layers: `NesButton` names the controller bits, and `InputQueue`
//! holds frame-timed button events so tests and scripted runs can press
//! buttons deterministically.

use std::collections::VecDeque;

use crate::controller::{Controller, button};

/// Logical button on the NES controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NesButton {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
}

impl NesButton {
    /// Bit position within the controller byte.
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            Self::A => button::A,
            Self::B => button::B,
            Self::Select => button::SELECT,
            Self::Start => button::START,
            Self::Up => button::UP,
            Self::Down => button::DOWN,
            Self::Left => button::LEFT,
            Self::Right => button::RIGHT,
        }
    }
}

/// A timed button event.
#[derive(Debug, Clone)]
pub struct InputEvent {
    /// Frame number at which the event fires.
    pub frame: u64,
    pub button: NesButton,
    /// True = press, false = release.
    pub pressed: bool,
}

/// Frame-ordered queue of button events, drained at frame start.
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }

    /// Insert an event in frame order.
    pub fn push(&mut self, event: InputEvent) {
        let pos = self
            .events
            .iter()
            .position(|e| e.frame > event.frame)
            .unwrap_or(self.events.len());
        self.events.insert(pos, event);
    }

    /// Queue a press at `at_frame` and its release `hold_frames` later.
    pub fn enqueue_button(&mut self, button: NesButton, at_frame: u64, hold_frames: u64) {
        self.push(InputEvent {
            frame: at_frame,
            button,
            pressed: true,
        });
        self.push(InputEvent {
            frame: at_frame + hold_frames,
            button,
            pressed: false,
        });
    }

    /// Apply every event due at `frame` to controller 1.
    pub fn process(&mut self, frame: u64, controller: &mut Controller) {
        while self.events.front().is_some_and(|e| e.frame <= frame) {
            if let Some(event) = self.events.pop_front() {
                controller.set_button(event.button.bit(), event.pressed);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
