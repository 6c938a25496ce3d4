//! Window events to touch samples.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, TouchPhase as WinitTouchPhase, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::gesture::{TouchEvent, TouchPhase};

/// What a window event means to the viewer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerAction {
    /// Feed this sample to the gesture interpreter.
    Touch(TouchEvent),
    /// The platform abandoned the current touch.
    Cancel,
    /// A keyboard shortcut for "next item".
    Advance,
}

/// Folds mouse, touch and keyboard window events into touch samples.
///
/// The left mouse button acts as a single finger: press is a touch-down,
/// cursor motion while held is a move, release is a touch-up. Moves with the
/// button up are tracked but not reported.
#[derive(Debug, Default)]
pub struct PointerInput {
    cursor: Vec2,
    pressed: bool,
    /// Id of the finger being followed; others are ignored.
    finger: Option<u64>,
}

impl PointerInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate one window event, if it is relevant.
    pub fn handle_event(&mut self, event: &WindowEvent) -> Option<PointerAction> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x as f32, position.y as f32)
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.left_button(*state == ElementState::Pressed),
            WindowEvent::Touch(touch) => {
                let phase = match touch.phase {
                    WinitTouchPhase::Started => Some(TouchPhase::Down),
                    WinitTouchPhase::Moved => Some(TouchPhase::Move),
                    WinitTouchPhase::Ended => Some(TouchPhase::Up),
                    WinitTouchPhase::Cancelled => None,
                };
                self.finger(
                    touch.id,
                    phase,
                    touch.location.x as f32,
                    touch.location.y as f32,
                )
            }
            WindowEvent::KeyboardInput { event, .. } => match event.physical_key {
                PhysicalKey::Code(key) => self.key(key, event.state == ElementState::Pressed, event.repeat),
                PhysicalKey::Unidentified(_) => None,
            },
            _ => None,
        }
    }

    pub fn cursor_moved(&mut self, x: f32, y: f32) -> Option<PointerAction> {
        self.cursor = Vec2::new(x, y);
        self.pressed
            .then(|| PointerAction::Touch(TouchEvent::new(x, y, TouchPhase::Move)))
    }

    pub fn left_button(&mut self, pressed: bool) -> Option<PointerAction> {
        if pressed == self.pressed {
            return None;
        }
        self.pressed = pressed;
        let phase = if pressed { TouchPhase::Down } else { TouchPhase::Up };
        Some(PointerAction::Touch(TouchEvent::new(
            self.cursor.x,
            self.cursor.y,
            phase,
        )))
    }

    /// A touch sample from finger `id`; `None` phase means cancelled.
    pub fn finger(&mut self, id: u64, phase: Option<TouchPhase>, x: f32, y: f32) -> Option<PointerAction> {
        match (self.finger, phase) {
            (None, Some(TouchPhase::Down)) => {
                self.finger = Some(id);
                Some(PointerAction::Touch(TouchEvent::new(x, y, TouchPhase::Down)))
            }
            (Some(active), Some(phase)) if active == id => {
                if phase == TouchPhase::Up {
                    self.finger = None;
                }
                Some(PointerAction::Touch(TouchEvent::new(x, y, phase)))
            }
            (Some(active), None) if active == id => {
                self.finger = None;
                Some(PointerAction::Cancel)
            }
            _ => None,
        }
    }

    pub fn key(&mut self, key: KeyCode, pressed: bool, repeat: bool) -> Option<PointerAction> {
        match key {
            KeyCode::Space | KeyCode::Enter if pressed && !repeat => Some(PointerAction::Advance),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(x: f32, y: f32, phase: TouchPhase) -> Option<PointerAction> {
        Some(PointerAction::Touch(TouchEvent::new(x, y, phase)))
    }

    #[test]
    fn mouse_click_becomes_down_and_up() {
        let mut input = PointerInput::new();
        assert_eq!(input.cursor_moved(10.0, 20.0), None);
        assert_eq!(input.left_button(true), touch(10.0, 20.0, TouchPhase::Down));
        assert_eq!(input.left_button(false), touch(10.0, 20.0, TouchPhase::Up));
    }

    #[test]
    fn drag_reports_moves_only_while_held() {
        let mut input = PointerInput::new();
        input.left_button(true);
        assert_eq!(input.cursor_moved(5.0, 6.0), touch(5.0, 6.0, TouchPhase::Move));
        input.left_button(false);
        assert_eq!(input.cursor_moved(7.0, 8.0), None);
    }

    #[test]
    fn repeated_button_state_is_ignored() {
        let mut input = PointerInput::new();
        assert!(input.left_button(false).is_none());
        input.left_button(true);
        assert!(input.left_button(true).is_none());
    }

    #[test]
    fn follows_only_the_first_finger() {
        let mut input = PointerInput::new();
        assert_eq!(
            input.finger(1, Some(TouchPhase::Down), 1.0, 1.0),
            touch(1.0, 1.0, TouchPhase::Down)
        );
        assert_eq!(input.finger(2, Some(TouchPhase::Down), 9.0, 9.0), None);
        assert_eq!(input.finger(2, Some(TouchPhase::Move), 9.0, 9.0), None);
        assert_eq!(
            input.finger(1, Some(TouchPhase::Up), 1.0, 1.0),
            touch(1.0, 1.0, TouchPhase::Up)
        );
        // The second finger can take over once the first lifts.
        assert!(input.finger(2, Some(TouchPhase::Down), 3.0, 3.0).is_some());
    }

    #[test]
    fn cancelled_touch_is_reported() {
        let mut input = PointerInput::new();
        input.finger(4, Some(TouchPhase::Down), 0.0, 0.0);
        assert_eq!(input.finger(4, None, 0.0, 0.0), Some(PointerAction::Cancel));
        assert_eq!(input.finger(4, Some(TouchPhase::Move), 1.0, 0.0), None);
    }

    #[test]
    fn space_and_enter_advance() {
        let mut input = PointerInput::new();
        assert_eq!(input.key(KeyCode::Space, true, false), Some(PointerAction::Advance));
        assert_eq!(input.key(KeyCode::Enter, true, false), Some(PointerAction::Advance));
        assert_eq!(input.key(KeyCode::Space, true, true), None);
        assert_eq!(input.key(KeyCode::Space, false, false), None);
        assert_eq!(input.key(KeyCode::KeyA, true, false), None);
    }
}
