//! Pointer tracking for hit testing.
//!
//! Orbit controls and part selection share the left mouse button. A press
//! only counts as a click if the cursor stays within [`CLICK_THRESHOLD`]
//! pixels of where it went down; anything further is a drag.

use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, MouseButton, WindowEvent},
};

/// Maximum cursor travel in physical pixels between press and release of a click.
pub const CLICK_THRESHOLD: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerState {
    pub position: PhysicalPosition<f64>,
    pub viewport: PhysicalSize<u32>,
    pressed_at: Option<PhysicalPosition<f64>>,
}

impl PointerState {
    pub fn new(viewport: PhysicalSize<u32>) -> Self {
        Self {
            position: PhysicalPosition::new(0.0, 0.0),
            viewport,
            pressed_at: None,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed_at.is_some()
    }

    pub fn press(&mut self) {
        self.pressed_at = Some(self.position);
    }

    /// Release the button. Returns the click position unless the press became a drag.
    pub fn release(&mut self) -> Option<PhysicalPosition<f64>> {
        let start = self.pressed_at.take()?;
        let (dx, dy) = (self.position.x - start.x, self.position.y - start.y);
        if dx.hypot(dy) <= CLICK_THRESHOLD {
            Some(self.position)
        } else {
            log::debug!("Drag of {:.1}px, not a click", dx.hypot(dy));
            None
        }
    }

    /// Feed a window event. Returns the position of a completed left click.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> Option<PhysicalPosition<f64>> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.position = *position;
                None
            }
            WindowEvent::Resized(size) => {
                self.viewport = *size;
                None
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    self.press();
                    None
                }
                ElementState::Released => self.release(),
            },
            _ => None,
        }
    }
}

impl Default for PointerState {
    fn default() -> Self {
        Self::new(PhysicalSize::new(0, 0))
    }
}
