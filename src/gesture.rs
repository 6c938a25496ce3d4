//! Turning raw touch positions into rotation-rate and advance signals.

use glam::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
}

/// One raw touch sample in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchEvent {
    pub x: f32,
    pub y: f32,
    pub phase: TouchPhase,
}

impl TouchEvent {
    pub fn new(x: f32, y: f32, phase: TouchPhase) -> Self {
        Self { x, y, phase }
    }

    fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureSignal {
    /// A drag moved. `delta_y` is the new per-step rotation in degrees;
    /// `delta_x` is computed the same way but nothing consumes it yet.
    Rotate { delta_x: f32, delta_y: f32 },
    /// A tap: show the next catalog item.
    Advance,
}

/// Tracks touch state between events.
///
/// A tap is an up event at exactly the touch-down position. Real touch
/// hardware can jitter by a sub-pixel between the two, so
/// [`with_tap_tolerance`](Self::with_tap_tolerance) can widen the match to a
/// radius; the default stays exact.
#[derive(Clone, Debug)]
pub struct GestureInterpreter {
    density: f32,
    tap_tolerance: f32,
    touch_down: Option<Vec2>,
    last: Vec2,
}

impl GestureInterpreter {
    /// `density` is the display's physical pixels per logical pixel.
    pub fn new(density: f32) -> Self {
        Self {
            density: if density > 0.0 { density } else { 1.0 },
            tap_tolerance: 0.0,
            touch_down: None,
            last: Vec2::ZERO,
        }
    }

    /// Accept taps whose up position is within `radius` pixels of the down
    /// position.
    pub fn with_tap_tolerance(mut self, radius: f32) -> Self {
        self.tap_tolerance = radius.max(0.0);
        self
    }

    pub fn set_density(&mut self, density: f32) {
        if density > 0.0 {
            self.density = density;
        }
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn handle(&mut self, event: TouchEvent) -> Option<GestureSignal> {
        let position = event.position();
        let signal = match event.phase {
            TouchPhase::Down => {
                self.touch_down = Some(position);
                None
            }
            TouchPhase::Move => {
                let delta = (position - self.last) / self.density / 2.0;
                Some(GestureSignal::Rotate {
                    delta_x: delta.x,
                    delta_y: delta.y,
                })
            }
            TouchPhase::Up => self
                .touch_down
                .take()
                .filter(|down| self.is_tap(*down, position))
                .map(|_| GestureSignal::Advance),
        };

        self.last = position;
        signal
    }

    /// Forget an in-progress touch, e.g. when the platform cancels it.
    pub fn cancel(&mut self) {
        self.touch_down = None;
    }

    fn is_tap(&self, down: Vec2, up: Vec2) -> bool {
        if self.tap_tolerance == 0.0 {
            down == up
        } else {
            down.distance(up) <= self.tap_tolerance
        }
    }
}
