use bitflags::bitflags;
use glam::Vec2;

bitflags! {
    /// Held-state of every digital control for one tick.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Buttons: u16 {
        const FORWARD      = 1 << 0;
        const BACK         = 1 << 1;
        const TURN_LEFT    = 1 << 2;
        const TURN_RIGHT   = 1 << 3;
        const STRAFE_LEFT  = 1 << 4;
        const STRAFE_RIGHT = 1 << 5;
        /// Edge-triggered by the front-end: set for one pump only.
        const USE          = 1 << 6;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputCmd {
    pub held: Buttons,
    /// Pointer offset from the view centre, each axis in `[-1, 1]`.
    pub pointer: Vec2,
}

impl InputCmd {
    #[inline]
    fn axis(&self, pos: Buttons, neg: Buttons) -> f32 {
        self.held.contains(pos) as i32 as f32 - self.held.contains(neg) as i32 as f32
    }

    /// –1 … +1 (back / forward)
    pub fn forward(&self) -> f32 {
        self.axis(Buttons::FORWARD, Buttons::BACK)
    }

    /// –1 … +1 (left / right)
    pub fn strafe(&self) -> f32 {
        self.axis(Buttons::STRAFE_RIGHT, Buttons::STRAFE_LEFT)
    }

    /// –1 … +1 (left / right)
    pub fn turn(&self) -> f32 {
        self.axis(Buttons::TURN_RIGHT, Buttons::TURN_LEFT)
    }

    /// Vertical look derived from the pointer (up is positive).
    pub fn look(&self) -> f32 {
        -self.pointer.y.clamp(-1.0, 1.0)
    }

    pub fn use_act(&self) -> bool {
        self.held.contains(Buttons::USE)
    }
}
