// sensorframe — Pipeline Events & Data Types

use crate::frame::Frame;

// ---------------------------------------------------------------------------
// Touch state (capacitive channels)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TouchState {
    #[default]
    Idle,
    Touched,
}

impl TouchState {
    /// Value carried on the wire: 1 = touched, 0 = idle.
    pub fn wire_value(self) -> i32 {
        match self {
            Self::Idle => 0,
            Self::Touched => 1,
        }
    }
}

/// A touch state change on one electrode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchTransition {
    pub electrode: u8,
    pub state: TouchState,
}

// ---------------------------------------------------------------------------
// Touch aggregate: one bit per electrode, owned by the scheduler
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchMask(u32);

impl TouchMask {
    /// Update one electrode's bit.  Electrodes beyond the mask are ignored.
    pub fn apply(&mut self, transition: TouchTransition) {
        let Some(bit) = Self::bit(transition.electrode) else {
            return;
        };
        match transition.state {
            TouchState::Touched => self.0 |= bit,
            TouchState::Idle => self.0 &= !bit,
        }
    }

    pub fn is_touched(&self, electrode: u8) -> bool {
        Self::bit(electrode).is_some_and(|bit| self.0 & bit != 0)
    }

    fn bit(electrode: u8) -> Option<u32> {
        1u32.checked_shl(electrode as u32)
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn bits(&self) -> u32 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Emission: what one channel tick hands back to the scheduler
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emission {
    pub frame: Frame,
    /// Set when the frame reports a touch transition.
    pub touch: Option<TouchTransition>,
}

impl Emission {
    pub fn value(frame: Frame) -> Self {
        Self { frame, touch: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_tracks_transitions() {
        let mut mask = TouchMask::default();
        mask.apply(TouchTransition { electrode: 3, state: TouchState::Touched });
        mask.apply(TouchTransition { electrode: 11, state: TouchState::Touched });
        assert!(mask.is_touched(3));
        assert_eq!(mask.count(), 2);

        mask.apply(TouchTransition { electrode: 3, state: TouchState::Idle });
        assert!(!mask.is_touched(3));
        assert_eq!(mask.bits(), 1 << 11);
    }

    #[test]
    fn electrodes_past_the_mask_do_not_alias() {
        let mut mask = TouchMask::default();
        mask.apply(TouchTransition { electrode: 32, state: TouchState::Touched });
        mask.apply(TouchTransition { electrode: 33, state: TouchState::Touched });
        assert_eq!(mask.bits(), 0);
        assert!(!mask.is_touched(0));
        assert!(!mask.is_touched(32));

        mask.apply(TouchTransition { electrode: 31, state: TouchState::Touched });
        assert!(mask.is_touched(31));
        assert_eq!(mask.count(), 1);
    }
}
