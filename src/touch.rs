// sensorframe — Touch Classifier
//
// Adaptive-baseline hysteresis for one capacitive electrode.
//
// `running_max` and `running_min` only ever widen: they are never decayed
// and never reset after startup.  A single large spike therefore raises both
// thresholds for the rest of the uptime, and touch sensitivity drifts down
// with it.  The thresholds (touch above 2/3 of the max, release below 2/4)
// leave a dead zone where the previous state is held.

use crate::config::{TOUCH_INITIAL_MAX, TOUCH_INITIAL_MIN};
use crate::events::TouchState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchClassifier {
    running_max: i32,
    running_min: i32,
    current: TouchState,
    previous: TouchState,
}

impl TouchClassifier {
    pub const fn new() -> Self {
        Self {
            running_max: TOUCH_INITIAL_MAX,
            running_min: TOUCH_INITIAL_MIN,
            current: TouchState::Idle,
            previous: TouchState::Idle,
        }
    }

    /// Classify one deviation (mean reading minus idle baseline).
    ///
    /// Returns the new state only when it differs from the last one.
    pub fn classify(&mut self, deviation: i32) -> Option<TouchState> {
        if deviation > self.running_max {
            self.running_max = deviation;
        }
        if deviation < self.running_min {
            self.running_min = deviation;
        }

        let max = self.running_max as i64;
        let deviation = deviation as i64;
        if deviation > max * 2 / 3 {
            self.current = TouchState::Touched;
        } else if deviation < max * 2 / 4 {
            self.current = TouchState::Idle;
        }

        if self.current == self.previous {
            return None;
        }
        self.previous = self.current;
        Some(self.current)
    }

    pub fn state(&self) -> TouchState {
        self.current
    }

    pub fn running_max(&self) -> i32 {
        self.running_max
    }

    pub fn running_min(&self) -> i32 {
        self.running_min
    }
}

impl Default for TouchClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(c: &mut TouchClassifier, deviations: &[i32]) -> Vec<TouchState> {
        deviations.iter().filter_map(|&d| c.classify(d)).collect()
    }

    #[test]
    fn rise_then_fall_emits_touch_and_release() {
        let mut c = TouchClassifier::new();
        // Establish M = 300; the first reading crosses its own 2M/3.
        assert_eq!(c.classify(300), Some(TouchState::Touched));
        assert_eq!(c.classify(100), Some(TouchState::Idle));
        assert_eq!(c.running_max(), 300);

        // 2M/3 = 200, M/2 = 150.
        let events = run(&mut c, &[160, 190, 210, 250, 180, 160, 150, 120, 180]);
        assert_eq!(events, vec![TouchState::Touched, TouchState::Idle]);
    }

    #[test]
    fn dead_zone_holds_state() {
        let mut c = TouchClassifier::new();
        c.classify(300);
        c.classify(0);
        assert!(run(&mut c, &[150, 175, 200, 151]).is_empty());
        assert_eq!(c.state(), TouchState::Idle);
    }

    #[test]
    fn baseline_never_shrinks() {
        let mut c = TouchClassifier::new();
        run(&mut c, &[900, -40, 10, 10, 10]);
        assert_eq!(c.running_max(), 900);
        assert_eq!(c.running_min(), -40);

        // A reading that touched at M = 300 is now well inside the idle band.
        assert_eq!(c.classify(250), None);
        assert_eq!(c.state(), TouchState::Idle);
    }

    #[test]
    fn noise_below_initial_baseline_stays_idle() {
        let mut c = TouchClassifier::new();
        assert!(run(&mut c, &[0, 1, 2, -3]).is_empty());
        assert_eq!(c.running_max(), 5);
    }
}
