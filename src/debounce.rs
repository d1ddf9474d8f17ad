// sensorframe — Digital Debouncer
//
// Unanimity vote over the last 16 raw levels.  A level change is reported
// only when every slot agrees and the agreed level differs from the one
// reported before.  Fed once per sub-period from the channel tick.

use crate::config::DIGITAL_WINDOW_LEN;

const ALL_HIGH: u16 = u16::MAX;
const _: () = assert!(DIGITAL_WINDOW_LEN == u16::BITS as usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitalWindow {
    // One bit per slot; the newest sample lands in bit 0.
    history: u16,
    reported: bool,
}

impl DigitalWindow {
    /// Window primed low with a low level already reported.
    pub const fn new() -> Self {
        Self {
            history: 0,
            reported: false,
        }
    }

    /// Push one raw level; returns the new level on a debounced change.
    pub fn push(&mut self, high: bool) -> Option<bool> {
        self.history = (self.history << 1) | high as u16;

        let unanimous = match self.history {
            0 => false,
            ALL_HIGH => true,
            _ => return None,
        };
        if unanimous == self.reported {
            return None;
        }
        self.reported = unanimous;
        Some(unanimous)
    }

    pub fn reported(&self) -> bool {
        self.reported
    }
}

impl Default for DigitalWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(w: &mut DigitalWindow, level: bool, n: usize) -> Vec<bool> {
        (0..n).filter_map(|_| w.push(level)).collect()
    }

    #[test]
    fn fifteen_highs_then_low_does_not_emit() {
        let mut w = DigitalWindow::new();
        assert!(feed(&mut w, true, 15).is_empty());
        assert_eq!(w.push(false), None);
        assert!(!w.reported());
    }

    #[test]
    fn sixteen_highs_after_sixteen_lows_emit_once() {
        let mut w = DigitalWindow::new();
        assert!(feed(&mut w, false, 16).is_empty());
        assert_eq!(feed(&mut w, true, 16), vec![true]);
        assert!(feed(&mut w, true, 40).is_empty());
    }

    #[test]
    fn release_needs_full_agreement_too() {
        let mut w = DigitalWindow::new();
        feed(&mut w, true, 16);
        assert!(feed(&mut w, false, 15).is_empty());
        assert_eq!(w.push(false), Some(false));
    }

    #[test]
    fn bounce_restarts_the_vote() {
        let mut w = DigitalWindow::new();
        feed(&mut w, true, 10);
        w.push(false);
        assert!(feed(&mut w, true, 15).is_empty());
        assert_eq!(w.push(true), Some(true));
    }
}
