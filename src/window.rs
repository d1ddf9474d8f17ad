// sensorframe — Sample Window
//
// Write-once-per-cycle accumulation buffer.  It is not a ring: once full it
// refuses samples until the next reduce clears it, and every refusal is
// counted so the lost-sample policy stays visible.

use heapless::Vec;

use crate::config::SAMPLE_CAPACITY;

#[derive(Debug, Clone, Default)]
pub struct SampleWindow<const N: usize = SAMPLE_CAPACITY> {
    samples: Vec<i32, N>,
    dropped: u32,
}

impl<const N: usize> SampleWindow<N> {
    pub const fn new() -> Self {
        Self {
            samples: Vec::new(),
            dropped: 0,
        }
    }

    /// Append a sample.  Returns `false` (and counts a drop) when full.
    pub fn push(&mut self, sample: i32) -> bool {
        if self.samples.push(sample).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
            return false;
        }
        true
    }

    /// Record a sample that was skipped because the window was full.
    pub fn note_drop(&mut self) {
        self.dropped = self.dropped.wrapping_add(1);
    }

    pub fn is_full(&self) -> bool {
        self.samples.is_full()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.samples
    }

    pub fn last(&self) -> Option<i32> {
        self.samples.last().copied()
    }

    /// Samples lost to a full window since construction.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_accepting_when_full() {
        let mut w: SampleWindow<4> = SampleWindow::new();
        for v in 0..4 {
            assert!(w.push(v));
        }
        assert!(w.is_full());
        assert!(!w.push(99));
        assert_eq!(w.as_slice(), &[0, 1, 2, 3]);
        assert_eq!(w.dropped(), 1);
    }

    #[test]
    fn clear_resets_contents_not_drop_count() {
        let mut w: SampleWindow<2> = SampleWindow::new();
        w.push(1);
        w.push(2);
        w.push(3);
        w.clear();
        assert!(w.is_empty());
        assert_eq!(w.len(), 0);
        assert_eq!(w.dropped(), 1);
        assert!(w.push(7));
        assert_eq!(w.last(), Some(7));
    }

    #[test]
    fn default_capacity_is_32() {
        let mut w: SampleWindow = SampleWindow::new();
        for v in 0..40 {
            w.push(v);
        }
        assert_eq!(w.len(), 32);
        assert_eq!(w.dropped(), 8);
    }
}
