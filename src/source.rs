// sensorframe — Raw Acquisition Boundary
//
// Every channel kind pulls its samples through one call.  Sources never
// fail: a driver that hits a bus error returns its best guess (usually the
// last good reading) and reports the fault once through a `FaultLatch`.

/// One raw reading for the channel identified by `id`.
pub trait RawSource {
    fn acquire(&mut self, id: u8) -> i32;
}

impl<F> RawSource for F
where
    F: FnMut(u8) -> i32,
{
    fn acquire(&mut self, id: u8) -> i32 {
        self(id)
    }
}

/// Average of `reads` consecutive readings from `read`.
pub fn oversample(reads: u8, mut read: impl FnMut() -> i32) -> i32 {
    let reads = reads.max(1);
    let sum: i64 = (0..reads).map(|_| read() as i64).sum();
    (sum / reads as i64) as i32
}

/// Good/bad state of one source, so a fault that repeats on every
/// acquisition is reported once when it starts and once when it clears.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FaultLatch {
    failing: bool,
}

impl FaultLatch {
    pub const fn new() -> Self {
        Self { failing: false }
    }

    /// Record a failed read.  Returns `true` only on the good→bad edge.
    pub fn fail(&mut self) -> bool {
        !core::mem::replace(&mut self.failing, true)
    }

    /// Record a good read.  Returns `true` only on the bad→good edge.
    pub fn recover(&mut self) -> bool {
        core::mem::replace(&mut self.failing, false)
    }

    pub fn is_failing(&self) -> bool {
        self.failing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_sources() {
        let mut calls = 0;
        let mut src = |id: u8| {
            calls += 1;
            id as i32 * 10
        };
        assert_eq!(src.acquire(4), 40);
        assert_eq!(src.acquire(5), 50);
        assert_eq!(calls, 2);
    }

    #[test]
    fn oversample_averages_and_never_divides_by_zero() {
        let mut seq = [10, 20, 30, 41].into_iter();
        assert_eq!(oversample(4, || seq.next().unwrap_or(0)), 25);
        assert_eq!(oversample(0, || 7), 7);
    }

    #[test]
    fn fault_is_reported_once_per_episode() {
        let mut latch = FaultLatch::new();
        assert!(!latch.recover());
        assert!(latch.fail());
        assert!(!latch.fail());
        assert!(!latch.fail());
        assert!(latch.is_failing());
        assert!(latch.recover());
        assert!(!latch.recover());
        assert!(latch.fail());
    }
}
