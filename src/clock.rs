// sensorframe — Millisecond Clock
//
// One reading per scheduler pass, shared by every channel.  All period
// checks go through `elapsed`, which is safe across the u32 wrap (~49 days).

/// Monotonic millisecond counter.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// Milliseconds from `since` to `now`, correct across counter wraparound.
#[inline]
pub fn elapsed(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Returns `true` once at least `period` ms have passed since `since`.
#[inline]
pub fn is_due(now: u32, since: u32, period: u32) -> bool {
    elapsed(now, since) >= period
}

/// Hand-driven clock for simulations and tests.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: std::cell::Cell<u32>,
}

impl ManualClock {
    pub fn new(start_ms: u32) -> Self {
        Self {
            now: std::cell::Cell::new(start_ms),
        }
    }

    pub fn set(&self, ms: u32) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Milliseconds since boot from the ESP high-resolution timer.
#[cfg(target_os = "espidf")]
#[derive(Debug, Default, Clone, Copy)]
pub struct EspClock;

#[cfg(target_os = "espidf")]
impl Clock for EspClock {
    fn now_ms(&self) -> u32 {
        unsafe { (esp_idf_sys::esp_timer_get_time() / 1000) as u32 }
    }
}
