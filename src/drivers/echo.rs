// sensorframe — Ultrasonic Echo Capture
//
// A GPIO interrupt on both edges of the echo pin timestamps the pulse.  The
// latch is the only state shared between the ISR and the scheduler.

use std::sync::atomic::{AtomicU32, Ordering};

/// Rising-edge timestamp and last complete pulse width, in microseconds.
pub struct EchoLatch {
    rise_us: AtomicU32,
    interval_us: AtomicU32,
}

impl EchoLatch {
    pub const fn new() -> Self {
        Self {
            rise_us: AtomicU32::new(0),
            interval_us: AtomicU32::new(0),
        }
    }

    /// Record an edge.  Called from interrupt context.
    pub fn on_edge(&self, high: bool, now_us: u32) {
        if high {
            self.rise_us.store(now_us, Ordering::Relaxed);
        } else {
            let rise = self.rise_us.load(Ordering::Relaxed);
            self.interval_us.store(now_us.wrapping_sub(rise), Ordering::Release);
        }
    }

    /// Width of the most recent complete echo pulse.
    pub fn interval_us(&self) -> u32 {
        self.interval_us.load(Ordering::Acquire)
    }
}

impl Default for EchoLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
pub use esp::{EchoSource, ECHO};

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_hal::gpio::{AnyInputPin, Input, InterruptType, PinDriver};

    use super::EchoLatch;
    use crate::source::RawSource;

    pub static ECHO: EchoLatch = EchoLatch::new();

    /// Echo pin as a channel source; each acquisition reads the latch.
    pub struct EchoSource {
        // Owns the interrupt subscription.
        _pin: PinDriver<'static, AnyInputPin, Input>,
        latch: &'static EchoLatch,
    }

    impl EchoSource {
        /// Subscribe an any-edge interrupt on `pin` that feeds [`ECHO`].
        pub fn new(pin: AnyInputPin) -> anyhow::Result<Self> {
            let mut pin = PinDriver::input(pin)?;
            let gpio = pin.pin() as i32;
            pin.set_interrupt_type(InterruptType::AnyEdge)?;

            // The HAL masks the pin interrupt before each callback, so the
            // callback re-arms it itself to catch the falling edge.
            // SAFETY: the callback only touches ISR-safe calls and atomics.
            unsafe {
                pin.subscribe(move || {
                    let high = esp_idf_sys::gpio_get_level(gpio) != 0;
                    let now_us = esp_idf_sys::esp_timer_get_time() as u32;
                    ECHO.on_edge(high, now_us);
                    esp_idf_sys::gpio_intr_enable(gpio);
                })?;
            }
            pin.enable_interrupt()?;

            log::info!("Echo capture armed on GPIO{}", gpio);
            Ok(Self {
                _pin: pin,
                latch: &ECHO,
            })
        }
    }

    impl RawSource for EchoSource {
        fn acquire(&mut self, _id: u8) -> i32 {
            self.latch.interval_us().min(i32::MAX as u32) as i32
        }
    }
}
