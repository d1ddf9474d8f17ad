// sensorframe — Digital Inputs & Trigger Outputs
//
// Button level reads and the ultrasonic trigger pulse.

#[cfg(target_os = "espidf")]
pub use esp::{DigitalSource, TriggerSource};

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_hal::delay::Ets;
    use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, Input, Output, PinDriver};

    use crate::config::TRIGGER_PULSE_US;
    use crate::source::{FaultLatch, RawSource};

    /// Input pin read as 0/1.  Pins 34–39 have no internal pulls, so the
    /// board provides them.
    pub struct DigitalSource {
        pin: PinDriver<'static, AnyInputPin, Input>,
    }

    impl DigitalSource {
        pub fn new(pin: AnyInputPin) -> anyhow::Result<Self> {
            Ok(Self {
                pin: PinDriver::input(pin)?,
            })
        }
    }

    impl RawSource for DigitalSource {
        fn acquire(&mut self, _id: u8) -> i32 {
            self.pin.is_high() as i32
        }
    }

    /// Output pin that emits a trigger pulse on every acquisition.
    pub struct TriggerSource {
        pin: PinDriver<'static, AnyOutputPin, Output>,
        fault: FaultLatch,
    }

    impl TriggerSource {
        pub fn new(pin: AnyOutputPin) -> anyhow::Result<Self> {
            let mut pin = PinDriver::output(pin)?;
            pin.set_low()?;
            Ok(Self {
                pin,
                fault: FaultLatch::new(),
            })
        }

        fn pulse(&mut self) -> anyhow::Result<()> {
            self.pin.set_high()?;
            Ets::delay_us(TRIGGER_PULSE_US);
            self.pin.set_low()?;
            Ok(())
        }
    }

    impl RawSource for TriggerSource {
        fn acquire(&mut self, id: u8) -> i32 {
            match self.pulse() {
                Ok(()) => {
                    if self.fault.recover() {
                        log::info!("Trigger on GPIO{} pulsing again", id);
                    }
                }
                Err(e) => {
                    if self.fault.fail() {
                        log::warn!("Trigger pulse failed on GPIO{}: {}", id, e);
                    }
                }
            }
            0
        }
    }
}
