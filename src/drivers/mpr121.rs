// sensorframe — MPR121 Capacitive Touch Controller
//
// The controller's own touch detection is left alone; we read filtered data
// and the electrode baseline, and report how far the filtered count has
// dropped below the baseline on top of the idle bias.  An untouched
// electrode reads close to `CAP_IDLE_BASELINE`.

use crate::config::CAP_IDLE_BASELINE;

const REG_FILTERED_0L: u8 = 0x04; // 2 bytes per electrode, 10-bit LE
const REG_BASELINE_0: u8 = 0x1E; // 1 byte per electrode, value >> 2

/// Register address of the filtered-data pair for `electrode`.
pub fn filtered_register(electrode: u8) -> u8 {
    REG_FILTERED_0L + electrode * 2
}

pub fn baseline_register(electrode: u8) -> u8 {
    REG_BASELINE_0 + electrode
}

/// Raw channel reading from one electrode's filtered count and baseline byte.
pub fn electrode_reading(filtered: u16, baseline: u8) -> i32 {
    CAP_IDLE_BASELINE + ((baseline as i32) << 2) - (filtered & 0x03FF) as i32
}

#[cfg(target_os = "espidf")]
pub use esp::{ElectrodeSource, Mpr121};

#[cfg(target_os = "espidf")]
mod esp {
    use super::*;
    use crate::config::{CAP_ELECTRODE_COUNT, I2C_ADDR_MPR121, I2C_TIMEOUT_TICKS};
    use crate::drivers::{lock_bus, SharedBus};
    use crate::source::{FaultLatch, RawSource};

    const REG_TOUCH_THRESHOLD_0: u8 = 0x41; // touch/release pairs
    const REG_DEBOUNCE: u8 = 0x5B;
    const REG_CONFIG1: u8 = 0x5C;
    const REG_CONFIG2: u8 = 0x5D;
    const REG_ECR: u8 = 0x5E;
    const REG_SOFT_RESET: u8 = 0x80;

    const SOFT_RESET_MAGIC: u8 = 0x63;
    /// Baseline tracking on, all 12 electrodes enabled.
    const ECR_RUN: u8 = 0x80 | 12;
    const TOUCH_THRESHOLD: u8 = 12;
    const RELEASE_THRESHOLD: u8 = 6;

    #[derive(Clone, Copy)]
    pub struct Mpr121 {
        bus: SharedBus,
    }

    impl Mpr121 {
        pub fn new(bus: SharedBus) -> Self {
            Self { bus }
        }

        pub fn init(&self) -> anyhow::Result<()> {
            let mut bus = lock_bus(self.bus)?;
            let mut write = |reg: u8, value: u8| bus.write(I2C_ADDR_MPR121, &[reg, value], I2C_TIMEOUT_TICKS);

            write(REG_SOFT_RESET, SOFT_RESET_MAGIC)?;
            // Electrodes must be stopped while configuring
            write(REG_ECR, 0x00)?;

            for e in 0..CAP_ELECTRODE_COUNT {
                write(REG_TOUCH_THRESHOLD_0 + e * 2, TOUCH_THRESHOLD)?;
                write(REG_TOUCH_THRESHOLD_0 + e * 2 + 1, RELEASE_THRESHOLD)?;
            }
            write(REG_DEBOUNCE, 0x00)?;
            // 16 µA charge current, 0.5 µs charge time, 1 ms sample interval
            write(REG_CONFIG1, 0x10)?;
            write(REG_CONFIG2, 0x20)?;
            write(REG_ECR, ECR_RUN)?;

            log::info!("MPR121 initialised ({} electrodes)", CAP_ELECTRODE_COUNT);
            Ok(())
        }

        pub fn read_electrode(&self, electrode: u8) -> anyhow::Result<i32> {
            let mut bus = lock_bus(self.bus)?;
            let mut filtered = [0u8; 2];
            bus.write_read(
                I2C_ADDR_MPR121,
                &[filtered_register(electrode)],
                &mut filtered,
                I2C_TIMEOUT_TICKS,
            )?;
            let mut baseline = [0u8; 1];
            bus.write_read(
                I2C_ADDR_MPR121,
                &[baseline_register(electrode)],
                &mut baseline,
                I2C_TIMEOUT_TICKS,
            )?;
            Ok(electrode_reading(u16::from_le_bytes(filtered), baseline[0]))
        }
    }

    /// One electrode as a channel source.
    pub struct ElectrodeSource {
        mpr: Mpr121,
        electrode: u8,
        last: i32,
        fault: FaultLatch,
    }

    impl ElectrodeSource {
        pub fn new(mpr: Mpr121, electrode: u8) -> Self {
            Self {
                mpr,
                electrode,
                last: CAP_IDLE_BASELINE,
                fault: FaultLatch::new(),
            }
        }
    }

    impl RawSource for ElectrodeSource {
        fn acquire(&mut self, _id: u8) -> i32 {
            match self.mpr.read_electrode(self.electrode) {
                Ok(v) => {
                    self.last = v;
                    if self.fault.recover() {
                        log::info!("MPR121 electrode {} reading again", self.electrode);
                    }
                }
                Err(e) => {
                    if self.fault.fail() {
                        log::warn!("MPR121 read error (electrode {}): {}", self.electrode, e);
                    }
                }
            }
            self.last
        }
    }
}
