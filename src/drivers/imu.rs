// sensorframe — MPU6050 IMU Source
//
// Register-level driver over the shared I2C bus.  Each IMU channel reads one
// axis out of a full 14-byte burst; axis readings are halved so a full-scale
// value fits the wire range with headroom, temperature is whole °C.

pub const BURST_LEN: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImuAxis {
    AccelX,
    AccelY,
    AccelZ,
    GyroX,
    GyroY,
    GyroZ,
    Temperature,
}

impl ImuAxis {
    pub const ALL: [ImuAxis; 7] = [
        Self::AccelX,
        Self::AccelY,
        Self::AccelZ,
        Self::GyroX,
        Self::GyroY,
        Self::GyroZ,
        Self::Temperature,
    ];

    /// Synthetic channel index (wire id is this plus `IMU_ID_OFFSET`).
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    // Offset of the big-endian register pair inside the burst.
    fn offset(self) -> usize {
        match self {
            Self::AccelX => 0,
            Self::AccelY => 2,
            Self::AccelZ => 4,
            Self::Temperature => 6,
            Self::GyroX => 8,
            Self::GyroY => 10,
            Self::GyroZ => 12,
        }
    }
}

/// Channel sample for `axis` from one burst read.
pub fn axis_sample(burst: &[u8; BURST_LEN], axis: ImuAxis) -> i32 {
    let at = axis.offset();
    let raw = i16::from_be_bytes([burst[at], burst[at + 1]]) as i32;
    match axis {
        // Datasheet: °C = raw / 340 + 36.53
        ImuAxis::Temperature => (raw * 100 / 340 + 3653) / 100,
        _ => raw / 2,
    }
}

#[cfg(target_os = "espidf")]
pub use esp::{ImuAxisSource, Mpu6050};

#[cfg(target_os = "espidf")]
mod esp {
    use super::*;
    use crate::config::*;
    use crate::drivers::{lock_bus, SharedBus};
    use crate::source::{FaultLatch, RawSource};

    // MPU6050 register addresses
    const REG_PWR_MGMT_1: u8 = 0x6B;
    const REG_CONFIG: u8 = 0x1A;
    const REG_GYRO_CONFIG: u8 = 0x1B;
    const REG_ACCEL_CONFIG: u8 = 0x1C;
    const REG_ACCEL_XOUT_H: u8 = 0x3B; // Start of 14-byte sensor burst
    const REG_WHO_AM_I: u8 = 0x75;
    const WHO_AM_I_EXPECTED: u8 = 0x68;

    #[derive(Clone, Copy)]
    pub struct Mpu6050 {
        bus: SharedBus,
    }

    impl Mpu6050 {
        pub fn new(bus: SharedBus) -> Self {
            Self { bus }
        }

        /// Verify the device is reachable on the I2C bus.
        pub fn is_connected(&self) -> bool {
            let Ok(mut bus) = lock_bus(self.bus) else {
                return false;
            };
            let mut buf = [0u8; 1];
            match bus.write_read(I2C_ADDR_MPU6050, &[REG_WHO_AM_I], &mut buf, I2C_TIMEOUT_TICKS) {
                Ok(()) => buf[0] == WHO_AM_I_EXPECTED,
                Err(_) => false,
            }
        }

        /// Wake the sensor and configure accel (±8 g), gyro (±500 °/s), DLPF 21 Hz.
        pub fn init(&self) -> anyhow::Result<()> {
            let mut bus = lock_bus(self.bus)?;

            // Wake up (clear SLEEP bit)
            bus.write(I2C_ADDR_MPU6050, &[REG_PWR_MGMT_1, 0x00], I2C_TIMEOUT_TICKS)?;

            // DLPF bandwidth 21 Hz
            bus.write(I2C_ADDR_MPU6050, &[REG_CONFIG, 0x04], I2C_TIMEOUT_TICKS)?;

            // Gyroscope: ±500 °/s
            bus.write(I2C_ADDR_MPU6050, &[REG_GYRO_CONFIG, 0x08], I2C_TIMEOUT_TICKS)?;

            // Accelerometer: ±8 g
            bus.write(I2C_ADDR_MPU6050, &[REG_ACCEL_CONFIG, 0x10], I2C_TIMEOUT_TICKS)?;

            log::info!("MPU6050 initialised (±8g, ±500°/s, DLPF 21Hz)");
            Ok(())
        }

        /// Burst-read accel, temperature and gyro registers.
        pub fn read_burst(&self) -> anyhow::Result<[u8; BURST_LEN]> {
            let mut bus = lock_bus(self.bus)?;
            let mut raw = [0u8; BURST_LEN];
            bus.write_read(I2C_ADDR_MPU6050, &[REG_ACCEL_XOUT_H], &mut raw, I2C_TIMEOUT_TICKS)?;
            Ok(raw)
        }
    }

    /// One IMU axis as a channel source.
    pub struct ImuAxisSource {
        imu: Mpu6050,
        axis: ImuAxis,
        last: i32,
        fault: FaultLatch,
    }

    impl ImuAxisSource {
        pub fn new(imu: Mpu6050, axis: ImuAxis) -> Self {
            Self {
                imu,
                axis,
                last: 0,
                fault: FaultLatch::new(),
            }
        }
    }

    impl RawSource for ImuAxisSource {
        fn acquire(&mut self, _id: u8) -> i32 {
            match self.imu.read_burst() {
                Ok(burst) => {
                    self.last = axis_sample(&burst, self.axis);
                    if self.fault.recover() {
                        log::info!("IMU {:?} reading again", self.axis);
                    }
                }
                Err(e) => {
                    if self.fault.fail() {
                        log::warn!("IMU read error ({:?}): {}", self.axis, e);
                    }
                }
            }
            self.last
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burst(words: [i16; 7]) -> [u8; BURST_LEN] {
        let mut out = [0u8; BURST_LEN];
        for (i, w) in words.iter().enumerate() {
            out[i * 2..i * 2 + 2].copy_from_slice(&w.to_be_bytes());
        }
        out
    }

    #[test]
    fn axes_are_halved() {
        // Burst order: ax, ay, az, temp, gx, gy, gz
        let b = burst([4096, -4096, 32767, 0, -32768, 10, -11]);
        assert_eq!(axis_sample(&b, ImuAxis::AccelX), 2048);
        assert_eq!(axis_sample(&b, ImuAxis::AccelY), -2048);
        assert_eq!(axis_sample(&b, ImuAxis::AccelZ), 16383);
        assert_eq!(axis_sample(&b, ImuAxis::GyroX), -16384);
        assert_eq!(axis_sample(&b, ImuAxis::GyroY), 5);
        assert_eq!(axis_sample(&b, ImuAxis::GyroZ), -5);
    }

    #[test]
    fn temperature_in_whole_degrees() {
        assert_eq!(axis_sample(&burst([0, 0, 0, 0, 0, 0, 0]), ImuAxis::Temperature), 36);
        // 340 LSB per degree
        assert_eq!(axis_sample(&burst([0, 0, 0, -3400, 0, 0, 0]), ImuAxis::Temperature), 26);
    }

    #[test]
    fn index_round_trips() {
        for axis in ImuAxis::ALL {
            assert_eq!(ImuAxis::from_index(axis.index()), Some(axis));
        }
        assert_eq!(ImuAxis::from_index(7), None);
    }
}
