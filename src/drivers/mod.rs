// sensorframe — Hardware Adapters
//
// Raw-sample sources and the serial link.  Register decoding and other
// pure helpers build everywhere; the ESP-IDF drivers themselves only exist
// under `target_os = "espidf"`.

pub mod adc;
pub mod echo;
pub mod gpio;
pub mod imu;
pub mod mpr121;
pub mod uart;

/// Thread-safe handle to a shared I2C bus.
#[cfg(target_os = "espidf")]
pub type SharedBus = &'static std::sync::Mutex<esp_idf_hal::i2c::I2cDriver<'static>>;

/// Lock the shared bus, turning a poisoned mutex into an error.
#[cfg(target_os = "espidf")]
pub(crate) fn lock_bus(
    bus: SharedBus,
) -> anyhow::Result<std::sync::MutexGuard<'static, esp_idf_hal::i2c::I2cDriver<'static>>> {
    bus.lock().map_err(|_| anyhow::anyhow!("I2C bus mutex poisoned"))
}
