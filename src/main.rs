// sensorframe — Firmware Entry Point
//
// Boot sequence:
//   1. Bring up logging, the serial link and the shared I2C bus.
//   2. Check for the MPU6050 and MPR121; channels for a missing device are
//      left out.
//   3. Register analog, button, ultrasonic, IMU and capacitive channels.
//   4. Run the scheduler loop on the main task forever.

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use std::sync::Mutex;

    use esp_idf_hal::gpio::{InputPin, OutputPin, Pin};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;

    use sensorframe::channel::{Channel, ChannelConfig, ChannelKind};
    use sensorframe::clock::EspClock;
    use sensorframe::config::*;
    use sensorframe::drivers::adc::{AdcUnit, AnalogSource};
    use sensorframe::drivers::echo::EchoSource;
    use sensorframe::drivers::gpio::{DigitalSource, TriggerSource};
    use sensorframe::drivers::imu::{ImuAxis, ImuAxisSource, Mpu6050};
    use sensorframe::drivers::mpr121::{ElectrodeSource, Mpr121};
    use sensorframe::drivers::uart::UartTransport;
    use sensorframe::tasks::scheduler::{scheduler_task, Scheduler};

    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::set_max_level(LOG_LEVEL);
    if LOG_LEVEL == log::LevelFilter::Off {
        // IDF components log to the same console; silence them too.
        unsafe {
            esp_idf_sys::esp_log_level_set(c"*".as_ptr(), esp_idf_sys::esp_log_level_t_ESP_LOG_NONE);
        }
    }
    log::info!("sensorframe firmware starting…");

    // ---- Peripherals ------------------------------------------------------
    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    // Typed pins must agree with the board map in config.rs.
    debug_assert_eq!(pins.gpio1.pin() as i32, PIN_UART_TX as i32);
    debug_assert_eq!(pins.gpio3.pin() as i32, PIN_UART_RX as i32);
    debug_assert_eq!(pins.gpio21.pin() as i32, PIN_I2C_SDA as i32);
    debug_assert_eq!(pins.gpio22.pin() as i32, PIN_I2C_SCL as i32);
    debug_assert_eq!(pins.gpio34.pin() as i32, PIN_BUTTON_0 as i32);
    debug_assert_eq!(pins.gpio35.pin() as i32, PIN_BUTTON_1 as i32);
    debug_assert_eq!(pins.gpio27.pin() as i32, PIN_ULTRASONIC_TRIG as i32);
    debug_assert_eq!(pins.gpio14.pin() as i32, PIN_ULTRASONIC_ECHO as i32);

    let link = UartTransport::new(peripherals.uart0, pins.gpio1, pins.gpio3)?;

    // ---- I2C bus (shared between MPU6050 and MPR121) ----------------------
    let i2c_config = I2cConfig::new().baudrate(I2C_BAUDRATE_KHZ.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        pins.gpio21, // SDA
        pins.gpio22, // SCL
        &i2c_config,
    )?;
    // SAFETY: The I2C peripheral is a singleton obtained from `Peripherals::take()`.
    // It will live for the entire programme duration (embedded firmware never exits).
    let i2c_bus: &'static Mutex<I2cDriver<'static>> =
        Box::leak(Box::new(Mutex::new(unsafe { core::mem::transmute(i2c) })));

    let mut scheduler = Scheduler::new(EspClock, link);

    // ---- Analog inputs ----------------------------------------------------
    let adc = AdcUnit::new()?;
    let reducers = [
        ChannelKind::Median,
        ChannelKind::Median,
        ChannelKind::Mean,
        ChannelKind::PeakDeviation,
    ];
    for (pin, kind) in ANALOG_PINS.into_iter().zip(reducers) {
        let source = AnalogSource::new(adc, pin, ANALOG_OVERSAMPLE)?;
        scheduler.add(Channel::new(ChannelConfig::analog(pin, kind), source));
    }

    // ---- Buttons ----------------------------------------------------------
    let buttons = [
        (PIN_BUTTON_0, pins.gpio34.downgrade_input()),
        (PIN_BUTTON_1, pins.gpio35.downgrade_input()),
    ];
    for (id, pin) in buttons {
        scheduler.add(Channel::new(ChannelConfig::digital(id), DigitalSource::new(pin)?));
    }

    // ---- Ultrasonic rangefinder -------------------------------------------
    scheduler.add(Channel::new(
        ChannelConfig::trig(PIN_ULTRASONIC_TRIG),
        TriggerSource::new(pins.gpio27.downgrade_output())?,
    ));
    scheduler.add(Channel::new(
        ChannelConfig::echo(PIN_ULTRASONIC_ECHO),
        EchoSource::new(pins.gpio14.downgrade_input())?,
    ));

    // ---- IMU --------------------------------------------------------------
    let imu = Mpu6050::new(i2c_bus);
    match imu.is_connected().then(|| imu.init()) {
        Some(Ok(())) => {
            for axis in ImuAxis::ALL {
                let kind = match axis {
                    ImuAxis::Temperature => ChannelKind::Median,
                    _ => ChannelKind::Mean,
                };
                scheduler.add(Channel::new(
                    ChannelConfig::imu(axis.index(), kind),
                    ImuAxisSource::new(imu, axis),
                ));
            }
        }
        Some(Err(e)) => log::error!("MPU6050 init failed: {}", e),
        None => log::warn!("MPU6050 not found, IMU channels disabled"),
    }

    // ---- Capacitive electrodes --------------------------------------------
    let mpr = Mpr121::new(i2c_bus);
    match mpr.init() {
        Ok(()) => {
            for electrode in 0..CAP_ELECTRODE_COUNT {
                scheduler.add(Channel::new(
                    ChannelConfig::capacitive(electrode),
                    ElectrodeSource::new(mpr, electrode),
                ));
            }
        }
        Err(e) => log::warn!("MPR121 init failed ({}), capacitive channels disabled", e),
    }

    log::info!("Boot complete, entering scheduler loop");
    scheduler_task(scheduler)
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("sensorframe is firmware for ESP-IDF targets; run `cargo test` for the host-side pipeline");
}
