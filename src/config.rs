// sensorframe — Hardware & System Configuration
// Target: ESP32 (Xtensa) sensor interface board

// ---------------------------------------------------------------------------
// GPIO Pin Definitions
// ---------------------------------------------------------------------------
/// Analog inputs on ADC1 (ADC2 is unusable while the radio is up).
pub const ANALOG_PINS: [u8; 4] = [36, 39, 32, 33];
pub const PIN_BUTTON_0: u8 = 34; // on-board push button, external pull-up
pub const PIN_BUTTON_1: u8 = 35; // on-board push button, external pull-up
pub const PIN_ULTRASONIC_TRIG: u8 = 27;
pub const PIN_ULTRASONIC_ECHO: u8 = 14;
pub const PIN_I2C_SDA: u8 = 21;
pub const PIN_I2C_SCL: u8 = 22;
pub const PIN_UART_TX: u8 = 1;
pub const PIN_UART_RX: u8 = 3;

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_MPU6050: u8 = 0x68;
pub const I2C_ADDR_MPR121: u8 = 0x5A;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks
pub const I2C_BAUDRATE_KHZ: u32 = 400;

// ---------------------------------------------------------------------------
// Serial link
// ---------------------------------------------------------------------------
pub const UART_BAUDRATE: u32 = 115_200;
/// Frame terminator.
pub const FRAME_END: u8 = 0xFF;
/// Escape prefix for END/ESC bytes inside a payload.
pub const FRAME_ESC: u8 = 0xFE;
/// Wire values are offset-binary: `value + FRAME_VALUE_OFFSET` as u16.
pub const FRAME_VALUE_OFFSET: i32 = 1 << 15;
/// Largest inbound payload the command decoder keeps.
pub const COMMAND_FRAME_CAPACITY: usize = 16;

// ---------------------------------------------------------------------------
// Wire identifier space
// ---------------------------------------------------------------------------
/// Capacitive electrodes are reported as `electrode + CAP_ID_OFFSET`.
pub const CAP_ID_OFFSET: u8 = 110;
/// IMU axes are reported as `axis + IMU_ID_OFFSET`.
pub const IMU_ID_OFFSET: u8 = 150;
pub const CAP_ELECTRODE_COUNT: u8 = 12;

// ---------------------------------------------------------------------------
// Sampling pipeline
// ---------------------------------------------------------------------------
pub const SAMPLE_CAPACITY: usize = 32;
pub const DIGITAL_WINDOW_LEN: usize = 16;
/// Reading of an untouched capacitive electrode.
pub const CAP_IDLE_BASELINE: i32 = 4096;
/// Touch baseline before any deviation has been observed.
pub const TOUCH_INITIAL_MAX: i32 = 5;
pub const TOUCH_INITIAL_MIN: i32 = 0;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const ANALOG_INTERVAL_MS: u32 = 50;
pub const ANALOG_OVERSAMPLE: u8 = 4;
pub const DIGITAL_SUB_PERIOD_MS: u32 = 1;
pub const CAP_INTERVAL_MS: u32 = 100;
pub const CAP_OVERSAMPLE: u8 = 16;
pub const IMU_INTERVAL_MS: u32 = 20;
pub const IMU_OVERSAMPLE: u8 = 2;
/// One ping per sub-period: 300 / 5 = 60 ms, the HC-SR04 minimum cycle.
pub const ULTRASONIC_INTERVAL_MS: u32 = 300;
pub const ULTRASONIC_OVERSAMPLE: u8 = 5;
/// Yield between scheduler passes so the idle task can feed the watchdog.
pub const PASS_YIELD_MS: u64 = 1;

// ---------------------------------------------------------------------------
// Ultrasonic rangefinder (HC-SR04)
// ---------------------------------------------------------------------------
pub const TRIGGER_PULSE_US: u32 = 10;
/// Shortest spacing between trigger pulses before echoes overlap.
pub const ULTRASONIC_MIN_PING_MS: u32 = 60;
const _: () = assert!(ULTRASONIC_INTERVAL_MS / ULTRASONIC_OVERSAMPLE as u32 >= ULTRASONIC_MIN_PING_MS);

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------
/// The console shares UART0 with the frame stream, and any log text would
/// land between frames.  Raise this only on a board that moves the frame
/// link off UART0.
pub const LOG_LEVEL: log::LevelFilter = log::LevelFilter::Off;
