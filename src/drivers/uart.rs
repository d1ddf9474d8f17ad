// sensorframe — Serial Link (UART0)

#[cfg(target_os = "espidf")]
pub use esp::UartTransport;

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_hal::delay::NON_BLOCK;
    use esp_idf_hal::gpio::{AnyIOPin, InputPin, OutputPin};
    use esp_idf_hal::peripheral::Peripheral;
    use esp_idf_hal::prelude::*;
    use esp_idf_hal::uart::{config::Config, Uart, UartDriver};

    use crate::config::UART_BAUDRATE;
    use crate::frame::Transport;

    pub struct UartTransport {
        uart: UartDriver<'static>,
    }

    impl UartTransport {
        pub fn new(
            uart: impl Peripheral<P = impl Uart> + 'static,
            tx: impl Peripheral<P = impl OutputPin> + 'static,
            rx: impl Peripheral<P = impl InputPin> + 'static,
        ) -> anyhow::Result<Self> {
            let config = Config::new().baudrate(Hertz(UART_BAUDRATE));
            let uart = UartDriver::new(
                uart,
                tx,
                rx,
                Option::<AnyIOPin>::None,
                Option::<AnyIOPin>::None,
                &config,
            )?;
            Ok(Self { uart })
        }
    }

    impl Transport for UartTransport {
        fn write(&mut self, mut bytes: &[u8]) -> anyhow::Result<()> {
            while !bytes.is_empty() {
                let n = self.uart.write(bytes)?;
                bytes = &bytes[n..];
            }
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> anyhow::Result<usize> {
            Ok(self.uart.read(buf, NON_BLOCK)?)
        }
    }
}
