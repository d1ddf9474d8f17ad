// sensorframe — Analog Inputs (ADC1 oneshot)

/// ADC1 channel number for an ESP32 GPIO, if the pin is routed to ADC1.
pub fn adc1_channel(pin: u8) -> Option<u32> {
    match pin {
        36 => Some(0),
        37 => Some(1),
        38 => Some(2),
        39 => Some(3),
        32 => Some(4),
        33 => Some(5),
        34 => Some(6),
        35 => Some(7),
        _ => None,
    }
}

#[cfg(target_os = "espidf")]
pub use esp::{AdcUnit, AnalogSource};

#[cfg(target_os = "espidf")]
mod esp {
    use super::adc1_channel;
    use crate::source::{oversample, FaultLatch, RawSource};

    /// Oneshot handle for ADC1, shared by every analog channel.
    #[derive(Clone, Copy)]
    pub struct AdcUnit {
        handle: esp_idf_sys::adc_oneshot_unit_handle_t,
    }

    impl AdcUnit {
        pub fn new() -> anyhow::Result<Self> {
            let mut handle: esp_idf_sys::adc_oneshot_unit_handle_t = core::ptr::null_mut();
            // SAFETY: plain C init call; `handle` is written on success.
            let ret = unsafe {
                let unit_cfg = esp_idf_sys::adc_oneshot_unit_init_cfg_t {
                    unit_id: esp_idf_sys::adc_unit_t_ADC_UNIT_1,
                    ulp_mode: esp_idf_sys::adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
                    ..core::mem::zeroed()
                };
                esp_idf_sys::adc_oneshot_new_unit(&unit_cfg, &mut handle)
            };
            if ret != esp_idf_sys::ESP_OK {
                anyhow::bail!("ADC unit init failed ({})", ret);
            }
            Ok(Self { handle })
        }

        /// Configure `pin` for 0–3.3 V at 12 bits.
        pub fn configure(&self, pin: u8) -> anyhow::Result<()> {
            let Some(channel) = adc1_channel(pin) else {
                anyhow::bail!("GPIO{} is not an ADC1 input", pin);
            };
            let chan_cfg = esp_idf_sys::adc_oneshot_chan_cfg_t {
                atten: esp_idf_sys::adc_atten_t_ADC_ATTEN_DB_11,
                bitwidth: esp_idf_sys::adc_bitwidth_t_ADC_BITWIDTH_12,
            };
            let ret = unsafe { esp_idf_sys::adc_oneshot_config_channel(self.handle, channel, &chan_cfg) };
            if ret != esp_idf_sys::ESP_OK {
                anyhow::bail!("ADC channel config failed for GPIO{} ({})", pin, ret);
            }
            Ok(())
        }

        pub fn read(&self, channel: u32) -> Option<i32> {
            let mut raw: i32 = 0;
            let ret = unsafe { esp_idf_sys::adc_oneshot_read(self.handle, channel, &mut raw) };
            (ret == esp_idf_sys::ESP_OK).then_some(raw)
        }
    }

    /// Analog pin as a channel source.  Each acquisition averages
    /// `reads` conversions.
    pub struct AnalogSource {
        adc: AdcUnit,
        channel: u32,
        reads: u8,
        last: i32,
        fault: FaultLatch,
    }

    impl AnalogSource {
        pub fn new(adc: AdcUnit, pin: u8, reads: u8) -> anyhow::Result<Self> {
            adc.configure(pin)?;
            let Some(channel) = adc1_channel(pin) else {
                anyhow::bail!("GPIO{} is not an ADC1 input", pin);
            };
            Ok(Self {
                adc,
                channel,
                reads,
                last: 0,
                fault: FaultLatch::new(),
            })
        }
    }

    impl RawSource for AnalogSource {
        fn acquire(&mut self, id: u8) -> i32 {
            let (adc, channel, last) = (self.adc, self.channel, self.last);
            let mut failed = false;
            let value = oversample(self.reads, || {
                adc.read(channel).unwrap_or_else(|| {
                    failed = true;
                    last
                })
            });
            if failed {
                if self.fault.fail() {
                    log::warn!("ADC read error on GPIO{}", id);
                }
            } else if self.fault.recover() {
                log::info!("ADC on GPIO{} reading again", id);
            }
            self.last = value;
            value
        }
    }
}
