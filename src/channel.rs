// sensorframe — Sensor Channel
//
// One independently scheduled pipeline: acquire → accumulate → reduce → emit.
//
//   Idle ──sub-period due──▶ Accumulating ──interval due, window non-empty──▶
//   Reducing ──▶ Idle
//
// The kind decides what "reduce" means and whether a result is emitted
// unconditionally (value kinds) or only on change (digital, capacitive).

use crate::clock::is_due;
use crate::config::*;
use crate::debounce::DigitalWindow;
use crate::events::{Emission, TouchTransition};
use crate::frame::Frame;
use crate::reduce;
use crate::source::RawSource;
use crate::touch::TouchClassifier;
use crate::window::SampleWindow;

/// Closed set of channel behaviours, each carrying only its own state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelKind {
    Mean,
    Median,
    Min,
    Max,
    PeakDeviation,
    /// Capacitive electrode: mean minus idle baseline, then touch hysteresis.
    CapSense {
        electrode: u8,
        classifier: TouchClassifier,
    },
    /// Ultrasonic echo times in µs, reduced by median.
    Echo,
    /// Binary input, debounced by unanimity; emits on change only.
    Digital(DigitalWindow),
    /// Trigger side of an ultrasonic pair: acquires, never reduces.
    Trig,
}

impl ChannelKind {
    pub fn cap_sense(electrode: u8) -> Self {
        Self::CapSense {
            electrode,
            classifier: TouchClassifier::new(),
        }
    }

    pub fn digital() -> Self {
        Self::Digital(DigitalWindow::new())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Min => "min",
            Self::Max => "max",
            Self::PeakDeviation => "peak-deviation",
            Self::CapSense { .. } => "cap-sense",
            Self::Echo => "echo",
            Self::Digital(_) => "digital",
            Self::Trig => "trig",
        }
    }
}

// ---------------------------------------------------------------------------
// Construction-time configuration
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Pin number or synthetic index handed to the raw source.
    pub id: u8,
    /// Identifier byte carried by this channel's frames.
    pub wire_id: u8,
    pub interval_ms: u32,
    /// Raw samples per output interval; sub-period = interval / over_sample.
    pub over_sample: u8,
    pub kind: ChannelKind,
}

impl ChannelConfig {
    pub fn new(id: u8, kind: ChannelKind, interval_ms: u32, over_sample: u8) -> Self {
        Self {
            id,
            wire_id: id,
            interval_ms,
            over_sample: over_sample.max(1),
            kind,
        }
    }

    /// Analog pin reduced with `kind`.
    pub fn analog(pin: u8, kind: ChannelKind) -> Self {
        Self::new(pin, kind, ANALOG_INTERVAL_MS, ANALOG_OVERSAMPLE)
    }

    /// Debounced digital pin, sampled every `DIGITAL_SUB_PERIOD_MS`.
    pub fn digital(pin: u8) -> Self {
        let window = DIGITAL_WINDOW_LEN as u32 * DIGITAL_SUB_PERIOD_MS;
        Self::new(pin, ChannelKind::digital(), window, DIGITAL_WINDOW_LEN as u8)
    }

    pub fn capacitive(electrode: u8) -> Self {
        Self::new(electrode, ChannelKind::cap_sense(electrode), CAP_INTERVAL_MS, CAP_OVERSAMPLE)
            .with_wire_id(electrode.wrapping_add(CAP_ID_OFFSET))
    }

    pub fn imu(axis: u8, kind: ChannelKind) -> Self {
        Self::new(axis, kind, IMU_INTERVAL_MS, IMU_OVERSAMPLE)
            .with_wire_id(axis.wrapping_add(IMU_ID_OFFSET))
    }

    pub fn echo(pin: u8) -> Self {
        Self::new(pin, ChannelKind::Echo, ULTRASONIC_INTERVAL_MS, ULTRASONIC_OVERSAMPLE)
    }

    pub fn trig(pin: u8) -> Self {
        Self::new(pin, ChannelKind::Trig, ULTRASONIC_INTERVAL_MS, ULTRASONIC_OVERSAMPLE)
    }

    pub fn with_wire_id(mut self, wire_id: u8) -> Self {
        self.wire_id = wire_id;
        self
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------
/// `interval / over_sample`, except that a trigger never pings faster than
/// the rangefinder can settle.
fn sub_period(kind: &ChannelKind, interval_ms: u32, over_sample: u8) -> u32 {
    let period = interval_ms / over_sample as u32;
    match kind {
        ChannelKind::Trig => period.max(ULTRASONIC_MIN_PING_MS),
        _ => period,
    }
}

pub struct Channel {
    id: u8,
    wire_id: u8,
    interval_ms: u32,
    sub_period_ms: u32,
    over_sample: u8,
    enabled: bool,
    kind: ChannelKind,
    window: SampleWindow,
    last_emitted: i32,
    last_sample_ms: u32,
    last_emit_ms: u32,
    source: Box<dyn RawSource>,
}

impl Channel {
    pub fn new(config: ChannelConfig, source: impl RawSource + 'static) -> Self {
        let over_sample = config.over_sample.max(1);
        Self {
            id: config.id,
            wire_id: config.wire_id,
            interval_ms: config.interval_ms,
            sub_period_ms: sub_period(&config.kind, config.interval_ms, over_sample),
            over_sample,
            enabled: true,
            kind: config.kind,
            window: SampleWindow::new(),
            last_emitted: 0,
            last_sample_ms: 0,
            last_emit_ms: 0,
            source: Box::new(source),
        }
    }

    /// Anchor both timers at `now` (call once when the scheduler starts).
    pub fn start(&mut self, now: u32) {
        self.last_sample_ms = now;
        self.last_emit_ms = now;
    }

    /// Run one scheduler visit.  Returns at most one emission.
    pub fn tick(&mut self, now: u32) -> Option<Emission> {
        if !self.enabled {
            return None;
        }
        match self.kind {
            // Digital output is decided by the debouncer, not the interval.
            ChannelKind::Digital(_) => self.accumulate(now),
            ChannelKind::Trig => {
                self.accumulate(now);
                None
            }
            _ => {
                self.accumulate(now);
                self.reduce(now)
            }
        }
    }

    fn accumulate(&mut self, now: u32) -> Option<Emission> {
        if !is_due(now, self.last_sample_ms, self.sub_period_ms) {
            return None;
        }
        self.last_sample_ms = now;

        match &mut self.kind {
            ChannelKind::Digital(debounce) => {
                let high = self.source.acquire(self.id) != 0;
                let level = debounce.push(high)? as i32;
                self.last_emitted = level;
                Some(Emission::value(Frame::new(self.wire_id, level)))
            }
            ChannelKind::Trig => {
                self.source.acquire(self.id);
                None
            }
            _ => {
                if self.window.is_full() {
                    self.window.note_drop();
                } else {
                    let sample = self.source.acquire(self.id);
                    self.window.push(sample);
                }
                None
            }
        }
    }

    fn reduce(&mut self, now: u32) -> Option<Emission> {
        if self.window.is_empty() || !is_due(now, self.last_emit_ms, self.interval_ms) {
            return None;
        }

        let samples = self.window.as_slice();
        let wire_id = self.wire_id;
        let value = match &mut self.kind {
            ChannelKind::Mean => reduce::mean(samples),
            ChannelKind::Median | ChannelKind::Echo => reduce::median(samples),
            ChannelKind::Min => reduce::min(samples),
            ChannelKind::Max => reduce::max(samples),
            ChannelKind::PeakDeviation => reduce::peak_deviation(samples, self.last_emitted),
            ChannelKind::CapSense {
                electrode,
                classifier,
            } => {
                let electrode = *electrode;
                let transition = reduce::mean(samples)
                    .and_then(|mean| classifier.classify(mean.saturating_sub(CAP_IDLE_BASELINE)))
                    .map(|state| TouchTransition { electrode, state });
                self.window.clear();
                self.last_emit_ms = now;

                let transition = transition?;
                self.last_emitted = transition.state.wire_value();
                return Some(Emission {
                    frame: Frame::new(wire_id, self.last_emitted),
                    touch: Some(transition),
                });
            }
            ChannelKind::Digital(_) | ChannelKind::Trig => None,
        };

        self.window.clear();
        self.last_emit_ms = now;

        let value = value?;
        self.last_emitted = value;
        Some(Emission::value(Frame::new(wire_id, value)))
    }

    /// Change the output interval; the sub-period follows the over-sample.
    pub fn set_interval(&mut self, interval_ms: u32) {
        self.interval_ms = interval_ms;
        self.sub_period_ms = sub_period(&self.kind, interval_ms, self.over_sample);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn wire_id(&self) -> u8 {
        self.wire_id
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn sub_period_ms(&self) -> u32 {
        self.sub_period_ms
    }

    pub fn kind(&self) -> &ChannelKind {
        &self.kind
    }

    pub fn last_emitted(&self) -> i32 {
        self.last_emitted
    }

    pub fn pending_samples(&self) -> usize {
        self.window.len()
    }

    /// Samples lost because the window was still full at a sub-period.
    pub fn dropped(&self) -> u32 {
        self.window.dropped()
    }
}
