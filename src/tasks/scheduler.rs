// sensorframe — Scheduler Task
//
// Cooperative polling loop.  Each pass reads the clock once, applies any
// host commands waiting on the link, then visits every channel in order.
// A channel's frame goes out on the link before the next channel runs.

use crate::channel::Channel;
use crate::clock::Clock;
use crate::command::{Command, CommandDecoder};
use crate::events::TouchMask;
use crate::frame::{FrameEncoder, Transport};
use crate::source::FaultLatch;

const INBOUND_CHUNK: usize = 32;

pub struct Scheduler<C: Clock, T: Transport> {
    clock: C,
    encoder: FrameEncoder<T>,
    commands: CommandDecoder,
    channels: Vec<Channel>,
    touched: TouchMask,
    frames_sent: u32,
    link_fault: FaultLatch,
}

impl<C: Clock, T: Transport> Scheduler<C, T> {
    pub fn new(clock: C, transport: T) -> Self {
        Self {
            clock,
            encoder: FrameEncoder::new(transport),
            commands: CommandDecoder::new(),
            channels: Vec::new(),
            touched: TouchMask::default(),
            frames_sent: 0,
            link_fault: FaultLatch::new(),
        }
    }

    /// Register a channel; its timers start from the current clock reading.
    pub fn add(&mut self, mut channel: Channel) -> &mut Self {
        channel.start(self.clock.now_ms());
        log::info!(
            "Channel {} (wire {}) {}: interval {} ms, sub-period {} ms",
            channel.id(),
            channel.wire_id(),
            channel.kind().name(),
            channel.interval_ms(),
            channel.sub_period_ms()
        );
        self.channels.push(channel);
        self
    }

    /// One scheduler pass over every channel.
    pub fn pass(&mut self) {
        let now = self.clock.now_ms();
        self.poll_commands();

        for channel in self.channels.iter_mut() {
            let Some(emission) = channel.tick(now) else {
                continue;
            };
            if let Some(transition) = emission.touch {
                self.touched.apply(transition);
            }
            log::debug!("{}: {}", emission.frame.id, emission.frame.value);

            match self.encoder.send(emission.frame) {
                Ok(()) => {
                    self.frames_sent = self.frames_sent.wrapping_add(1);
                    if self.link_fault.recover() {
                        log::info!("Frame link writing again");
                    }
                }
                Err(e) => {
                    if self.link_fault.fail() {
                        log::warn!("Frame write failed (wire {}): {}", emission.frame.id, e);
                    }
                }
            }
        }
    }

    fn poll_commands(&mut self) {
        let mut buf = [0u8; INBOUND_CHUNK];
        loop {
            let n = match self.encoder.transport_mut().read(&mut buf) {
                Ok(n) => n,
                Err(e) => {
                    log::warn!("Link read failed: {}", e);
                    return;
                }
            };
            if n == 0 {
                return;
            }
            for &byte in &buf[..n] {
                match self.commands.push(byte) {
                    Ok(Some(command)) => self.apply(command),
                    Ok(None) => {}
                    Err(e) => log::warn!("Dropping host frame: {}", e),
                }
            }
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::SetInterval {
                wire_id,
                interval_ms,
            } => {
                let updated = self.set_interval(wire_id, interval_ms as u32);
                if updated == 0 {
                    log::warn!("SetInterval for unknown wire id {}", wire_id);
                }
            }
        }
    }

    /// Set the output interval of every channel reporting as `wire_id`.
    pub fn set_interval(&mut self, wire_id: u8, interval_ms: u32) -> usize {
        let mut updated = 0;
        for channel in self.channels.iter_mut().filter(|c| c.wire_id() == wire_id) {
            channel.set_interval(interval_ms);
            log::info!(
                "Channel {} interval {} ms (sub-period {} ms)",
                wire_id,
                channel.interval_ms(),
                channel.sub_period_ms()
            );
            updated += 1;
        }
        updated
    }

    /// Enable or disable every channel reporting as `wire_id`.
    pub fn set_enabled(&mut self, wire_id: u8, enabled: bool) -> usize {
        let mut updated = 0;
        for channel in self.channels.iter_mut().filter(|c| c.wire_id() == wire_id) {
            channel.set_enabled(enabled);
            updated += 1;
        }
        updated
    }

    pub fn touched(&self) -> TouchMask {
        self.touched
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn frames_sent(&self) -> u32 {
        self.frames_sent
    }

    /// `true` while frame writes are failing.
    pub fn link_failing(&self) -> bool {
        self.link_fault.is_failing()
    }

    pub fn transport(&self) -> &T {
        self.encoder.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.encoder.transport_mut()
    }
}

/// Firmware main loop.  Never returns.
#[cfg(target_os = "espidf")]
pub fn scheduler_task<C: Clock, T: Transport>(mut scheduler: Scheduler<C, T>) -> ! {
    use std::thread;
    use std::time::Duration;

    use crate::config::PASS_YIELD_MS;

    log::info!("Scheduler started with {} channels", scheduler.channels().len());
    let yield_for = Duration::from_millis(PASS_YIELD_MS);

    loop {
        scheduler.pass();
        // Timing comes from the clock comparison, not from this sleep.
        thread::sleep(yield_for);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelConfig, ChannelKind};
    use crate::clock::ManualClock;
    use crate::config::{CAP_IDLE_BASELINE, FRAME_END};
    use crate::frame::{Frame, FrameDecoder, MemoryTransport};

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn write(&mut self, _bytes: &[u8]) -> anyhow::Result<()> {
            anyhow::bail!("uart busy")
        }
    }

    fn frames(bytes: &[u8]) -> Vec<Frame> {
        let mut d: FrameDecoder<8> = FrameDecoder::new();
        bytes
            .iter()
            .filter_map(|&b| d.push(b).ok().flatten().and_then(Frame::from_payload))
            .collect()
    }

    #[test]
    fn pass_visits_channels_in_order() {
        let clock = ManualClock::new(0);
        let mut s = Scheduler::new(&clock, MemoryTransport::default());
        s.add(Channel::new(ChannelConfig::new(36, ChannelKind::Mean, 10, 1), |_: u8| 1));
        s.add(Channel::new(ChannelConfig::new(39, ChannelKind::Max, 10, 1), |_: u8| 2));

        clock.set(10);
        s.pass();
        assert_eq!(frames(&s.transport().written), vec![Frame::new(36, 1), Frame::new(39, 2)]);
        assert_eq!(s.transport().writes, 2);
        assert_eq!(s.frames_sent(), 2);
    }

    #[test]
    fn touch_mask_follows_electrodes() {
        let clock = ManualClock::new(0);
        let mut s = Scheduler::new(&clock, MemoryTransport::default());
        s.add(Channel::new(ChannelConfig::capacitive(0), |_: u8| CAP_IDLE_BASELINE + 400));
        s.add(Channel::new(ChannelConfig::capacitive(1), |_: u8| CAP_IDLE_BASELINE));

        for t in 1..=100 {
            clock.set(t);
            s.pass();
        }
        assert!(s.touched().is_touched(0));
        assert!(!s.touched().is_touched(1));
        assert_eq!(frames(&s.transport().written), vec![Frame::new(110, 1)]);
    }

    #[test]
    fn host_command_changes_interval() {
        let clock = ManualClock::new(0);
        let mut s = Scheduler::new(&clock, MemoryTransport::default());
        s.add(Channel::new(ChannelConfig::new(3, ChannelKind::Mean, 500, 10), |_: u8| 7));

        s.transport_mut().inbound.extend([3, 0x00, 0x64, FRAME_END]);
        s.pass();
        assert_eq!(s.channels()[0].interval_ms(), 100);
        assert_eq!(s.channels()[0].sub_period_ms(), 10);

        for t in 1..=100 {
            clock.set(t);
            s.pass();
        }
        assert_eq!(frames(&s.transport().written), vec![Frame::new(3, 7)]);
    }

    #[test]
    fn unknown_command_target_is_ignored() {
        let clock = ManualClock::new(0);
        let mut s = Scheduler::new(&clock, MemoryTransport::default());
        s.add(Channel::new(ChannelConfig::new(3, ChannelKind::Mean, 500, 10), |_: u8| 7));
        assert_eq!(s.set_interval(99, 20), 0);
        assert_eq!(s.channels()[0].interval_ms(), 500);
    }

    #[test]
    fn write_errors_do_not_stop_the_pass() {
        let clock = ManualClock::new(0);
        let mut s = Scheduler::new(&clock, FailingTransport);
        s.add(Channel::new(ChannelConfig::new(1, ChannelKind::Mean, 10, 1), |_: u8| 1));
        s.add(Channel::new(ChannelConfig::new(2, ChannelKind::Mean, 10, 1), |_: u8| 2));
        clock.set(10);
        s.pass();
        assert_eq!(s.frames_sent(), 0);
        assert_eq!(s.channels()[1].last_emitted(), 2);
        assert!(s.link_failing());
    }

    #[test]
    fn link_fault_clears_once_writes_succeed() {
        struct FlakyTransport {
            failures_left: u32,
            inner: MemoryTransport,
        }

        impl Transport for FlakyTransport {
            fn write(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
                if self.failures_left > 0 {
                    self.failures_left -= 1;
                    anyhow::bail!("tx fifo full");
                }
                self.inner.write(bytes)
            }
        }

        let clock = ManualClock::new(0);
        let link = FlakyTransport {
            failures_left: 3,
            inner: MemoryTransport::default(),
        };
        let mut s = Scheduler::new(&clock, link);
        s.add(Channel::new(ChannelConfig::new(1, ChannelKind::Mean, 10, 1), |_: u8| 4));

        for t in [10, 20, 30] {
            clock.set(t);
            s.pass();
            assert!(s.link_failing());
        }
        clock.set(40);
        s.pass();
        assert!(!s.link_failing());
        assert_eq!(s.frames_sent(), 1);
        assert_eq!(frames(&s.transport().inner.written), vec![Frame::new(1, 4)]);
    }

    #[test]
    fn disabled_channel_is_skipped() {
        let clock = ManualClock::new(0);
        let mut s = Scheduler::new(&clock, MemoryTransport::default());
        s.add(Channel::new(ChannelConfig::new(1, ChannelKind::Mean, 10, 1), |_: u8| 1));
        assert_eq!(s.set_enabled(1, false), 1);
        clock.set(10);
        s.pass();
        assert!(s.transport().written.is_empty());
    }
}
