// sensorframe — Host Commands
//
// The host may send frames back over the same link using the same END/ESC
// convention.  The only command understood is "set interval":
//
//   [wire id] [interval hi] [interval lo] END

use crate::config::COMMAND_FRAME_CAPACITY;
use crate::frame::{DecodeError, FrameDecoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetInterval { wire_id: u8, interval_ms: u16 },
}

impl Command {
    pub fn parse(payload: &[u8]) -> Option<Self> {
        match *payload {
            [wire_id, hi, lo] => Some(Self::SetInterval {
                wire_id,
                interval_ms: u16::from_be_bytes([hi, lo]),
            }),
            _ => None,
        }
    }
}

/// Turns the inbound byte stream into commands.
#[derive(Debug, Default)]
pub struct CommandDecoder {
    frames: FrameDecoder<COMMAND_FRAME_CAPACITY>,
}

impl CommandDecoder {
    pub const fn new() -> Self {
        Self {
            frames: FrameDecoder::new(),
        }
    }

    /// Feed one inbound byte.  Unknown payloads are logged and dropped.
    pub fn push(&mut self, byte: u8) -> Result<Option<Command>, DecodeError> {
        let Some(payload) = self.frames.push(byte)? else {
            return Ok(None);
        };
        if payload.is_empty() {
            return Ok(None);
        }
        let command = Command::parse(payload);
        if command.is_none() {
            log::warn!("Ignoring unknown host frame ({} bytes)", payload.len());
        }
        Ok(command)
    }
}
