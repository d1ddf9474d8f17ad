// sensorframe — Serial Framing
//
// Wire format of one frame:
//
//   [id] [value hi] [value lo] END
//
// The value is a signed 16-bit reading sent big-endian in offset-binary
// (`value + 32768`).  Any payload byte equal to END or ESC is sent as
// `ESC, byte`, so END only ever appears as a terminator and frames can be
// concatenated freely on the link.

use core::fmt;

use heapless::Vec;

use crate::config::{FRAME_END, FRAME_ESC, FRAME_VALUE_OFFSET};

/// Worst case: three escaped payload bytes plus the terminator.
pub const MAX_ENCODED_LEN: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub id: u8,
    pub value: i16,
}

impl Frame {
    /// Build a frame, saturating `value` into the 16-bit wire range.
    pub fn new(id: u8, value: i32) -> Self {
        Self {
            id,
            value: value.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
        }
    }

    fn payload(&self) -> [u8; 3] {
        let raw = (self.value as i32 + FRAME_VALUE_OFFSET) as u16;
        let [hi, lo] = raw.to_be_bytes();
        [self.id, hi, lo]
    }

    /// Escaped, terminated byte sequence for this frame.
    pub fn encode(&self) -> Vec<u8, MAX_ENCODED_LEN> {
        let mut out = Vec::new();
        for byte in self.payload() {
            if byte == FRAME_END || byte == FRAME_ESC {
                let _ = out.push(FRAME_ESC);
            }
            let _ = out.push(byte);
        }
        let _ = out.push(FRAME_END);
        out
    }

    /// Parse an unescaped 3-byte payload back into a frame.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        match *payload {
            [id, hi, lo] => {
                let raw = u16::from_be_bytes([hi, lo]) as i32;
                Some(Self {
                    id,
                    value: (raw - FRAME_VALUE_OFFSET) as i16,
                })
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Transport: the byte sink the frames go out on
// ---------------------------------------------------------------------------
pub trait Transport {
    /// Write one complete frame.  Fire-and-forget: no acknowledgement.
    fn write(&mut self, bytes: &[u8]) -> anyhow::Result<()>;

    /// Read whatever inbound bytes are pending without blocking.
    fn read(&mut self, _buf: &mut [u8]) -> anyhow::Result<usize> {
        Ok(0)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        (**self).write(bytes)
    }

    fn read(&mut self, buf: &mut [u8]) -> anyhow::Result<usize> {
        (**self).read(buf)
    }
}

/// Collects written bytes in memory.  Useful for simulation and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryTransport {
    pub written: std::vec::Vec<u8>,
    pub inbound: std::collections::VecDeque<u8>,
    pub writes: usize,
}

impl Transport for MemoryTransport {
    fn write(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.written.extend_from_slice(bytes);
        self.writes += 1;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> anyhow::Result<usize> {
        let n = buf.len().min(self.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(self.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

// ---------------------------------------------------------------------------
// Encoder: sole writer of the transport
// ---------------------------------------------------------------------------
pub struct FrameEncoder<T: Transport> {
    transport: T,
}

impl<T: Transport> FrameEncoder<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Encode and write a frame as a single transport write.
    pub fn send(&mut self, frame: Frame) -> anyhow::Result<()> {
        self.transport.write(&frame.encode())
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

// ---------------------------------------------------------------------------
// Decoder: inbound side of the same convention
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The frame grew past the decoder's capacity.
    Overflow,
    /// ESC followed by something other than END or ESC.
    BadEscape(u8),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow => write!(f, "frame exceeds decoder capacity"),
            Self::BadEscape(b) => write!(f, "invalid escape sequence 0x{:02X}", b),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Incremental unescaper.  After an error it drops bytes up to the next END.
#[derive(Debug, Clone, Default)]
pub struct FrameDecoder<const N: usize> {
    buf: Vec<u8, N>,
    escaped: bool,
    discarding: bool,
    complete: bool,
}

impl<const N: usize> FrameDecoder<N> {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            escaped: false,
            discarding: false,
            complete: false,
        }
    }

    /// Feed one byte.  `Ok(Some(payload))` when END closes a frame; the
    /// payload stays valid until the next push.
    pub fn push(&mut self, byte: u8) -> Result<Option<&[u8]>, DecodeError> {
        if self.complete {
            self.complete = false;
            self.buf.clear();
        }

        if self.discarding {
            if byte == FRAME_END {
                self.discarding = false;
                self.escaped = false;
                self.buf.clear();
            }
            return Ok(None);
        }

        if self.escaped {
            self.escaped = false;
            if byte != FRAME_END && byte != FRAME_ESC {
                return Err(self.fail(DecodeError::BadEscape(byte)));
            }
            return self.store(byte).map(|_| None);
        }

        match byte {
            FRAME_ESC => {
                self.escaped = true;
                Ok(None)
            }
            FRAME_END => {
                self.complete = true;
                Ok(Some(self.buf.as_slice()))
            }
            _ => self.store(byte).map(|_| None),
        }
    }

    fn store(&mut self, byte: u8) -> Result<(), DecodeError> {
        if self.buf.push(byte).is_err() {
            return Err(self.fail(DecodeError::Overflow));
        }
        Ok(())
    }

    fn fail(&mut self, err: DecodeError) -> DecodeError {
        self.buf.clear();
        self.discarding = true;
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8]) -> std::vec::Vec<Frame> {
        let mut decoder: FrameDecoder<8> = FrameDecoder::new();
        let mut frames = std::vec::Vec::new();
        for &b in bytes {
            if let Ok(Some(payload)) = decoder.push(b) {
                frames.extend(Frame::from_payload(payload));
            }
        }
        frames
    }

    #[test]
    fn round_trip_negative_value() {
        let frame = Frame::new(7, -300);
        let bytes = frame.encode();
        // -300 + 32768 = 32468 = 0x7ED4
        assert_eq!(bytes.as_slice(), &[7, 0x7E, 0xD4, FRAME_END]);
        assert_eq!(decode_all(&bytes), vec![Frame::new(7, -300)]);
    }

    #[test]
    fn value_bytes_colliding_with_end_and_esc_are_escaped() {
        // 32766 + 32768 = 0xFFFE
        let frame = Frame::new(FRAME_END, 32766);
        let bytes = frame.encode();
        assert_eq!(
            bytes.as_slice(),
            &[FRAME_ESC, FRAME_END, FRAME_ESC, FRAME_END, FRAME_ESC, FRAME_ESC, FRAME_END]
        );
        assert_eq!(decode_all(&bytes), vec![frame]);
    }

    #[test]
    fn concatenated_frames_decode_independently() {
        let frames = [Frame::new(3, 100), Frame::new(254, -1), Frame::new(110, 1)];
        let stream: std::vec::Vec<u8> = frames.iter().flat_map(|f| f.encode()).collect();
        assert_eq!(decode_all(&stream), frames.to_vec());
    }

    #[test]
    fn wide_values_saturate() {
        assert_eq!(Frame::new(1, 100_000).value, i16::MAX);
        assert_eq!(Frame::new(1, -100_000).value, i16::MIN);
    }

    #[test]
    fn encoder_writes_each_frame_once() {
        let mut enc = FrameEncoder::new(MemoryTransport::default());
        enc.send(Frame::new(36, 2048)).unwrap();
        enc.send(Frame::new(39, 0)).unwrap();
        assert_eq!(enc.transport().writes, 2);
        assert_eq!(decode_all(&enc.transport().written).len(), 2);
    }

    #[test]
    fn decoder_resyncs_after_bad_escape() {
        let mut decoder: FrameDecoder<8> = FrameDecoder::new();
        assert_eq!(decoder.push(1), Ok(None));
        assert_eq!(decoder.push(FRAME_ESC), Ok(None));
        assert_eq!(decoder.push(0x10), Err(DecodeError::BadEscape(0x10)));
        assert_eq!(decoder.push(2), Ok(None));
        assert_eq!(decoder.push(FRAME_END), Ok(None));

        for b in Frame::new(5, 5).encode() {
            if let Some(payload) = decoder.push(b).unwrap() {
                assert_eq!(Frame::from_payload(payload), Some(Frame::new(5, 5)));
            }
        }
    }

    #[test]
    fn decoder_reports_overflow() {
        let mut decoder: FrameDecoder<2> = FrameDecoder::new();
        decoder.push(1).unwrap();
        decoder.push(2).unwrap();
        assert_eq!(decoder.push(3), Err(DecodeError::Overflow));
    }
}
