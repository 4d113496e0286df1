//! Length-prefix frame codec for the peer link.
//!
//! Wire format:
//! ```text
//! ┌────────────┬───────────────────────────┐
//! │ Length (2B)│ postcard payload (N B)    │
//! │ LE u16     │                           │
//! └────────────┴───────────────────────────┘
//! ```
//!
//! The decoder accumulates incoming bytes and yields complete frames. A
//! single `Transport::read` may return part of the header, part of the
//! payload, or several frames back to back; [`FrameDecoder::feed`]
//! reports how much of the input it consumed so the caller can loop.

/// Maximum frame payload size.
pub const MAX_FRAME_SIZE: usize = 192;

/// Frame header size (2-byte little-endian length).
pub const HEADER_SIZE: usize = 2;

enum DecoderState {
    ReadingHeader { collected: usize },
    ReadingPayload { expected: usize, collected: usize },
}

/// Streaming frame decoder.
pub struct FrameDecoder {
    state: DecoderState,
    header_buf: [u8; HEADER_SIZE],
    payload_buf: [u8; MAX_FRAME_SIZE],
    dropped: u32,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::ReadingHeader { collected: 0 },
            header_buf: [0; HEADER_SIZE],
            payload_buf: [0; MAX_FRAME_SIZE],
            dropped: 0,
        }
    }

    /// Feed bytes into the decoder.
    ///
    /// Returns the number of bytes consumed and, when a frame completed
    /// inside them, its payload. The slice is valid until the next call.
    pub fn feed(&mut self, data: &[u8]) -> (usize, Option<&[u8]>) {
        let mut offset = 0;

        while offset < data.len() {
            match &mut self.state {
                DecoderState::ReadingHeader { collected } => {
                    let to_copy = (HEADER_SIZE - *collected).min(data.len() - offset);
                    self.header_buf[*collected..*collected + to_copy]
                        .copy_from_slice(&data[offset..offset + to_copy]);
                    *collected += to_copy;
                    offset += to_copy;

                    if *collected == HEADER_SIZE {
                        let expected = u16::from_le_bytes(self.header_buf) as usize;
                        if expected == 0 || expected > MAX_FRAME_SIZE {
                            // resync on the next byte
                            self.dropped = self.dropped.saturating_add(1);
                            self.state = DecoderState::ReadingHeader { collected: 0 };
                            continue;
                        }
                        self.state = DecoderState::ReadingPayload {
                            expected,
                            collected: 0,
                        };
                    }
                }

                DecoderState::ReadingPayload { expected, collected } => {
                    let to_copy = (*expected - *collected).min(data.len() - offset);
                    self.payload_buf[*collected..*collected + to_copy]
                        .copy_from_slice(&data[offset..offset + to_copy]);
                    *collected += to_copy;
                    offset += to_copy;

                    if *collected == *expected {
                        let len = *expected;
                        self.state = DecoderState::ReadingHeader { collected: 0 };
                        return (offset, Some(&self.payload_buf[..len]));
                    }
                }
            }
        }

        (offset, None)
    }

    /// Frames discarded for an out-of-range length.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Reset decoder state (e.g. after a transport reconnect).
    pub fn reset(&mut self) {
        self.state = DecoderState::ReadingHeader { collected: 0 };
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a payload into a length-prefixed frame.
///
/// Writes `[LE-u16 length][payload]` into `out_buf` and returns the total
/// number of bytes written.
pub fn encode_frame(payload: &[u8], out_buf: &mut [u8]) -> Option<usize> {
    let total = HEADER_SIZE + payload.len();
    if payload.is_empty() || payload.len() > MAX_FRAME_SIZE || total > out_buf.len() {
        return None;
    }
    out_buf[..HEADER_SIZE].copy_from_slice(&(payload.len() as u16).to_le_bytes());
    out_buf[HEADER_SIZE..total].copy_from_slice(payload);
    Some(total)
}
