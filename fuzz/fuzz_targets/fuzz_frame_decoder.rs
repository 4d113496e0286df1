//! Fuzz target: `FrameDecoder::feed`
//!
//! Drives arbitrary byte sequences through the streaming frame decoder in
//! the same consume-and-loop pattern the comms task uses, and asserts it
//! always makes progress and never yields an out-of-bounds payload.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use vanwater::comms::codec::{FrameDecoder, MAX_FRAME_SIZE};

fuzz_target!(|data: &[u8]| {
    let mut decoder = FrameDecoder::new();

    let mut rest = data;
    while !rest.is_empty() {
        let (used, frame) = decoder.feed(rest);
        if let Some(payload) = frame {
            assert!(!payload.is_empty(), "decoder must not yield empty payload");
            assert!(payload.len() <= MAX_FRAME_SIZE, "payload exceeds MAX_FRAME_SIZE");
        }
        assert!(used > 0 && used <= rest.len(), "decoder must make progress");
        rest = &rest[used..];
    }

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    let _ = decoder.feed(data);
});
