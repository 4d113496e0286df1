//! Fuzz target: `PeerMessage::decode`
//!
//! Any payload either fails cleanly or decodes to a message that encodes
//! back into a frame.
//!
//! cargo fuzz run fuzz_peer_message

#![no_main]

use libfuzzer_sys::fuzz_target;
use vanwater::comms::message::{MAX_WIRE_SIZE, PeerMessage};

fuzz_target!(|data: &[u8]| {
    if let Ok(msg) = PeerMessage::decode(data) {
        let mut wire = [0u8; MAX_WIRE_SIZE];
        let n = msg.encode(&mut wire).expect("decoded message must re-encode");
        assert!(n <= MAX_WIRE_SIZE);
    }
});
