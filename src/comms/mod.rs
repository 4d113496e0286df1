//! Peer board link.
//!
//! ```text
//!  CaseOrchestrator ──▶ PeerHandle ══ channels ══ PeerComms ──▶ Transport
//!                                                    │
//!                         button flags, tank state ◀─┘
//! ```
//!
//! Framing lives in [`codec`], message types in [`message`]. The
//! orchestrator side ([`link`]) and the transport side ([`task`]) share
//! one [`PeerChannels`](link::PeerChannels).

pub mod codec;
pub mod link;
pub mod message;
pub mod task;
pub mod transport;
