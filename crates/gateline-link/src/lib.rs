//! Bit-serial credential link.
//!
//! A deliberately plaintext two-line protocol: one line carries data bits,
//! the other a manually driven clock strobe marking each sampling instant.
//! The transmitter prefixes every credential with a fixed sentinel byte so
//! the receiver, which has no independent start-of-frame signal, can find
//! frame boundaries by shifting incoming bits through a [`SyncWindow`].
//!
//! Both ends enforce a failed-attempt lockout through their own independent
//! [`AttemptPolicy`] instance; the bit stream is the only channel between
//! them, so the counters are never shared or reconciled.

pub mod frame;
pub mod lockout;
pub mod receiver;
pub mod sync;
pub mod transmitter;

pub use frame::FrameBuffer;
pub use lockout::{AttemptPolicy, Verdict};
pub use receiver::{BitOutcome, CredentialReceiver, FrameAssembler, RxState};
pub use sync::SyncWindow;
pub use transmitter::{CredentialTransmitter, SendOutcome};
