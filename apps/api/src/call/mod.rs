//! Voice-call sessions: persona synthesis, the call state machine, its
//! per-call driver task and the voice gateway seam.

pub mod classify;
pub mod gateway;
pub mod handlers;
pub mod machine;
pub mod persona;
pub mod prompts;
pub mod registry;
pub mod session;
pub mod transcript;
pub mod vapi;
