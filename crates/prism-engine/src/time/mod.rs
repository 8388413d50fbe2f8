//! Time subsystem.
//!
//! One `ShaderClock` per renderer, started at renderer construction. Call
//! `tick()` once per encoded frame to obtain the time uniform's value.

mod shader_clock;

pub use shader_clock::ShaderClock;
