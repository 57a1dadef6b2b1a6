//! Smart decisions and job plan compilation

pub mod compiler;
pub mod smart;

pub use compiler::{compile, compile_as, compile_degraded, compile_degraded_as};
pub use smart::{decide, smart_audio_profile, Decisions};
