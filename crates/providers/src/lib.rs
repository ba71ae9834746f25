//! Generation backend clients for TeamKB.
//!
//! All clients implement the `teamkb_core::Generator` trait.

pub mod openai_compat;

pub use openai_compat::{OpenAiCompatGenerator, SYSTEM_INSTRUCTION};
