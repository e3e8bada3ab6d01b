// src/acquisition/mod.rs
//! Signal acquisition and buffering components

pub mod ring_buffer;

pub use ring_buffer::*;
