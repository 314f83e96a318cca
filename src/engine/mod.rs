//! Pure, I/O-free building blocks of the search pipeline.
//!
//! Every function here is deterministic given its inputs, except where a
//! caller-supplied random source is taken explicitly.

pub mod diversify;
pub mod filters;
pub mod geo;
pub mod ranking;
pub mod similar;
pub mod statistics;
