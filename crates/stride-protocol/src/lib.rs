//! stride-protocol — decoder for the coach chat event stream.
//!
//! The coach streams `text/event-stream` frames, each carrying one JSON
//! object on a `data: ` line:
//!
//! ```text
//! data: {"delta":"Easy ","done":false,"error":""}
//!
//! data: {"delta":"run today.","done":false,"error":""}
//!
//! : ping
//!
//! data: {"delta":"","done":true,"error":""}
//! ```
//!
//! [`StreamDecoder`] turns arbitrarily split network chunks into an ordered
//! list of [`Signal`]s.

pub mod decoder;
pub mod frames;
pub mod signal;
pub mod utf8;

pub use decoder::StreamDecoder;
pub use signal::Signal;
