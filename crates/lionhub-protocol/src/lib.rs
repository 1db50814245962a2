//! Wire types for talking to the chat platform.
//!
//! `blocks` holds the Block Kit layout used for show briefings and update
//! notices, `web_api` the request bodies and response envelopes of the Web API
//! methods the hub calls.

pub mod blocks;
pub mod web_api;

pub use blocks::{Block, TextObject};
