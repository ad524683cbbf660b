//! Classic STUN (RFC 3489) message codec.
//!
//! Only what NAT type discovery needs: binding requests with an optional
//! CHANGE-REQUEST attribute, and binding responses carrying MAPPED-ADDRESS and
//! CHANGED-ADDRESS.

pub mod attrs;
pub mod constants;
pub mod error;
pub mod header;
pub mod message;
pub mod packet;
pub mod util;
