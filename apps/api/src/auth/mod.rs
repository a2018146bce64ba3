//! Password login for the browser client and the optional site-wide gate.

pub mod gate;
pub mod handlers;
