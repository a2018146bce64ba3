//! Resume PDF → structured attendee profile, via Claude's document input.

pub mod handlers;
pub mod prompts;
