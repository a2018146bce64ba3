//! Attendee search: full-list search against any catalog model, the
//! vector-prefiltered variant, and a prompt-size estimator.

pub mod handlers;
pub mod prompts;
