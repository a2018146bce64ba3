//! Attendee profiles: the wire model, the text we embed, the row we store,
//! and the sync endpoint that ties them together.

pub mod handlers;
pub mod models;
pub mod text;
