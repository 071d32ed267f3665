//! Collaborator traits defined in `campushub-core` and implemented by other crates.

pub mod mailer;

pub use mailer::{Mailer, OutgoingMail};
