//! Invitations and the account lifecycle after provisioning.

pub mod delivery;
pub mod dispatcher;
pub mod lifecycle;
pub mod queue;

pub use delivery::{LogMailer, SmtpMailer, build_mailer};
pub use dispatcher::InvitationDispatcher;
pub use lifecycle::AccountService;
pub use queue::{InvitationQueue, InvitationReceiver};
