//! Provisioned tenant member entities.

pub mod lifecycle;
pub mod model;
pub mod profile;
pub mod status;

pub use lifecycle::{AccountLifecycle, LifecycleEvent, TransitionError};
pub use model::{NewMember, TenantMember};
pub use profile::{NewProfile, StudentProfile, TrainerProfile};
pub use status::{AccountStatus, MemberKind};
