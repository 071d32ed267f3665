//! PostgreSQL implementations of the store traits.

pub mod member;
pub mod upload;

pub use member::MemberRepository;
pub use upload::UploadRepository;
