use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, EgressError>;

#[derive(Debug, Error)]
pub enum EgressError {
    #[error("egress pool exhausted: requested {requested}, {available} available")]
    Exhausted { requested: usize, available: usize },

    #[error("invalid proxy URL {url}: {reason}")]
    InvalidProxy { url: String, reason: String },

    #[error("lease {0} is not held by this provider")]
    UnknownLease(Uuid),
}
