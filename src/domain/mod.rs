pub mod analytics;
pub mod assessment;
pub mod calendar;
pub mod citation;
pub mod coach;
pub mod content;
mod error;
pub mod learner;
pub mod plan;
pub mod skill;
pub mod user;

pub use error::DomainError;

/// Fresh UUID for a newly created record.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
