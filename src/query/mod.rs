//! Student-facing query model: subject choices, strategy tiers and the
//! request shapes relayed to the recommendation backend.

pub mod subjects;
pub mod types;
pub mod validation;

pub use subjects::{FirstSubject, OptionalSubject, SubjectError, SubjectSelection};
pub use types::{MajorGroupQuery, ReportQuery, Strategy, UniversityQuery};
pub use validation::validate_university_query;

/// Major-priority requests carry the report field set
pub type MajorPriorityQuery = ReportQuery;
