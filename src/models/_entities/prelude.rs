pub use super::candidates::Entity as Candidates;
pub use super::interviewers::Entity as Interviewers;
pub use super::interviews::Entity as Interviews;
pub use super::feedback::Entity as Feedback;
pub use super::ai_screenings::Entity as AiScreenings;
pub use super::stage_changes::Entity as StageChanges;
pub use super::status_changes::Entity as StatusChanges;
