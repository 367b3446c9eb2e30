pub mod _entities;

pub mod state_machine;

pub mod candidates;
pub mod interviewers;
pub mod interviews;
pub mod feedback;
pub mod ai_screenings;
pub mod stage_changes;
pub mod status_changes;
