pub mod plan_assignments;
pub mod time_entries;
