pub mod matches;
pub mod standings;
