pub mod activity_log;
pub mod application;
pub mod open;
pub mod panel;
pub mod strength_input;
pub mod style;
pub mod types;
