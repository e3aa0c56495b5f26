pub mod changelog;
pub mod control;
pub mod cs;
pub mod firmware;
pub mod vrc;
