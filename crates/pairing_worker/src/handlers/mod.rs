pub mod actions;
pub mod classify;
pub mod resolve;
