pub mod ai;
pub mod auth;
pub mod chat;
pub mod scheduling;
