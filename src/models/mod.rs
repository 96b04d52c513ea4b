pub mod application;
pub mod chat;
pub mod job;
pub mod user;
