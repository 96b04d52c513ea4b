pub mod application_service;
pub mod chat_service;
pub mod cleanup_service;
pub mod eligibility;
pub mod file_store;
pub mod scheduler;
pub mod status_machine;
