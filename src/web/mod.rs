// src/web/mod.rs
pub mod dashboard_handlers;
pub mod message_handlers;
pub mod note_handlers;
pub mod realtime_handlers;
pub mod routes;
pub mod student_handlers;
