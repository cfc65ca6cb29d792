pub mod chat;
pub mod envelope;
pub mod route;
