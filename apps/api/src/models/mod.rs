pub mod chat;
pub mod document;
