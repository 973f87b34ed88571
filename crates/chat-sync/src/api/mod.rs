//! Request/response side of the chat backend

mod rest;

pub use rest::RestChatApi;
