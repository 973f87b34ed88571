//! Ports - interfaces the domain needs from the outside world

mod chat_api;

pub use chat_api::{ApiResult, ChatApi};
