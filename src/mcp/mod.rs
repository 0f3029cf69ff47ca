pub mod catalog;
pub mod http;
pub mod interceptor;
pub mod protocol;
pub mod server;
