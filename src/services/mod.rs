pub mod access_transport;
pub mod bulk;
pub mod doh;
pub mod logger;
pub mod policy;
pub mod tool_executor;
pub mod transport;
