pub mod aggregate;
pub mod cli;
pub mod component;
pub mod config;
pub mod decode;
pub mod engine;
pub mod page;
pub mod pipeline;
pub mod policy;
pub mod report;
pub mod scorer;
pub mod server;
pub mod util;
pub mod validator;
