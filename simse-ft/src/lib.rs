pub mod checker;
pub mod config;
pub mod error;
pub mod node;
pub mod path;
pub mod protocol;
pub mod server;
pub mod transport;
pub mod tree;

#[cfg(test)]
mod proptests;
