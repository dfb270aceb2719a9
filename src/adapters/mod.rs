//! Adapters - implementations of the ports plus the HTTP surface.

pub mod ai;
pub mod credentials;
pub mod http;
pub mod knowledge;
pub mod persistence;
pub mod storage;
pub mod tools;
