//! Inbound adapters exposing the coordinator to external callers.

pub mod http;
