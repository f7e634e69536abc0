//! Data transfer objects for the wire formats the core speaks.

pub mod http;
