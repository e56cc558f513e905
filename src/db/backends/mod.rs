//! Database backend implementations.

pub mod postgres;
