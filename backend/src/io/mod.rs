//! # IO Module
//!
//! Interface layer that exposes the domain services over HTTP. Pure
//! translation: no business logic lives here.

pub mod rest;

pub use rest::*;
