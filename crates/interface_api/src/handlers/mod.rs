//! Request handlers

pub mod billing;
pub mod health;
pub mod lab;
pub mod patient;
pub mod pharmacy;
