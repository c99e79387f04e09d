//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API that front ends call
//! - **Outbound (Driven)**: the remote authorization and registry services

pub mod inbound;
pub mod outbound;
