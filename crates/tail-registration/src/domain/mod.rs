//! # Domain Layer
//!
//! Identifier codec, field rules, the challenge state machine and submission
//! assembly. No I/O happens here.

pub mod coordinator;
pub mod entities;
pub mod errors;
pub mod form;
pub mod identifier;
pub mod submission;
pub mod validation;
