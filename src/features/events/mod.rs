//! # Feature: Event Listeners
//!
//! Gateway events routed to listeners loaded from definition files. Listeners
//! run the same actions as commands but have no invoker to reply to.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: `once` listeners re-arm when their file is reloaded
//! - 1.0.0: Initial release

pub mod bus;

pub use bus::EventBus;
