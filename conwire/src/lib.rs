//! Application framework based on [conwire_di] conditional component registration.
//!
//! An [Application](application::Application) assembles an
//! [ApplicationContext](application::ApplicationContext) from component configurations, evaluating
//! registration conditions along the way, and configures supporting infrastructure, e.g. logging.
//! Contexts can form hierarchies, with conditions deciding whether to search ancestors.
//!
//! ### Features
//!
//! * `threadsafe` - use threadsafe pointers and `Send + Sync` trait bounds

pub mod application;
pub mod config;
pub mod runner;
