//! Engine console log oracle for Gladiator parity runs.
//!
//! A parity run launches a Quake II dedicated server with the Gladiator bot
//! module, captures its console output and writes a metadata document
//! alongside. This crate turns those two artifacts into an ordered event
//! sequence and decides whether the sequence matches a catalogued scenario:
//!
//! 1. **Decode**: [`console`] splits console text into lines, strips the
//!    timestamp prefix ([`timestamp`]) and classifies each line
//!    ([`classify`]); [`metadata`] turns score samples into events.
//! 2. **Merge**: [`merge`] orders both sources by timestamp.
//! 3. **Compare**: [`diff`] aligns the catalogue expectations
//!    ([`catalog`], [`expectation`]) against the merged sequence and
//!    [`report`] renders the outcome.
//! 4. **Refresh**: [`refresh`] regenerates a scenario from a known-good
//!    capture and writes it back into the catalogue.
//!
//! [`runner`] wires the steps together for the `engine_log_harness` binary.

pub mod catalog;
pub mod classify;
pub mod config;
pub mod console;
pub mod diff;
pub mod event;
pub mod expectation;
pub mod merge;
pub mod metadata;
pub mod refresh;
pub mod report;
pub mod runner;
pub mod timestamp;

pub use glparity_error::{ParityError, Result};
