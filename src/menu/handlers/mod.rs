//! Handlers for the menu states that run device operations
//!
//! Each handler prints its own progress and result and returns the event
//! that moves the state machine on.

mod connect;
mod recovery;
mod status;
