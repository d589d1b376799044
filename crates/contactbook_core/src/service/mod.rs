//! Use-case facade over storage, queues and the index.
//!
//! # Responsibility
//! - Expose the single entry point the presentation layer talks to.
//! - Keep callers decoupled from SQLite and thread plumbing.

pub mod contact_book;
