//! # fakturo
//!
//! `fakturo` is the HTTP backend of a small invoices/customers admin
//! application. The invoices and customers tables themselves are plain CRUD
//! owned by their route handlers; what this crate is careful about is the
//! front door:
//!
//! - credential verification against stored bcrypt hashes, with a single
//!   indistinguishable failure shape for unknown emails and wrong passwords,
//! - server-side sessions (random tokens, hashed at rest, SQL-side expiry),
//! - a login action whose outcome is either a typed rejection state or an
//!   explicit redirect instruction, never an exception,
//! - a perimeter guard that classifies every request path against an ordered
//!   rule list before any handler runs.

pub mod api;
pub mod cli;
