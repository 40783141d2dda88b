//! Session scripts: a line-oriented command language that replays input
//! events against a [`Session`](crate::session::Session).
//!
//! ```text
//! container 20 20
//! zone [x: 0, y: 0, width: 8, height: 6, name: "Entrée"]
//! template T1 shelf "Étagère" [width: 2, height: 1.8, depth: 0.6]
//! plan shop "Boutique" {
//!     element E1 shelf [x: 0, y: 0, width: 200, height: 60]
//! }
//! assign T1
//! place T1
//! ```

pub mod ast;
pub mod error;
mod grammar;
pub mod lexer;
pub mod runner;

pub use ast::{Command, Script};
pub use error::{CommandError, ScriptError};
pub use grammar::parse;
pub use runner::{execute, run, CommandOutcome, RunReport};
