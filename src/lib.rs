//! rusty-payload - capability-checked payload execution over shells
//!
//! This library provides:
//! - A shell abstraction where each operation (execute, read, write, upload,
//!   unlink) is a separate trait a shell may or may not expose
//! - Payloads that declare the operations they need and run only when the
//!   bound shell exposes them, in interactive (text) or structured (JSON) mode
//! - A catalogue of built-in payloads and a local shell for lab targets
//!
//! # Example
//!
//! ```no_run
//! use rusty_payload::payload::{Payload, builtin::CurrentUser};
//! use rusty_payload::shell::LocalShell;
//!
//! let shell = LocalShell::default();
//! let payload = Payload::new(&shell, &CurrentUser);
//!
//! // Empty when the shell exposes everything the payload needs
//! assert!(payload.can_run().is_empty());
//!
//! let text = payload.run("").unwrap();
//! let json = payload.run_api("").unwrap();
//! println!("{text}\n{json}");
//! ```

pub mod config;
pub mod error;
pub mod payload;
pub mod shell;
pub mod utils;

pub use error::{CatalogError, PayloadError, ShellError};
pub use payload::{BasePayload, Mode, Payload, PayloadCatalog, PayloadLogic, ShellAccess};
pub use shell::{LocalShell, Operation, OperationSet, Shell};
