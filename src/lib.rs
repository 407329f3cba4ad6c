//! Lambda adapters between Genesys Cloud Function Data Actions and third-party HTTP APIs.
//!
//! Each function lives in a binary under `src/bin/`; the handlers, their request and
//! response shapes, and the shared HTTP/config/error plumbing live here.

pub mod assistants;
pub mod chat;
pub mod config;
pub mod error;
pub mod finance;
pub mod gemini;
pub mod genesys;
pub mod http;
pub mod ibge;
pub mod places;
pub mod simulation;
pub mod text;
pub mod weather;

pub use config::{init_tracing, Settings};
pub use error::{AdapterError, Result};
