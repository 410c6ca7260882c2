//! Soteria Rust SDK for guarding LLM prompts.
//!
//! Before a guarded function runs, its prompt argument is sent to a remote
//! guard (`POST {api_base}/process`) which may block it, redact it or rewrite
//! it. The function only ever sees the processed prompt.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use soteria::{guard_prompt, CallArgs};
//!
//! fn main() -> Result<(), soteria::GuardError> {
//!     soteria::configure("your-api-key", "https://api.soteriainfra.com");
//!
//!     let greet = guard_prompt("pii-redactor", "prompt")
//!         .wrap(|args: CallArgs| args.get_str("prompt").unwrap_or_default().to_uppercase());
//!
//!     let reply = greet.call(CallArgs::new().kwarg("prompt", "hello, I am jane@example.com"))?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```
//!
//! # Explicit Client
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use soteria::{guard_prompt, GuardClient};
//!
//! fn main() -> Result<(), soteria::GuardError> {
//!     let client = Arc::new(GuardClient::new("your-api-key", "https://guard.internal")?);
//!     let guard = guard_prompt("secrets-masker", "prompt").with_client(client);
//!
//!     let cleaned = guard.process("my token is sk-123")?;
//!     println!("{}", cleaned);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod types;
pub mod guardrails;

pub use client::{send_guard_request, GuardClient};
pub use config::{configure, configure_from_env, current_config, reset};
pub use error::{GuardError, Result};
pub use guardrails::{guard_prompt, presets, CallArgs, GuardPrompt, Guarded};
pub use types::{GuardConfig, GuardOutcome, GuardRequest, Metadata, API_BASE_ENV, API_KEY_ENV};
