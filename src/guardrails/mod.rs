//! Guard decorators.
//!
//! A guard sends the prompt argument of a call to the remote service before
//! the wrapped function runs. The service either blocks the call or hands back
//! a processed (redacted, rewritten) prompt that replaces the original.
//!
//! # Example
//!
//! ```rust,no_run
//! use soteria::guardrails::presets::extended;
//! use soteria::{CallArgs, GuardError};
//!
//! soteria::configure("your-api-key", "https://api.soteriainfra.com");
//!
//! let ask = extended::guard_profanity().wrap(|args: CallArgs| {
//!     format!("LLM answer to: {}", args.get_str("prompt").unwrap_or_default())
//! });
//!
//! match ask.call(CallArgs::new().kwarg("prompt", "What is the weather?")) {
//!     Ok(answer) => println!("{}", answer),
//!     Err(GuardError::GuardRejection { guard_name, summaries }) => {
//!         println!("Blocked by {}: {}", guard_name, summaries);
//!     }
//!     Err(e) => eprintln!("Guard call failed: {}", e),
//! }
//! ```

mod guard;
pub mod presets;

pub use guard::{guard_prompt, CallArgs, GuardPrompt, Guarded};
