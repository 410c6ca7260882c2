//! Guard decorator factory.

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::client::{send_guard_request, GuardClient};
use crate::error::{GuardError, Result};
use crate::types::{GuardOutcome, Metadata};

/// Arguments of a guarded call.
///
/// The guard reads and rewrites its prompt through the keyword arguments
/// only. A prompt passed positionally is invisible to it and the call fails
/// with [`GuardError::ArgumentMissing`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    positional: Vec<Value>,
    keyword: Map<String, Value>,
}

impl CallArgs {
    /// Empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Add a keyword argument, replacing any previous value under that name.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    /// Keyword argument by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.keyword.get(name)
    }

    /// Keyword argument by name, when it is a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Positional arguments in call order.
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// All keyword arguments.
    pub fn keyword(&self) -> &Map<String, Value> {
        &self.keyword
    }

    /// Insert or replace a keyword argument in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.keyword.insert(name.into(), value.into());
    }
}

#[derive(Debug, Clone)]
enum ClientHandle {
    /// Read the process-wide configuration on every call.
    Default,
    Bound(Arc<GuardClient>),
}

/// A remote guard bound to the name of the argument it inspects.
///
/// Obtained from [`guard_prompt`] or one of the presets, then applied to a
/// function with [`GuardPrompt::wrap`].
#[derive(Debug, Clone)]
pub struct GuardPrompt {
    guard_name: String,
    prompt_arg: String,
    metadata: Metadata,
    client: ClientHandle,
}

/// Create a guard for `guard_name` that checks the keyword argument `prompt_arg`.
///
/// ```rust,no_run
/// use soteria::{guard_prompt, CallArgs};
///
/// soteria::configure("your-api-key", "https://api.soteriainfra.com");
///
/// let greet = guard_prompt("pii-redactor", "prompt")
///     .wrap(|args: CallArgs| format!("Hello, {}", args.get_str("prompt").unwrap_or_default()));
///
/// let reply = greet.call(CallArgs::new().kwarg("prompt", "my email is a@b.c"))?;
/// # Ok::<(), soteria::GuardError>(())
/// ```
pub fn guard_prompt(guard_name: impl Into<String>, prompt_arg: impl Into<String>) -> GuardPrompt {
    GuardPrompt {
        guard_name: guard_name.into(),
        prompt_arg: prompt_arg.into(),
        metadata: Metadata::new(),
        client: ClientHandle::Default,
    }
}

impl GuardPrompt {
    /// Name of the remote guard.
    pub fn guard_name(&self) -> &str {
        &self.guard_name
    }

    /// Keyword argument the guard inspects.
    pub fn prompt_arg(&self) -> &str {
        &self.prompt_arg
    }

    /// Send requests through `client` instead of the default configuration.
    pub fn with_client(mut self, client: Arc<GuardClient>) -> Self {
        self.client = ClientHandle::Bound(client);
        self
    }

    /// Metadata sent with every request. Empty unless set.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Wrap `func` so every call goes through this guard first.
    pub fn wrap<F, R>(&self, func: F) -> Guarded<F>
    where
        F: Fn(CallArgs) -> R,
    {
        Guarded {
            guard: self.clone(),
            func,
        }
    }

    /// Run the guard on `prompt` and return the processed prompt.
    ///
    /// A valid outcome without a processed prompt yields `Value::Null`.
    pub fn process(&self, prompt: impl Into<Value>) -> Result<Value> {
        let outcome = self.send(prompt.into())?;

        if !outcome.is_valid {
            tracing::info!(guard_name = %self.guard_name, "prompt blocked by guard");
            return Err(GuardError::GuardRejection {
                guard_name: self.guard_name.clone(),
                summaries: outcome.validation_summaries,
            });
        }

        if outcome.processed_prompt.is_null() {
            tracing::warn!(
                guard_name = %self.guard_name,
                "guard accepted prompt without returning a processed prompt"
            );
        }

        Ok(outcome.processed_prompt)
    }

    fn send(&self, prompt: Value) -> Result<GuardOutcome> {
        let metadata = self.metadata.clone();
        match &self.client {
            ClientHandle::Default => send_guard_request(prompt, &self.guard_name, metadata),
            ClientHandle::Bound(client) => {
                client.send_guard_request(prompt, &self.guard_name, metadata)
            }
        }
    }
}

/// A function wrapped by a [`GuardPrompt`].
#[derive(Debug, Clone)]
pub struct Guarded<F> {
    guard: GuardPrompt,
    func: F,
}

impl<F> Guarded<F> {
    /// The guard applied before each call.
    pub fn guard(&self) -> &GuardPrompt {
        &self.guard
    }

    /// Call the wrapped function with its prompt argument replaced by the
    /// guard's processed prompt.
    ///
    /// The wrapped function never runs when this returns an error. Safe to
    /// call from inside a Tokio runtime; the HTTP round trip blocks the
    /// calling thread either way.
    pub fn call<R>(&self, mut args: CallArgs) -> Result<R>
    where
        F: Fn(CallArgs) -> R,
    {
        let prompt_arg = &self.guard.prompt_arg;
        let prompt = match args.get(prompt_arg) {
            Some(value) if !value.is_null() => value.clone(),
            _ => {
                return Err(GuardError::ArgumentMissing {
                    prompt_arg: prompt_arg.clone(),
                })
            }
        };

        let processed = self.guard.process(prompt)?;
        args.set(prompt_arg.clone(), processed);

        Ok((self.func)(args))
    }
}
