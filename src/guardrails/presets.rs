//! Ready-made guards.
//!
//! Two menus of guard names are in circulation and they do not fully agree
//! (`secrets-redactor` vs `secrets-masker`, for instance). Each is exposed in
//! its own namespace; pick the one matching the guards deployed on your
//! service.

use super::guard::{guard_prompt, GuardPrompt};

/// Argument name every preset inspects.
pub const DEFAULT_PROMPT_ARG: &str = "prompt";

macro_rules! presets {
    ($($(#[$meta:meta])* $fn_name:ident => $guard_name:literal,)+) => {
        $(
            $(#[$meta])*
            pub fn $fn_name() -> GuardPrompt {
                guard_prompt($guard_name, super::DEFAULT_PROMPT_ARG)
            }
        )+

        /// Preset identifier to guard name.
        pub const CATALOG: &[(&str, &str)] = &[$((stringify!($fn_name), $guard_name),)+];

        /// Find a preset by identifier, e.g. `"guard_jailbreak"`.
        pub fn lookup(identifier: &str) -> Option<GuardPrompt> {
            CATALOG
                .iter()
                .find(|(name, _)| *name == identifier)
                .map(|(_, guard_name)| guard_prompt(*guard_name, super::DEFAULT_PROMPT_ARG))
        }
    };
}

/// Redaction and blocking guards for PII, secrets, jailbreaks and prompt injection.
pub mod basic {
    use super::*;

    presets! {
        /// Redacts personally identifiable information.
        guard_pii_redactor => "pii-redactor",
        /// Redacts secrets such as API keys.
        guard_secrets_redactor => "secrets-redactor",
        /// Blocks jailbreak attempts.
        guard_jailbreak => "jailbreak-detector",
        /// Blocks prompt injection.
        guard_prompt_injection => "prompt-injection-detector",
    }
}

/// Redaction, blocking, pipeline and formatting guards.
pub mod extended {
    use super::*;

    presets! {
        /// Redacts personally identifiable information.
        guard_pii => "pii-redactor",
        /// Masks secrets such as API keys.
        guard_secrets => "secrets-masker",
        /// Blocks profanity.
        guard_profanity => "profanity-blocker",
        /// Blocks jailbreak attempts.
        guard_jailbreak => "jailbreak-detector",
        /// Blocks prompts that look unlike normal traffic.
        guard_unusual_prompt => "unusual-prompt-detector",
        /// Blocks SQL and other database injection.
        guard_database_injection => "database-injection-detector",
        /// Runs the standard security pipeline.
        guard_standard_security => "standard-security-pipeline",
        /// Requires the prompt to be exactly two words.
        guard_two_words => "two-words-only",
        /// Rejects prompts over the short length limit.
        guard_short_length => "length-checker-short",
    }
}
