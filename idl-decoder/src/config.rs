//! Decoder and logging configuration.

use std::collections::HashMap;
use std::str::FromStr;

use solana_pubkey::Pubkey;

use crate::codec::DEFAULT_MAX_DEPTH;

/// How much detail the transaction formatter prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogVerbosity {
    /// Instruction names and events only.
    Brief,
    /// Adds decoded fields and account tables.
    #[default]
    Standard,
    /// Adds raw payloads and program logs.
    Detailed,
}

impl FromStr for LogVerbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "brief" => Ok(LogVerbosity::Brief),
            "standard" => Ok(LogVerbosity::Standard),
            "detailed" | "debug" => Ok(LogVerbosity::Detailed),
            other => Err(format!("unknown verbosity `{other}`")),
        }
    }
}

/// Well-known program names, injected by the caller.
#[derive(Debug, Clone, Default)]
pub struct KnownPrograms(HashMap<Pubkey, String>);

impl KnownPrograms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names for the native and SPL programs most transactions touch.
    pub fn solana_builtins() -> Self {
        let mut known = Self::new();
        for (id, name) in [
            ("11111111111111111111111111111111", "System Program"),
            ("ComputeBudget111111111111111111111111111111", "Compute Budget"),
            ("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA", "SPL Token"),
            ("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb", "Token 2022"),
            ("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL", "Associated Token Account"),
            ("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr", "Memo Program"),
            ("BPFLoaderUpgradeab1e11111111111111111111111", "BPF Upgradeable Loader"),
        ] {
            if let Ok(pubkey) = Pubkey::from_str(id) {
                known.insert(pubkey, name);
            }
        }
        known
    }

    pub fn insert(&mut self, program_id: Pubkey, name: impl Into<String>) {
        self.0.insert(program_id, name.into());
    }

    pub fn get(&self, program_id: &Pubkey) -> Option<&str> {
        self.0.get(program_id).map(String::as_str)
    }
}

/// User-facing account labels, injected by the caller.
#[derive(Debug, Clone, Default)]
pub struct AccountLabels(HashMap<Pubkey, String>);

impl AccountLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pubkey: Pubkey, label: impl Into<String>) {
        self.0.insert(pubkey, label.into());
    }

    pub fn get(&self, pubkey: &Pubkey) -> Option<&str> {
        self.0.get(pubkey).map(String::as_str)
    }
}

/// Configuration for decoding and transaction logging.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Maximum length of the detail appended to "argument decode failed".
    pub max_error_detail: usize,
    /// How many `name:hex` pairs a discriminator-mismatch diagnostic lists.
    pub max_known_discriminators: usize,
    /// Nesting limit for defined / container types.
    pub max_type_depth: usize,
    pub known_programs: KnownPrograms,
    pub account_labels: AccountLabels,
    /// Print every logged transaction, not only failed ones.
    pub log_events: bool,
    pub use_colors: bool,
    pub verbosity: LogVerbosity,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_error_detail: 200,
            max_known_discriminators: 5,
            max_type_depth: DEFAULT_MAX_DEPTH,
            known_programs: KnownPrograms::new(),
            account_labels: AccountLabels::new(),
            log_events: false,
            use_colors: true,
            verbosity: LogVerbosity::Standard,
        }
    }
}

impl DecoderConfig {
    /// Verbose preset: prints every transaction with full detail.
    pub fn debug() -> Self {
        Self {
            log_events: true,
            verbosity: LogVerbosity::Detailed,
            ..Self::default()
        }
    }

    /// Build from environment variables, falling back to defaults.
    ///
    /// - `IDL_DECODER_LOG_EVENTS`: print every transaction
    /// - `IDL_DECODER_NO_COLOR`: disable ANSI colors
    /// - `IDL_DECODER_VERBOSITY`: `brief`, `standard` or `detailed`
    /// - `IDL_DECODER_MAX_ERROR_DETAIL`: diagnostic detail length
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(value) = lookup("IDL_DECODER_LOG_EVENTS") {
            config.log_events = is_truthy(&value);
        }
        if let Some(value) = lookup("IDL_DECODER_NO_COLOR") {
            config.use_colors = !is_truthy(&value);
        }
        if let Some(verbosity) = lookup("IDL_DECODER_VERBOSITY").and_then(|v| v.parse().ok()) {
            config.verbosity = verbosity;
        }
        if let Some(max) = lookup("IDL_DECODER_MAX_ERROR_DETAIL").and_then(|v| v.parse().ok()) {
            config.max_error_detail = max;
        }
        config
    }

    pub fn with_known_programs(mut self, known_programs: KnownPrograms) -> Self {
        self.known_programs = known_programs;
        self
    }

    pub fn with_account_labels(mut self, account_labels: AccountLabels) -> Self {
        self.account_labels = account_labels;
        self
    }

    pub fn with_verbosity(mut self, verbosity: LogVerbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Truncate a diagnostic detail to `max_error_detail` characters.
    pub(crate) fn bound_detail(&self, detail: &str) -> String {
        if detail.chars().count() <= self.max_error_detail {
            return detail.to_string();
        }
        let mut bounded: String = detail.chars().take(self.max_error_detail).collect();
        bounded.push_str("...");
        bounded
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
