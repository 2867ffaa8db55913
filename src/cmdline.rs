//! Kernel command line normalization.
//!
//! Turns a raw argument string into an ordered name/value mapping for
//! downstream tooling. Bare flags are collected separately and exposed under
//! the reserved `_` key only when the mapping leaves this module.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Key under which positional tokens are published.
pub const POSITIONAL_KEY: &str = "_";

/// Positional token injected when speculative-execution mitigations are off.
pub const NOSPEC_TOKEN: &str = "nospec";

/// Named entries injected when speculative-execution mitigations are off.
pub const MITIGATION_OVERRIDES: &[(&str, &str)] = &[("spectre_v2", "off"), ("pti", "off")];

/// Ordered boot arguments.
///
/// Named arguments keep the position where their name was first seen, with
/// later values overwriting earlier ones. Positional tokens keep their order
/// and are published as one space-joined entry sitting where the first of
/// them appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedArgs {
    named: Vec<(String, String)>,
    positional: Vec<String>,
    // Number of named entries that preceded the first positional token.
    positional_slot: Option<usize>,
}

impl NormalizedArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize `raw` boot arguments, optionally disabling CPU mitigations.
    pub fn parse(raw: &str, disable_meltdown_spectre: bool) -> Self {
        let mut args = Self::new();
        if disable_meltdown_spectre {
            args.push_positional(NOSPEC_TOKEN);
            for (name, value) in MITIGATION_OVERRIDES {
                args.insert(name, value);
            }
        }

        for token in raw.split(' ').filter(|token| !token.is_empty()) {
            match token.split_once('=') {
                Some(("", _)) => args.push_positional(token),
                Some((POSITIONAL_KEY, value)) => args.push_positional(value),
                Some((name, value)) => args.insert(name, value),
                None => args.push_positional(token),
            }
        }
        args
    }

    /// Set `name` to `value`, keeping the original position of `name`.
    pub fn insert(&mut self, name: &str, value: &str) {
        match self.named.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.named.push((name.to_string(), value.to_string())),
        }
    }

    pub fn push_positional(&mut self, token: &str) {
        if self.positional_slot.is_none() {
            self.positional_slot = Some(self.named.len());
        }
        self.positional.push(token.to_string());
    }

    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// Value of a named argument. Positional tokens are not reachable here.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.named
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.positional.is_empty()
    }

    /// Number of entries in the published mapping.
    pub fn len(&self) -> usize {
        self.named.len() + usize::from(!self.positional.is_empty())
    }

    /// Published entries in order, with positional tokens joined under `_`.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.len());
        let joined = self.positional.join(" ");
        for (idx, (name, value)) in self.named.iter().enumerate() {
            if self.positional_slot == Some(idx) {
                out.push((POSITIONAL_KEY.to_string(), joined.clone()));
            }
            out.push((name.clone(), value.clone()));
        }
        if self.positional_slot == Some(self.named.len()) {
            out.push((POSITIONAL_KEY.to_string(), joined));
        }
        out
    }
}

impl Serialize for NormalizedArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (name, value) in &entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
