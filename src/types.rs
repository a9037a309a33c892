use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// "A rebuild should happen now."
///
/// Carries no data; the watcher sends one per settled burst of changes and
/// one more is injected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildSignal;

/// How a burst of qualifying file events is coalesced into one rebuild.
///
/// - `Restart`: every event pushes the deadline out again; the rebuild fires
///   once the tree has been quiet for the full delay (default).
/// - `Fixed`: the first event of a burst arms the timer, later events are
///   absorbed, and the rebuild fires a fixed delay after that first event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DebouncePolicy {
    #[default]
    Restart,
    Fixed,
}

impl FromStr for DebouncePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "restart" => Ok(DebouncePolicy::Restart),
            "fixed" => Ok(DebouncePolicy::Fixed),
            other => Err(format!(
                "invalid debounce_policy: {other} (expected \"restart\" or \"fixed\")"
            )),
        }
    }
}

impl fmt::Display for DebouncePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebouncePolicy::Restart => f.write_str("restart"),
            DebouncePolicy::Fixed => f.write_str("fixed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_policy_names_case_insensitively() {
        assert_eq!("Restart".parse::<DebouncePolicy>(), Ok(DebouncePolicy::Restart));
        assert_eq!(" fixed ".parse::<DebouncePolicy>(), Ok(DebouncePolicy::Fixed));
        assert!("sometimes".parse::<DebouncePolicy>().is_err());
    }
}
