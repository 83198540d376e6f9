/// Ledger membership of a detail URL
///
/// A URL that was never discovered has no state at all.
use std::fmt;

/// Represents the ledger set a discovered URL currently belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    /// Discovered but not yet attempted
    Pending,

    /// Fetched and extracted successfully
    Scraped,

    /// Attempted and errored
    Failed,
}

impl UrlState {
    /// Returns true if no further fetch attempt will be made in normal operation
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Scraped)
    }

    /// Name used for this state in logs and status output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scraped => "scraped",
            Self::Failed => "failed",
        }
    }

    /// Parses a state name; returns None for unknown names
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "scraped" => Some(Self::Scraped),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible states
    pub fn all_states() -> [Self; 3] {
        [Self::Pending, Self::Scraped, Self::Failed]
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!UrlState::Pending.is_terminal());
        assert!(UrlState::Scraped.is_terminal());
        assert!(UrlState::Failed.is_terminal());
    }

    #[test]
    fn test_is_success() {
        assert!(UrlState::Scraped.is_success());
        assert!(!UrlState::Pending.is_success());
        assert!(!UrlState::Failed.is_success());
    }

    #[test]
    fn test_names() {
        for state in UrlState::all_states() {
            assert_eq!(UrlState::from_name(state.as_str()), Some(state));
        }
        assert_eq!(UrlState::from_name("queued"), None);
        assert_eq!(format!("{}", UrlState::Failed), "failed");
    }
}
