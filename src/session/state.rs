//! Conversation states carried by the session cache

/// What the bot expects from the user's next free-text message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Next message is a cocktail name to search for
    AwaitingSearchText,
}

impl SessionState {
    pub fn token(self) -> &'static [u8] {
        match self {
            SessionState::AwaitingSearchText => b"searchbyname",
        }
    }

    /// Unknown tokens map to `None`, same as no state at all
    pub fn from_token(token: &[u8]) -> Option<Self> {
        match token {
            b"searchbyname" => Some(SessionState::AwaitingSearchText),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_mapping() {
        let state = SessionState::AwaitingSearchText;
        assert_eq!(SessionState::from_token(state.token()), Some(state));
        assert_eq!(SessionState::from_token(b"something-else"), None);
        assert_eq!(SessionState::from_token(b""), None);
    }
}
