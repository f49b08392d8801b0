use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store rejected write with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Binary access decision observed by the door-lock controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    Denied,
}

impl AccessDecision {
    pub fn from_match(matched: bool) -> Self {
        if matched {
            AccessDecision::Granted
        } else {
            AccessDecision::Denied
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted)
    }
}

/// Remote key-value target holding the latest decision string.
///
/// A write replaces the previous value; there is no versioning.
pub trait DecisionStore: Send {
    fn write(&mut self, value: &str) -> Result<(), PublishError>;
}
