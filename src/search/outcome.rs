use crate::errors::SearchError;

/// The result of one search attempt, consumed once to produce the terminal
/// message of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Success { report_reference: String },
    Failure { error: SearchError },
}

impl SearchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SearchOutcome::Success { .. })
    }

    pub fn report_reference(&self) -> Option<&str> {
        match self {
            SearchOutcome::Success { report_reference } => Some(report_reference),
            SearchOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&SearchError> {
        match self {
            SearchOutcome::Success { .. } => None,
            SearchOutcome::Failure { error } => Some(error),
        }
    }

    /// Short lowercase label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SearchOutcome::Success { .. } => "success",
            SearchOutcome::Failure {
                error: SearchError::Application { .. },
            } => "application_error",
            SearchOutcome::Failure {
                error: SearchError::Transport(_),
            } => "transport_error",
            SearchOutcome::Failure {
                error: SearchError::TimedOut { .. },
            } => "timed_out",
        }
    }
}

impl From<SearchError> for SearchOutcome {
    fn from(error: SearchError) -> Self {
        SearchOutcome::Failure { error }
    }
}
