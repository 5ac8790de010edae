// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

/// Why a list fetch produced no page. Every variant is recoverable except
/// `Unauthorized`, which ends the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("failed to fetch: {0}")]
    Network(String),

    #[error("session expired -- sign in again")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("server returned a malformed page: {0}")]
    Decode(String),
}

impl FetchError {
    pub const fn is_session_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Short text for the status line.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "failed to fetch orders; check the connection and retry".to_owned(),
            Self::Unauthorized => "session expired; run `salesdesk --set-token <token>`".to_owned(),
            Self::NotFound => "orders endpoint not found; check [api].base_url".to_owned(),
            Self::Server { status, message } if message.is_empty() => {
                format!("server error ({status}); retry later")
            }
            Self::Server { status, message } => format!("server error ({status}): {message}"),
            Self::Decode(_) => "server error: unreadable response; retry later".to_owned(),
        }
    }
}
