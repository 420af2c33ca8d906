use std::env;
use std::fmt::{self, Debug, Display};

#[derive(Debug)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Transport-class failures (codes 1..=99) may be retried as-is.
    /// Invocation-class failures (codes 100+) require a state resync first.
    pub fn is_retryable(&self) -> bool {
        self.code < 100
    }
}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        transport_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        decode_error(err)
    }
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error {
        code: 1,
        message: "environment variable error".into(),
    }
}

pub fn transport_error(_: reqwest::Error) -> Error {
    Error {
        code: 3,
        message: "transport error".into(),
    }
}

pub fn upstream_error() -> Error {
    Error {
        code: 4,
        message: "upstream error".into(),
    }
}

pub fn timeout_error() -> Error {
    Error {
        code: 5,
        message: "request timed out".into(),
    }
}

pub fn decode_error<T: Debug>(_: T) -> Error {
    Error {
        code: 6,
        message: "decode error".into(),
    }
}

pub fn invalid_invocation_error() -> Error {
    Error {
        code: 100,
        message: "invalid invocation".into(),
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: 101,
        message: "invalid input".into(),
    }
}

pub fn unauthorized_error() -> Error {
    Error {
        code: 102,
        message: "unauthorized".into(),
    }
}
