use http::StatusCode;

/// Outcome of a call answered with a success status.
///
/// Failures never show up here, they are a [`ClientError`](crate::ClientError).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<T> {
    /// A non-empty body, decoded.
    Message { value: T, status: StatusCode },
    /// No body to decode.
    Empty { status: StatusCode },
}

impl<T> Reply<T> {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Message { status, .. } | Self::Empty { status } => *status,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Message { value, .. } => Some(value),
            Self::Empty { .. } => None,
        }
    }

    pub fn into_parts(self) -> (Option<T>, StatusCode) {
        match self {
            Self::Message { value, status } => (Some(value), status),
            Self::Empty { status } => (None, status),
        }
    }

    /// The value paired with the status, `T::default()` standing in for an empty body.
    pub fn into_value_or_default(self) -> (T, StatusCode)
    where
        T: Default,
    {
        let (value, status) = self.into_parts();
        (value.unwrap_or_default(), status)
    }
}
