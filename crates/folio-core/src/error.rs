#![forbid(unsafe_code)]

/// Errors surfaced by folio APIs.
///
/// Effects never fail: missing anchors and unsupported host features make an
/// effect inert instead. Only configuration input can be rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolioError {
    /// Malformed or out-of-range configuration.
    Config(String),
    /// Host does not provide a required facility.
    Unsupported(&'static str),
}

impl core::fmt::Display for FolioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Unsupported(what) => write!(f, "unsupported: {what}"),
        }
    }
}

impl std::error::Error for FolioError {}

impl From<serde_json::Error> for FolioError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        assert_eq!(
            FolioError::Unsupported("window").to_string(),
            "unsupported: window"
        );
        let err: FolioError = serde_json::from_str::<u32>("x").map_err(FolioError::from).unwrap_err();
        assert!(err.to_string().starts_with("invalid configuration: "));
    }
}
