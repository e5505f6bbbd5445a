pub type StoreshotResult<T> = Result<T, StoreshotError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreshotError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing asset: {0}")]
    MissingAsset(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("io error: {0}")]
    Io(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreshotError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn missing_asset(msg: impl Into<String>) -> Self {
        Self::MissingAsset(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Errors that abort the whole batch rather than a single (screenshot, device) pair.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MissingAsset(_) | Self::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            StoreshotError::config("x")
                .to_string()
                .contains("configuration error:")
        );
        assert!(
            StoreshotError::missing_asset("x")
                .to_string()
                .contains("missing asset:")
        );
        assert!(
            StoreshotError::decode("x")
                .to_string()
                .contains("decode error:")
        );
        assert!(
            StoreshotError::render("x")
                .to_string()
                .contains("render error:")
        );
        assert!(StoreshotError::io("x").to_string().contains("io error:"));
    }

    #[test]
    fn only_pair_local_errors_are_recoverable() {
        assert!(!StoreshotError::missing_asset("a").is_fatal());
        assert!(!StoreshotError::decode("a").is_fatal());
        assert!(StoreshotError::config("a").is_fatal());
        assert!(StoreshotError::io("a").is_fatal());
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = StoreshotError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
