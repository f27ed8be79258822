pub type ColorblockResult<T> = Result<T, ColorblockError>;

#[derive(thiserror::Error, Debug)]
pub enum ColorblockError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("layout error: {0}")]
    Layout(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ColorblockError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ColorblockError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            ColorblockError::layout("x")
                .to_string()
                .contains("layout error:")
        );
        assert!(
            ColorblockError::surface("x")
                .to_string()
                .contains("surface error:")
        );
        assert!(
            ColorblockError::encode("x")
                .to_string()
                .contains("encode error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ColorblockError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
