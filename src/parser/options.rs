//! Extraction options and configuration.

/// Options for extracting documents.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Whether to extract paginated pages in parallel
    pub parallel: bool,

    /// Whether plain text may fall back to the EUC-KR legacy encoding
    pub legacy_encoding_fallback: bool,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (keep pages whose text cannot be read).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Enable or disable the EUC-KR fallback for plain text.
    pub fn with_legacy_encoding_fallback(mut self, enabled: bool) -> Self {
        self.legacy_encoding_fallback = enabled;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            parallel: true,
            legacy_encoding_fallback: true,
        }
    }
}

/// Error handling mode during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any page error
    #[default]
    Strict,
    /// Log the error and keep the page without text
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_options_builder() {
        let options = ExtractOptions::new()
            .lenient()
            .sequential()
            .with_legacy_encoding_fallback(false);

        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert!(!options.parallel);
        assert!(!options.legacy_encoding_fallback);
    }

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert!(options.parallel);
        assert!(options.legacy_encoding_fallback);
    }
}
