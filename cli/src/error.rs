use crate::models::DateRange;
use crate::providers::ProviderError;
use thiserror::Error;

/// Errors surfaced by the series pipeline.
///
/// Every pipeline operation returns one of these instead of panicking, so the
/// caller (HTTP service, CLI) decides how to present it.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad symbol format, inverted date range, non-positive window, or short window >= long window.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The request was valid but the source has no rows for it.
    #[error("No data found for {symbol} from {range}")]
    NoDataFound { symbol: String, range: DateRange },

    /// Network or provider failure.
    #[error("Data source unavailable: {0}")]
    SourceUnavailable(String),
}

impl PipelineError {
    pub fn invalid(message: impl Into<String>) -> Self {
        PipelineError::InvalidInput(message.into())
    }

    /// Short machine-readable tag for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput(_) => "invalid_input",
            PipelineError::NoDataFound { .. } => "no_data_found",
            PipelineError::SourceUnavailable(_) => "source_unavailable",
        }
    }

    /// Map a provider failure for `symbol` over `range` onto the pipeline's error kinds.
    pub fn from_provider(error: ProviderError, symbol: &str, range: DateRange) -> Self {
        match error {
            ProviderError::UnknownSymbol(_) | ProviderError::NoData => PipelineError::NoDataFound {
                symbol: symbol.to_string(),
                range,
            },
            other => PipelineError::SourceUnavailable(other.to_string()),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_provider_error_mapping() {
        let err = PipelineError::from_provider(ProviderError::UnknownSymbol("ZZZZ".into()), "ZZZZ", range());
        assert_eq!(err.kind(), "no_data_found");

        let err = PipelineError::from_provider(ProviderError::NoData, "AAPL", range());
        assert!(matches!(err, PipelineError::NoDataFound { ref symbol, .. } if symbol == "AAPL"));

        let err = PipelineError::from_provider(
            ProviderError::InvalidResponse("truncated body".into()),
            "AAPL",
            range(),
        );
        assert_eq!(err.kind(), "source_unavailable");
        assert!(err.to_string().contains("truncated body"));
    }

    #[test]
    fn test_no_data_message_names_range() {
        let err = PipelineError::NoDataFound { symbol: "MSFT".into(), range: range() };
        assert_eq!(err.to_string(), "No data found for MSFT from 2024-01-01 to 2024-01-31");
    }
}
