use crate::error::{PipelineError, PipelineResult};
use regex::Regex;
use std::sync::OnceLock;

/// Default cap on tickers per request
pub const MAX_TICKERS: usize = 8;

fn symbol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Z0-9^][A-Z0-9.\-=^]{0,14}$").expect("symbol pattern is a valid regex")
    })
}

/// Trim and uppercase a symbol, rejecting anything that cannot be a ticker.
pub fn normalize_symbol(raw: &str) -> PipelineResult<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(PipelineError::invalid("ticker symbol is empty"));
    }
    if !symbol_pattern().is_match(&symbol) {
        return Err(PipelineError::invalid(format!("'{}' is not a valid ticker symbol", raw.trim())));
    }
    Ok(symbol)
}

/// Split comma/space separated input into unique uppercase tickers, keeping the first `max`.
///
/// Symbols are not validated here; the pipeline reports bad ones per ticker when fetching.
pub fn parse_tickers(raw: &str, max: usize) -> Vec<String> {
    let mut tickers: Vec<String> = Vec::new();
    for part in raw.split(|c: char| c == ',' || c.is_whitespace()) {
        if tickers.len() >= max {
            break;
        }
        let candidate = part.trim().to_uppercase();
        if candidate.is_empty() || tickers.contains(&candidate) {
            continue;
        }
        tickers.push(candidate);
    }
    tickers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tickers() {
        assert_eq!(
            parse_tickers("aapl, msft nvda,,AAPL", MAX_TICKERS),
            vec!["AAPL", "MSFT", "NVDA"]
        );
        assert!(parse_tickers(" , ,", MAX_TICKERS).is_empty());
    }

    #[test]
    fn test_parse_tickers_caps_count() {
        let raw = "A B C D E F G H I J";
        let tickers = parse_tickers(raw, MAX_TICKERS);
        assert_eq!(tickers.len(), 8);
        assert_eq!(tickers.last().unwrap(), "H");
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" brk-b ").unwrap(), "BRK-B");
        assert_eq!(normalize_symbol("^gspc").unwrap(), "^GSPC");
        assert_eq!(normalize_symbol("EURUSD=X").unwrap(), "EURUSD=X");
        assert_eq!(normalize_symbol("ZZZZINVALID").unwrap(), "ZZZZINVALID");
        assert!(matches!(normalize_symbol(""), Err(PipelineError::InvalidInput(_))));
        assert!(normalize_symbol("AA PL").is_err());
        assert!(normalize_symbol("../etc/passwd").is_err());
        assert!(normalize_symbol("WAYTOOLONGSYMBOL1").is_err());
    }
}
