use super::{MarketDataProvider, ProviderError};
use crate::models::OhlcvRow;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Fixed symbol -> rows table. Handy for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    data: HashMap<String, Vec<OhlcvRow>>,
    unavailable: bool,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: &str, rows: Vec<OhlcvRow>) -> Self {
        self.data.insert(symbol.to_string(), rows);
        self
    }

    /// Every fetch fails as if the upstream source were down.
    pub fn offline(mut self) -> Self {
        self.unavailable = true;
        self
    }
}

#[async_trait]
impl MarketDataProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcvRow>, ProviderError> {
        if self.unavailable {
            return Err(ProviderError::InvalidResponse("source offline".to_string()));
        }
        let rows = self
            .data
            .get(symbol)
            .ok_or_else(|| ProviderError::UnknownSymbol(symbol.to_string()))?;

        Ok(rows
            .iter()
            .filter(|row| start <= row.date && row.date <= end)
            .cloned()
            .collect())
    }
}
