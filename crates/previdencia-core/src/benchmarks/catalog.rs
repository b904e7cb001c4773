//! Benchmark identities and the session fetch cache.
//!
//! The HTTP clients that actually pull these series (central-bank SGS
//! and market tickers) live outside the core; `BenchmarkProvider` is
//! the seam they plug into. A provider returning `Ok(None)` means "no
//! data for that window" and degrades the benchmark to unavailable
//! rather than failing the computation.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::series::ValueSeries;
use crate::PrevidenciaResult;

/// The external series the analyzer can compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Benchmark {
    /// Interbank deposit rate, accumulated daily factor.
    Cdi,
    /// Broad consumer price index, accumulated monthly factor.
    Ipca,
    /// National consumer price index, accumulated monthly factor.
    Inpc,
    /// S&P 500 Total Return index.
    Sp500Tr,
    /// USD/BRL exchange rate.
    UsdBrl,
}

/// Where a benchmark's raw observations come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchmarkSource {
    /// Central-bank SGS time series code.
    Sgs { code: u32 },
    /// Market data ticker symbol.
    Ticker { symbol: &'static str },
}

impl Benchmark {
    pub const ALL: [Benchmark; 5] = [
        Benchmark::Cdi,
        Benchmark::Ipca,
        Benchmark::Inpc,
        Benchmark::Sp500Tr,
        Benchmark::UsdBrl,
    ];

    /// Human-readable label used in UI dropdowns and table headers.
    pub fn label(&self) -> &'static str {
        match self {
            Benchmark::Cdi => "CDI",
            Benchmark::Ipca => "IPCA",
            Benchmark::Inpc => "INPC",
            Benchmark::Sp500Tr => "S&P 500",
            Benchmark::UsdBrl => "USD",
        }
    }

    pub fn from_label(label: &str) -> Option<Benchmark> {
        Benchmark::ALL.iter().copied().find(|b| b.label() == label)
    }

    pub fn source(&self) -> BenchmarkSource {
        match self {
            Benchmark::Cdi => BenchmarkSource::Sgs { code: 12 },
            Benchmark::Ipca => BenchmarkSource::Sgs { code: 433 },
            Benchmark::Inpc => BenchmarkSource::Sgs { code: 188 },
            Benchmark::Sp500Tr => BenchmarkSource::Ticker { symbol: "^SP500TR" },
            Benchmark::UsdBrl => BenchmarkSource::Ticker { symbol: "USDBRL=X" },
        }
    }

    /// Series usable as deflators for real-value conversion.
    pub fn is_deflator(&self) -> bool {
        matches!(self, Benchmark::Ipca | Benchmark::Inpc | Benchmark::UsdBrl)
    }
}

/// The excluded fetch collaborator's interface.
pub trait BenchmarkProvider {
    fn fetch(
        &self,
        benchmark: Benchmark,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PrevidenciaResult<Option<ValueSeries>>;
}

/// Session-lifetime read-through cache keyed by benchmark.
///
/// Toggle changes within one session re-use the fetched series; failed
/// fetches are not cached so the next toggle retries. The key space is
/// the fixed benchmark set, so there is no eviction.
#[derive(Default)]
pub struct BenchmarkCache {
    entries: HashMap<Benchmark, ValueSeries>,
}

impl BenchmarkCache {
    pub fn new() -> Self {
        BenchmarkCache::default()
    }

    pub fn get_or_fetch(
        &mut self,
        provider: &dyn BenchmarkProvider,
        benchmark: Benchmark,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PrevidenciaResult<Option<&ValueSeries>> {
        if !self.entries.contains_key(&benchmark) {
            match provider.fetch(benchmark, start, end)? {
                Some(series) => {
                    self.entries.insert(benchmark, series);
                }
                None => return Ok(None),
            }
        }
        Ok(self.entries.get(&benchmark))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
