//! Historical price series, alignment and providers
//!
//! A `PriceTable` is the date-aligned, gap-filled view the simulator walks.
//! Providers hand out tables for a symbol set and date range; an empty table
//! is never returned, `DataUnavailable` is raised instead.

use crate::error::{BacktestError, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Date format accepted by the CSV loaders
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Daily prices for one symbol, `None` marking a gap
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<(NaiveDate, Option<f64>)>,
}

impl PriceSeries {
    /// Build a series, rejecting unsorted or duplicated dates
    pub fn new(symbol: impl Into<String>, points: Vec<(NaiveDate, Option<f64>)>) -> Result<Self> {
        let symbol = symbol.into();
        if let Some(pair) = points.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(BacktestError::InvalidPriceData {
                symbol,
                reason: format!("dates not strictly increasing at {} -> {}", pair[0].0, pair[1].0),
            });
        }
        Ok(Self { symbol, points })
    }

    /// Build a series with no gaps
    pub fn from_closes(symbol: impl Into<String>, closes: Vec<(NaiveDate, f64)>) -> Result<Self> {
        Self::new(symbol, closes.into_iter().map(|(d, p)| (d, Some(p))).collect())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[(NaiveDate, Option<f64>)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when at least one point carries a value
    pub fn has_observations(&self) -> bool {
        self.points.iter().any(|(_, p)| p.is_some())
    }

    /// Value recorded on `date`, if any
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |(d, _)| *d)
            .ok()
            .and_then(|idx| self.points[idx].1)
    }

    /// Restrict to `[start, end]`
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: self.symbol.clone(),
            points: self
                .points
                .iter()
                .filter(|(d, _)| *d >= start && *d <= end)
                .copied()
                .collect(),
        }
    }

    /// Forward-fill then back-fill gaps
    pub fn filled(&self) -> Self {
        let mut values: Vec<Option<f64>> = self.points.iter().map(|(_, p)| *p).collect();
        fill_gaps(&mut values);
        Self {
            symbol: self.symbol.clone(),
            points: self.points.iter().map(|(d, _)| *d).zip(values).collect(),
        }
    }
}

/// Forward-fill, then back-fill the leading gap
///
/// A column with no observations is left untouched.
pub fn fill_gaps(values: &mut [Option<f64>]) {
    let mut last = None;
    for value in values.iter_mut() {
        match value {
            Some(v) => last = Some(*v),
            None => *value = last,
        }
    }
    if let Some(first) = values.iter().find_map(|v| *v) {
        for value in values.iter_mut().take_while(|v| v.is_none()) {
            *value = Some(first);
        }
    }
}

/// Date-aligned prices, one column per symbol
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl PriceTable {
    /// Align `series` on the union of their observed dates within `[start, end]`
    ///
    /// Symbols without a single observation in range are dropped; the
    /// remaining columns are forward-filled and then back-filled.
    pub fn align(series: &[PriceSeries], start: NaiveDate, end: NaiveDate) -> Self {
        let dates: Vec<NaiveDate> = series
            .iter()
            .flat_map(|s| s.points().iter())
            .filter(|(d, p)| p.is_some() && *d >= start && *d <= end)
            .map(|(d, _)| *d)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut symbols = Vec::with_capacity(series.len());
        let mut columns = Vec::with_capacity(series.len());
        for s in series {
            if symbols.iter().any(|existing| existing == s.symbol()) {
                continue;
            }
            let mut column: Vec<Option<f64>> = dates.iter().map(|d| s.value_at(*d)).collect();
            if column.iter().all(Option::is_none) {
                debug!("Dropping {}: no prices between {} and {}", s.symbol(), start, end);
                continue;
            }
            fill_gaps(&mut column);
            symbols.push(s.symbol().to_string());
            columns.push(column);
        }

        Self {
            dates,
            symbols,
            columns,
        }
    }

    /// Build a table from pre-aligned columns without filling
    pub fn from_columns(dates: Vec<NaiveDate>, columns: Vec<(String, Vec<Option<f64>>)>) -> Result<Self> {
        if let Some(pair) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(BacktestError::InvalidPriceData {
                symbol: "*".to_string(),
                reason: format!("trading dates not strictly increasing at {} -> {}", pair[0], pair[1]),
            });
        }
        let mut symbols = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        for (symbol, column) in columns {
            if column.len() != dates.len() {
                return Err(BacktestError::InvalidPriceData {
                    reason: format!("{} prices for {} trading dates", column.len(), dates.len()),
                    symbol,
                });
            }
            symbols.push(symbol);
            values.push(column);
        }
        Ok(Self {
            dates,
            symbols,
            columns: values,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Number of trading days
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// True when there is no date or no symbol to simulate
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.symbols.is_empty()
    }

    /// Prices of `symbol` across all trading days
    pub fn column(&self, symbol: &str) -> Option<&[Option<f64>]> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Price of `symbol` on the `day`-th trading day
    pub fn price(&self, symbol: &str, day: usize) -> Option<f64> {
        self.column(symbol).and_then(|c| c.get(day).copied().flatten())
    }

    /// True when `symbol` has at least one price
    pub fn has_data(&self, symbol: &str) -> bool {
        self.column(symbol)
            .is_some_and(|c| c.iter().any(Option::is_some))
    }
}

/// Supplier of adjusted daily closes
pub trait PriceSource: Send + Sync {
    /// Aligned, gap-filled prices for `symbols` over `[start, end]`
    fn fetch(&self, symbols: &[String], start: NaiveDate, end: NaiveDate) -> Result<PriceTable>;

    /// Gap-filled prices for a single symbol, `None` if it has no data in range
    fn fetch_series(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Option<PriceSeries>;
}

/// Price source over series held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    series: FxHashMap<String, PriceSeries>,
}

impl InMemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source pre-loaded with `series`
    pub fn with_series(series: impl IntoIterator<Item = PriceSeries>) -> Self {
        let mut source = Self::new();
        for s in series {
            source.insert(s);
        }
        source
    }

    /// Add or replace the series for its symbol
    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.symbol().to_string(), series);
    }

    /// Symbols known to this source, sorted
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.series.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Load a wide CSV (`date,SYM1,SYM2,...`) from disk
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading prices from: {}", path.display());
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Load a wide CSV; an empty cell is a gap
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers = reader.headers()?.clone();
        let symbols: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
        if symbols.is_empty() {
            return Err(BacktestError::no_data("price file has no symbol columns"));
        }

        let mut points: Vec<Vec<(NaiveDate, Option<f64>)>> = vec![Vec::new(); symbols.len()];
        for record in reader.records() {
            let record = record?;
            let Some(raw_date) = record.get(0) else {
                continue;
            };
            let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)?;
            for (idx, symbol) in symbols.iter().enumerate() {
                let cell = record.get(idx + 1).unwrap_or("");
                let value = if cell.is_empty() {
                    None
                } else {
                    Some(cell.parse::<f64>().map_err(|e| BacktestError::InvalidPriceData {
                        symbol: symbol.clone(),
                        reason: format!("bad price '{cell}' on {date}: {e}"),
                    })?)
                };
                points[idx].push((date, value));
            }
        }

        let mut source = Self::new();
        for (symbol, mut pts) in symbols.into_iter().zip(points) {
            pts.sort_by_key(|(d, _)| *d);
            source.insert(PriceSeries::new(symbol, pts)?);
        }
        info!("Loaded price history for {} symbols", source.series.len());
        Ok(source)
    }
}

impl PriceSource for InMemoryPriceSource {
    fn fetch(&self, symbols: &[String], start: NaiveDate, end: NaiveDate) -> Result<PriceTable> {
        let requested: Vec<PriceSeries> = symbols
            .iter()
            .filter_map(|symbol| {
                let found = self.series.get(symbol).cloned();
                if found.is_none() {
                    warn!("No price history for {}", symbol);
                }
                found
            })
            .collect();

        let table = PriceTable::align(&requested, start, end);
        if table.is_empty() {
            return Err(BacktestError::no_data(format!(
                "none of {} requested symbols has prices between {} and {}",
                symbols.len(),
                start,
                end
            )));
        }
        debug!(
            "Aligned {} symbols over {} trading days",
            table.symbols().len(),
            table.len()
        );
        Ok(table)
    }

    fn fetch_series(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Option<PriceSeries> {
        let series = self.series.get(symbol)?.window(start, end);
        series.has_observations().then(|| series.filled())
    }
}
