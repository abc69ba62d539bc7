use crate::ids::normalize_instrument;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single daily closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Daily price histories for a universe of instruments.
///
/// Each instrument's points are kept sorted with strictly increasing dates.
/// Gaps (non-trading days, late listings, provider holes) are simply absent
/// points; non-finite prices are treated as missing and never stored.
/// Non-positive prices are kept so downstream consumers can report them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    series: BTreeMap<String, Vec<PricePoint>>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the history for one instrument.
    ///
    /// Points are sorted by date and duplicate dates collapse to the first
    /// occurrence. An instrument with no usable points is not recorded.
    pub fn insert(&mut self, instrument: &str, points: Vec<PricePoint>) {
        let id = normalize_instrument(instrument);
        if id.is_empty() {
            return;
        }

        let mut points: Vec<PricePoint> = points.into_iter().filter(|p| p.price.is_finite()).collect();
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);

        if points.is_empty() {
            self.series.remove(&id);
        } else {
            self.series.insert(id, points);
        }
    }

    /// Builder-style variant of [`PriceSeries::insert`].
    pub fn with_series(mut self, instrument: &str, points: Vec<PricePoint>) -> Self {
        self.insert(instrument, points);
        self
    }

    /// True when no instrument has a single usable price.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Number of instruments with at least one price.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Instrument identifiers in ascending order.
    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn points(&self, instrument: &str) -> Option<&[PricePoint]> {
        self.series.get(instrument).map(Vec::as_slice)
    }

    /// The union of all dates on which any instrument has a price, ascending.
    /// This is the aligned calendar every instrument is measured against.
    pub fn trading_dates(&self) -> Vec<NaiveDate> {
        self.series
            .values()
            .flat_map(|points| points.iter().map(|p| p.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Aligns one instrument to `calendar`, yielding `None` where it has no price.
    pub fn aligned(&self, instrument: &str, calendar: &[NaiveDate]) -> Vec<Option<f64>> {
        let points = self.points(instrument).unwrap_or(&[]);
        let mut cursor = points.iter().peekable();

        calendar
            .iter()
            .map(|date| {
                while cursor.next_if(|p| p.date < *date).is_some() {}
                cursor.next_if(|p| p.date == *date).map(|p| p.price)
            })
            .collect()
    }

    /// The latest known price per instrument (a forward fill to the last date).
    pub fn last_prices(&self) -> BTreeMap<String, f64> {
        self.series
            .iter()
            .filter_map(|(id, points)| points.last().map(|p| (id.clone(), p.price)))
            .collect()
    }
}
