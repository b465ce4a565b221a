//! Text renditions of the tool result widgets, plus the registry that maps a
//! backend tool identifier onto its loading and final views.

mod insider;
mod line_items;
mod prices;
mod registry;
mod web_search;

pub use insider::{InsiderTransaction, InsiderTransactionsTable};
pub use line_items::{LineItemRow, LineItemsTable};
pub use prices::{PriceChart, PricePoint, PriceSummary};
pub use registry::{
    ToolComponent, ToolRegistry, GET_PRICES, INSIDER_TRANSACTIONS, SEARCH_LINE_ITEMS, SEARCH_WEB,
};
pub use web_search::{WebSearchResult, WebSearchResults};

use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ToolView {
    Loading { title: &'static str },
    Prices(PriceChart),
    LineItems(LineItemsTable),
    WebSearch(WebSearchResults),
    InsiderTransactions(InsiderTransactionsTable),
}

impl ToolView {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn render_lines(&self) -> Vec<String> {
        match self {
            Self::Loading { title } => vec![format!("[{title}: loading...]")],
            Self::Prices(chart) => chart.render_lines(),
            Self::LineItems(table) => table.render_lines(),
            Self::WebSearch(results) => results.render_lines(),
            Self::InsiderTransactions(table) => table.render_lines(),
        }
    }
}

/// Pulls the record list out of a tool result. Results arrive either as a bare
/// array or as an object holding the array under one of `keys`.
fn records<T: DeserializeOwned>(payload: &Value, keys: &[&str]) -> Vec<T> {
    let items = match payload {
        Value::Array(items) => items.as_slice(),
        Value::Object(fields) => keys
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<T>(item.clone()) {
            Ok(record) => Some(record),
            Err(error) => {
                tracing::debug!(%error, "skipping malformed tool result record");
                None
            }
        })
        .collect()
}

/// Groups the integer part in thousands, keeping up to two decimals.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = (value * 100.0).round() / 100.0;
    let negative = rounded < 0.0;
    let absolute = rounded.abs();
    let whole = absolute.trunc() as u64;
    let cents = ((absolute - absolute.trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if cents > 0 {
        out.push_str(&format!(".{cents:02}"));
    }
    out
}
