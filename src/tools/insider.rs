use super::{format_number, ToolView};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InsiderTransaction {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub transaction_date: Option<String>,
    #[serde(default)]
    pub transaction_shares: Option<f64>,
    #[serde(default)]
    pub transaction_price_per_share: Option<f64>,
    #[serde(default)]
    pub transaction_value: Option<f64>,
    #[serde(default)]
    pub shares_owned_after_transaction: Option<f64>,
    #[serde(default)]
    pub filing_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsiderTransactionsTable {
    pub transactions: Vec<InsiderTransaction>,
}

pub(super) fn loading() -> ToolView {
    ToolView::Loading {
        title: "Insider transactions",
    }
}

pub(super) fn final_view(payload: &Value) -> ToolView {
    ToolView::InsiderTransactions(InsiderTransactionsTable::from_payload(payload))
}

impl InsiderTransactionsTable {
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            transactions: super::records(payload, &["insider_trades", "insider_transactions"]),
        }
    }

    pub fn render_lines(&self) -> Vec<String> {
        if self.transactions.is_empty() {
            return vec!["Insider transactions: none reported".to_string()];
        }

        let mut lines = vec![format!(
            "Insider transactions ({})",
            self.transactions.len()
        )];
        for tx in &self.transactions {
            lines.push(render_transaction(tx));
        }
        lines
    }
}

fn render_transaction(tx: &InsiderTransaction) -> String {
    let date = tx
        .transaction_date
        .as_deref()
        .or(tx.filing_date.as_deref())
        .unwrap_or("----------");
    let who = match (tx.name.as_deref(), tx.title.as_deref()) {
        (Some(name), Some(title)) => format!("{name} ({title})"),
        (Some(name), None) => name.to_string(),
        (None, Some(title)) => title.to_string(),
        (None, None) => "unknown insider".to_string(),
    };

    let mut line = format!("{date}  {who}");
    if let Some(ticker) = tx.ticker.as_deref() {
        line.push_str(&format!(" [{ticker}]"));
    }
    if let Some(shares) = tx.transaction_shares {
        let sign = if shares > 0.0 { "+" } else { "" };
        line.push_str(&format!("  {sign}{} sh", format_number(shares)));
    }
    if let Some(price) = tx.transaction_price_per_share {
        line.push_str(&format!(" @ ${:.2}", price));
    }
    if let Some(value) = tx.transaction_value {
        line.push_str(&format!("  = ${}", format_number(value)));
    }
    if let Some(owned) = tx.shares_owned_after_transaction {
        line.push_str(&format!("  (owns {})", format_number(owned)));
    }
    line
}
