use super::{format_number, ToolView};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const STATEMENTS: [(&str, &str); 4] = [
    ("balance_sheet", "Balance Sheet"),
    ("income_statement", "Income Statement"),
    ("cash_flow_statement", "Cash Flow Statement"),
    ("comprehensive_income", "Comprehensive Income"),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LineItemRow {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub report_period: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(flatten)]
    pub items: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineItemsTable {
    pub rows: Vec<LineItemRow>,
}

pub(super) fn loading() -> ToolView {
    ToolView::Loading {
        title: "Financial line items",
    }
}

pub(super) fn final_view(payload: &Value) -> ToolView {
    ToolView::LineItems(LineItemsTable::from_payload(payload))
}

impl LineItemsTable {
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            rows: super::records(payload, &["search_results", "line_items", "results"]),
        }
    }

    pub fn render_lines(&self) -> Vec<String> {
        if self.rows.is_empty() {
            return vec!["Financial line items: no results".to_string()];
        }

        let mut lines = vec![format!("Financial line items ({} rows)", self.rows.len())];
        for row in &self.rows {
            if let Some(financials) = row.items.get("financials").and_then(Value::as_object) {
                render_statements(row, financials, &mut lines);
                continue;
            }

            let heading: Vec<&str> = [&row.ticker, &row.period, &row.report_period]
                .into_iter()
                .filter_map(|part| part.as_deref())
                .collect();
            lines.push(if heading.is_empty() {
                "-".to_string()
            } else {
                heading.join(" · ")
            });

            for (label, value) in &row.items {
                if let Some(rendered) = render_item(value, row.currency.as_deref()) {
                    lines.push(format!("  {}: {rendered}", humanize(label)));
                }
            }
        }
        lines
    }
}

/// Filing-style rows: a company heading, the period, then each statement's
/// entries in their `order`.
fn render_statements(row: &LineItemRow, financials: &Map<String, Value>, lines: &mut Vec<String>) {
    let text = |key: &str| row.items.get(key).and_then(Value::as_str);

    let company = text("company_name").or(row.ticker.as_deref()).unwrap_or("-");
    lines.push(match text("fiscal_period").or(row.period.as_deref()) {
        Some(period) => format!("{company} - {period}"),
        None => company.to_string(),
    });
    if let (Some(start), Some(end)) = (text("start_date"), text("end_date")) {
        lines.push(format!("  Period: {start} to {end}"));
    }

    for (key, title) in STATEMENTS {
        let Some(statement) = financials.get(key).and_then(Value::as_object) else {
            continue;
        };
        lines.push(format!("  {title}"));

        let mut entries: Vec<&Map<String, Value>> =
            statement.values().filter_map(Value::as_object).collect();
        entries.sort_by(|a, b| {
            let order = |entry: &Map<String, Value>| {
                entry.get("order").and_then(Value::as_f64).unwrap_or(f64::MAX)
            };
            order(a).total_cmp(&order(b))
        });

        for entry in entries {
            let label = entry.get("label").and_then(Value::as_str).unwrap_or("-");
            let unit = entry.get("unit").and_then(Value::as_str);
            let value = entry
                .get("value")
                .and_then(|value| render_item(value, None))
                .unwrap_or_default();
            lines.push(match unit {
                Some(unit) if !unit.is_empty() => format!("    {label}: {value} {unit}"),
                _ => format!("    {label}: {value}"),
            });
        }
    }
}

fn render_item(value: &Value, currency: Option<&str>) -> Option<String> {
    match value {
        Value::Number(number) => {
            let formatted = format_number(number.as_f64()?);
            Some(match currency {
                Some(code) => format!("{formatted} {code}"),
                None => formatted,
            })
        }
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn humanize(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for (idx, word) in label.split('_').filter(|w| !w.is_empty()).enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        if idx == 0 {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        } else {
            out.push_str(word);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_render_heading_and_sorted_items() {
        let table = LineItemsTable::from_payload(&json!({
            "search_results": [{
                "ticker": "NVDA",
                "period": "annual",
                "report_period": "2024-01-28",
                "currency": "USD",
                "revenue": 60922000000i64,
                "net_income": 29760000000i64,
                "notes": null
            }]
        }));

        assert_eq!(
            table.render_lines(),
            vec![
                "Financial line items (1 rows)",
                "NVDA · annual · 2024-01-28",
                "  Net income: 29,760,000,000 USD",
                "  Revenue: 60,922,000,000 USD",
            ]
        );
    }

    #[test]
    fn test_filing_rows_render_statements_in_order() {
        let table = LineItemsTable::from_payload(&json!([{
            "company_name": "Apple Inc.",
            "fiscal_period": "Q2 2024",
            "start_date": "2023-12-31",
            "end_date": "2024-03-30",
            "financials": {
                "income_statement": {
                    "net_income_loss": {"label": "Net Income", "value": 23636000000i64, "unit": "USD", "order": 3200},
                    "revenues": {"label": "Revenues", "value": 90753000000i64, "unit": "USD", "order": 100}
                },
                "balance_sheet": {
                    "assets": {"label": "Assets", "value": 337411000000i64, "unit": "USD", "order": 100}
                }
            }
        }]));

        assert_eq!(
            table.render_lines(),
            vec![
                "Financial line items (1 rows)",
                "Apple Inc. - Q2 2024",
                "  Period: 2023-12-31 to 2024-03-30",
                "  Balance Sheet",
                "    Assets: 337,411,000,000 USD",
                "  Income Statement",
                "    Revenues: 90,753,000,000 USD",
                "    Net Income: 23,636,000,000 USD",
            ]
        );
    }

    #[test]
    fn test_empty_payload_renders_notice() {
        let table = LineItemsTable::from_payload(&Value::Null);
        assert_eq!(table.render_lines(), vec!["Financial line items: no results"]);
    }

    #[test]
    fn test_humanize_labels() {
        assert_eq!(humanize("free_cash_flow"), "Free cash flow");
        assert_eq!(humanize("ebit"), "Ebit");
    }
}
