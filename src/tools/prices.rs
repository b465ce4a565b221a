use super::ToolView;
use serde::Deserialize;
use serde_json::Value;

const SPARKLINE_WIDTH: usize = 48;
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PricePoint {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceChart {
    pub ticker: String,
    pub prices: Vec<PricePoint>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSummary {
    pub last_close: f64,
    pub dollar_change: f64,
    pub percent_change: f64,
}

impl PriceSummary {
    pub fn dollar_label(&self) -> String {
        if self.dollar_change > 0.0 {
            format!("+${:.2}", self.dollar_change)
        } else {
            format!("-${:.2}", self.dollar_change.abs())
        }
    }

    pub fn percent_label(&self) -> String {
        if self.percent_change > 0.0 {
            format!("(+{:.2}%)", self.percent_change)
        } else {
            format!("({:.2}%)", self.percent_change)
        }
    }
}

pub(super) fn loading() -> ToolView {
    ToolView::Loading {
        title: "Price chart",
    }
}

pub(super) fn final_view(payload: &Value) -> ToolView {
    ToolView::Prices(PriceChart::from_payload(payload))
}

impl PriceChart {
    pub fn from_payload(payload: &Value) -> Self {
        let ticker = payload
            .get("ticker")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let prices = super::records(payload, &["prices"]);
        Self { ticker, prices }
    }

    /// Change between the first and last close of the series.
    pub fn summary(&self) -> Option<PriceSummary> {
        let start = self.prices.first()?.close;
        let end = self.prices.last()?.close;
        let dollar_change = end - start;
        let percent_change = if start == 0.0 {
            0.0
        } else {
            dollar_change / start * 100.0
        };
        Some(PriceSummary {
            last_close: end,
            dollar_change,
            percent_change,
        })
    }

    pub fn render_lines(&self) -> Vec<String> {
        let ticker = if self.ticker.is_empty() {
            "Price chart"
        } else {
            self.ticker.as_str()
        };

        let Some(summary) = self.summary() else {
            return vec![format!("{ticker}: no price data")];
        };

        let mut lines = vec![
            ticker.to_string(),
            format!(
                "${:.2}  {} {}",
                summary.last_close,
                summary.dollar_label(),
                summary.percent_label()
            ),
        ];

        let closes: Vec<f64> = self.prices.iter().map(|point| point.close).collect();
        lines.push(sparkline(&closes, SPARKLINE_WIDTH));

        if let (Some(first), Some(last)) = (self.prices.first(), self.prices.last()) {
            if let (Some(from), Some(to)) = (&first.time, &last.time) {
                lines.push(format!("{from} .. {to} ({} points)", self.prices.len()));
            }
        }
        lines
    }
}

fn sparkline(values: &[f64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let sampled: Vec<f64> = if values.len() <= width {
        values.to_vec()
    } else {
        (0..width)
            .map(|slot| values[slot * (values.len() - 1) / (width - 1).max(1)])
            .collect()
    };

    let min = sampled.iter().copied().fold(f64::INFINITY, f64::min);
    let max = sampled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    let top = SPARK_LEVELS.len() - 1;

    sampled
        .iter()
        .map(|value| {
            if span <= f64::EPSILON {
                SPARK_LEVELS[top / 2]
            } else {
                let level = ((value - min) / span * top as f64).round() as usize;
                SPARK_LEVELS[level.min(top)]
            }
        })
        .collect()
}
