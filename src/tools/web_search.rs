use super::ToolView;
use crate::util::truncate_chars;
use serde::Deserialize;
use serde_json::Value;

const SNIPPET_CHARS: usize = 160;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebSearchResult {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WebSearchResults {
    pub results: Vec<WebSearchResult>,
}

pub(super) fn loading() -> ToolView {
    ToolView::Loading {
        title: "Web search",
    }
}

pub(super) fn final_view(payload: &Value) -> ToolView {
    ToolView::WebSearch(WebSearchResults::from_payload(payload))
}

impl WebSearchResults {
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            results: super::records(payload, &["results"]),
        }
    }

    pub fn render_lines(&self) -> Vec<String> {
        if self.results.is_empty() {
            return vec!["Web search: no results".to_string()];
        }

        let mut lines = vec![format!("Web search ({} results)", self.results.len())];
        for (idx, result) in self.results.iter().enumerate() {
            let title = result
                .title
                .as_deref()
                .map(str::trim)
                .filter(|title| !title.is_empty())
                .unwrap_or(result.url.as_str());
            lines.push(format!("{}. {title}", idx + 1));
            lines.push(format!("   {}", result.url));
            if let Some(content) = result.content.as_deref() {
                let flattened = content.split_whitespace().collect::<Vec<_>>().join(" ");
                if !flattened.is_empty() {
                    lines.push(format!("   {}", truncate_chars(&flattened, SNIPPET_CHARS)));
                }
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_results_fall_back_to_url_for_title() {
        let results = WebSearchResults::from_payload(&json!([
            {"url": "https://example.com/a", "title": "Apple beats estimates", "content": "Apple  reported\nrecord revenue."},
            {"url": "https://example.com/b", "content": ""},
            {"title": "missing url is skipped"}
        ]));

        assert_eq!(
            results.render_lines(),
            vec![
                "Web search (2 results)",
                "1. Apple beats estimates",
                "   https://example.com/a",
                "   Apple reported record revenue.",
                "2. https://example.com/b",
                "   https://example.com/b",
            ]
        );
    }

    #[test]
    fn test_long_snippets_are_truncated() {
        let content = "word ".repeat(100);
        let results = WebSearchResults::from_payload(&json!({
            "results": [{"url": "https://example.com", "content": content}]
        }));
        let lines = results.render_lines();
        assert!(lines[3].ends_with("..."));
        assert!(lines[3].chars().count() <= SNIPPET_CHARS + 6);
    }
}
