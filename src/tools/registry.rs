use super::{insider, line_items, prices, web_search, ToolView};
use serde_json::Value;
use std::collections::BTreeMap;

pub const GET_PRICES: &str = "get-prices";
pub const SEARCH_LINE_ITEMS: &str = "search-line-items";
pub const SEARCH_WEB: &str = "search-web";
pub const INSIDER_TRANSACTIONS: &str = "insider-transactions";

/// The loading/final view pair mounted for one backend tool.
#[derive(Clone, Copy)]
pub struct ToolComponent {
    pub loading: fn() -> ToolView,
    pub final_view: fn(&Value) -> ToolView,
}

impl std::fmt::Debug for ToolComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolComponent").finish_non_exhaustive()
    }
}

/// Static map from backend tool identifiers to their views. An identifier the
/// backend emits but this map lacks means the two sides have drifted.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    components: BTreeMap<String, ToolComponent>,
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::empty();
        registry
            .register(
                GET_PRICES,
                ToolComponent {
                    loading: prices::loading,
                    final_view: prices::final_view,
                },
            )
            .register(
                SEARCH_LINE_ITEMS,
                ToolComponent {
                    loading: line_items::loading,
                    final_view: line_items::final_view,
                },
            )
            .register(
                SEARCH_WEB,
                ToolComponent {
                    loading: web_search::loading,
                    final_view: web_search::final_view,
                },
            )
            .register(
                INSIDER_TRANSACTIONS,
                ToolComponent {
                    loading: insider::loading,
                    final_view: insider::final_view,
                },
            );
        registry
    }

    pub fn register(&mut self, tool_id: impl Into<String>, component: ToolComponent) -> &mut Self {
        self.components.insert(tool_id.into(), component);
        self
    }

    pub fn get(&self, tool_id: &str) -> Option<ToolComponent> {
        self.components.get(tool_id).copied()
    }

    pub fn tool_ids(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }
}
