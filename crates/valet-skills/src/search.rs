//! Web search tool: `web_search.query`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use valet_contracts::{error::ValetResult, plan::Args, tool::ToolContext};
use valet_core::traits::ServerTool;

use crate::{
    args::{optional_u64, required_str},
    connectors::SearchConnector,
};

pub struct WebSearchTool {
    connector: Arc<dyn SearchConnector>,
}

impl WebSearchTool {
    pub fn new(connector: Arc<dyn SearchConnector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl ServerTool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search.query"
    }

    fn description(&self) -> &str {
        "Search the web for current information, news, local businesses, weather, or any real-time data."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query string.",
                },
                "count": {
                    "type": "integer",
                    "default": 5,
                    "minimum": 1,
                    "maximum": 20,
                    "description": "Number of results to return.",
                },
                "country": {
                    "type": "string",
                    "description": "Country code for localized results (e.g. 'US').",
                },
            },
            "required": ["query"],
        })
    }

    async fn execute(&self, args: &Args, _ctx: &ToolContext) -> ValetResult<Args> {
        let results = self
            .connector
            .search(
                required_str(args, "query", self.name())?,
                optional_u64(args, "count", 5),
                args.get("country").and_then(|v| v.as_str()),
            )
            .await?;

        let mut out = Args::new();
        out.insert("count".to_string(), json!(results.len()));
        out.insert("results".to_string(), Value::Array(results));
        Ok(out)
    }
}
