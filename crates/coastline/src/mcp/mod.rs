use crate::{
    algorithms::{estimate_response_size, truncate_to_budget},
    manager::{CoastlineCommand, CoastlineManager, CommandOutput},
    types::{CoastlineResult, Gap, ProcessingStats},
};
use rmcp::{
    handler::server::tool::IntoCallToolResult, model::{CallToolResult, Content, ServerCapabilities, ServerInfo}, schemars, tool, Error as McpError, ServerHandler
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use std::sync::{Arc, RwLock};

/// Estimated response size above which GeoJSON payloads are truncated
pub const MAX_RESPONSE_BYTES: usize = 1_000_000;

/// Request for loading chart features from a GeoJSON file
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LoadFeaturesRequest {
    #[schemars(description = "Path to a GeoJSON file of chart features")]
    pub path: String,
}

/// Request for simplification with tolerance parameter
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SimplificationRequest {
    #[schemars(
        description = "Simplification tolerance in meters (higher = more simplified)",
        range(min = 0.0, max = 10000.0)
    )]
    pub tolerance_m: f64,
}

/// Request for gap filling
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GapFillingRequest {
    #[schemars(
        description = "Largest gap in meters that may be bridged",
        range(min = 0.0, max = 50000.0)
    )]
    pub max_gap_distance_m: f64,
}

/// Response containing coastline extraction results
#[derive(Debug, Serialize, schemars::JsonSchema, TS)]
#[ts(export)]
pub struct CoastlineResponse {
    #[schemars(description = "Number of coastlines produced")]
    pub coastline_count: usize,
    #[schemars(description = "Number of coastlines included in the GeoJSON payload")]
    pub returned_count: usize,
    #[schemars(description = "Whether the payload was cut down to the longest coastlines")]
    pub truncated: bool,
    #[schemars(description = "Estimated size in bytes of the full GeoJSON rendering")]
    pub estimated_size_bytes: usize,
    #[schemars(description = "Pipeline counters")]
    #[ts(type = "Record<string, unknown> | null")]
    pub stats: Option<serde_json::Value>,
    #[schemars(description = "GeoJSON representation of the coastlines")]
    #[ts(type = "unknown")]
    pub geojson: serde_json::Value,
}

/// Response containing detected gaps
#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct GapsResponse {
    pub gap_count: usize,
    pub gaps: Vec<Gap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// MCP Server for coastline reconstruction
#[derive(Clone)]
pub struct CoastlineMcpServer {
    manager: Arc<RwLock<Option<CoastlineManager>>>,
}

impl CoastlineMcpServer {
    pub fn new() -> Self {
        Self { manager: Arc::new(RwLock::new(None)) }
    }

    /// Start with an already loaded feature batch
    pub fn with_manager(manager: CoastlineManager) -> Self {
        Self { manager: Arc::new(RwLock::new(Some(manager))) }
    }

    /// Convert CoastlineResult to CoastlineResponse, truncating oversized payloads
    fn result_to_response(&self, result: CoastlineResult) -> Result<CoastlineResponse, String> {
        let coastline_count = result.coastlines.len();
        let estimated_size_bytes = estimate_response_size(&result.coastlines);
        let truncated = estimated_size_bytes > MAX_RESPONSE_BYTES;

        let payload = if truncated {
            tracing::warn!(estimated_size_bytes, "response over budget, keeping longest coastlines");
            CoastlineResult {
                coastlines: truncate_to_budget(&result.coastlines, MAX_RESPONSE_BYTES),
                ..result
            }
        } else {
            result
        };

        let typed_geojson = payload.to_typed_geojson()
            .map_err(|e| format!("Failed to convert to typed GeoJSON: {}", e))?;

        Ok(CoastlineResponse {
            coastline_count,
            returned_count: payload.coastlines.len(),
            truncated,
            estimated_size_bytes,
            stats: stats_value(&payload.stats),
            geojson: serde_json::to_value(typed_geojson)
                .map_err(|e| format!("Failed to serialize GeoJSON: {}", e))?,
        })
    }

    fn run(&self, command: CoastlineCommand) -> Result<CommandOutput, String> {
        let guard = self.manager.read().map_err(|_| "Manager lock poisoned".to_string())?;
        let manager = guard
            .as_ref()
            .ok_or_else(|| "No features loaded. Please load features first.".to_string())?;
        let name = command.to_string();
        manager.execute(command).map_err(|e| format!("{} failed: {}", name, e))
    }

    fn extract(&self, command: CoastlineCommand) -> CoastlineResponse {
        match self.run(command) {
            Ok(CommandOutput::Coastlines(result)) => self
                .result_to_response(result)
                .unwrap_or_else(CoastlineResponse::error),
            Ok(CommandOutput::Gaps(_)) => CoastlineResponse::error("Command does not produce coastlines".to_string()),
            Err(e) => CoastlineResponse::error(e),
        }
    }
}

fn stats_value(stats: &ProcessingStats) -> Option<serde_json::Value> {
    serde_json::to_value(stats).ok()
}

impl Default for CoastlineMcpServer {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoCallToolResult for CoastlineResponse {
    fn into_call_tool_result(self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&self).unwrap_or_else(|_| format!("{:?}", self)),
        )]))
    }
}

impl IntoCallToolResult for GapsResponse {
    fn into_call_tool_result(self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&self).unwrap_or_else(|_| format!("{:?}", self)),
        )]))
    }
}

impl CoastlineResponse {
    fn error(message: String) -> Self {
        Self {
            coastline_count: 0,
            returned_count: 0,
            truncated: false,
            estimated_size_bytes: 0,
            stats: None,
            geojson: serde_json::json!({ "error": message }),
        }
    }
}

#[tool(tool_box)]
impl CoastlineMcpServer {
    #[tool(description = "Load chart features (GeoJSON) from a file path")]
    fn load_features(&self, #[tool(aggr)] LoadFeaturesRequest { path }: LoadFeaturesRequest) -> String {
        let mut manager = CoastlineManager::new();
        let count = match manager.load_features(&path) {
            Ok(count) => count,
            Err(e) => return format!("Failed to load features from {}: {}", path, e),
        };

        match self.manager.write() {
            Ok(mut slot) => {
                *slot = Some(manager);
                format!("Loaded {} features from {}", count, path)
            }
            Err(_) => "Manager lock poisoned".to_string(),
        }
    }

    #[tool(description = "Extract, stitch and annotate coastlines from the loaded chart features")]
    fn extract_coastlines(&self) -> CoastlineResponse {
        self.extract(CoastlineCommand::ExtractCoastlines)
    }

    #[tool(description = "Extract coastlines with Douglas-Peucker simplification to reduce point count")]
    fn extract_coastlines_with_simplification(
        &self,
        #[tool(aggr)] SimplificationRequest { tolerance_m }: SimplificationRequest
    ) -> CoastlineResponse {
        self.extract(CoastlineCommand::ExtractCoastlinesWithSimplification { tolerance_m })
    }

    #[tool(description = "Extract coastlines and bridge digitization gaps up to a maximum distance")]
    fn extract_coastlines_with_gap_filling(
        &self,
        #[tool(aggr)] GapFillingRequest { max_gap_distance_m }: GapFillingRequest
    ) -> CoastlineResponse {
        self.extract(CoastlineCommand::ExtractCoastlinesWithGapFilling { max_gap_distance_m })
    }

    #[tool(description = "List unconnected endpoint pairs left after stitching, nearest first")]
    fn detect_gaps(&self) -> GapsResponse {
        match self.run(CoastlineCommand::DetectGaps) {
            Ok(CommandOutput::Gaps(gaps)) => GapsResponse { gap_count: gaps.len(), gaps, error: None },
            Ok(CommandOutput::Coastlines(_)) => GapsResponse {
                gap_count: 0,
                gaps: Vec::new(),
                error: Some("Command does not produce gaps".to_string()),
            },
            Err(e) => GapsResponse { gap_count: 0, gaps: Vec::new(), error: Some(e) },
        }
    }

    #[tool(description = "Get information about available commands and their parameters")]
    fn get_command_info(&self) -> String {
        command_info()
    }

    #[tool(description = "Get the JSON schema for CoastlineCommand")]
    fn get_command_schema(&self) -> String {
        let schema = CoastlineCommand::schema();
        serde_json::to_string_pretty(&schema)
            .unwrap_or_else(|e| format!("Failed to serialize schema: {}", e))
    }
}

fn command_info() -> String {
    let mut info = String::new();
    info.push_str("Available CoastlineCommands:\n\n");

    for (i, name) in CoastlineCommand::command_names().iter().enumerate() {
        info.push_str(&format!("{}. {}\n", i + 1, name));
    }

    info.push_str("\nCommand Details:\n");
    for cmd in CoastlineCommand::examples() {
        info.push_str(&format!("\n- {}\n", cmd));
        info.push_str(&format!("  Description: {}\n", cmd.description()));

        let params = cmd.parameters_info();
        if !params.is_empty() {
            info.push_str("  Parameters:\n");
            for (name, desc, required) in params {
                let req_marker = if required { " (required)" } else { " (optional)" };
                info.push_str(&format!("    - {}{}: {}\n", name, req_marker, desc));
            }
        }
    }

    info
}

#[tool(tool_box)]
impl ServerHandler for CoastlineMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Coastline Reconstruction Server - Extract continuous, annotated coastlines from nautical chart features with stitching, gap filling, simplification and water-side classification.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_batch() -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("coastline_mcp_test_{}.geojson", std::process::id()));
        std::fs::write(
            &path,
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"_featureType":"COALNE"},
                 "geometry":{"type":"LineString","coordinates":[[0,0],[0.001,0]]}},
                {"type":"Feature","properties":{"_featureType":"COALNE"},
                 "geometry":{"type":"LineString","coordinates":[[0.002,0],[0.003,0]]}}
            ]}"#,
        )
        .expect("Should write test batch");
        path
    }

    #[test]
    fn test_extract_before_load_reports_error() {
        let server = CoastlineMcpServer::new();
        let response = server.extract_coastlines();
        assert_eq!(response.coastline_count, 0);
        assert!(response.geojson["error"].as_str().is_some_and(|e| e.contains("No features loaded")));
    }

    #[test]
    fn test_load_and_extract() {
        let path = write_batch();
        let server = CoastlineMcpServer::new();
        let message = server.load_features(LoadFeaturesRequest { path: path.display().to_string() });
        assert!(message.starts_with("Loaded 2 features"), "{message}");

        let response = server.extract_coastlines();
        assert_eq!(response.coastline_count, 2);
        assert_eq!(response.returned_count, 2);
        assert!(!response.truncated);
        assert!(response.estimated_size_bytes > 0);

        let filled = server.extract_coastlines_with_gap_filling(GapFillingRequest { max_gap_distance_m: 500.0 });
        assert_eq!(filled.coastline_count, 1);

        let gaps = server.detect_gaps();
        assert!(gaps.error.is_none());
        assert_eq!(gaps.gap_count, gaps.gaps.len());
        assert!(gaps.gap_count > 0);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_command_info_lists_every_command() {
        let info = command_info();
        for name in CoastlineCommand::command_names() {
            assert!(info.contains(name));
        }
    }
}
