/// Output format for graph export.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize,
)]
pub enum ExportFormat {
    /// Node/link graph data with directory and extension filter state (default).
    #[default]
    Json,
    /// Graphviz DOT, one cluster per directory.
    Dot,
}

/// Parameters controlling a graph export.
#[derive(Debug, Clone, Default)]
pub struct ExportParams {
    pub format: ExportFormat,
    /// Export the reverse mapping (edges point from a file to its dependents).
    pub reverse: bool,
}

/// Result of a graph export.
pub struct ExportResult {
    /// The rendered graph (JSON or DOT text).
    pub content: String,
    pub node_count: usize,
    pub edge_count: usize,
    /// Advisory warnings, already logged.
    pub warnings: Vec<String>,
}
