pub mod dot;
pub mod json;
pub mod model;

use crate::engine::DependencyGraphEngine;
use crate::graph::FileGraph;

use model::{ExportFormat, ExportParams, ExportResult};

/// Above this many nodes Graphviz layouts become slow and unreadable.
const DOT_NODE_WARNING: usize = 1500;

/// Export the engine's filtered graph.
///
/// Only active files appear: disabled extensions and directories are applied
/// exactly as [`DependencyGraphEngine::get_dependencies`] applies them.
pub fn export_graph(
    engine: &DependencyGraphEngine,
    params: &ExportParams,
) -> anyhow::Result<ExportResult> {
    let snapshot = engine.snapshot();
    let mapping = if params.reverse {
        engine.get_dependents()
    } else {
        engine.get_dependencies()
    };
    let graph = FileGraph::from_mapping(&snapshot, &mapping);

    let mut warnings = Vec::new();
    if params.format == ExportFormat::Dot && graph.node_count() > DOT_NODE_WARNING {
        let msg = format!(
            "Large graph: {} files may render poorly in Graphviz. \
             Consider disabling directories or extensions.",
            graph.node_count()
        );
        tracing::warn!("{msg}");
        warnings.push(msg);
    }

    let content = match params.format {
        ExportFormat::Json => json::render_json(
            &graph,
            &snapshot,
            engine.get_directories(),
            engine.get_target_extensions(),
        )?,
        ExportFormat::Dot => dot::render_dot(&graph),
    };

    Ok(ExportResult {
        content,
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_export_respects_filters() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/a.ts", "import './b'; import './c';");
        write(dir.path(), "src/b.ts", "");
        write(dir.path(), "src/c/index.ts", "");
        let engine = DependencyGraphEngine::new(vec![dir.path().to_path_buf()]).unwrap();
        engine.update_dependencies_blocking();

        let params = ExportParams {
            format: ExportFormat::Dot,
            reverse: false,
        };
        let full = export_graph(&engine, &params).unwrap();
        assert_eq!((full.node_count, full.edge_count), (3, 2));

        engine.set_directory_enabled("src/c", false);
        let filtered = export_graph(&engine, &params).unwrap();
        assert_eq!((filtered.node_count, filtered.edge_count), (2, 1));
        assert!(!filtered.content.contains("index.ts"));
        assert!(filtered.warnings.is_empty());
    }

    #[test]
    fn test_reverse_export_flips_edges() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.ts", "import './b';");
        write(dir.path(), "b.ts", "");
        let engine = DependencyGraphEngine::new(vec![dir.path().to_path_buf()]).unwrap();
        engine.update_dependencies_blocking();

        let result = export_graph(
            &engine,
            &ExportParams {
                format: ExportFormat::Json,
                reverse: true,
            },
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&result.content).unwrap();
        let nodes = value["nodes"].as_array().unwrap();
        let link = &value["links"][0];
        let name_of = |id: &serde_json::Value| {
            nodes
                .iter()
                .find(|n| &n["id"] == id)
                .map(|n| n["name"].as_str().unwrap().to_string())
                .unwrap()
        };
        assert_eq!(name_of(&link["source"]), "b.ts");
        assert_eq!(name_of(&link["target"]), "a.ts");
    }
}
