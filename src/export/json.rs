use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::Serialize;

use crate::graph::directory::DirectoryEntry;
use crate::graph::filter::ExtensionEntry;
use crate::graph::{FileGraph, GraphSnapshot};

/// Graph data in the node/link shape consumed by force-directed renderers.
#[derive(Debug, Serialize)]
pub struct GraphData {
    pub nodes: Vec<NodeData>,
    pub links: Vec<LinkData>,
    /// Filter tree with effective state, so a renderer can draw the toggles.
    pub directories: Vec<DirectoryEntry>,
    pub extensions: Vec<ExtensionEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub id: usize,
    /// File name.
    pub name: String,
    pub full_path: String,
    /// Containing directory relative to the workspace root; `""` at the root.
    pub dir_path: String,
    pub extension: String,
}

#[derive(Debug, Serialize)]
pub struct LinkData {
    pub source: usize,
    pub target: usize,
}

pub fn build_graph_data(
    graph: &FileGraph,
    directories: Vec<DirectoryEntry>,
    extensions: Vec<ExtensionEntry>,
) -> GraphData {
    let mut nodes: Vec<NodeData> = graph
        .graph
        .node_indices()
        .map(|idx| {
            let node = &graph.graph[idx];
            NodeData {
                id: idx.index(),
                name: node.name(),
                full_path: node.path.to_string_lossy().into_owned(),
                dir_path: node.directory.clone(),
                extension: node.extension.clone(),
            }
        })
        .collect();
    nodes.sort_by(|a, b| a.full_path.cmp(&b.full_path));

    let mut links: Vec<LinkData> = graph
        .graph
        .edge_references()
        .map(|e| LinkData {
            source: e.source().index(),
            target: e.target().index(),
        })
        .collect();
    links.sort_by_key(|l| (l.source, l.target));

    GraphData {
        nodes,
        links,
        directories,
        extensions,
    }
}

/// Render pretty-printed JSON graph data.
pub fn render_json(
    graph: &FileGraph,
    snapshot: &GraphSnapshot,
    directories: Vec<DirectoryEntry>,
    extensions: Vec<ExtensionEntry>,
) -> serde_json::Result<String> {
    tracing::debug!(
        generation = snapshot.generation,
        nodes = graph.node_count(),
        "rendering json graph data"
    );
    serde_json::to_string_pretty(&build_graph_data(graph, directories, extensions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::{Path, PathBuf};

    use crate::graph::DependencyMap;
    use crate::graph::node::FileNode;

    #[test]
    fn test_graph_data_shape() {
        let root = Path::new("/ws");
        let a = PathBuf::from("/ws/a.ts");
        let b = PathBuf::from("/ws/lib/b.ts");
        let files: BTreeMap<PathBuf, FileNode> = [&a, &b]
            .into_iter()
            .map(|p| (p.clone(), FileNode::new(p.clone(), root)))
            .collect();
        let mut deps = DependencyMap::new();
        deps.insert(a.clone(), BTreeSet::from([b.clone()]));
        deps.insert(b.clone(), BTreeSet::new());
        let snapshot = GraphSnapshot::new(1, vec![root.to_path_buf()], files, deps, None);
        let mapping = snapshot
            .dependencies
            .iter()
            .map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
            .collect();
        let graph = FileGraph::from_mapping(&snapshot, &mapping);

        let json = render_json(&graph, &snapshot, Vec::new(), Vec::new()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let first = &value["nodes"][0];
        assert_eq!(first["name"], "a.ts");
        assert_eq!(first["fullPath"], "/ws/a.ts");
        assert_eq!(first["dirPath"], "");
        assert_eq!(value["nodes"][1]["dirPath"], "lib");
        assert_eq!(value["links"].as_array().unwrap().len(), 1);
        assert_eq!(value["links"][0]["source"], first["id"]);
    }
}
