use std::collections::BTreeMap;
use std::fmt::Write;

use petgraph::stable_graph::NodeIndex;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use crate::graph::FileGraph;
use crate::language::FileClass;

/// Sanitize a string for use as a DOT node ID or subgraph name.
///
/// Replaces non-alphanumeric characters with `_`. Prepends `n` if the result
/// starts with a digit (DOT IDs must not start with a digit).
pub fn sanitize_dot_id(s: &str) -> String {
    let mut result: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, 'n');
    }
    if result.is_empty() {
        result = "root".to_string();
    }
    result
}

fn escape_label(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn class_fillcolor(class: FileClass) -> &'static str {
    match class {
        FileClass::Script => "#AED6F1",
        FileClass::Component => "#A9DFBF",
        FileClass::Stylesheet => "#F9E79F",
        FileClass::Markup => "#F1948A",
        FileClass::Other => "#EAECEE",
    }
}

/// Render the graph as DOT: one `cluster_*` subgraph per directory, edges after.
///
/// Cluster ids carry the directory's position, since sanitizing alone maps
/// `src/c` and `src_c` to the same id.
pub fn render_dot(graph: &FileGraph) -> String {
    let mut clusters: BTreeMap<&str, Vec<NodeIndex>> = BTreeMap::new();
    for idx in graph.graph.node_indices() {
        clusters
            .entry(graph.graph[idx].directory.as_str())
            .or_default()
            .push(idx);
    }

    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "digraph filedep {{");
    let _ = writeln!(out, "    rankdir=LR;");
    let _ = writeln!(out, "    node [shape=box style=filled fontname=monospace];");

    for (position, (directory, members)) in clusters.iter().enumerate() {
        let label = if directory.is_empty() { "." } else { directory };
        let _ = writeln!(
            out,
            "    subgraph cluster_{}_{position} {{",
            sanitize_dot_id(directory)
        );
        let _ = writeln!(out, "        label=\"{}\";", escape_label(label));
        for idx in members {
            let node = &graph.graph[*idx];
            let _ = writeln!(
                out,
                "        n{} [label=\"{}\" fillcolor=\"{}\"];",
                idx.index(),
                escape_label(&node.name()),
                class_fillcolor(node.class)
            );
        }
        let _ = writeln!(out, "    }}");
    }

    let mut edges: Vec<(usize, usize)> = graph
        .graph
        .edge_references()
        .map(|e| (e.source().index(), e.target().index()))
        .collect();
    edges.sort_unstable();
    for (src, tgt) in edges {
        let _ = writeln!(out, "    n{src} -> n{tgt};");
    }

    let _ = writeln!(out, "}}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::{Path, PathBuf};

    use crate::graph::node::FileNode;
    use crate::graph::{DependencyMap, GraphSnapshot};

    #[test]
    fn test_sanitize_dot_id() {
        assert_eq!(sanitize_dot_id("src/c"), "src_c");
        assert_eq!(sanitize_dot_id("1st"), "n1st");
        assert_eq!(sanitize_dot_id(""), "root");
    }

    #[test]
    fn test_render_dot_clusters_by_directory() {
        let root = Path::new("/ws");
        let paths = [
            PathBuf::from("/ws/src/a.ts"),
            PathBuf::from("/ws/src/c/index.ts"),
            PathBuf::from("/ws/main.css"),
        ];
        let files = paths
            .iter()
            .map(|p| (p.clone(), FileNode::new(p.clone(), root)))
            .collect();
        let mut deps = DependencyMap::new();
        deps.insert(paths[0].clone(), BTreeSet::from([paths[1].clone()]));
        deps.insert(paths[1].clone(), BTreeSet::new());
        deps.insert(paths[2].clone(), BTreeSet::new());
        let snapshot = GraphSnapshot::new(1, vec![root.to_path_buf()], files, deps, None);
        let mapping = snapshot
            .dependencies
            .iter()
            .map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
            .collect();
        let dot = render_dot(&FileGraph::from_mapping(&snapshot, &mapping));

        assert!(dot.starts_with("digraph filedep {"));
        assert!(dot.contains("subgraph cluster_root_0 {"));
        assert!(dot.contains("subgraph cluster_src_c_2 {"));
        assert!(dot.contains("label=\"index.ts\""));
        assert!(dot.contains("#F9E79F"), "stylesheets get their own color");
        assert_eq!(dot.matches(" -> ").count(), 1);
    }

    #[test]
    fn test_cluster_ids_are_unique() {
        let root = Path::new("/ws");
        let paths = [
            PathBuf::from("/ws/a.ts"),
            PathBuf::from("/ws/root/b.ts"),
            PathBuf::from("/ws/src/c/d.ts"),
            PathBuf::from("/ws/src_c/e.ts"),
        ];
        let files = paths
            .iter()
            .map(|p| (p.clone(), FileNode::new(p.clone(), root)))
            .collect();
        let deps: DependencyMap = paths.iter().map(|p| (p.clone(), BTreeSet::new())).collect();
        let snapshot = GraphSnapshot::new(1, vec![root.to_path_buf()], files, deps, None);
        let mapping = snapshot
            .dependencies
            .keys()
            .map(|k| (k.clone(), Vec::new()))
            .collect();
        let dot = render_dot(&FileGraph::from_mapping(&snapshot, &mapping));

        let ids: BTreeSet<&str> = dot
            .lines()
            .filter_map(|l| l.trim().strip_prefix("subgraph "))
            .collect();
        assert_eq!(ids.len(), 4, "{dot}");
    }
}
