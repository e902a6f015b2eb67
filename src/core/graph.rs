//! Function-level call graph over a source tree.
//!
//! Python, JavaScript, and TypeScript files are parsed with tree-sitter. Each
//! function becomes a node identified by `<file-stem>:<dotted scope path>`;
//! calls are matched to definitions by unqualified name only, so a call to
//! `save` links to every function named `save` in the tree.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tree_sitter::Node;
use walkdir::{DirEntry, WalkDir};

use super::complexity::{complexity_in_file, structural_node_count};
use super::language::{Language, new_file_parser};
use super::parser::{class_name, function_name};
use crate::storage::config::{DEFAULT_EXCLUDED_DIRS, GraphConfig};

/// Default number of hotspots reported.
pub const DEFAULT_MAX_HOTSPOTS: usize = 20;

/// Extensions the graph builder scans.
const GRAPH_EXTENSIONS: &[&str] = &["py", "js", "mjs", "cjs", "jsx", "ts", "tsx"];

// =============================================================================
// Output types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub complexity: u32,
    pub file: String,
    pub degree: usize,
    pub hotspot: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub id: String,
    pub score: f64,
}

/// Nodes in discovery order, edges in caller order, hotspots by score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub hotspots: Vec<Hotspot>,
}

impl CallGraph {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// =============================================================================
// Builder
// =============================================================================

#[derive(Debug, Clone)]
pub struct GraphBuilder {
    excluded_dirs: Vec<String>,
    max_hotspots: usize,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self {
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(ToString::to_string).collect(),
            max_hotspots: DEFAULT_MAX_HOTSPOTS,
        }
    }
}

/// A function found while scanning, before edges are resolved.
#[derive(Debug)]
struct Symbol {
    id: String,
    short_name: String,
    file: PathBuf,
    complexity: u32,
    calls: BTreeSet<String>,
}

impl GraphBuilder {
    #[must_use]
    pub fn from_config(config: &GraphConfig) -> Self {
        Self {
            excluded_dirs: config.excluded_dirs.clone(),
            max_hotspots: config.max_hotspots,
        }
    }

    /// Build the call graph for every supported file under `root`.
    ///
    /// A missing root or a tree with no supported files yields an empty graph.
    #[must_use]
    pub fn build_graph(&self, root: &Path) -> CallGraph {
        let mut symbols: Vec<Symbol> = Vec::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();

        for path in self.source_files(root) {
            let Some(language) = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(Language::from_extension)
            else {
                continue;
            };
            let source = match std::fs::read(&path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable file");
                    continue;
                }
            };

            for symbol in scan_file(&path, language, &source) {
                // Same stem and scope in two files: the later definition wins.
                if let Some(&i) = by_id.get(&symbol.id) {
                    symbols[i] = symbol;
                } else {
                    by_id.insert(symbol.id.clone(), symbols.len());
                    symbols.push(symbol);
                }
            }
        }

        let graph = self.assemble(&symbols);
        tracing::info!(
            root = %root.display(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Built call graph"
        );
        graph
    }

    fn source_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_skipped(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unreadable path");
                    continue;
                }
            };
            let supported = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| GRAPH_EXTENSIONS.contains(&ext));
            if entry.file_type().is_file() && supported {
                files.push(entry.into_path());
            }
        }
        files
    }

    /// Hidden entries and excluded directories below the root.
    fn is_skipped(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.')
            || (entry.file_type().is_dir() && self.excluded_dirs.iter().any(|d| **d == *name))
    }

    fn assemble(&self, symbols: &[Symbol]) -> CallGraph {
        let mut by_short_name: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, symbol) in symbols.iter().enumerate() {
            by_short_name.entry(symbol.short_name.as_str()).or_default().push(i);
        }

        let mut degree = vec![0usize; symbols.len()];
        let mut edges = Vec::new();
        for (from, symbol) in symbols.iter().enumerate() {
            for callee in &symbol.calls {
                let Some(targets) = by_short_name.get(callee.as_str()) else {
                    continue;
                };
                for &to in targets.iter().filter(|&&to| to != from) {
                    degree[from] += 1;
                    degree[to] += 1;
                    edges.push(GraphEdge {
                        from: symbol.id.clone(),
                        to: symbols[to].id.clone(),
                    });
                }
            }
        }

        let max_complexity = symbols.iter().map(|s| s.complexity).max().unwrap_or(0).max(1);
        let nodes: Vec<GraphNode> = symbols
            .iter()
            .zip(&degree)
            .map(|(symbol, &deg)| GraphNode {
                id: symbol.id.clone(),
                complexity: symbol.complexity,
                file: symbol.file.display().to_string(),
                degree: deg,
                hotspot: hotspot_score(symbol.complexity, max_complexity, deg),
            })
            .collect();

        let mut hotspots: Vec<Hotspot> = nodes
            .iter()
            .map(|n| Hotspot {
                id: n.id.clone(),
                score: n.hotspot,
            })
            .collect();
        // sort_by is stable, so ties keep discovery order.
        hotspots.sort_by(|a, b| b.score.total_cmp(&a.score));
        hotspots.truncate(self.max_hotspots);

        CallGraph {
            nodes,
            edges,
            hotspots,
        }
    }
}

/// `build_graph` with default exclusions and hotspot count.
#[must_use]
pub fn build_graph(root: &Path) -> CallGraph {
    GraphBuilder::default().build_graph(root)
}

/// `round4(c / max_c * ln(2 + degree))`.
#[must_use]
pub fn hotspot_score(complexity: u32, max_complexity: u32, degree: usize) -> f64 {
    let normalized = f64::from(complexity) / f64::from(max_complexity.max(1));
    #[allow(clippy::cast_precision_loss)]
    let spread = (1.0 + degree as f64 + 1.0).ln();
    round4(normalized * spread)
}

pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

// =============================================================================
// Per-file scan
// =============================================================================

fn scan_file(path: &Path, language: Language, source: &str) -> Vec<Symbol> {
    let Some(mut parser) = new_file_parser(language, path) else {
        return Vec::new();
    };
    let Some(tree) = parser.parse(source, None) else {
        tracing::debug!(path = %path.display(), "Parse failed, file skipped");
        return Vec::new();
    };

    let mut scan = FileScan {
        language,
        source,
        lines: source.lines().collect(),
        stem: path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path,
        symbols: Vec::new(),
    };
    let mut scope = Vec::new();
    scan.visit(tree.root_node(), &mut scope, None);
    scan.symbols
}

struct FileScan<'a> {
    language: Language,
    source: &'a str,
    lines: Vec<&'a str>,
    stem: String,
    path: &'a Path,
    symbols: Vec<Symbol>,
}

impl FileScan<'_> {
    /// `current` is the index of the innermost enclosing function, if any.
    fn visit(&mut self, node: Node<'_>, scope: &mut Vec<String>, current: Option<usize>) {
        if let Some(name) = function_name(self.language, node, self.source) {
            let qualified = if scope.is_empty() {
                name.clone()
            } else {
                format!("{}.{name}", scope.join("."))
            };
            let index = self.symbols.len();
            self.symbols.push(Symbol {
                id: format!("{}:{qualified}", self.stem),
                short_name: name.clone(),
                file: self.path.to_path_buf(),
                complexity: self.function_complexity(node),
                calls: BTreeSet::new(),
            });
            scope.push(name);
            self.visit_children(node, scope, Some(index));
            scope.pop();
            return;
        }

        if let Some(name) = class_name(self.language, node, self.source) {
            scope.push(name);
            self.visit_children(node, scope, current);
            scope.pop();
            return;
        }

        if let Some(index) = current
            && let Some(target) = call_target(self.language, node, self.source)
        {
            self.symbols[index].calls.insert(target);
        }
        self.visit_children(node, scope, current);
    }

    fn visit_children(&mut self, node: Node<'_>, scope: &mut Vec<String>, current: Option<usize>) {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        for child in children {
            self.visit(child, scope, current);
        }
    }

    /// Score the function's own lines; fall back to counting its branch nodes.
    fn function_complexity(&self, node: Node<'_>) -> u32 {
        let start = node.start_position().row;
        let end = node.end_position().row;
        match self.lines.get(start..=end) {
            Some(lines) => complexity_in_file(self.language, self.path, &dedent(lines)).max(1),
            None => structural_node_count(self.language, node),
        }
    }
}

/// Join `lines` with their common leading whitespace removed, so nested
/// definitions parse as top-level code.
fn dedent(lines: &[&str]) -> String {
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| l.get(indent..).unwrap_or_else(|| l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Unqualified name of the function a call expression invokes.
fn call_target(language: Language, node: Node<'_>, source: &str) -> Option<String> {
    let (call_kind, member_kind, member_field) = match language {
        Language::Python => ("call", "attribute", "attribute"),
        Language::JavaScript | Language::TypeScript => ("call_expression", "member_expression", "property"),
        Language::Java | Language::Go | Language::Rust => return None,
    };
    if node.kind() != call_kind {
        return None;
    }

    let function = node.child_by_field_name("function")?;
    let name_node = match function.kind() {
        "identifier" => function,
        kind if kind == member_kind => function.child_by_field_name(member_field)?,
        _ => return None,
    };
    name_node
        .utf8_text(source.as_bytes())
        .ok()
        .map(str::to_string)
}
