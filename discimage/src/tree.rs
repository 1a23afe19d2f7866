//! Unified file tree
//!
//! Both parsers produce the same arena-backed tree. Nodes own nothing but
//! their child ids; the parent link is fixed once when a node is attached.
//! Format-specific metadata sits in [`NodeKind`].

use crate::directory::IsoNode;
use crate::file::extent::Extent;
use crate::udf::file_entry::UdfNode;
use crate::utils::string;

/// Index of a node inside its [`FileTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// Format-specific node metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Node read from an ISO9660 directory record
    Iso(IsoNode),

    /// Node read from a UDF file entry
    Udf(UdfNode),
}

/// One file or directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    size: u64,
    sector: u64,
    is_directory: bool,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    path: String,
}

impl Node {
    /// Detached node; parent and path are set by [`FileTree::attach`]
    pub fn new(
        name: impl Into<String>,
        size: u64,
        sector: u64,
        is_directory: bool,
        kind: NodeKind,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            sector,
            is_directory,
            kind,
            parent: None,
            children: Vec::new(),
            path: String::new(),
        }
    }

    /// Name as displayed (Rock Ridge name when in use, `;n` suffix kept)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Absolute logical sector of the data
    pub fn sector(&self) -> u64 {
        self.sector
    }

    /// Data extent
    pub fn extent(&self) -> Extent {
        Extent::new(self.sector, self.size)
    }

    /// Is this a directory?
    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// Is this a regular file?
    pub fn is_file(&self) -> bool {
        !self.is_directory
    }

    /// Format-specific metadata
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    /// Parent directory (`None` for the root)
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in on-disk order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Full path recorded at attach time, `/`-separated
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Arena holding every node of one parsed table of contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTree {
    nodes: Vec<Node>,
}

impl FileTree {
    /// Start a tree from its root directory
    pub fn with_root(mut root: Node) -> Self {
        root.parent = None;
        root.path = String::from("/");
        Self { nodes: vec![root] }
    }

    /// Root directory
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Trees always hold at least the root
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node by id
    ///
    /// Ids are only handed out by this tree, so indexing cannot miss.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Node by id, if it belongs to this tree
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Attach `node` as the last child of `parent`
    pub fn attach(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent_path = &self.nodes[parent.0].path;
        node.path = if parent_path == "/" {
            format!("/{}", node.name)
        } else {
            format!("{}/{}", parent_path, node.name)
        };
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Full path built by walking the ancestors, joined with `separator`
    ///
    /// The root is just the separator. With `'/'` this equals
    /// [`Node::path`].
    pub fn full_path(&self, id: NodeId, separator: char) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            if node.parent.is_some() {
                names.push(node.name.as_str());
            }
            current = node.parent;
        }
        if names.is_empty() {
            return separator.to_string();
        }
        let mut path = String::new();
        for name in names.iter().rev() {
            path.push(separator);
            path.push_str(name);
        }
        path
    }

    /// Every node in pre-order, root first
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev());
        }
        order
    }

    /// Every file (non-directory) in pre-order
    pub fn files(&self) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|&id| self.node(id).is_file())
            .collect()
    }

    /// Look a path up from the root
    ///
    /// `/` and `\` both separate segments. Each segment is matched against
    /// the children in order; a stored `;n` version suffix is ignored, so
    /// `/DIR/FILE.TXT` finds `FILE.TXT;1`. The first matching child is
    /// followed and there is no backtracking. Returns `None` on a miss.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let normalized = path.replace('\\', "/");
        let mut current = self.root();
        for segment in normalized.split('/').filter(|s| !s.is_empty()) {
            current = *self
                .node(current)
                .children
                .iter()
                .find(|&&child| name_matches(self.node(child).name(), segment))?;
        }
        Some(current)
    }
}

fn name_matches(stored: &str, query: &str) -> bool {
    if stored == query {
        return true;
    }
    let base = string::strip_version(stored);
    // "README.;1" is the on-disk form of an extensionless "README"
    base == query || (base.len() < stored.len() && base.strip_suffix('.') == Some(query))
}
