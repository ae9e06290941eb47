//! Path Model
//!
//! A path names one location in a component's data model, read root to leaf.
//! Loop aliases show up as markers: `for item of items` followed by
//! `item.name` is the path `items[item].name`.

use crate::expression::ast::Expr;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};

/// One step of a [`Path`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Property(String),
    /// An element of an array, introduced by a loop alias at `depth` nested
    /// loops from the template root.
    Marker { alias: String, depth: usize },
}

impl PathSegment {
    pub fn property(name: impl Into<String>) -> Self {
        PathSegment::Property(name.into())
    }

    pub fn marker(alias: impl Into<String>, depth: usize) -> Self {
        PathSegment::Marker {
            alias: alias.into(),
            depth,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, PathSegment::Marker { .. })
    }

    pub fn as_property(&self) -> Option<&str> {
        match self {
            PathSegment::Property(name) => Some(name),
            PathSegment::Marker { .. } => None,
        }
    }
}

// Markers compare equal to each other whatever their alias: only their
// position in the path identifies them.
impl PartialEq for PathSegment {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PathSegment::Property(a), PathSegment::Property(b)) => a == b,
            (PathSegment::Marker { .. }, PathSegment::Marker { .. }) => true,
            _ => false,
        }
    }
}

impl Eq for PathSegment {}

impl Hash for PathSegment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            PathSegment::Property(name) => {
                0u8.hash(state);
                name.hash(state);
            }
            PathSegment::Marker { .. } => 1u8.hash(state),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Property(name) => write!(f, "{}", name),
            PathSegment::Marker { alias, .. } => write!(f, "[{}]", alias),
        }
    }
}

/// Ordered, non-empty sequence of segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path(SmallVec<[PathSegment; 4]>);

impl Path {
    pub fn new(first: PathSegment) -> Self {
        let mut segments = SmallVec::new();
        segments.push(first);
        Path(segments)
    }

    /// Returns `None` for an empty segment list
    pub fn from_segments(segments: impl IntoIterator<Item = PathSegment>) -> Option<Self> {
        let segments: SmallVec<[PathSegment; 4]> = segments.into_iter().collect();
        if segments.is_empty() {
            None
        } else {
            Some(Path(segments))
        }
    }

    pub fn from_properties(names: &[&str]) -> Option<Self> {
        Path::from_segments(names.iter().map(|name| PathSegment::property(*name)))
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn leaf(&self) -> &PathSegment {
        &self.0[self.0.len() - 1]
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn with(&self, segment: PathSegment) -> Path {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    pub fn marker_count(&self) -> usize {
        self.0.iter().filter(|s| s.is_marker()).count()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 && !segment.is_marker() {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Same length and pairwise equal segments
pub fn equals(a: &Path, b: &Path) -> bool {
    a == b
}

/// Name of the index variable standing for the loop at `depth`
pub fn index_identifier(depth: usize) -> String {
    format!("$i{}", depth)
}

/// Resolution of loop markers to index expressions, by loop depth.
///
/// Depths without an entry stay symbolic and resolve to
/// [`index_identifier`].
#[derive(Debug, Clone, Default)]
pub struct MarkerTable {
    by_depth: Vec<Option<Expr>>,
}

impl MarkerTable {
    pub fn symbolic() -> Self {
        MarkerTable::default()
    }

    pub fn bind(&mut self, depth: usize, index: Expr) {
        if self.by_depth.len() <= depth {
            self.by_depth.resize(depth + 1, None);
        }
        self.by_depth[depth] = Some(index);
    }

    pub fn resolve(&self, depth: usize) -> Expr {
        self.by_depth
            .get(depth)
            .and_then(|index| index.clone())
            .unwrap_or_else(|| Expr::ident(index_identifier(depth)))
    }
}

/// Builds the expression reading `path` off `root`, with every marker
/// replaced by its index expression from `table`.
pub fn chain_from(table: &MarkerTable, path: &Path, root: Expr) -> Expr {
    path.segments()
        .iter()
        .fold(root, |acc, segment| match segment {
            PathSegment::Property(name) => acc.member(name.clone()),
            PathSegment::Marker { depth, .. } => acc.index(table.resolve(*depth)),
        })
}

/// The suffix of `path` from its innermost loop alias, as names.
///
/// `items[item].name` gives `["item", "name"]`; a path without markers is
/// returned whole.
pub fn slice_from_last_marker(path: &Path) -> Vec<String> {
    let segments = path.segments();
    match segments.iter().rposition(|s| s.is_marker()) {
        Some(index) => segments[index..]
            .iter()
            .map(|segment| match segment {
                PathSegment::Property(name) => name.clone(),
                PathSegment::Marker { alias, .. } => alias.clone(),
            })
            .collect(),
        None => segments
            .iter()
            .filter_map(|s| s.as_property().map(str::to_string))
            .collect(),
    }
}
