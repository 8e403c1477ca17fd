//! Per-node grid annotations.
//!
//! Annotations live on the node itself and are replaced wholesale on every
//! attach. Keys are not checked against the node's parameters; an unknown
//! key simply becomes a grid entry that the search driver may reject.

use sg_types::{Grid, GridSpec, NodeRef};
use std::sync::Arc;
use tracing::debug;

/// Attach `grid` to `node`, overwriting any previous annotation.
pub fn attach(node: &NodeRef, grid: impl Into<GridSpec>) -> NodeRef {
    let grid = grid.into().into_grid();
    debug!(
        "Attaching {} conjunction(s) to {}",
        grid.len(),
        node.type_name()
    );
    node.set_annotation(grid);
    Arc::clone(node)
}

/// Owned variant of [`attach`] for building annotated nodes inline.
pub fn set_grid(node: NodeRef, grid: impl Into<GridSpec>) -> NodeRef {
    attach(&node, grid);
    node
}

/// The node's raw annotation, or an empty grid if none was attached.
pub fn read(node: &NodeRef) -> Grid {
    node.annotation()
}
