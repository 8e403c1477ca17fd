//! # sg-grid
//!
//! Grid composition engine for searchgrid.
//!
//! Attach candidate values to parameters of individual configuration nodes,
//! then expand a whole tree of nodes into the disjunctive grid a search
//! driver enumerates. Nested parameters are addressed as
//! `owner__param`, and a parameter searched over alternative nodes gets a
//! separate disjunct per node that carries its own grid.

mod annotate;
mod builder;
mod compose;
mod config;
mod merge;
mod namer;
mod search;

pub use annotate::{attach, read, set_grid};
pub use builder::{build_grid, build_param_grid, GridBuilder, DEFAULT_MAX_DEPTH, NESTING_SEPARATOR};
pub use compose::{
    make_column_transformer, make_pipeline, make_union, ColumnSelection, CompositeKind, Pipeline,
};
pub use config::SearchOptions;
pub use merge::{merge, prefix_keys};
pub use namer::{name_slots, NamedSteps, Slot, ALTERNATIVES_NAME};
pub use search::{
    enumerate_points, make_grid_search, make_random_search, make_search_with, GridSearch,
    GridSearchDriver, RandomSearch, RandomSearchDriver, SearchDriver, SearchRoot,
    SearchStrategy, ROOT_STEP,
};
