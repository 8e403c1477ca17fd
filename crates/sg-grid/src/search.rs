//! Search drivers that consume an expanded grid.
//!
//! Fitting and scoring live outside this crate. The drivers here only turn
//! an [`ExpandedGrid`] into concrete parameter points, which is all an
//! external fitting loop needs to iterate.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sg_types::{
    invalid_config, Conjunction, ExpandedGrid, Node, NodeRef, ParamPoint, SgResult, Value,
};
use tracing::info;

use crate::annotate::attach;
use crate::builder::build_param_grid;
use crate::compose::Pipeline;
use crate::config::SearchOptions;

/// Step name of the synthetic root wrapping a list of alternatives.
pub const ROOT_STEP: &str = "root";

/// What to search over: one configuration, or alternative configurations.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchRoot {
    Single(Value),
    Alternatives(Vec<Value>),
}

impl From<Value> for SearchRoot {
    fn from(value: Value) -> Self {
        SearchRoot::Single(value)
    }
}

impl From<NodeRef> for SearchRoot {
    fn from(node: NodeRef) -> Self {
        SearchRoot::Single(Value::Node(node))
    }
}

impl From<&NodeRef> for SearchRoot {
    fn from(node: &NodeRef) -> Self {
        SearchRoot::Single(Value::from(node))
    }
}

impl From<Vec<Value>> for SearchRoot {
    fn from(values: Vec<Value>) -> Self {
        SearchRoot::Alternatives(values)
    }
}

impl From<Vec<NodeRef>> for SearchRoot {
    fn from(nodes: Vec<NodeRef>) -> Self {
        SearchRoot::Alternatives(nodes.into_iter().map(Value::Node).collect())
    }
}

impl SearchRoot {
    /// Resolve to a fit-capable root node. A list of alternatives is wrapped
    /// in a pipeline with a single `root` step searched over the list.
    pub fn into_node(self) -> SgResult<NodeRef> {
        match self {
            SearchRoot::Single(Value::Node(node)) if node.can_fit() => Ok(node),
            SearchRoot::Single(Value::Node(node)) => Err(invalid_config!(
                "{} cannot be fitted and is not a list of alternatives",
                node.type_name()
            )),
            SearchRoot::Single(other) => Err(invalid_config!(
                "expected a configuration node or a list of alternatives, got {other}"
            )),
            SearchRoot::Alternatives(alternatives) => {
                let Some(first) = alternatives.first().cloned() else {
                    return Err(invalid_config!("empty list of alternative roots"));
                };
                let node = Node::new(Pipeline::new(vec![(ROOT_STEP.to_string(), first)]));
                let mut grid = Conjunction::new();
                grid.insert(ROOT_STEP.to_string(), alternatives);
                Ok(attach(&node, grid))
            }
        }
    }
}

/// Constructor seam for the search driver that evaluates a grid.
pub trait SearchDriver {
    type Search;

    fn create(
        &self,
        estimator: NodeRef,
        grid: ExpandedGrid,
        options: SearchOptions,
    ) -> SgResult<Self::Search>;
}

/// Build the grid for `root` and hand both to `driver`.
pub fn make_search_with<D: SearchDriver>(
    driver: &D,
    root: impl Into<SearchRoot>,
    options: SearchOptions,
) -> SgResult<D::Search> {
    options.validate()?;
    let estimator = root.into().into_node()?;
    let grid = build_param_grid(&estimator)?;
    info!(
        "Built search grid for {}: {} disjunct(s), {} point(s)",
        estimator.type_name(),
        grid.len(),
        grid.grid_size()
            .map_or_else(|| "overflowing".to_string(), |n| n.to_string())
    );
    driver.create(estimator, grid, options)
}

/// Exhaustive search over the grid of `root`.
pub fn make_grid_search(root: impl Into<SearchRoot>, options: SearchOptions) -> SgResult<GridSearch> {
    make_search_with(&GridSearchDriver, root, options)
}

/// Random sampling from the grid of `root`.
pub fn make_random_search(
    root: impl Into<SearchRoot>,
    options: SearchOptions,
) -> SgResult<RandomSearch> {
    make_search_with(&RandomSearchDriver, root, options)
}

/// Every parameter point of `grid`, conjunction by conjunction, with the
/// last key varying fastest. An empty grid yields one empty point.
pub fn enumerate_points(grid: &ExpandedGrid) -> Vec<ParamPoint> {
    if grid.is_empty() {
        return vec![ParamPoint::new()];
    }

    let mut points = Vec::new();
    for conjunction in grid.conjunctions() {
        // Cartesian product
        let mut result: Vec<ParamPoint> = vec![ParamPoint::new()];
        for (name, candidates) in conjunction {
            let mut next = Vec::with_capacity(result.len() * candidates.len());
            for existing in &result {
                for value in candidates {
                    let mut point = existing.clone();
                    point.insert(name.clone(), value.clone());
                    next.push(point);
                }
            }
            result = next;
        }
        points.extend(result);
    }
    points
}

/// Common trait for all search strategies.
pub trait SearchStrategy: Send + Sync {
    /// Generate the next batch of parameter points to evaluate.
    fn suggest(&mut self, count: usize) -> Vec<ParamPoint>;

    /// Human-readable strategy name.
    fn name(&self) -> &str;
}

// ---- Grid search ----

#[derive(Debug, Clone, Copy, Default)]
pub struct GridSearchDriver;

impl SearchDriver for GridSearchDriver {
    type Search = GridSearch;

    fn create(
        &self,
        estimator: NodeRef,
        grid: ExpandedGrid,
        options: SearchOptions,
    ) -> SgResult<GridSearch> {
        Ok(GridSearch::new(estimator, grid, options))
    }
}

/// Exhaustive enumeration of every point in the grid.
#[derive(Debug, Clone)]
pub struct GridSearch {
    estimator: NodeRef,
    param_grid: ExpandedGrid,
    options: SearchOptions,
    cursor: usize,
    points: Vec<ParamPoint>,
}

impl GridSearch {
    pub fn new(estimator: NodeRef, param_grid: ExpandedGrid, options: SearchOptions) -> Self {
        let points = enumerate_points(&param_grid);
        Self {
            estimator,
            param_grid,
            options,
            cursor: 0,
            points,
        }
    }

    pub fn estimator(&self) -> &NodeRef {
        &self.estimator
    }

    pub fn param_grid(&self) -> &ExpandedGrid {
        &self.param_grid
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn points(&self) -> &[ParamPoint] {
        &self.points
    }

    pub fn remaining(&self) -> usize {
        self.points.len() - self.cursor
    }
}

impl SearchStrategy for GridSearch {
    fn suggest(&mut self, count: usize) -> Vec<ParamPoint> {
        let end = (self.cursor + count).min(self.points.len());
        let batch = self.points[self.cursor..end].to_vec();
        self.cursor = end;
        batch
    }

    fn name(&self) -> &str {
        "grid"
    }
}

// ---- Random search ----

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSearchDriver;

impl SearchDriver for RandomSearchDriver {
    type Search = RandomSearch;

    fn create(
        &self,
        estimator: NodeRef,
        grid: ExpandedGrid,
        options: SearchOptions,
    ) -> SgResult<RandomSearch> {
        if options.n_iter == 0 {
            return Err(invalid_config!("n_iter must be positive for random search"));
        }
        Ok(RandomSearch::new(estimator, grid, options))
    }
}

/// Draws up to `n_iter` points: a conjunction uniformly at random, then one
/// candidate per parameter.
#[derive(Debug, Clone)]
pub struct RandomSearch {
    estimator: NodeRef,
    param_grid: ExpandedGrid,
    options: SearchOptions,
    rng: StdRng,
    drawn: usize,
}

impl RandomSearch {
    pub fn new(estimator: NodeRef, param_grid: ExpandedGrid, options: SearchOptions) -> Self {
        let seed = options.seed.unwrap_or_else(rand::random);
        Self {
            estimator,
            param_grid,
            options,
            rng: StdRng::seed_from_u64(seed),
            drawn: 0,
        }
    }

    pub fn estimator(&self) -> &NodeRef {
        &self.estimator
    }

    pub fn param_grid(&self) -> &ExpandedGrid {
        &self.param_grid
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn remaining(&self) -> usize {
        self.options.n_iter.saturating_sub(self.drawn)
    }

    fn sample_one(&mut self) -> ParamPoint {
        let conjunctions = self.param_grid.conjunctions();
        if conjunctions.is_empty() {
            return ParamPoint::new();
        }

        let conjunction = &conjunctions[self.rng.random_range(0..conjunctions.len())];
        let mut point = ParamPoint::new();
        for (name, candidates) in conjunction {
            if candidates.is_empty() {
                continue;
            }
            let idx = self.rng.random_range(0..candidates.len());
            point.insert(name.clone(), candidates[idx].clone());
        }
        point
    }
}

impl SearchStrategy for RandomSearch {
    fn suggest(&mut self, count: usize) -> Vec<ParamPoint> {
        let count = count.min(self.remaining());
        self.drawn += count;
        (0..count).map(|_| self.sample_one()).collect()
    }

    fn name(&self) -> &str {
        "random"
    }
}
