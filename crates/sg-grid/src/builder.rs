//! Recursive expansion of a configuration tree into a disjunctive grid.

use sg_types::{
    Candidates, Conjunction, ExpandedGrid, Grid, GridError, NodeId, NodeRef, SgResult, Value,
};
use std::collections::HashSet;
use tracing::debug;

use crate::merge::merge;

/// Separator between an owning parameter and a nested parameter name.
pub const NESTING_SEPARATOR: &str = "__";

/// Deepest configuration tree the builder will walk.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Walks configuration trees and expands their grid annotations.
#[derive(Debug, Clone)]
pub struct GridBuilder {
    max_depth: usize,
}

impl Default for GridBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Nodes on the current traversal path, with the label each was reached by.
type Trail = Vec<(NodeId, String)>;

fn describe(trail: &Trail, leaf: &str) -> String {
    trail
        .iter()
        .skip(1)
        .map(|(_, label)| label.as_str())
        .chain(std::iter::once(leaf))
        .filter(|label| !label.is_empty())
        .collect::<Vec<_>>()
        .join(NESTING_SEPARATOR)
}

impl GridBuilder {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Expand `node` into a list of conjunctions, or `None` when nothing in
    /// the tree is annotated.
    pub fn build(&self, node: &NodeRef) -> SgResult<Option<Grid>> {
        let mut trail = Trail::new();
        self.build_node(node, node.type_name(), &mut trail)
    }

    /// Expand `node` and flatten the result for a search driver.
    pub fn build_expanded(&self, node: &NodeRef) -> SgResult<ExpandedGrid> {
        Ok(ExpandedGrid::from_disjuncts(self.build(node)?))
    }

    fn build_node(&self, node: &NodeRef, label: &str, trail: &mut Trail) -> SgResult<Option<Grid>> {
        if trail.iter().any(|(id, _)| *id == node.id()) {
            return Err(GridError::CycleDetected {
                path: describe(trail, label),
            }
            .into());
        }
        if trail.len() >= self.max_depth {
            return Err(GridError::DepthExceeded {
                limit: self.max_depth,
                path: describe(trail, label),
            }
            .into());
        }

        trail.push((node.id(), label.to_string()));
        let result = self.expand(node, trail);
        trail.pop();
        result
    }

    fn expand(&self, node: &NodeRef, trail: &mut Trail) -> SgResult<Option<Grid>> {
        let mut grid = node.annotation();
        if grid.iter().all(Conjunction::is_empty) {
            grid = vec![Conjunction::new()];
        }
        let declared: HashSet<String> = grid.iter().flat_map(|c| c.keys().cloned()).collect();

        // Nested nodes held as current parameter values. A conjunction that
        // already lists candidates for the parameter is left alone; those
        // candidates are expanded individually below.
        for (name, value) in node.params() {
            let Value::Node(child) = &value else {
                continue;
            };
            let Some(sub_grid) = self.build_node(child, &name, trail)? else {
                continue;
            };
            let prefix = format!("{name}{NESTING_SEPARATOR}");
            grid = grid
                .into_iter()
                .flat_map(|conjunction| {
                    if conjunction.contains_key(&name) {
                        vec![conjunction]
                    } else {
                        merge(vec![conjunction], Some(sub_grid.as_slice()), Some(&prefix))
                    }
                })
                .collect();
        }

        // Candidate nodes carrying their own grids. Keys merged in from
        // nested nodes were already expanded by the nested build.
        let mut out = Grid::new();
        for conjunction in grid {
            let mut part = vec![conjunction.clone()];
            for (name, candidates) in &conjunction {
                if !declared.contains(name) {
                    continue;
                }
                if candidates.is_empty() {
                    return Err(GridError::EmptyCandidates {
                        path: describe(trail, name),
                    }
                    .into());
                }
                if !candidates.iter().any(Value::is_node) {
                    continue;
                }
                let alternatives = self.split_candidates(name, candidates, trail)?;
                part = merge(part, Some(alternatives.as_slice()), None);
            }
            out.extend(part);
        }

        if out.iter().all(Conjunction::is_empty) {
            debug!("No grid for {}", node.type_name());
            return Ok(None);
        }

        debug!(
            "Expanded {} into {} conjunction(s)",
            node.type_name(),
            out.len()
        );
        Ok(Some(out))
    }

    /// One conjunction per candidate node with its own grid, pinned to that
    /// candidate, plus one conjunction holding every remaining candidate.
    fn split_candidates(
        &self,
        name: &str,
        candidates: &Candidates,
        trail: &mut Trail,
    ) -> SgResult<Grid> {
        let prefix = format!("{name}{NESTING_SEPARATOR}");
        let mut alternatives = Grid::new();
        let mut no_sub_grid = Candidates::new();

        for candidate in candidates {
            if let Value::Node(child) = candidate {
                if let Some(sub_grid) = self.build_node(child, name, trail)? {
                    let mut pinned = Conjunction::new();
                    pinned.insert(name.to_string(), vec![candidate.clone()]);
                    alternatives.extend(merge(
                        vec![pinned],
                        Some(sub_grid.as_slice()),
                        Some(&prefix),
                    ));
                    continue;
                }
            }
            no_sub_grid.push(candidate.clone());
        }

        if !no_sub_grid.is_empty() {
            let mut rest = Conjunction::new();
            rest.insert(name.to_string(), no_sub_grid);
            alternatives.push(rest);
        }
        Ok(alternatives)
    }
}

/// Expand `node` with the default builder; `None` when nothing is annotated.
pub fn build_grid(node: &NodeRef) -> SgResult<Option<Grid>> {
    GridBuilder::new().build(node)
}

/// Expand `node` into the shape a search driver expects: `{}`, a bare
/// conjunction, or a list of conjunctions.
pub fn build_param_grid(node: &NodeRef) -> SgResult<ExpandedGrid> {
    GridBuilder::new().build_expanded(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::set_grid;
    use crate::compose::Pipeline;
    use sg_types::{conjunction, Component, Estimator, Node, ParamMap, SgError};
    use std::sync::{Arc, OnceLock};

    fn svc() -> NodeRef {
        Estimator::new("SVC")
            .with_param("C", 1.0)
            .with_param("gamma", "scale")
            .into_node()
    }

    fn pipeline(steps: Vec<(&str, Value)>) -> NodeRef {
        Node::new(Pipeline::new(
            steps
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        ))
    }

    #[test]
    fn single_node_grid() {
        let node = set_grid(svc(), conjunction! { "C" => [1, 2] });
        assert_eq!(
            build_param_grid(&node).unwrap(),
            ExpandedGrid::Single(conjunction! { "C" => [1, 2] })
        );

        let node = set_grid(svc(), conjunction! { "C" => [1, 2], "gamma" => [1, 2] });
        assert_eq!(
            build_param_grid(&node).unwrap(),
            ExpandedGrid::Single(conjunction! { "C" => [1, 2], "gamma" => [1, 2] })
        );
    }

    #[test]
    fn unannotated_tree_has_no_grid() {
        let pipe = pipeline(vec![("sel", Estimator::new("SelectKBest").into_node().into())]);
        assert_eq!(build_grid(&pipe).unwrap(), None);
        assert_eq!(build_param_grid(&pipe).unwrap(), ExpandedGrid::Empty);
    }

    #[test]
    fn empty_annotations_collapse() {
        let node = set_grid(svc(), Grid::new());
        assert_eq!(build_grid(&node).unwrap(), None);

        let node = set_grid(svc(), vec![Conjunction::new(), Conjunction::new()]);
        assert_eq!(build_grid(&node).unwrap(), None);
    }

    #[test]
    fn nested_parameters_are_namespaced() {
        let inner = set_grid(svc(), conjunction! { "C" => [1, 2], "gamma" => [1, 2] });
        let pipe = pipeline(vec![("svc", inner.into())]);

        assert_eq!(
            build_param_grid(&pipe).unwrap(),
            ExpandedGrid::Single(conjunction! { "svc__C" => [1, 2], "svc__gamma" => [1, 2] })
        );
    }

    #[test]
    fn two_levels_of_nesting() {
        let inner = set_grid(
            Estimator::new("SelectKBest").into_node(),
            conjunction! { "k" => [1, 2] },
        );
        let middle = Estimator::new("Wrapper").with_param("x", &inner).into_node();
        let outer = pipeline(vec![("w", middle.into())]);

        let grid = build_grid(&outer).unwrap().unwrap();
        assert_eq!(grid, vec![conjunction! { "w__x__k" => [1, 2] }]);
    }

    #[test]
    fn nested_alternatives_with_several_disjuncts() {
        let a = set_grid(
            Estimator::new("SVC").into_node(),
            vec![conjunction! { "k" => [1] }, conjunction! { "j" => [2] }],
        );
        let b = Estimator::new("LogisticRegression").into_node();
        let inner = set_grid(
            pipeline(vec![("clf", Value::from(&a))]),
            conjunction! { "clf" => [&a, &b] },
        );
        let outer = pipeline(vec![("p", inner.into())]);

        let grid = build_grid(&outer).unwrap().unwrap();
        assert_eq!(
            grid,
            vec![
                conjunction! { "p__clf" => [&a], "p__clf__k" => [1] },
                conjunction! { "p__clf" => [&a], "p__clf__j" => [2] },
                conjunction! { "p__clf" => [&b] },
            ]
        );
    }

    #[test]
    fn alternative_estimators_with_own_grids() {
        let clf1 = set_grid(svc(), conjunction! { "kernel" => ["linear"] });
        let clf2 = Estimator::new("LogisticRegression").into_node();
        let clf3 = set_grid(
            svc(),
            conjunction! { "kernel" => ["poly"], "degree" => [2, 3] },
        );
        let clf4 = Estimator::new("SGDClassifier").into_node();
        let sel = set_grid(
            Estimator::new("SelectKBest").into_node(),
            conjunction! { "k" => [2, 3] },
        );
        let pipe = set_grid(
            pipeline(vec![("sel", sel.into()), ("clf", Value::None)]),
            conjunction! { "clf" => [&clf1, &clf2, &clf3, &clf4] },
        );

        let expected = vec![
            conjunction! { "clf" => [&clf1], "clf__kernel" => ["linear"], "sel__k" => [2, 3] },
            conjunction! {
                "clf" => [&clf3],
                "clf__kernel" => ["poly"],
                "clf__degree" => [2, 3],
                "sel__k" => [2, 3]
            },
            conjunction! { "clf" => [&clf2, &clf4], "sel__k" => [2, 3] },
        ];
        assert_eq!(build_grid(&pipe).unwrap().unwrap(), expected);
    }

    #[test]
    fn candidate_grids_are_not_shared() {
        let lr = set_grid(
            Estimator::new("LogisticRegression").into_node(),
            conjunction! { "C" => [1, 2, 3] },
        );
        let svc = svc();
        let pipe = set_grid(
            pipeline(vec![("root", lr.clone().into())]),
            conjunction! { "root" => [&lr, &svc] },
        );

        let grid = build_grid(&pipe).unwrap().unwrap();
        assert_eq!(grid.len(), 2);

        assert_eq!(grid[0]["root"], vec![Value::from(&lr)]);
        assert_eq!(grid[0]["root__C"], vec![Value::from(1), Value::from(2), Value::from(3)]);

        assert_eq!(grid[1]["root"], vec![Value::from(&svc)]);
        assert!(!grid[1].contains_key("root__C"));
    }

    #[test]
    fn current_value_grid_applies_only_without_explicit_candidates() {
        let lr = set_grid(
            Estimator::new("LogisticRegression").into_node(),
            conjunction! { "C" => [1, 2] },
        );
        let other = Estimator::new("SVC").into_node();
        let pipe = set_grid(
            pipeline(vec![("clf", lr.clone().into())]),
            vec![
                conjunction! { "clf" => [&other] },
                conjunction! { "memory" => ["cache"] },
            ],
        );

        let grid = build_grid(&pipe).unwrap().unwrap();
        assert_eq!(
            grid,
            vec![
                conjunction! { "clf" => [&other] },
                conjunction! { "memory" => ["cache"], "clf__C" => [1, 2] },
            ]
        );
    }

    #[test]
    fn plain_candidates_stay_together() {
        let node = set_grid(
            Estimator::new("Scaler").into_node(),
            conjunction! { "with_mean" => [true, false] },
        );
        let pipe = set_grid(
            pipeline(vec![("scale", Value::None)]),
            conjunction! { "scale" => [Value::None, Value::from(&node)] },
        );

        let grid = build_grid(&pipe).unwrap().unwrap();
        assert_eq!(
            grid,
            vec![
                conjunction! { "scale" => [&node], "scale__with_mean" => [true, false] },
                conjunction! { "scale" => [Value::None] },
            ]
        );
    }

    #[test]
    fn empty_candidate_list_is_rejected() {
        let node = set_grid(svc(), conjunction! { "C" => [] });
        match build_grid(&node) {
            Err(SgError::Grid(GridError::EmptyCandidates { path })) => assert_eq!(path, "C"),
            other => panic!("expected empty candidate error, got {other:?}"),
        }
    }

    /// A component whose only parameter points back at a node set after
    /// construction.
    #[derive(Debug, Default)]
    struct Loop {
        target: OnceLock<NodeRef>,
    }

    impl Component for Loop {
        fn type_name(&self) -> &str {
            "Loop"
        }

        fn params(&self) -> ParamMap {
            let mut params = ParamMap::new();
            if let Some(target) = self.target.get() {
                params.insert("next".to_string(), Value::from(target));
            }
            params
        }
    }

    #[test]
    fn cycles_are_detected() {
        let looping = Arc::new(Loop::default());
        let node = Node::new(SharedLoop(Arc::clone(&looping)));
        looping.target.set(Arc::clone(&node)).unwrap();

        match build_grid(&node) {
            Err(SgError::Grid(GridError::CycleDetected { path })) => assert_eq!(path, "next"),
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[derive(Debug)]
    struct SharedLoop(Arc<Loop>);

    impl Component for SharedLoop {
        fn type_name(&self) -> &str {
            self.0.type_name()
        }

        fn params(&self) -> ParamMap {
            self.0.params()
        }
    }

    #[test]
    fn shared_node_is_not_a_cycle() {
        let sel = set_grid(
            Estimator::new("SelectKBest").into_node(),
            conjunction! { "k" => [1, 2] },
        );
        let pipe = pipeline(vec![("a", sel.clone().into()), ("b", sel.into())]);

        let grid = build_grid(&pipe).unwrap().unwrap();
        assert_eq!(grid, vec![conjunction! { "a__k" => [1, 2], "b__k" => [1, 2] }]);
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut node = set_grid(
            Estimator::new("Leaf").into_node(),
            conjunction! { "k" => [1] },
        );
        for _ in 0..5 {
            node = Estimator::new("Wrapper").with_param("inner", node).into_node();
        }

        assert!(GridBuilder::new().with_max_depth(6).build(&node).is_ok());
        match GridBuilder::new().with_max_depth(5).build(&node) {
            Err(SgError::Grid(GridError::DepthExceeded { limit, .. })) => assert_eq!(limit, 5),
            other => panic!("expected depth error, got {other:?}"),
        }
    }
}
