//! Composite nodes whose steps may hold alternatives.

use serde::{Deserialize, Serialize};
use sg_types::{invalid_config, Component, Node, NodeRef, ParamMap, SgResult, Value};
use std::fmt;

use crate::annotate::attach;
use crate::namer::{name_slots, NamedSteps, Slot};

/// How a composite combines its steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositeKind {
    /// Steps are chained, each feeding the next.
    Pipeline,
    /// Steps run side by side and their outputs are concatenated.
    FeatureUnion,
    /// Each step transforms its own subset of input columns.
    ColumnTransformer,
}

impl CompositeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            CompositeKind::Pipeline => "Pipeline",
            CompositeKind::FeatureUnion => "FeatureUnion",
            CompositeKind::ColumnTransformer => "ColumnTransformer",
        }
    }
}

impl fmt::Display for CompositeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A composite of named steps plus auxiliary options such as `memory`.
///
/// Its parameters are the steps in order, followed by the options. An
/// option never replaces a step of the same name.
#[derive(Debug, Clone)]
pub struct Pipeline {
    kind: CompositeKind,
    steps: Vec<(String, Value)>,
    options: ParamMap,
}

impl Pipeline {
    pub fn new(steps: Vec<(String, Value)>) -> Self {
        Self {
            kind: CompositeKind::Pipeline,
            steps,
            options: ParamMap::new(),
        }
    }

    pub fn union(steps: Vec<(String, Value)>) -> Self {
        Self {
            kind: CompositeKind::FeatureUnion,
            ..Self::new(steps)
        }
    }

    pub fn column_transformer(steps: Vec<(String, Value)>) -> Self {
        Self {
            kind: CompositeKind::ColumnTransformer,
            ..Self::new(steps)
        }
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    pub fn with_options(mut self, options: ParamMap) -> Self {
        self.options.extend(options);
        self
    }

    pub fn kind(&self) -> CompositeKind {
        self.kind
    }

    pub fn steps(&self) -> &[(String, Value)] {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&Value> {
        self.steps
            .iter()
            .find(|(step, _)| step == name)
            .map(|(_, value)| value)
    }

    pub fn options(&self) -> &ParamMap {
        &self.options
    }
}

impl Component for Pipeline {
    fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    fn params(&self) -> ParamMap {
        let mut params: ParamMap = self.steps.iter().cloned().collect();
        for (name, value) in &self.options {
            params.entry(name.clone()).or_insert_with(|| value.clone());
        }
        params
    }
}

/// A transformer applied to a fixed set of columns: one column-transformer
/// step. Named after its transformer when steps are named from types.
#[derive(Debug, Clone)]
pub struct ColumnSelection {
    transformer: NodeRef,
    columns: Vec<String>,
}

impl ColumnSelection {
    pub fn new<I, S>(transformer: &NodeRef, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            transformer: NodeRef::clone(transformer),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn transformer(&self) -> &NodeRef {
        &self.transformer
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn into_node(self) -> NodeRef {
        Node::new(self)
    }
}

impl Component for ColumnSelection {
    fn type_name(&self) -> &str {
        self.transformer.type_name()
    }

    fn params(&self) -> ParamMap {
        let mut params = ParamMap::new();
        params.insert("transformer".to_string(), Value::from(&self.transformer));
        params.insert("columns".to_string(), Value::from(serde_json::json!(self.columns)));
        params
    }
}

fn make_composite<I>(kind: CompositeKind, slots: I, options: ParamMap) -> SgResult<NodeRef>
where
    I: IntoIterator,
    I::Item: Into<Slot>,
{
    let NamedSteps { steps, grid } = name_slots(slots);
    if let Some((name, _)) = steps.iter().find(|(name, _)| options.contains_key(name)) {
        return Err(invalid_config!(
            "{kind} step {name} clashes with an option of the same name"
        ));
    }

    let pipeline = Pipeline {
        kind,
        steps,
        options,
    };
    let node = Node::new(pipeline);
    if !grid.is_empty() {
        attach(&node, grid);
    }
    Ok(node)
}

/// Build a pipeline whose steps are named from their types. Slots with
/// alternatives are searched over via the pipeline's grid annotation.
pub fn make_pipeline<I>(slots: I, options: ParamMap) -> SgResult<NodeRef>
where
    I: IntoIterator,
    I::Item: Into<Slot>,
{
    make_composite(CompositeKind::Pipeline, slots, options)
}

/// Feature-union counterpart of [`make_pipeline`].
pub fn make_union<I>(slots: I, options: ParamMap) -> SgResult<NodeRef>
where
    I: IntoIterator,
    I::Item: Into<Slot>,
{
    make_composite(CompositeKind::FeatureUnion, slots, options)
}

/// Column-transformer counterpart of [`make_pipeline`]. Candidates are
/// usually [`ColumnSelection`] nodes or `None`.
pub fn make_column_transformer<I>(slots: I, options: ParamMap) -> SgResult<NodeRef>
where
    I: IntoIterator,
    I::Item: Into<Slot>,
{
    make_composite(CompositeKind::ColumnTransformer, slots, options)
}
