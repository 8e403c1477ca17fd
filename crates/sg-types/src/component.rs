use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::grid::Grid;
use crate::value::Value;

/// Ordered mapping from parameter name to its current value.
pub type ParamMap = IndexMap<String, Value>;

/// Unique node identifier.
pub type NodeId = Uuid;

/// Shared handle to a configuration node. The same node may appear in
/// several places of a tree.
pub type NodeRef = Arc<Node>;

/// Capability of a configuration object that exposes named parameters.
pub trait Component: fmt::Debug + Send + Sync {
    /// Type identifier, e.g. "SelectKBest".
    fn type_name(&self) -> &str;

    /// The node's own parameters, in declaration order. Nested parameters
    /// of child nodes are not flattened in.
    fn params(&self) -> ParamMap;

    /// Whether this component can be fitted by a search driver.
    fn can_fit(&self) -> bool {
        true
    }
}

/// A configuration tree node: a component plus its grid annotation.
pub struct Node {
    id: NodeId,
    component: Box<dyn Component>,
    annotation: RwLock<Grid>,
}

impl Node {
    pub fn new<C: Component + 'static>(component: C) -> NodeRef {
        Arc::new(Self {
            id: Uuid::new_v4(),
            component: Box::new(component),
            annotation: RwLock::new(Grid::new()),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn component(&self) -> &dyn Component {
        self.component.as_ref()
    }

    pub fn type_name(&self) -> &str {
        self.component.type_name()
    }

    pub fn params(&self) -> ParamMap {
        self.component.params()
    }

    pub fn can_fit(&self) -> bool {
        self.component.can_fit()
    }

    /// Snapshot of the attached grid annotation (empty if none attached).
    pub fn annotation(&self) -> Grid {
        self.annotation.read().clone()
    }

    /// Replace the attached grid annotation.
    pub fn set_annotation(&self, grid: Grid) {
        *self.annotation.write() = grid;
    }

    pub fn has_annotation(&self) -> bool {
        !self.annotation.read().is_empty()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("type_name", &self.type_name())
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.type_name())?;
        for (i, (name, value)) in self.params().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            // Nested nodes are shown by type only to keep the output flat.
            match value {
                Value::Node(child) => write!(f, "{name}={}(...)", child.type_name())?,
                other => write!(f, "{name}={other}")?,
            }
        }
        write!(f, ")")
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("component", self.type_name())?;
        map.serialize_entry("params", &self.params())?;
        map.end()
    }
}

/// A generic leaf component: a type name plus ordered parameters.
#[derive(Debug, Clone)]
pub struct Estimator {
    name: String,
    params: ParamMap,
    fittable: bool,
}

impl Estimator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: ParamMap::new(),
            fittable: true,
        }
    }

    /// A parameter bag that is not itself fit-capable.
    pub fn config(name: impl Into<String>) -> Self {
        Self {
            fittable: false,
            ..Self::new(name)
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn into_node(self) -> NodeRef {
        Node::new(self)
    }
}

impl Component for Estimator {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> ParamMap {
        self.params.clone()
    }

    fn can_fit(&self) -> bool {
        self.fittable
    }
}
