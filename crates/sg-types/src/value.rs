use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::component::{Node, NodeRef};

/// A parameter value: the no-op sentinel, a plain value, or a nested node.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Plain(serde_json::Value),
    Node(NodeRef),
}

impl Value {
    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    /// True for the no-op sentinel, including a plain JSON `null`.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None | Value::Plain(serde_json::Value::Null))
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Value::Node(_))
    }

    /// Lowercase type identifier, used when deriving step names.
    pub fn type_identity(&self) -> String {
        match self {
            Value::None => "nonetype".to_string(),
            Value::Node(node) => node.type_name().to_lowercase(),
            Value::Plain(plain) => match plain {
                serde_json::Value::Null => "nonetype",
                serde_json::Value::Bool(_) => "bool",
                serde_json::Value::Number(n) if n.is_f64() => "float",
                serde_json::Value::Number(_) => "int",
                serde_json::Value::String(_) => "str",
                serde_json::Value::Array(_) => "list",
                serde_json::Value::Object(_) => "dict",
            }
            .to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (a, b) if a.is_none() || b.is_none() => a.is_none() && b.is_none(),
            (Value::Plain(a), Value::Plain(b)) => a == b,
            // Nodes are shared handles; two nodes are the same value only if
            // they are the same instance.
            (Value::Node(a), Value::Node(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Plain(v) => write!(f, "{v}"),
            Value::Node(node) => write!(f, "{node}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::None => serializer.serialize_none(),
            Value::Plain(v) => v.serialize(serializer),
            Value::Node(node) => Node::serialize(node, serializer),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::None,
            other => Value::Plain(other),
        }
    }
}

impl From<NodeRef> for Value {
    fn from(node: NodeRef) -> Self {
        Value::Node(node)
    }
}

impl From<&NodeRef> for Value {
    fn from(node: &NodeRef) -> Self {
        Value::Node(Arc::clone(node))
    }
}

impl From<Option<NodeRef>> for Value {
    fn from(node: Option<NodeRef>) -> Self {
        node.map_or(Value::None, Value::Node)
    }
}

macro_rules! plain_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::from(serde_json::Value::from(value))
                }
            }
        )*
    };
}

plain_from!(bool, i32, i64, u32, u64, f64, &str, String);
