use indexmap::IndexMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::value::Value;

/// Ordered list of values to try for one parameter.
pub type Candidates = Vec<Value>;

/// Parameters varied jointly: the cross product of every candidate list.
pub type Conjunction = IndexMap<String, Candidates>;

/// A disjunction of conjunctions; the search space is their union.
pub type Grid = Vec<Conjunction>;

/// One concrete assignment of a value to every parameter path.
pub type ParamPoint = IndexMap<String, Value>;

/// A grid declaration as written by a caller: one mapping or a list of them.
#[derive(Debug, Clone, PartialEq)]
pub enum GridSpec {
    One(Conjunction),
    Many(Grid),
}

impl GridSpec {
    /// Normalise to the disjunct-sequence form.
    pub fn into_grid(self) -> Grid {
        match self {
            GridSpec::One(conjunction) => vec![conjunction],
            GridSpec::Many(grid) => grid,
        }
    }
}

impl From<Conjunction> for GridSpec {
    fn from(conjunction: Conjunction) -> Self {
        GridSpec::One(conjunction)
    }
}

impl From<Grid> for GridSpec {
    fn from(grid: Grid) -> Self {
        GridSpec::Many(grid)
    }
}

/// Caller-facing grid: nothing to search, one bare conjunction, or a list.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExpandedGrid {
    #[default]
    Empty,
    Single(Conjunction),
    Disjunction(Grid),
}

impl ExpandedGrid {
    /// Flatten a built grid: `None` becomes `Empty`, a single disjunct is
    /// unwrapped, anything longer is kept as a list.
    pub fn from_disjuncts(grid: Option<Grid>) -> Self {
        match grid {
            None => ExpandedGrid::Empty,
            Some(mut grid) if grid.len() == 1 => match grid.pop() {
                Some(conjunction) if conjunction.is_empty() => ExpandedGrid::Empty,
                Some(conjunction) => ExpandedGrid::Single(conjunction),
                None => ExpandedGrid::Empty,
            },
            Some(grid) => ExpandedGrid::Disjunction(grid),
        }
    }

    pub fn conjunctions(&self) -> &[Conjunction] {
        match self {
            ExpandedGrid::Empty => &[],
            ExpandedGrid::Single(conjunction) => std::slice::from_ref(conjunction),
            ExpandedGrid::Disjunction(grid) => grid,
        }
    }

    pub fn into_grid(self) -> Grid {
        match self {
            ExpandedGrid::Empty => Grid::new(),
            ExpandedGrid::Single(conjunction) => vec![conjunction],
            ExpandedGrid::Disjunction(grid) => grid,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ExpandedGrid::Empty)
    }

    /// Number of disjuncts.
    pub fn len(&self) -> usize {
        self.conjunctions().len()
    }

    /// Total number of parameter points, or `None` on overflow. An empty
    /// grid still yields the single point that keeps every default.
    pub fn grid_size(&self) -> Option<usize> {
        if self.is_empty() {
            return Some(1);
        }
        let mut total: usize = 0;
        for conjunction in self.conjunctions() {
            let mut points: usize = 1;
            for candidates in conjunction.values() {
                points = points.checked_mul(candidates.len())?;
            }
            total = total.checked_add(points)?;
        }
        Some(total)
    }
}

impl Serialize for ExpandedGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExpandedGrid::Empty => serializer.serialize_map(Some(0))?.end(),
            ExpandedGrid::Single(conjunction) => conjunction.serialize(serializer),
            ExpandedGrid::Disjunction(grid) => grid.serialize(serializer),
        }
    }
}

/// Build a [`Conjunction`] from literal candidate lists.
///
/// ```
/// use sg_types::{conjunction, Value};
///
/// let c = conjunction! { "C" => [1, 2], "kernel" => ["linear"] };
/// assert_eq!(c["C"], vec![Value::from(1), Value::from(2)]);
/// ```
#[macro_export]
macro_rules! conjunction {
    () => {
        $crate::Conjunction::new()
    };
    ($($key:expr => [$($value:expr),* $(,)?]),+ $(,)?) => {{
        let mut conjunction = $crate::Conjunction::new();
        $(
            conjunction.insert(
                ::std::string::String::from($key),
                vec![$($crate::Value::from($value)),*],
            );
        )+
        conjunction
    }};
}
