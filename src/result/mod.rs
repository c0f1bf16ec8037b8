//! Query results and their flattening.
//!
//! - [`value`] - Scalar cell/key/property values
//! - [`properties`] - Property and caption-override specifications
//! - [`tidy`] - The tidy-data flattener
//!
//! A [`CellResult`] is what the engine hands back for one executed query:
//! one member list per axis (axis 0 holds the measures) plus the cell
//! values, either as a dense matrix or as explicitly addressed cells.

pub mod properties;
pub mod tidy;
pub mod value;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::engine::{LevelRef, Member};

pub use properties::{parse_caption_properties, parse_properties, CaptionOverrides, PropertySpec};
pub use tidy::{tidy, Tidy, TidyOptions};
pub use value::Scalar;

/// The cells and axis members of one executed query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellResult {
    /// Axis 0 is the measures axis; drilldown axes follow in order.
    pub axes: Vec<ResultAxis>,
    pub cells: CellData,
    /// The query that produced this result, when debugging was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mdx: Option<String>,
}

/// Members of one axis, in the order the engine returned them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultAxis {
    pub members: Vec<Member>,
    /// The level the axis was drilled on. Filled from the compiled query
    /// when the engine leaves it out.
    #[serde(default)]
    pub level: Option<LevelRef>,
    /// Ancestor chains, nearest parent first, keyed by parent unique name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parents: BTreeMap<String, Vec<Member>>,
}

impl ResultAxis {
    pub fn new(members: Vec<Member>) -> Self {
        Self {
            members,
            level: None,
            parents: BTreeMap::new(),
        }
    }

    /// The axis level, falling back to the level of its first member.
    pub fn effective_level(&self) -> Option<&LevelRef> {
        self.level
            .as_ref()
            .or_else(|| self.members.first().map(|m| &m.level))
    }

    /// The ancestors of a member, nearest parent first. Empty when parents
    /// were not fetched or the member is a root.
    pub fn ancestors_of(&self, member: &Member) -> &[Member] {
        member
            .parent_name
            .as_ref()
            .and_then(|p| self.parents.get(p))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Cell values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellData {
    /// Row-major over the axes with axis 0 varying fastest.
    Dense(Vec<Scalar>),
    /// Only the cells the engine reported, addressed by member ordinal on
    /// each axis. Absent cells are null.
    Keyed(Vec<KeyedCell>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedCell {
    pub coordinates: Vec<usize>,
    pub value: Scalar,
}

/// Random access into a result's cells.
pub enum CellLookup<'a> {
    Dense {
        values: &'a [Scalar],
        strides: Vec<usize>,
    },
    Keyed(HashMap<&'a [usize], &'a Scalar>),
}

impl CellLookup<'_> {
    /// The value at the given per-axis ordinals; null when absent.
    pub fn get(&self, coordinates: &[usize]) -> &Scalar {
        const NULL: &Scalar = &Scalar::Null;
        match self {
            CellLookup::Dense { values, strides } => {
                let offset: usize = coordinates
                    .iter()
                    .zip(strides)
                    .map(|(ordinal, stride)| ordinal * stride)
                    .sum();
                values.get(offset).unwrap_or(NULL)
            }
            CellLookup::Keyed(cells) => cells.get(coordinates).copied().unwrap_or(NULL),
        }
    }
}

impl CellResult {
    /// Number of members on each axis.
    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(|a| a.members.len()).collect()
    }

    pub fn lookup(&self) -> CellLookup<'_> {
        match &self.cells {
            CellData::Dense(values) => {
                let mut strides = Vec::with_capacity(self.axes.len());
                let mut stride = 1;
                for axis in &self.axes {
                    strides.push(stride);
                    stride *= axis.members.len();
                }
                CellLookup::Dense { values, strides }
            }
            CellData::Keyed(cells) => CellLookup::Keyed(
                cells
                    .iter()
                    .map(|c| (c.coordinates.as_slice(), &c.value))
                    .collect(),
            ),
        }
    }

    /// Cell values nested one array per axis, last axis outermost.
    pub fn nested_values(&self) -> serde_json::Value {
        let lookup = self.lookup();
        let shape = self.shape();
        let mut coordinates = vec![0; shape.len()];
        nest(&lookup, &shape, shape.len(), &mut coordinates)
    }

    /// Drilldown axes, skipping the measures axis.
    pub fn drilldown_axes(&self) -> &[ResultAxis] {
        self.axes.get(1..).unwrap_or(&[])
    }

    pub fn measures(&self) -> &[Member] {
        self.axes
            .first()
            .map(|a| a.members.as_slice())
            .unwrap_or(&[])
    }
}

fn nest(
    lookup: &CellLookup<'_>,
    shape: &[usize],
    remaining: usize,
    coordinates: &mut [usize],
) -> serde_json::Value {
    if remaining == 0 {
        return serde_json::to_value(lookup.get(coordinates)).unwrap_or(serde_json::Value::Null);
    }
    let axis = remaining - 1;
    let items = (0..shape[axis])
        .map(|ordinal| {
            coordinates[axis] = ordinal;
            nest(lookup, shape, axis, coordinates)
        })
        .collect();
    serde_json::Value::Array(items)
}
