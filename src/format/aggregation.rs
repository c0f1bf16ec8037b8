//! Aggregation JSON: the cell matrix with its axes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::describe::{dimension_info, DimensionInfo, MemberDescription};
use crate::engine::{measures_level, Cube};
use crate::result::CellResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisMembers {
    pub members: Vec<MemberDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationOutput {
    pub axes: Vec<AxisMembers>,
    pub axis_dimensions: Vec<Option<DimensionInfo>>,
    /// One nested array per axis, last axis outermost.
    pub values: serde_json::Value,
    /// Per axis, the nearest ancestor of each parent member, keyed by the
    /// parent's unique name. Present only when ancestors were fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis_parents: Option<Vec<BTreeMap<String, MemberDescription>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mdx: Option<String>,
}

pub fn aggregation(result: &CellResult, cube: &Cube) -> AggregationOutput {
    let axes = result
        .axes
        .iter()
        .map(|axis| AxisMembers {
            members: axis.members.iter().map(MemberDescription::from).collect(),
        })
        .collect();

    let axis_dimensions = result
        .axes
        .iter()
        .enumerate()
        .map(|(i, axis)| match axis.effective_level() {
            Some(level) => dimension_info(cube, level),
            None if i == 0 => dimension_info(cube, &measures_level()),
            None => None,
        })
        .collect();

    let has_parents = result.axes.iter().any(|a| !a.parents.is_empty());
    let axis_parents = has_parents.then(|| {
        result
            .axes
            .iter()
            .map(|axis| {
                axis.parents
                    .iter()
                    .filter_map(|(parent, chain)| {
                        chain
                            .first()
                            .map(|m| (parent.clone(), MemberDescription::from(m)))
                    })
                    .collect()
            })
            .collect()
    });

    AggregationOutput {
        axes,
        axis_dimensions,
        values: result.nested_values(),
        axis_parents,
        mdx: result.mdx.clone(),
    }
}
