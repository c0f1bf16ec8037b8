//! The tidy-data flattener.
//!
//! Turns a [`CellResult`] into one row per combination of drilldown axis
//! members. Each drilldown axis contributes an (ID, label) column pair for
//! its level, preceded by one pair per ancestor level when parents are
//! requested. Property columns follow, then one column per measure.

use serde::Serialize;

use crate::engine::{Cube, Member};
use crate::error::{QueryError, QueryResult};
use crate::planner::Pagination;

use super::properties::{CaptionOverrides, PropertySpec};
use super::value::Scalar;
use super::{CellResult, ResultAxis};

/// Flattening options.
#[derive(Debug, Clone, Default)]
pub struct TidyOptions {
    /// Emit ancestor (ID, label) pairs from the first real level down.
    pub parents: bool,
    /// Carry the query text into the output.
    pub debug: bool,
    pub properties: Vec<PropertySpec>,
    pub captions: CaptionOverrides,
    /// Drop rows whose measures are all null.
    pub sparse: bool,
    /// Offset and limit over the cross product of the drilldown axes,
    /// counted before sparse rows are dropped.
    pub window: Pagination,
}

/// Header plus rows; every row has exactly `header.len()` values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tidy {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Scalar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mdx: Option<String>,
}

/// Column layout of one drilldown axis.
struct AxisLayout<'a> {
    axis: &'a ResultAxis,
    /// Depths of the levels that get a column pair, root first. The last
    /// one is the axis level itself.
    depths: Vec<usize>,
}

/// Flatten a result into tidy rows.
pub fn tidy(result: &CellResult, cube: &Cube, options: &TidyOptions) -> QueryResult<Tidy> {
    let drilldown_axes = result.drilldown_axes();

    let mut header = Vec::new();
    let mut layouts = Vec::with_capacity(drilldown_axes.len());

    for (i, axis) in drilldown_axes.iter().enumerate() {
        let resolved = axis.effective_level().and_then(|l| cube.level(l));
        match resolved {
            Some(resolved) => {
                let first = if options.parents {
                    resolved.hierarchy.first_real_depth().min(resolved.depth())
                } else {
                    resolved.depth()
                };
                let depths: Vec<usize> = (first..=resolved.depth()).collect();
                for &depth in &depths {
                    let caption = resolved
                        .hierarchy
                        .level_at(depth)
                        .map(|l| l.caption.as_str())
                        .unwrap_or_default();
                    header.push(format!("ID {}", caption));
                    header.push(caption.to_string());
                }
                layouts.push(AxisLayout { axis, depths });
            }
            None => {
                header.push(format!("ID Axis {}", i + 1));
                header.push(format!("Axis {}", i + 1));
                let depth = axis.members.first().map(|m| m.depth).unwrap_or_default();
                layouts.push(AxisLayout {
                    axis,
                    depths: vec![depth],
                });
            }
        }
    }

    // Each property reads from the axis drilled on its hierarchy.
    let mut property_axes = Vec::with_capacity(options.properties.len());
    for spec in &options.properties {
        let position = drilldown_axes
            .iter()
            .position(|a| a.effective_level().is_some_and(|l| l.same_hierarchy(&spec.level)))
            .ok_or_else(|| QueryError::PropertyNotInDrilldown {
                dimension: spec.level.dimension.clone(),
            })?;
        property_axes.push(position);
        header.push(spec.column().to_string());
    }

    let measures = result.measures();
    header.extend(measures.iter().map(|m| m.caption.clone()));

    let lookup = result.lookup();
    let shape: Vec<usize> = drilldown_axes.iter().map(|a| a.members.len()).collect();
    let mut rows = Vec::new();

    for ordinals in options.window.rows(Odometer::new(shape)) {
        let mut coordinates = Vec::with_capacity(ordinals.len() + 1);
        coordinates.push(0);
        coordinates.extend(&ordinals);

        let values: Vec<Scalar> = (0..measures.len())
            .map(|m| {
                coordinates[0] = m;
                lookup.get(&coordinates).clone()
            })
            .collect();

        if options.sparse && !values.is_empty() && values.iter().all(Scalar::is_null) {
            continue;
        }

        let mut row = Vec::with_capacity(header.len());
        for (layout, &ordinal) in layouts.iter().zip(&ordinals) {
            let member = &layout.axis.members[ordinal];
            let ancestors = layout.axis.ancestors_of(member);
            for &depth in &layout.depths {
                match member_at_depth(member, ancestors, depth) {
                    Some(m) => {
                        row.push(m.key.clone());
                        row.push(options.captions.caption(m));
                    }
                    None => {
                        row.push(Scalar::Null);
                        row.push(Scalar::Null);
                    }
                }
            }
        }
        for (spec, &position) in options.properties.iter().zip(&property_axes) {
            let axis = &layouts[position].axis;
            let member = &axis.members[ordinals[position]];
            row.push(spec.value_for(member, axis.ancestors_of(member)));
        }
        row.extend(values);
        rows.push(row);
    }

    Ok(Tidy {
        header,
        rows,
        mdx: if options.debug { result.mdx.clone() } else { None },
    })
}

/// The member itself at the deepest column, ancestors above it.
fn member_at_depth<'a>(
    member: &'a Member,
    ancestors: &'a [Member],
    depth: usize,
) -> Option<&'a Member> {
    if member.depth == depth {
        return Some(member);
    }
    ancestors.iter().find(|a| a.depth == depth)
}

/// Iterates every index tuple of a shape, first position slowest.
/// An empty shape yields one empty tuple; any zero extent yields nothing.
struct Odometer {
    shape: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl Odometer {
    fn new(shape: Vec<usize>) -> Self {
        let next = (!shape.contains(&0)).then(|| vec![0; shape.len()]);
        Self { shape, next }
    }
}

impl Iterator for Odometer {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        let mut following = current.clone();
        for pos in (0..following.len()).rev() {
            following[pos] += 1;
            if following[pos] < self.shape[pos] {
                self.next = Some(following);
                break;
            }
            following[pos] = 0;
        }
        Some(current)
    }
}

impl Tidy {
    /// Column index by name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
