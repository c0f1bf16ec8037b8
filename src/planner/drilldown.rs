//! Drilldown resolution.
//!
//! A drilldown names the level an axis breaks out on, or a named set that
//! supplies the axis members directly.

use log::debug;

use crate::engine::{Cube, LevelRef, NamedSet};
use crate::error::{QueryError, QueryResult};
use crate::mdx::Identifier;

/// What an axis is drilled on.
#[derive(Debug, Clone, PartialEq)]
pub enum DrilldownTarget {
    Level {
        level: LevelRef,
        /// e.g. `[Time].[Year]`
        unique_name: String,
        depth: usize,
    },
    NamedSet(NamedSet),
}

/// A resolved drilldown together with the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Drilldown {
    pub expression: String,
    pub target: DrilldownTarget,
}

impl Drilldown {
    /// The level the axis lands on: the drilled level or the set's anchor.
    pub fn level(&self) -> Option<&LevelRef> {
        match &self.target {
            DrilldownTarget::Level { level, .. } => Some(level),
            DrilldownTarget::NamedSet(set) => set.anchor.as_ref(),
        }
    }
}

/// Resolve one drilldown specification against a cube.
pub fn resolve_drilldown(cube: &Cube, expression: &str) -> QueryResult<Drilldown> {
    let expression = expression.trim();

    if let Some(set) = cube.named_set(expression) {
        debug!("drilldown {} is a named set", expression);
        return Ok(Drilldown {
            expression: expression.to_string(),
            target: DrilldownTarget::NamedSet(set.clone()),
        });
    }

    let invalid = |reason: String| QueryError::InvalidDrilldown {
        drilldown: expression.to_string(),
        reason,
    };

    let ident = Identifier::parse(expression).map_err(|e| invalid(e.to_string()))?;
    if ident.has_key_segment() {
        return Err(invalid(
            "drilldown must name a level, not a member key".to_string(),
        ));
    }

    let names = ident.names();
    let (dimension_name, hierarchy_name, level_name) = match names.as_slice() {
        [dimension] => (*dimension, None, None),
        [dimension, level] => (*dimension, None, Some(*level)),
        [dimension, hierarchy, level] => (*dimension, Some(*hierarchy), Some(*level)),
        _ => {
            return Err(invalid(format!(
                "expected at most 3 segments, got {}",
                names.len()
            )))
        }
    };

    let dimension = cube
        .dimension(dimension_name)
        .ok_or_else(|| QueryError::UnknownDimension {
            cube: cube.name.clone(),
            dimension: dimension_name.to_string(),
        })?;

    let hierarchy = match hierarchy_name {
        Some(name) => dimension.hierarchy(name).ok_or_else(|| {
            invalid(format!(
                "hierarchy `{}` does not exist in dimension {}",
                name, dimension.name
            ))
        })?,
        None => dimension
            .default_hierarchy()
            .ok_or_else(|| invalid(format!("dimension {} has no hierarchies", dimension.name)))?,
    };

    let level = match level_name {
        Some(name) => hierarchy.level(name).ok_or_else(|| {
            invalid(format!(
                "level `{}` does not exist in {}",
                name, hierarchy.unique_name
            ))
        })?,
        None => hierarchy
            .default_level()
            .ok_or_else(|| invalid(format!("hierarchy {} has no levels", hierarchy.name)))?,
    };

    Ok(Drilldown {
        expression: expression.to_string(),
        target: DrilldownTarget::Level {
            level: LevelRef::new(&dimension.name, &hierarchy.name, &level.name),
            unique_name: level.unique_name.clone(),
            depth: level.depth,
        },
    })
}
