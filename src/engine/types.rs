//! Cube metadata as exposed by the analytical engine.
//!
//! These types are read-only snapshots. An engine adapter builds them once
//! per cube and the session caches them; nothing in the compiler mutates
//! them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mdx::ident::quote_name;
use crate::result::Scalar;

/// Dimension type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionType {
    #[default]
    Standard,
    Time,
    Measures,
}

/// A cube: dimensions, measures and named sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cube {
    pub name: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Non-measure dimensions, in declaration order.
    pub dimensions: Vec<Dimension>,
    pub measures: Vec<Measure>,
    #[serde(default)]
    pub named_sets: Vec<NamedSet>,
}

/// A measure of the cube.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub name: String,
    #[serde(default)]
    pub caption: String,
    /// Unique name, e.g. `[Measures].[Unit Sales]`.
    #[serde(default)]
    pub full_name: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default, rename = "type")]
    pub dimension_type: DimensionType,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    pub hierarchies: Vec<Hierarchy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hierarchy {
    pub name: String,
    /// Unique name, e.g. `[Time]` or `[Time].[Weekly]`.
    #[serde(default)]
    pub unique_name: String,
    /// Whether the first level is the synthetic "(All)" level.
    pub has_all: bool,
    #[serde(default)]
    pub all_member_name: Option<String>,
    /// Levels, root first.
    pub levels: Vec<Level>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    /// Unique name, e.g. `[Product].[Product Family]`.
    #[serde(default)]
    pub unique_name: String,
    #[serde(default)]
    pub caption: String,
    /// Depth within the hierarchy, 0 being the root level.
    #[serde(default)]
    pub depth: usize,
    /// Declared member property names.
    #[serde(default)]
    pub properties: Vec<String>,
}

/// An engine-defined set usable as a drilldown or cut target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSet {
    pub name: String,
    /// The level the set logically belongs to, when the engine knows it.
    #[serde(default)]
    pub anchor: Option<LevelRef>,
}

/// Identifies a level by its (dimension, hierarchy, level) names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelRef {
    pub dimension: String,
    pub hierarchy: String,
    pub level: String,
}

impl LevelRef {
    pub fn new(
        dimension: impl Into<String>,
        hierarchy: impl Into<String>,
        level: impl Into<String>,
    ) -> Self {
        Self {
            dimension: dimension.into(),
            hierarchy: hierarchy.into(),
            level: level.into(),
        }
    }

    /// True when both levels belong to the same hierarchy.
    pub fn same_hierarchy(&self, other: &LevelRef) -> bool {
        self.dimension == other.dimension && self.hierarchy == other.hierarchy
    }
}

/// A member of a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    /// Unique name, e.g. `[Product].[Drink]`.
    pub full_name: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub key: Scalar,
    pub depth: usize,
    #[serde(default)]
    pub all_member: bool,
    #[serde(default)]
    pub drillable: bool,
    #[serde(default)]
    pub num_children: usize,
    /// Unique name of the parent member, `None` at the hierarchy root.
    #[serde(default)]
    pub parent_name: Option<String>,
    pub level: LevelRef,
    /// Property values, by property name.
    #[serde(default)]
    pub properties: BTreeMap<String, Scalar>,
}

impl Member {
    pub fn property(&self, name: &str) -> Option<&Scalar> {
        self.properties.get(name)
    }
}

/// A level together with the hierarchy and dimension that own it.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedLevel<'a> {
    pub dimension: &'a Dimension,
    pub hierarchy: &'a Hierarchy,
    pub level: &'a Level,
}

impl<'a> ResolvedLevel<'a> {
    pub fn level_ref(&self) -> LevelRef {
        LevelRef::new(
            &self.dimension.name,
            &self.hierarchy.name,
            &self.level.name,
        )
    }

    pub fn unique_name(&self) -> &'a str {
        &self.level.unique_name
    }

    pub fn depth(&self) -> usize {
        self.level.depth
    }
}

fn default_true() -> bool {
    true
}

impl Cube {
    /// Look up a non-measure dimension by name.
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions
            .iter()
            .find(|d| d.dimension_type != DimensionType::Measures && d.name == name)
    }

    pub fn measure(&self, name: &str) -> Option<&Measure> {
        self.measures.iter().find(|m| m.name == name)
    }

    /// The measure used when a request names none.
    pub fn default_measure(&self) -> Option<&Measure> {
        self.measures.first()
    }

    pub fn named_set(&self, name: &str) -> Option<&NamedSet> {
        self.named_sets.iter().find(|s| s.name == name)
    }

    /// Resolve a level reference against this cube.
    pub fn level(&self, level: &LevelRef) -> Option<ResolvedLevel<'_>> {
        let dimension = self.dimension(&level.dimension)?;
        let hierarchy = dimension.hierarchy(&level.hierarchy)?;
        let lvl = hierarchy.level(&level.level)?;
        Some(ResolvedLevel {
            dimension,
            hierarchy,
            level: lvl,
        })
    }

    /// Fill in unique names, depths and captions that an engine or a
    /// catalog file left out.
    pub fn normalize(&mut self) {
        for measure in &mut self.measures {
            if measure.caption.is_empty() {
                measure.caption = measure.name.clone();
            }
            if measure.full_name.is_empty() {
                measure.full_name = format!("[Measures].{}", quote_name(&measure.name));
            }
        }

        for dimension in &mut self.dimensions {
            if dimension.caption.is_empty() {
                dimension.caption = dimension.name.clone();
            }
            for hierarchy in &mut dimension.hierarchies {
                if hierarchy.unique_name.is_empty() {
                    hierarchy.unique_name = if hierarchy.name == dimension.name {
                        quote_name(&dimension.name)
                    } else {
                        format!(
                            "{}.{}",
                            quote_name(&dimension.name),
                            quote_name(&hierarchy.name)
                        )
                    };
                }
                for (depth, level) in hierarchy.levels.iter_mut().enumerate() {
                    level.depth = depth;
                    if level.caption.is_empty() {
                        level.caption = level.name.clone();
                    }
                    if level.unique_name.is_empty() {
                        level.unique_name =
                            format!("{}.{}", hierarchy.unique_name, quote_name(&level.name));
                    }
                }
            }
        }
    }
}

impl Dimension {
    pub fn hierarchy(&self, name: &str) -> Option<&Hierarchy> {
        self.hierarchies.iter().find(|h| h.name == name)
    }

    /// The first declared hierarchy.
    pub fn default_hierarchy(&self) -> Option<&Hierarchy> {
        self.hierarchies.first()
    }
}

impl Hierarchy {
    pub fn level(&self, name: &str) -> Option<&Level> {
        self.levels.iter().find(|l| l.name == name)
    }

    /// Depth of the first level that is not the synthetic "(All)" level.
    pub fn first_real_depth(&self) -> usize {
        usize::from(self.has_all)
    }

    /// The level a bare dimension drilldown lands on.
    pub fn default_level(&self) -> Option<&Level> {
        self.levels
            .get(self.first_real_depth())
            .or_else(|| self.levels.first())
    }

    pub fn level_at(&self, depth: usize) -> Option<&Level> {
        self.levels.get(depth)
    }
}
