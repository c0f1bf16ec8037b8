//! In-memory engine over a JSON catalog.
//!
//! A catalog file holds cube metadata, member trees per hierarchy and a
//! list of recorded query results. Member expressions resolve with the
//! usual MDX name rules; `execute` answers only queries whose text was
//! recorded, which makes the catalog a deterministic stand-in for a live
//! engine.
//!
//! ```json
//! {
//!   "cubes": [{
//!     "name": "Sales",
//!     "dimensions": [...],
//!     "measures": [{"name": "Unit Sales"}],
//!     "members": [{"dimension": "Time", "members": [{"name": "1997", "key": 1997}]}]
//!   }],
//!   "results": [{
//!     "cube": "Sales",
//!     "mdx": "SELECT {[Measures].[Unit Sales]} ON COLUMNS\nFROM [Sales]",
//!     "axes": [["[Measures].[Unit Sales]"]],
//!     "cells": {"dense": [266773.0]}
//!   }]
//! }
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use super::error::{EngineError, EngineResult};
use super::provider::Engine;
use super::types::{Cube, Hierarchy, LevelRef, Member};
use crate::mdx::ident::{quote_name, Identifier, Segment};
use crate::result::{CellData, CellResult, ResultAxis, Scalar};

/// Level reference used for members of the measures axis.
pub fn measures_level() -> LevelRef {
    LevelRef::new("Measures", "Measures", "MeasuresLevel")
}

fn measure_member(name: &str, full_name: &str, caption: &str) -> Member {
    Member {
        name: name.to_string(),
        full_name: full_name.to_string(),
        caption: caption.to_string(),
        key: Scalar::Text(name.to_string()),
        depth: 0,
        all_member: false,
        drillable: false,
        num_children: 0,
        parent_name: None,
        level: measures_level(),
        properties: BTreeMap::new(),
    }
}

// ============================================================================
// File format
// ============================================================================

#[derive(Debug, Deserialize)]
struct CatalogFile {
    cubes: Vec<CatalogCube>,
    #[serde(default)]
    results: Vec<RecordedResult>,
}

#[derive(Debug, Deserialize)]
struct CatalogCube {
    #[serde(flatten)]
    cube: Cube,
    #[serde(default)]
    members: Vec<MemberTree>,
}

/// Members of one hierarchy. The "All" member is synthesized.
#[derive(Debug, Deserialize)]
struct MemberTree {
    dimension: String,
    #[serde(default)]
    hierarchy: Option<String>,
    members: Vec<MemberNode>,
}

#[derive(Debug, Deserialize)]
struct MemberNode {
    name: String,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    key: Scalar,
    #[serde(default)]
    properties: BTreeMap<String, Scalar>,
    #[serde(default)]
    children: Vec<MemberNode>,
}

#[derive(Debug, Deserialize)]
struct RecordedResult {
    cube: String,
    mdx: String,
    /// Member unique names, one list per axis.
    axes: Vec<Vec<String>>,
    cells: CellData,
}

// ============================================================================
// Loaded catalog
// ============================================================================

struct HierarchyMembers {
    dimension: String,
    hierarchy: String,
    all_member: Option<usize>,
    /// First real level members, in declaration order.
    roots: Vec<usize>,
}

struct CubeCatalog {
    cube: Cube,
    members: Vec<Member>,
    children: Vec<Vec<usize>>,
    by_full_name: HashMap<String, usize>,
    hierarchies: Vec<HierarchyMembers>,
}

/// `Engine` backed by a catalog loaded into memory.
pub struct CatalogEngine {
    cubes: Vec<CubeCatalog>,
    results: Vec<(String, String, CellResult)>,
}

impl CatalogEngine {
    /// Load a catalog from a JSON file.
    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Catalog(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        let file: CatalogFile =
            serde_json::from_str(json).map_err(|e| EngineError::Catalog(e.to_string()))?;

        let cubes = file
            .cubes
            .into_iter()
            .map(CubeCatalog::build)
            .collect::<EngineResult<Vec<_>>>()?;

        let mut engine = Self {
            cubes,
            results: Vec::new(),
        };
        for recorded in file.results {
            let result = engine.materialize(&recorded)?;
            engine
                .results
                .push((recorded.cube, recorded.mdx.trim().to_string(), result));
        }
        Ok(engine)
    }

    fn catalog(&self, cube: &str) -> Option<&CubeCatalog> {
        self.cubes.iter().find(|c| c.cube.name == cube)
    }

    /// Turn a recorded result's member names into full axis members.
    fn materialize(&self, recorded: &RecordedResult) -> EngineResult<CellResult> {
        let catalog = self.catalog(&recorded.cube).ok_or_else(|| {
            EngineError::Catalog(format!("recorded result for unknown cube {}", recorded.cube))
        })?;

        let axes = recorded
            .axes
            .iter()
            .map(|names| {
                names
                    .iter()
                    .map(|name| {
                        catalog.axis_member(name).ok_or_else(|| {
                            EngineError::Catalog(format!(
                                "recorded result references unknown member {}",
                                name
                            ))
                        })
                    })
                    .collect::<EngineResult<Vec<_>>>()
                    .map(ResultAxis::new)
            })
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(CellResult {
            axes,
            cells: recorded.cells.clone(),
            mdx: None,
        })
    }
}

impl CubeCatalog {
    fn build(source: CatalogCube) -> EngineResult<Self> {
        let mut cube = source.cube;
        cube.normalize();

        let mut catalog = Self {
            cube,
            members: Vec::new(),
            children: Vec::new(),
            by_full_name: HashMap::new(),
            hierarchies: Vec::new(),
        };

        for tree in source.members {
            catalog.add_tree(tree)?;
        }
        Ok(catalog)
    }

    fn add_tree(&mut self, tree: MemberTree) -> EngineResult<()> {
        let dimension = self.cube.dimension(&tree.dimension).ok_or_else(|| {
            EngineError::Catalog(format!(
                "members given for unknown dimension {}",
                tree.dimension
            ))
        })?;
        let hierarchy = match &tree.hierarchy {
            Some(name) => dimension.hierarchy(name),
            None => dimension.default_hierarchy(),
        }
        .ok_or_else(|| {
            EngineError::Catalog(format!(
                "members given for unknown hierarchy in {}",
                tree.dimension
            ))
        })?
        .clone();

        let mut entry = HierarchyMembers {
            dimension: dimension.name.clone(),
            hierarchy: hierarchy.name.clone(),
            all_member: None,
            roots: Vec::new(),
        };

        if hierarchy.has_all {
            let name = hierarchy
                .all_member_name
                .clone()
                .unwrap_or_else(|| format!("All {}s", hierarchy.name));
            let level = hierarchy.levels.first().ok_or_else(|| {
                EngineError::Catalog(format!("hierarchy {} has no levels", hierarchy.name))
            })?;
            let all = Member {
                full_name: format!("{}.{}", hierarchy.unique_name, quote_name(&name)),
                caption: name.clone(),
                key: Scalar::Text(name.clone()),
                depth: 0,
                all_member: true,
                drillable: !tree.members.is_empty(),
                num_children: tree.members.len(),
                parent_name: None,
                level: LevelRef::new(&entry.dimension, &entry.hierarchy, &level.name),
                properties: BTreeMap::new(),
                name,
            };
            entry.all_member = Some(self.push(all, None));
        }

        for node in tree.members {
            let idx = self.add_node(&hierarchy, &entry, node, entry.all_member)?;
            entry.roots.push(idx);
        }

        self.hierarchies.push(entry);
        Ok(())
    }

    fn add_node(
        &mut self,
        hierarchy: &Hierarchy,
        entry: &HierarchyMembers,
        node: MemberNode,
        parent: Option<usize>,
    ) -> EngineResult<usize> {
        let depth = parent.map_or(hierarchy.first_real_depth(), |p| self.members[p].depth + 1);
        let level = hierarchy.level_at(depth).ok_or_else(|| {
            EngineError::Catalog(format!(
                "member {} is deeper than the levels of {}",
                node.name, hierarchy.name
            ))
        })?;

        let full_name = match parent {
            Some(p) if !self.members[p].all_member => {
                format!("{}.{}", self.members[p].full_name, quote_name(&node.name))
            }
            _ => format!("{}.{}", hierarchy.unique_name, quote_name(&node.name)),
        };

        let member = Member {
            caption: node.caption.unwrap_or_else(|| node.name.clone()),
            key: if node.key.is_null() {
                Scalar::Text(node.name.clone())
            } else {
                node.key
            },
            depth,
            all_member: false,
            drillable: !node.children.is_empty(),
            num_children: node.children.len(),
            parent_name: parent.map(|p| self.members[p].full_name.clone()),
            level: LevelRef::new(&entry.dimension, &entry.hierarchy, &level.name),
            properties: node.properties,
            full_name,
            name: node.name,
        };
        let idx = self.push(member, parent);

        for child in node.children {
            self.add_node(hierarchy, entry, child, Some(idx))?;
        }
        Ok(idx)
    }

    fn push(&mut self, member: Member, parent: Option<usize>) -> usize {
        let idx = self.members.len();
        self.by_full_name.insert(member.full_name.clone(), idx);
        self.members.push(member);
        self.children.push(Vec::new());
        if let Some(p) = parent {
            self.children[p].push(idx);
        }
        idx
    }

    fn hierarchy_members(&self, dimension: &str, hierarchy: &str) -> Option<&HierarchyMembers> {
        self.hierarchies
            .iter()
            .find(|h| h.dimension == dimension && h.hierarchy == hierarchy)
    }

    /// A member of a result axis: a measure, a calculated measure defined
    /// by the query, or a dimension member.
    fn axis_member(&self, unique_name: &str) -> Option<Member> {
        if let Some(measure) = self
            .cube
            .measures
            .iter()
            .find(|m| m.full_name == unique_name)
        {
            return Some(measure_member(&measure.name, &measure.full_name, &measure.caption));
        }
        if let Some(idx) = self.by_full_name.get(unique_name) {
            return Some(self.members[*idx].clone());
        }
        let name = unique_name
            .strip_prefix("[Measures].[")
            .and_then(|rest| rest.strip_suffix(']'))?
            .replace("]]", "]");
        Some(measure_member(&name, unique_name, &name))
    }

    /// Resolve a member expression.
    fn resolve(&self, expression: &str) -> Option<usize> {
        if let Some(&idx) = self.by_full_name.get(expression) {
            return Some(idx);
        }

        let ident = Identifier::parse(expression).ok()?;
        let (first, rest) = ident.segments.split_first()?;
        let dimension = self.cube.dimension(&first.name)?;

        // `Dim.Hierarchy.…` first, then the default hierarchy.
        if let Some((second, tail)) = rest.split_first() {
            if let Some(hierarchy) = dimension.hierarchy(&second.name) {
                if let Some(idx) = self.resolve_in(hierarchy, &dimension.name, tail) {
                    return Some(idx);
                }
            }
        }
        let hierarchy = dimension.default_hierarchy()?;
        self.resolve_in(hierarchy, &dimension.name, rest)
    }

    fn resolve_in(&self, hierarchy: &Hierarchy, dimension: &str, path: &[Segment]) -> Option<usize> {
        let entry = self.hierarchy_members(dimension, &hierarchy.name)?;
        let (head, tail) = path.split_first()?;

        // `Level.Name` or `Level.&Key`
        if let [target] = tail {
            if let Some(level) = hierarchy.level(&head.name) {
                let found = self.members.iter().position(|m| {
                    m.level.dimension == dimension
                        && m.level.hierarchy == hierarchy.name
                        && m.level.level == level.name
                        && segment_matches(target, m)
                });
                if found.is_some() {
                    return found;
                }
            }
        }

        // Path from the hierarchy root, optionally through the All member.
        let mut path = path;
        if let Some(all) = entry.all_member {
            if segment_matches(head, &self.members[all]) {
                if tail.is_empty() {
                    return Some(all);
                }
                path = tail;
            }
        }

        let mut candidates: &[usize] = &entry.roots;
        let mut current = None;
        for segment in path {
            let idx = candidates
                .iter()
                .copied()
                .find(|&idx| segment_matches(segment, &self.members[idx]))?;
            current = Some(idx);
            candidates = &self.children[idx];
        }
        current
    }

    fn ancestors(&self, member: &Member) -> Vec<Member> {
        let mut ancestors = Vec::new();
        let mut parent = member.parent_name.as_ref();
        while let Some(&idx) = parent.and_then(|p| self.by_full_name.get(p)) {
            let m = &self.members[idx];
            ancestors.push(m.clone());
            parent = m.parent_name.as_ref();
        }
        ancestors
    }

    fn children(&self, member: &Member) -> Vec<Member> {
        self.by_full_name
            .get(&member.full_name)
            .map(|&idx| {
                self.children[idx]
                    .iter()
                    .map(|&c| self.members[c].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn level_members(&self, level: &LevelRef) -> Vec<Member> {
        let mut seen = HashSet::new();
        self.members
            .iter()
            .filter(|m| &m.level == level)
            .filter(|m| seen.insert(m.key.to_string()))
            .cloned()
            .collect()
    }
}

fn segment_matches(segment: &Segment, member: &Member) -> bool {
    if segment.is_key() {
        member.key.to_string() == segment.name
    } else {
        member.name == segment.name
    }
}

#[async_trait]
impl Engine for CatalogEngine {
    async fn cube_names(&self) -> EngineResult<Vec<String>> {
        Ok(self.cubes.iter().map(|c| c.cube.name.clone()).collect())
    }

    async fn cube(&self, name: &str) -> EngineResult<Option<Cube>> {
        Ok(self.catalog(name).map(|c| c.cube.clone()))
    }

    async fn member(&self, cube: &str, expression: &str) -> EngineResult<Option<Member>> {
        Ok(self.catalog(cube).and_then(|c| {
            c.resolve(expression.trim())
                .map(|idx| c.members[idx].clone())
        }))
    }

    async fn ancestors(&self, cube: &str, member: &Member) -> EngineResult<Vec<Member>> {
        Ok(self
            .catalog(cube)
            .map(|c| c.ancestors(member))
            .unwrap_or_default())
    }

    async fn children(&self, cube: &str, member: &Member) -> EngineResult<Vec<Member>> {
        Ok(self
            .catalog(cube)
            .map(|c| c.children(member))
            .unwrap_or_default())
    }

    async fn level_members(&self, cube: &str, level: &LevelRef) -> EngineResult<Vec<Member>> {
        Ok(self
            .catalog(cube)
            .map(|c| c.level_members(level))
            .unwrap_or_default())
    }

    async fn execute(&self, cube: &str, mdx: &str) -> EngineResult<CellResult> {
        let mdx = mdx.trim();
        self.results
            .iter()
            .find(|(c, text, _)| c == cube && text == mdx)
            .map(|(_, _, result)| result.clone())
            .ok_or_else(|| EngineError::rejected(format!("no recorded result for query:\n{}", mdx)))
    }

    async fn flush(&self) -> EngineResult<()> {
        Ok(())
    }
}
