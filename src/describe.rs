//! Serializable metadata descriptions.
//!
//! The payloads a metadata endpoint returns: whole cubes, one dimension
//! with its level members, and single members with their ancestors.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::{
    measures_level, Cube, Dimension, DimensionType, Hierarchy, Level, LevelRef, Member, Session,
};
use crate::error::{QueryError, QueryResult};
use crate::result::Scalar;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CubeDescription {
    pub name: String,
    pub annotations: BTreeMap<String, String>,
    pub dimensions: Vec<DimensionDescription>,
    pub measures: Vec<MeasureDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionDescription {
    pub name: String,
    pub caption: String,
    #[serde(rename = "type")]
    pub dimension_type: DimensionType,
    pub annotations: BTreeMap<String, String>,
    pub hierarchies: Vec<HierarchyDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyDescription {
    pub name: String,
    pub has_all: bool,
    pub all_member_name: Option<String>,
    pub levels: Vec<LevelDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelDescription {
    pub name: String,
    pub full_name: String,
    pub caption: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<MemberDescription>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureDescription {
    pub name: String,
    pub caption: String,
    pub annotations: BTreeMap<String, String>,
    pub full_name: String,
}

/// A member as metadata endpoints report it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberDescription {
    pub name: String,
    pub full_name: String,
    pub caption: String,
    pub all_member: bool,
    pub drillable: bool,
    pub depth: usize,
    pub key: Scalar,
    pub num_children: usize,
    pub parent_name: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<MemberDescription>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ancestors: Option<Vec<MemberDescription>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<DimensionInfo>,
}

impl From<&Member> for MemberDescription {
    fn from(m: &Member) -> Self {
        Self {
            name: m.name.clone(),
            full_name: m.full_name.clone(),
            caption: m.caption.clone(),
            all_member: m.all_member,
            drillable: m.drillable,
            depth: m.depth,
            key: m.key.clone(),
            num_children: m.num_children,
            parent_name: m.parent_name.clone(),
            properties: BTreeMap::new(),
            children: None,
            ancestors: None,
            dimension: None,
        }
    }
}

/// Dimension name, caption, type and level caption of a member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionInfo {
    pub name: String,
    pub caption: String,
    #[serde(rename = "type")]
    pub dimension_type: DimensionType,
    pub level: String,
}

/// Dimension info for members of a level; the measures axis included.
pub fn dimension_info(cube: &Cube, level: &LevelRef) -> Option<DimensionInfo> {
    if *level == measures_level() {
        return Some(DimensionInfo {
            name: "Measures".to_string(),
            caption: "Measures".to_string(),
            dimension_type: DimensionType::Measures,
            level: level.level.clone(),
        });
    }
    let resolved = cube.level(level)?;
    Some(DimensionInfo {
        name: resolved.dimension.name.clone(),
        caption: resolved.dimension.caption.clone(),
        dimension_type: resolved.dimension.dimension_type,
        level: resolved.level.caption.clone(),
    })
}

/// Options for member listings.
#[derive(Debug, Clone, Default)]
pub struct MemberOptions {
    /// Properties to include with each member.
    pub member_properties: Vec<String>,
    /// Property whose value replaces the caption.
    pub caption: Option<String>,
    pub children: bool,
}

pub fn describe_cube(cube: &Cube) -> CubeDescription {
    CubeDescription {
        name: cube.name.clone(),
        annotations: cube.annotations.clone(),
        dimensions: cube
            .dimensions
            .iter()
            .filter(|d| d.dimension_type != DimensionType::Measures)
            .map(|d| describe_dimension_shape(d, None))
            .collect(),
        measures: cube
            .measures
            .iter()
            .filter(|m| m.visible)
            .map(|m| MeasureDescription {
                name: m.name.clone(),
                caption: m.caption.clone(),
                annotations: m.annotations.clone(),
                full_name: m.full_name.clone(),
            })
            .collect(),
    }
}

fn describe_dimension_shape(
    dimension: &Dimension,
    members: Option<&BTreeMap<(String, String), Vec<MemberDescription>>>,
) -> DimensionDescription {
    DimensionDescription {
        name: dimension.name.clone(),
        caption: dimension.caption.clone(),
        dimension_type: dimension.dimension_type,
        annotations: dimension.annotations.clone(),
        hierarchies: dimension
            .hierarchies
            .iter()
            .map(|h| HierarchyDescription {
                name: h.name.clone(),
                has_all: h.has_all,
                all_member_name: h.all_member_name.clone(),
                levels: h
                    .levels
                    .iter()
                    .map(|l| LevelDescription {
                        name: l.name.clone(),
                        full_name: l.unique_name.clone(),
                        caption: l.caption.clone(),
                        members: members
                            .and_then(|m| m.get(&(h.name.clone(), l.name.clone())))
                            .cloned(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// A dimension with the members of every level.
pub async fn describe_dimension(
    session: &Session,
    cube: &Cube,
    dimension: &str,
) -> QueryResult<DimensionDescription> {
    let dim = cube
        .dimension(dimension)
        .ok_or_else(|| QueryError::UnknownDimension {
            cube: cube.name.clone(),
            dimension: dimension.to_string(),
        })?;

    let mut members = BTreeMap::new();
    for hierarchy in &dim.hierarchies {
        for level in &hierarchy.levels {
            let level_ref = LevelRef::new(&dim.name, &hierarchy.name, &level.name);
            let listed = session
                .engine()
                .level_members(&cube.name, &level_ref)
                .await?;
            members.insert(
                (hierarchy.name.clone(), level.name.clone()),
                listed.iter().map(MemberDescription::from).collect(),
            );
        }
    }

    Ok(describe_dimension_shape(dim, Some(&members)))
}

fn find_level<'a>(
    cube: &'a Cube,
    dimension: &str,
    level: &str,
) -> QueryResult<(&'a Dimension, &'a Hierarchy, &'a Level)> {
    let dim = cube
        .dimension(dimension)
        .ok_or_else(|| QueryError::UnknownDimension {
            cube: cube.name.clone(),
            dimension: dimension.to_string(),
        })?;
    let hierarchy = dim
        .default_hierarchy()
        .ok_or_else(|| QueryError::UnknownHierarchy {
            dimension: dim.name.clone(),
            hierarchy: dim.name.clone(),
        })?;
    let lvl = hierarchy
        .level(level)
        .ok_or_else(|| QueryError::UnknownLevel {
            dimension: dim.name.clone(),
            level: level.to_string(),
        })?;
    Ok((dim, hierarchy, lvl))
}

/// Members of a level of the dimension's first hierarchy, unique by key.
pub async fn level_members(
    session: &Session,
    cube: &Cube,
    dimension: &str,
    level: &str,
    options: &MemberOptions,
) -> QueryResult<Vec<MemberDescription>> {
    let (dim, hierarchy, lvl) = find_level(cube, dimension, level)?;
    let level_ref = LevelRef::new(&dim.name, &hierarchy.name, &lvl.name);
    let members = session
        .engine()
        .level_members(&cube.name, &level_ref)
        .await?;

    let described = members
        .iter()
        .map(|m| describe_with_options(session, &cube.name, m, options));
    futures::future::try_join_all(described).await
}

/// One member of a level, looked up by key.
pub async fn member_by_key(
    session: &Session,
    cube: &Cube,
    dimension: &str,
    level: &str,
    key: &str,
    options: &MemberOptions,
) -> QueryResult<MemberDescription> {
    let (dim, hierarchy, lvl) = find_level(cube, dimension, level)?;
    let level_ref = LevelRef::new(&dim.name, &hierarchy.name, &lvl.name);
    let members = session
        .engine()
        .level_members(&cube.name, &level_ref)
        .await?;
    let member = members
        .iter()
        .find(|m| m.key.to_string() == key)
        .ok_or_else(|| QueryError::MemberNotFound(key.to_string()))?;

    let mut description = describe_with_options(session, &cube.name, member, options).await?;
    let ancestors = session.engine().ancestors(&cube.name, member).await?;
    description.ancestors = Some(ancestors.iter().map(MemberDescription::from).collect());
    Ok(description)
}

/// A member by unique name, with its ancestors and dimension.
pub async fn member_by_name(
    session: &Session,
    cube: &Cube,
    full_name: &str,
) -> QueryResult<MemberDescription> {
    let member = session
        .engine()
        .member(&cube.name, full_name)
        .await?
        .ok_or_else(|| QueryError::MemberNotFound(full_name.to_string()))?;
    let ancestors = session.engine().ancestors(&cube.name, &member).await?;

    let mut description = MemberDescription::from(&member);
    description.ancestors = Some(ancestors.iter().map(MemberDescription::from).collect());
    description.dimension = dimension_info(cube, &member.level);
    Ok(description)
}

async fn describe_with_options(
    session: &Session,
    cube: &str,
    member: &Member,
    options: &MemberOptions,
) -> QueryResult<MemberDescription> {
    let mut description = MemberDescription::from(member);
    for name in &options.member_properties {
        if let Some(value) = member.property(name) {
            description.properties.insert(name.clone(), value.clone());
        }
    }
    if let Some(value) = options
        .caption
        .as_deref()
        .and_then(|p| member.property(p))
        .filter(|v| !v.is_null())
    {
        description.caption = value.to_string();
    }
    if options.children {
        let children = session.engine().children(cube, member).await?;
        description.children = Some(children.iter().map(MemberDescription::from).collect());
    }
    Ok(description)
}
