//! Member property requests.
//!
//! Properties are named `Dimension.Level.Property` or
//! `Dimension.Hierarchy.Level.Property`. The same syntax selects caption
//! overrides: a property whose value replaces the member caption in the
//! label columns.

use std::collections::BTreeMap;

use crate::engine::{Cube, LevelRef, Member};
use crate::error::{QueryError, QueryResult};
use crate::mdx::Identifier;

use super::value::Scalar;

/// One requested property of one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    pub level: LevelRef,
    pub property: String,
}

impl PropertySpec {
    /// Column name in tidy output.
    pub fn column(&self) -> &str {
        &self.property
    }

    /// The property's value for a member of an axis: the member's own
    /// value when it sits on the property's level, else the value of the
    /// ancestor that does.
    pub fn value_for(&self, member: &Member, ancestors: &[Member]) -> Scalar {
        std::iter::once(member)
            .chain(ancestors)
            .find(|m| m.level == self.level)
            .and_then(|m| m.property(&self.property))
            .cloned()
            .unwrap_or_default()
    }
}

/// Caption property per level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionOverrides {
    by_level: BTreeMap<LevelRef, String>,
}

impl CaptionOverrides {
    pub fn is_empty(&self) -> bool {
        self.by_level.is_empty()
    }

    pub fn property_for(&self, level: &LevelRef) -> Option<&str> {
        self.by_level.get(level).map(String::as_str)
    }

    /// The label for a member: its override property when one was
    /// requested for its level and the member has it, else its caption.
    pub fn caption(&self, member: &Member) -> Scalar {
        self.property_for(&member.level)
            .and_then(|p| member.property(p))
            .filter(|v| !v.is_null())
            .map(|v| Scalar::Text(v.to_string()))
            .unwrap_or_else(|| Scalar::Text(member.caption.clone()))
    }
}

/// Parse property requests, requiring each dimension to be drilled.
pub fn parse_properties(
    cube: &Cube,
    specs: &[String],
    drilled: &[LevelRef],
) -> QueryResult<Vec<PropertySpec>> {
    specs
        .iter()
        .map(|spec| parse_spec(cube, spec, drilled))
        .collect()
}

/// Parse caption-override requests. Later requests for the same level win.
pub fn parse_caption_properties(
    cube: &Cube,
    specs: &[String],
    drilled: &[LevelRef],
) -> QueryResult<CaptionOverrides> {
    let mut overrides = CaptionOverrides::default();
    for spec in specs {
        let parsed = parse_spec(cube, spec, drilled)?;
        overrides.by_level.insert(parsed.level, parsed.property);
    }
    Ok(overrides)
}

fn parse_spec(cube: &Cube, spec: &str, drilled: &[LevelRef]) -> QueryResult<PropertySpec> {
    let invalid = |reason: String| QueryError::InvalidProperty {
        property: spec.to_string(),
        reason,
    };

    let ident = Identifier::parse(spec.trim()).map_err(|e| invalid(e.to_string()))?;
    let names = ident.names();
    let (dimension, hierarchy, level, property) = match names.as_slice() {
        [d, l, p] => (*d, None, *l, *p),
        [d, h, l, p] => (*d, Some(*h), *l, *p),
        _ => {
            return Err(invalid(
                "expected Dimension.Level.Property or Dimension.Hierarchy.Level.Property"
                    .to_string(),
            ))
        }
    };

    let dim = cube
        .dimension(dimension)
        .ok_or_else(|| invalid(format!("dimension `{}` does not exist", dimension)))?;
    let hier = match hierarchy {
        Some(name) => dim.hierarchy(name),
        None => dim.default_hierarchy(),
    }
    .ok_or_else(|| invalid(format!("no such hierarchy in dimension {}", dimension)))?;
    let lvl = hier
        .level(level)
        .ok_or_else(|| invalid(format!("level `{}` does not exist", level)))?;

    if !lvl.properties.iter().any(|p| p == property) {
        return Err(invalid(format!(
            "property `{}` is not declared on level {}",
            property, lvl.name
        )));
    }

    let level = LevelRef::new(&dim.name, &hier.name, &lvl.name);
    if !drilled.iter().any(|d| d.same_hierarchy(&level)) {
        return Err(QueryError::PropertyNotInDrilldown {
            dimension: dim.name.clone(),
        });
    }

    Ok(PropertySpec {
        level,
        property: property.to_string(),
    })
}
