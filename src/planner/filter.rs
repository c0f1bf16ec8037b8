//! Filter, order and pagination clauses.

use std::sync::LazyLock;

use regex::Regex;

use crate::engine::{Cube, LevelRef};
use crate::error::{QueryError, QueryResult};
use crate::mdx::{
    CompareOp, Comparison, Condition, Identifier, MemberAttribute, SetExpr, SortDirection,
    ValueExpr,
};

static FILTER_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<measure>[\w\s]+?)\s*(?P<op>>=|<=|<>|=|<|>)\s*(?P<value>-?\d+(?:\.\d*)?)\s*$")
        .unwrap()
});

/// Parse one `<measure> <op> <number>` clause.
pub fn parse_filter(cube: &Cube, clause: &str) -> QueryResult<Comparison> {
    let invalid = || QueryError::InvalidFilter {
        filter: clause.to_string(),
    };
    let caps = FILTER_CLAUSE.captures(clause).ok_or_else(invalid)?;

    let measure_name = caps["measure"].trim();
    let measure = cube
        .measure(measure_name)
        .ok_or_else(|| QueryError::UnknownMeasure {
            cube: cube.name.clone(),
            measure: measure_name.to_string(),
        })?;
    let op = CompareOp::parse(&caps["op"]).ok_or_else(invalid)?;

    Ok(Comparison {
        value: ValueExpr::Measure(measure.full_name.clone()),
        op,
        number: caps["value"].to_string(),
    })
}

/// Conjoin every filter clause.
pub fn compile_filters(cube: &Cube, clauses: &[String]) -> QueryResult<Condition> {
    let comparisons = clauses
        .iter()
        .map(|clause| parse_filter(cube, clause))
        .collect::<QueryResult<Vec<_>>>()?;
    Ok(Condition { comparisons })
}

/// A compiled order clause.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpec {
    /// The order target as written.
    pub expression: String,
    pub by: ValueExpr,
    pub direction: SortDirection,
    /// Hierarchy whose axis gets ordered; `None` orders every axis.
    pub hierarchy: Option<LevelRef>,
}

impl OrderSpec {
    /// Whether this clause wraps an axis drilled on `level`.
    pub fn applies_to(&self, level: Option<&LevelRef>) -> bool {
        match (&self.hierarchy, level) {
            (None, _) => true,
            (Some(target), Some(level)) => target.same_hierarchy(level),
            (Some(_), None) => false,
        }
    }
}

/// Compile an order target: `Measures.[name]`, `Dim.Level.Property`,
/// `Dim.Hierarchy.Level.Property`, or a built-in attribute (`caption`,
/// `key`, `name`, `unique_name`) in the property position.
pub fn compile_order(cube: &Cube, target: &str, descending: bool) -> QueryResult<OrderSpec> {
    let invalid = |reason: String| QueryError::InvalidOrder {
        order: target.to_string(),
        reason,
    };
    let direction = if descending {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };

    let ident = Identifier::parse(target.trim()).map_err(|e| invalid(e.to_string()))?;
    let names = ident.names();

    if let ["Measures", measure] = names.as_slice() {
        let measure = cube
            .measure(measure)
            .ok_or_else(|| invalid(format!("measure `{}` does not exist", measure)))?;
        return Ok(OrderSpec {
            expression: target.trim().to_string(),
            by: ValueExpr::Measure(measure.full_name.clone()),
            direction,
            hierarchy: None,
        });
    }

    let (dimension, hierarchy, level, property) = match names.as_slice() {
        [d, l, p] => (*d, None, *l, *p),
        [d, h, l, p] => (*d, Some(*h), *l, *p),
        _ => {
            return Err(invalid(
                "expected Measures.[name] or Dimension.[Hierarchy.]Level.Property".to_string(),
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

    let by = match MemberAttribute::parse(property) {
        Some(attribute) => ValueExpr::Attribute {
            hierarchy: hier.unique_name.clone(),
            attribute,
        },
        None if lvl.properties.iter().any(|p| p == property) => ValueExpr::Property {
            hierarchy: hier.unique_name.clone(),
            property: property.to_string(),
        },
        None => {
            return Err(invalid(format!(
                "property `{}` is not declared on level {}",
                property, lvl.name
            )))
        }
    };

    Ok(OrderSpec {
        expression: target.trim().to_string(),
        by,
        direction,
        hierarchy: Some(LevelRef::new(&dim.name, &hier.name, &lvl.name)),
    })
}

/// Offset/limit applied to each drilldown axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl Pagination {
    pub fn new(offset: Option<u64>, limit: Option<u64>) -> Self {
        Self { offset, limit }
    }

    pub fn is_empty(&self) -> bool {
        self.offset.is_none() && self.limit.is_none()
    }

    /// Wrap a set in `SUBSET`; an offset alone keeps everything after it.
    pub fn apply(&self, set: SetExpr) -> SetExpr {
        if self.is_empty() {
            set
        } else {
            set.subset(self.offset.unwrap_or(0), self.limit)
        }
    }

    /// Apply the same window to a row sequence.
    pub fn rows<I: Iterator>(&self, rows: I) -> std::iter::Take<std::iter::Skip<I>> {
        let offset = self.offset.map_or(0, |o| usize::try_from(o).unwrap_or(usize::MAX));
        let limit = self
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        rows.skip(offset).take(limit)
    }
}
