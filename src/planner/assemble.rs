//! Query assembly.
//!
//! Measures always sit on axis 0. A measure filter turns every requested
//! measure into a calculated `IIF` member, so it narrows cells on every
//! axis combination and the grand total alike. Each drilldown axis is
//! wrapped in a fixed order: base set, then `ORDER`, then `SUBSET`, then
//! `DISTINCT`.
//!
//! Offset and limit count flattened rows. With exactly one drilldown the
//! axis members are the rows, so the window compiles to `SUBSET`. With
//! none or several it is kept as [`CompiledQuery::row_window`] and applied
//! by the flattener to the cross product of the axes.

use super::cut::Cut;
use super::drilldown::Drilldown;
use super::filter::{OrderSpec, Pagination};
use super::slicer::{ResolvedAxis, SlicerPlan};
use crate::engine::{LevelRef, Measure};
use crate::error::{QueryError, QueryResult};
use crate::mdx::{Axis, Condition, FilteredMeasure, MdxQuery, SetExpr};

/// Clauses that apply to the query as a whole.
#[derive(Debug, Clone, Default)]
pub struct QueryClauses {
    pub filter: Condition,
    pub order: Option<OrderSpec>,
    pub pagination: Pagination,
    pub nonempty: bool,
    pub distinct: bool,
}

/// A fully compiled request. Renders to exactly one MDX query.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub cube: String,
    pub measures: Vec<Measure>,
    /// Conjoined measure filter; empty when unfiltered.
    pub filter: Condition,
    pub drilldowns: Vec<Drilldown>,
    pub axes: Vec<ResolvedAxis>,
    /// Axis sets with every wrapping applied, parallel to `axes`.
    pub axis_sets: Vec<SetExpr>,
    pub slicer: Vec<Cut>,
    pub nonempty: bool,
    /// Offset and limit the MDX could not express, applied to tidy rows.
    pub row_window: Pagination,
}

impl CompiledQuery {
    pub fn to_query(&self) -> MdxQuery {
        let mut query = MdxQuery::new(&self.cube);
        let mut measures = Vec::with_capacity(self.measures.len());
        for measure in &self.measures {
            if self.filter.is_empty() {
                measures.push(SetExpr::Member(measure.full_name.clone()));
            } else {
                let filtered =
                    FilteredMeasure::new(&measure.name, &measure.full_name, self.filter.clone());
                measures.push(SetExpr::Member(filtered.name.clone()));
                query = query.with_member(filtered);
            }
        }

        query = query.axis(Axis::new(SetExpr::Set(measures)).non_empty(self.nonempty));
        for set in &self.axis_sets {
            query = query.axis(Axis::new(set.clone()).non_empty(self.nonempty));
        }
        for cut in &self.slicer {
            query = query.slice(cut.to_set());
        }
        query
    }

    pub fn to_mdx(&self) -> String {
        self.to_query().to_mdx()
    }

    /// Level of each drilldown axis, in axis order.
    pub fn axis_levels(&self) -> Vec<Option<LevelRef>> {
        self.axes.iter().map(|a| a.level().cloned()).collect()
    }

    /// The requested measure behind a measure-axis member. Filtered
    /// queries report their calculated members, which map back to the
    /// measure they wrap.
    pub fn requested_measure(&self, unique_name: &str) -> Option<&Measure> {
        self.measures.iter().find(|m| {
            m.full_name == unique_name
                || (!self.filter.is_empty()
                    && FilteredMeasure::unique_name(&m.name) == unique_name)
        })
    }
}

/// Combine measures, matched axes and clauses into a compiled query.
pub fn assemble(
    cube: &str,
    measures: Vec<Measure>,
    drilldowns: Vec<Drilldown>,
    plan: SlicerPlan,
    clauses: QueryClauses,
) -> QueryResult<CompiledQuery> {
    if let Some(order) = &clauses.order {
        let drilled = plan.axes.iter().any(|axis| order.applies_to(axis.level()));
        if !plan.axes.is_empty() && !drilled {
            return Err(QueryError::InvalidOrder {
                order: order.expression.clone(),
                reason: "its dimension is not in the drilldown list".to_string(),
            });
        }
    }

    let single_axis = plan.axes.len() == 1;
    let axis_sets = plan
        .axes
        .iter()
        .map(|axis| {
            let mut set = axis.to_set()?;
            if let Some(order) = &clauses.order {
                if order.applies_to(axis.level()) {
                    set = set.order(order.by.clone(), order.direction);
                }
            }
            if single_axis {
                set = clauses.pagination.apply(set);
            }
            if clauses.distinct {
                set = set.distinct();
            }
            Ok(set)
        })
        .collect::<QueryResult<Vec<_>>>()?;

    Ok(CompiledQuery {
        cube: cube.to_string(),
        measures,
        filter: clauses.filter,
        drilldowns,
        axes: plan.axes,
        axis_sets,
        slicer: plan.slicer,
        nonempty: clauses.nonempty,
        row_window: if single_axis {
            Pagination::default()
        } else {
            clauses.pagination
        },
    })
}
