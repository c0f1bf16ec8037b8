//! Slicer-axis matching.
//!
//! Each drilldown axis claims at most one cut: a cut on exactly its level,
//! or failing that a cut on an ancestor level of the same hierarchy (which
//! becomes a descendant expansion). Whatever is left forms the slicer.

use log::debug;

use super::cut::{Cut, CutKind};
use super::drilldown::{Drilldown, DrilldownTarget};
use crate::engine::{LevelRef, NamedSet};
use crate::error::{QueryError, QueryResult};
use crate::mdx::SetExpr;

/// The final shape of one drilldown axis.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedAxis {
    /// Every member of the level.
    PlainMembers { level: LevelRef, unique_name: String },
    /// Exactly the members of a cut on the axis level.
    SetCut(Cut),
    /// Descendants of an ancestor cut, down to the axis level.
    DescendantExpansion {
        cut: Cut,
        level: LevelRef,
        unique_name: String,
    },
    /// An engine-defined set.
    NamedSetRef(NamedSet),
}

impl ResolvedAxis {
    /// The level the axis members belong to, when known.
    pub fn level(&self) -> Option<&LevelRef> {
        match self {
            ResolvedAxis::PlainMembers { level, .. } => Some(level),
            ResolvedAxis::SetCut(cut) => cut.level.as_ref(),
            ResolvedAxis::DescendantExpansion { level, .. } => Some(level),
            ResolvedAxis::NamedSetRef(set) => set.anchor.as_ref(),
        }
    }

    /// The axis set before any order or pagination wrapping.
    pub fn to_set(&self) -> QueryResult<SetExpr> {
        Ok(match self {
            ResolvedAxis::PlainMembers { unique_name, .. } => {
                SetExpr::LevelMembers(unique_name.clone())
            }
            ResolvedAxis::SetCut(cut) => match cut.kind {
                // One-element set keeps every axis a set.
                CutKind::Member => SetExpr::braced(cut.to_set()),
                _ => cut.to_set(),
            },
            ResolvedAxis::DescendantExpansion {
                cut, unique_name, ..
            } => {
                let mut expansions: Vec<SetExpr> = cut
                    .member_fragments()
                    .into_iter()
                    .map(|fragment| SetExpr::Descendants {
                        member: Box::new(SetExpr::Fragment(fragment.clone())),
                        level: unique_name.clone(),
                    })
                    .collect();
                match (cut.kind, expansions.len()) {
                    (CutKind::Member, 1) => expansions.remove(0),
                    (CutKind::Set, _) => SetExpr::Set(expansions),
                    _ => return Err(range_expansion(cut)),
                }
            }
            ResolvedAxis::NamedSetRef(set) => SetExpr::braced(SetExpr::NamedSet(set.name.clone())),
        })
    }
}

/// Axes plus the cuts none of them claimed.
#[derive(Debug, Clone, PartialEq)]
pub struct SlicerPlan {
    pub axes: Vec<ResolvedAxis>,
    pub slicer: Vec<Cut>,
}

/// Match cuts against drilldown axes.
pub fn match_cuts(drilldowns: &[Drilldown], cuts: Vec<Cut>) -> QueryResult<SlicerPlan> {
    reject_duplicate_levels(&cuts)?;

    let mut remaining: Vec<Option<Cut>> = cuts.into_iter().map(Some).collect();
    let mut axes = Vec::with_capacity(drilldowns.len());

    for drilldown in drilldowns {
        let (level, unique_name, depth) = match &drilldown.target {
            DrilldownTarget::NamedSet(set) => {
                axes.push(ResolvedAxis::NamedSetRef(set.clone()));
                continue;
            }
            DrilldownTarget::Level {
                level,
                unique_name,
                depth,
            } => (level, unique_name, *depth),
        };

        // A cut on exactly this level.
        if let Some(cut) = take_first(&mut remaining, |cut| cut.level.as_ref() == Some(level)) {
            debug!("cut {} consumed by axis {}", cut.expression, drilldown.expression);
            axes.push(ResolvedAxis::SetCut(cut));
            continue;
        }

        // First cut on an ancestor level of the same hierarchy.
        let ancestor = take_first(&mut remaining, |cut| {
            cut.level.as_ref().is_some_and(|l| l.same_hierarchy(level))
                && cut.depth().is_some_and(|d| d < depth)
        });
        if let Some(cut) = ancestor {
            if cut.kind == CutKind::Range {
                return Err(range_expansion(&cut));
            }
            debug!(
                "cut {} expanded to descendants at {}",
                cut.expression, unique_name
            );
            axes.push(ResolvedAxis::DescendantExpansion {
                cut,
                level: level.clone(),
                unique_name: unique_name.clone(),
            });
            continue;
        }

        axes.push(ResolvedAxis::PlainMembers {
            level: level.clone(),
            unique_name: unique_name.clone(),
        });
    }

    let slicer: Vec<Cut> = remaining.into_iter().flatten().collect();

    // A leftover cut below a drilled level of its hierarchy would drill up.
    for cut in slicer.iter().filter(|c| c.kind != CutKind::NamedSet) {
        let (Some(cut_level), Some(cut_depth)) = (cut.level.as_ref(), cut.depth()) else {
            continue;
        };
        for drilldown in drilldowns {
            if let DrilldownTarget::Level { level, depth, .. } = &drilldown.target {
                if level.same_hierarchy(cut_level) && cut_depth > *depth {
                    return Err(QueryError::IllegalDrilldown {
                        cut: cut.expression.clone(),
                        drilldown: drilldown.expression.clone(),
                    });
                }
            }
        }
    }

    if !slicer.is_empty() {
        debug!(
            "slicer cuts: {}",
            slicer
                .iter()
                .map(|c| c.expression.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(SlicerPlan { axes, slicer })
}

fn take_first(remaining: &mut [Option<Cut>], pred: impl Fn(&Cut) -> bool) -> Option<Cut> {
    remaining
        .iter_mut()
        .find(|slot| matches!(slot, Some(cut) if cut.kind != CutKind::NamedSet && pred(cut)))
        .and_then(Option::take)
}

fn reject_duplicate_levels(cuts: &[Cut]) -> QueryResult<()> {
    for (i, cut) in cuts.iter().enumerate() {
        if cut.kind == CutKind::NamedSet {
            continue;
        }
        let duplicate = cuts[..i]
            .iter()
            .any(|prev| prev.kind != CutKind::NamedSet && prev.level == cut.level);
        if duplicate {
            return Err(QueryError::InvalidCut {
                cut: cut.expression.clone(),
                reason: "another cut already restricts this level".to_string(),
            });
        }
    }
    Ok(())
}

fn range_expansion(cut: &Cut) -> QueryError {
    QueryError::UnsupportedOperation(format!(
        "range cut `{}` cannot be expanded to descendants",
        cut.expression
    ))
}
