//! Cut resolution.
//!
//! A cut restricts the query to one member, a set of members, a range of
//! members, or a named set. Every member a cut mentions must exist, and
//! sets and ranges must stay on a single level.

use futures::future::try_join_all;

use crate::engine::{Cube, Engine, LevelRef, Member};
use crate::error::{QueryError, QueryResult};
use crate::mdx::{parse_expression, Fragment, Operator, SetExpr};

/// Shape of a cut expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutKind {
    Member,
    Set,
    Range,
    NamedSet,
}

/// A resolved cut.
#[derive(Debug, Clone, PartialEq)]
pub struct Cut {
    /// The expression as the caller wrote it.
    pub expression: String,
    pub kind: CutKind,
    /// The level every member of the cut belongs to. `None` only for a
    /// named set the engine reports no anchor for.
    pub level: Option<LevelRef>,
    /// Canonical form of the expression; `None` for named sets.
    pub fragment: Option<Fragment>,
    /// Member for `Member`, elements for `Set`, endpoints for `Range`.
    pub members: Vec<Member>,
}

impl Cut {
    /// Depth of the anchor level; members of one level share it.
    pub fn depth(&self) -> Option<usize> {
        self.members.first().map(|m| m.depth)
    }

    /// Fragments of the individual members of a set cut, or the member
    /// itself for a member cut.
    pub fn member_fragments(&self) -> Vec<&Fragment> {
        match (&self.kind, &self.fragment) {
            (CutKind::Set, Some(Fragment::Call { args, .. })) => args.iter().collect(),
            (CutKind::Member, Some(fragment)) => vec![fragment],
            _ => Vec::new(),
        }
    }

    /// The cut as a slicer term.
    pub fn to_set(&self) -> SetExpr {
        match (&self.kind, &self.fragment) {
            (_, Some(fragment)) => SetExpr::Fragment(fragment.clone()),
            (_, None) => SetExpr::NamedSet(self.expression.clone()),
        }
    }
}

/// Resolve one cut expression.
pub async fn resolve_cut(engine: &dyn Engine, cube: &Cube, expression: &str) -> QueryResult<Cut> {
    let expression = expression.trim();

    if let Some(set) = cube.named_set(expression) {
        return Ok(Cut {
            expression: expression.to_string(),
            kind: CutKind::NamedSet,
            level: set.anchor.clone(),
            fragment: None,
            members: Vec::new(),
        });
    }

    let fragment = parse_expression(expression).map_err(|e| QueryError::InvalidCut {
        cut: expression.to_string(),
        reason: e.to_string(),
    })?;

    match &fragment {
        Fragment::Identifier(_) => {
            let member = engine
                .member(&cube.name, &fragment.to_string())
                .await?
                .ok_or_else(|| QueryError::unknown_member("Unknown member in cut", expression))?;
            Ok(Cut {
                expression: expression.to_string(),
                kind: CutKind::Member,
                level: Some(member.level.clone()),
                fragment: Some(fragment),
                members: vec![member],
            })
        }
        Fragment::Call {
            operator: Operator::Braces,
            args,
        } => {
            if args.is_empty() {
                return Err(QueryError::InvalidCut {
                    cut: expression.to_string(),
                    reason: "empty set".to_string(),
                });
            }
            let members = resolve_members(engine, cube, args, "Unknown member in cut set").await?;
            let level = single_level(&members)
                .ok_or_else(|| QueryError::HeterogeneousCutSet {
                    cut: expression.to_string(),
                })?
                .clone();
            Ok(Cut {
                expression: expression.to_string(),
                kind: CutKind::Set,
                level: Some(level),
                fragment: Some(fragment),
                members,
            })
        }
        _ => match range_endpoints(&fragment) {
            Some(endpoints) => {
                let members =
                    resolve_members(engine, cube, endpoints, "Unknown member in cut range").await?;
                let level = single_level(&members)
                    .ok_or_else(|| QueryError::HeterogeneousCutRange {
                        cut: expression.to_string(),
                    })?
                    .clone();
                // Always carried parenthesized so it reads as a set on an axis.
                let fragment = Fragment::Call {
                    operator: Operator::Parens,
                    args: vec![Fragment::Call {
                        operator: Operator::Range,
                        args: endpoints.to_vec(),
                    }],
                };
                Ok(Cut {
                    expression: expression.to_string(),
                    kind: CutKind::Range,
                    level: Some(level),
                    fragment: Some(fragment),
                    members,
                })
            }
            None => Err(QueryError::InvalidCut {
                cut: expression.to_string(),
                reason: "expected a member, a set `{a, b}` or a range `(a : b)`".to_string(),
            }),
        },
    }
}

/// `a : b` or `(a : b)`, with identifier endpoints.
fn range_endpoints(fragment: &Fragment) -> Option<&[Fragment]> {
    let args = match fragment.as_call()? {
        (Operator::Range, args) => args,
        (Operator::Parens, [inner]) => match inner.as_call()? {
            (Operator::Range, args) => args,
            _ => return None,
        },
        _ => return None,
    };
    (args.len() == 2 && args.iter().all(|a| a.as_identifier().is_some())).then_some(args)
}

async fn resolve_members(
    engine: &dyn Engine,
    cube: &Cube,
    fragments: &[Fragment],
    context: &str,
) -> QueryResult<Vec<Member>> {
    let lookups = fragments.iter().map(|fragment| async move {
        if fragment.as_identifier().is_none() {
            return Err(QueryError::unknown_member(context, fragment.to_string()));
        }
        engine
            .member(&cube.name, &fragment.to_string())
            .await?
            .ok_or_else(|| QueryError::unknown_member(context, fragment.to_string()))
    });
    try_join_all(lookups).await
}

fn single_level(members: &[Member]) -> Option<&LevelRef> {
    let first = &members.first()?.level;
    members.iter().all(|m| &m.level == first).then_some(first)
}
