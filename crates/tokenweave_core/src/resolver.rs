//! Alias resolution
//!
//! The token set is a directed graph: an alias has an edge to its referent.
//! Resolution is a depth-first walk with an in-progress marker set, memoized
//! so that a token referenced by many others is resolved once.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Result, TokenError};
use crate::token::{Literal, ResolvedToken, ResolvedTokenSet, TokenSet, TokenType, TokenValue};

/// An unresolved entry: its value and the type it must resolve to, if known
#[derive(Clone, Copy)]
struct Pending<'a> {
    value: &'a TokenValue,
    declared: Option<TokenType>,
}

/// A resolved entry and the alias it was reached through, if any
struct Memo<'a> {
    literal: Literal,
    target: Option<&'a str>,
}

/// Depth-first resolver over pending entries, falling back to an already
/// resolved set for ids that are not pending.
pub(crate) struct Resolver<'a> {
    pending: FxHashMap<&'a str, Pending<'a>>,
    settled: Option<&'a ResolvedTokenSet>,
    memo: FxHashMap<&'a str, Memo<'a>>,
    in_progress: FxHashSet<&'a str>,
    trail: Vec<&'a str>,
}

impl<'a> Resolver<'a> {
    fn new(settled: Option<&'a ResolvedTokenSet>) -> Self {
        Self {
            pending: FxHashMap::default(),
            settled,
            memo: FxHashMap::default(),
            in_progress: FxHashSet::default(),
            trail: Vec::new(),
        }
    }

    fn add(&mut self, id: &'a str, value: &'a TokenValue, declared: Option<TokenType>) {
        self.pending.insert(id, Pending { value, declared });
    }

    /// Ids from `id` down to the token that holds its literal.
    fn chain_from(&self, id: &'a str) -> Vec<String> {
        let mut chain = vec![id.to_string()];
        let mut next = self.memo.get(id).and_then(|memo| memo.target);
        while let Some(step) = next {
            chain.push(step.to_string());
            next = self.memo.get(step).and_then(|memo| memo.target);
        }
        chain
    }

    /// Resolve one id to its literal.
    fn resolve_id(&mut self, id: &'a str) -> Result<Literal> {
        if let Some(memo) = self.memo.get(id) {
            return Ok(memo.literal.clone());
        }

        if self.in_progress.contains(id) {
            let start = self.trail.iter().position(|seen| *seen == id).unwrap_or(0);
            let mut path: Vec<String> = self.trail[start..].iter().map(|s| s.to_string()).collect();
            path.push(id.to_string());
            return Err(TokenError::Cycle { path });
        }

        let Some(entry) = self.pending.get(id).copied() else {
            return match self.settled.and_then(|set| set.value(id)) {
                Some(literal) => Ok(literal.clone()),
                None => {
                    let mut path: Vec<String> = self.trail.iter().map(|s| s.to_string()).collect();
                    path.push(id.to_string());
                    Err(TokenError::UnresolvedReference {
                        path,
                        missing: id.to_string(),
                    })
                }
            };
        };

        let (literal, target) = match entry.value {
            TokenValue::Literal(literal) => (literal.clone(), None),
            TokenValue::Alias(target) => {
                self.in_progress.insert(id);
                self.trail.push(id);

                let literal = self.resolve_id(target.as_str())?;
                if let Some(expected) = entry.declared {
                    let found = literal.token_type();
                    if found != expected {
                        let mut path: Vec<String> =
                            self.trail.iter().map(|s| s.to_string()).collect();
                        path.extend(self.chain_from(target.as_str()));
                        return Err(TokenError::TypeMismatch {
                            path,
                            expected,
                            found,
                        });
                    }
                }

                self.trail.pop();
                self.in_progress.remove(id);
                (literal, Some(target.as_str()))
            }
        };

        self.memo.insert(
            id,
            Memo {
                literal: literal.clone(),
                target,
            },
        );
        Ok(literal)
    }
}

/// Resolve every alias in `set`, keeping the set's declaration order.
///
/// Fails with [`TokenError::Cycle`], [`TokenError::UnresolvedReference`] or
/// [`TokenError::TypeMismatch`], each carrying the id path that led to it.
/// Resolving an alias-free set returns it unchanged.
pub fn resolve(set: &TokenSet) -> Result<ResolvedTokenSet> {
    let mut resolver = Resolver::new(None);
    for token in set.iter() {
        resolver.add(&token.id, &token.value, token.declared_type);
    }

    let mut resolved = ResolvedTokenSet::default();
    for token in set.iter() {
        let value = resolver.resolve_id(&token.id)?;
        resolved.push(ResolvedToken {
            id: token.id.clone(),
            value,
            category: token.category.clone(),
            description: token.description.clone(),
        });
    }

    let aliases = set.iter().filter(|t| t.is_alias()).count();
    tracing::debug!("resolved {} tokens ({} aliases)", resolved.len(), aliases);
    Ok(resolved)
}

/// Resolve a batch of overrides against an already composed set.
///
/// Overrides shadow the composed values, so an override may alias another
/// override in the same batch; ids that are not overridden resolve to their
/// composed literal. Returned in the order given.
pub(crate) fn resolve_overrides(
    overrides: &[(String, TokenValue, TokenType)],
    composed: &ResolvedTokenSet,
) -> Result<Vec<(String, Literal)>> {
    let mut resolver = Resolver::new(Some(composed));
    for (id, value, ty) in overrides {
        resolver.add(id, value, Some(*ty));
    }

    let mut updates = Vec::with_capacity(overrides.len());
    for (id, _, _) in overrides {
        updates.push((id.clone(), resolver.resolve_id(id)?));
    }
    Ok(updates)
}
