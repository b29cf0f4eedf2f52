//! Saved per-index hash contexts for amortised attempts.
//!
//! Context `j` has absorbed `(j, M, pk)`.  It depends only on the public key,
//! so the set is built once per key and finished many times with the
//! per-attempt `(mes, w)` suffix.

use crate::engine::{Digest256, HashEngine};
use crate::error::PrehashError;

/// One saved engine state per array index, bound to a public key.
#[derive(Debug, Clone)]
pub struct UnfinalizedContexts<C> {
    pk: Vec<u8>,
    contexts: Vec<C>,
}

impl<C: Clone + Send + Sync> UnfinalizedContexts<C> {
    pub(crate) fn new(pk: &[u8], contexts: Vec<C>) -> Self {
        UnfinalizedContexts {
            pk: pk.to_vec(),
            contexts,
        }
    }

    /// Number of contexts, equal to `N`.
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// `true` if there are no contexts.
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Public key the contexts were built from.
    pub fn public_key(&self) -> &[u8] {
        &self.pk
    }

    /// Context for index `j`.
    pub fn get(&self, j: usize) -> Option<&C> {
        self.contexts.get(j)
    }

    /// All contexts in index order.
    pub fn as_slice(&self) -> &[C] {
        &self.contexts
    }

    /// Finishes context `j` with `mes || w`.
    pub fn finish<E>(&self, engine: &E, j: usize, mes: &[u8], w: &[u8]) -> Option<Digest256>
    where
        E: HashEngine<Context = C>,
    {
        self.contexts.get(j).map(|ctx| engine.finish(ctx, &[mes, w]))
    }

    /// Rejects use with a buffer whose public key differs from the one the
    /// contexts absorbed.
    pub fn ensure_public_key(&self, pk: &[u8]) -> Result<(), PrehashError> {
        if self.pk != pk {
            return Err(PrehashError::Configuration(
                "unfinalized contexts were built for a different public key".into(),
            ));
        }
        Ok(())
    }
}
