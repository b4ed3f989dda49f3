//! Corpus item identity

use std::fmt::Debug;
use std::hash::Hash;

/// Identity of a corpus item (token, sentence, edge, ...).
///
/// Storages never inspect items; they only hash and compare them. Any type
/// with stable identity semantics qualifies, from plain `u64` ids to
/// interned handles.
pub trait Item: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T> Item for T where T: Eq + Hash + Clone + Debug + Send + Sync + 'static {}
