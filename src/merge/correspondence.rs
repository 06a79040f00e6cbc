use crate::error::Error;
use crate::model::atom::{AtomId, FragmentAtom};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Shared identity of atoms that occupy the same position across fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentKey(pub u32);

impl fmt::Display for AttachmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Maps `(fragment index, atom id)` pairs to attachment keys.
///
/// Produced by an external alignment step and consumed only by
/// [`merge`](super::merge).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrespondenceMap {
    entries: BTreeMap<FragmentAtom, AttachmentKey>,
}

impl CorrespondenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `key` to an atom.
    ///
    /// Re-inserting the same pair is a no-op; giving an atom a second,
    /// different key is an error.
    pub fn insert(&mut self, fragment: usize, atom: AtomId, key: AttachmentKey) -> Result<(), Error> {
        let slot = FragmentAtom { fragment, atom };
        match self.entries.get(&slot) {
            Some(existing) if *existing != key => Err(Error::malformed_correspondence(
                fragment,
                atom,
                format!("atom already mapped to {existing}, cannot also map to {key}"),
            )),
            _ => {
                self.entries.insert(slot, key);
                Ok(())
            }
        }
    }

    /// Declares that two fragment atoms are the same atom, under a fresh key.
    pub fn pair(&mut self, first: (usize, AtomId), second: (usize, AtomId)) -> Result<AttachmentKey, Error> {
        let key = self
            .entries
            .get(&FragmentAtom {
                fragment: first.0,
                atom: first.1,
            })
            .copied()
            .unwrap_or_else(|| self.next_key());
        self.insert(first.0, first.1, key)?;
        self.insert(second.0, second.1, key)?;
        Ok(key)
    }

    pub fn key_of(&self, fragment: usize, atom: AtomId) -> Option<AttachmentKey> {
        self.entries.get(&FragmentAtom { fragment, atom }).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (FragmentAtom, AttachmentKey)> + '_ {
        self.entries.iter().map(|(slot, key)| (*slot, *key))
    }

    /// Members of every key, in ascending fragment and atom order.
    pub fn groups(&self) -> BTreeMap<AttachmentKey, BTreeSet<FragmentAtom>> {
        let mut groups: BTreeMap<AttachmentKey, BTreeSet<FragmentAtom>> = BTreeMap::new();
        for (slot, key) in &self.entries {
            groups.entry(*key).or_default().insert(*slot);
        }
        groups
    }

    fn next_key(&self) -> AttachmentKey {
        AttachmentKey(
            self.entries
                .values()
                .map(|k| k.0 + 1)
                .max()
                .unwrap_or(0),
        )
    }
}
