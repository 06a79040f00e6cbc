//! Union of fragment graphs through shared attachment atoms.
//!
//! Every fragment atom is copied into a fresh [`MolecularGraph`] under a new
//! id. Atoms that share an [`AttachmentKey`] are fused into a single atom.
//! Inputs are never modified, and a malformed correspondence aborts the merge
//! before any graph is produced.

mod correspondence;

pub use correspondence::{AttachmentKey, CorrespondenceMap};

use crate::error::Error;
use crate::model::atom::{Atom, AtomId, FragmentAtom, Provenance};
use crate::model::graph::{MolecularGraph, ordered};
use crate::model::types::BondOrder;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Fragment whose attribute values win when atoms are fused.
    pub primary: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self { primary: 0 }
    }
}

/// Merges `fragments` into one pre-validation candidate graph.
///
/// Fresh ids are assigned fragment by fragment in ascending source id order.
/// A fused atom takes element, charge, aromaticity, hydrogens and position
/// from its member in the primary fragment (the lowest fragment index if the
/// primary has no member) and is protected if any member was. Bonds are
/// de-duplicated by endpoint pair keeping the highest order; bonds that
/// collapse onto one fused atom are dropped.
pub fn merge(
    fragments: &[MolecularGraph],
    correspondences: &CorrespondenceMap,
    options: &MergeOptions,
) -> Result<MolecularGraph, Error> {
    if fragments.is_empty() {
        return Err(Error::invalid_graph("merge needs at least one fragment"));
    }
    check_correspondences(fragments, correspondences)?;

    let groups = correspondences.groups();
    let mut merged = MolecularGraph::new();
    let mut fused_ids: BTreeMap<AttachmentKey, AtomId> = BTreeMap::new();
    let mut id_map: BTreeMap<FragmentAtom, AtomId> = BTreeMap::new();

    for (index, fragment) in fragments.iter().enumerate() {
        for (source, atom) in fragment.atoms() {
            let slot = FragmentAtom {
                fragment: index,
                atom: source,
            };
            let Some(key) = correspondences.key_of(index, source) else {
                let copy = Atom {
                    provenance: Provenance::fragment(index, source),
                    ..atom.clone()
                };
                id_map.insert(slot, merged.add_atom(copy));
                continue;
            };

            if let Some(&id) = fused_ids.get(&key) {
                id_map.insert(slot, id);
                continue;
            }

            let members = groups.get(&key).cloned().unwrap_or_default();
            let fused = fuse(fragments, &members, options.primary)?;
            let id = merged.add_atom(fused);
            fused_ids.insert(key, id);
            id_map.insert(slot, id);
        }
    }

    let mut bonds: BTreeMap<(AtomId, AtomId), BondOrder> = BTreeMap::new();
    for (index, fragment) in fragments.iter().enumerate() {
        for bond in fragment.bonds() {
            let lookup = |atom: AtomId| {
                id_map
                    .get(&FragmentAtom {
                        fragment: index,
                        atom,
                    })
                    .copied()
            };
            let (Some(a), Some(b)) = (lookup(bond.a), lookup(bond.b)) else {
                continue;
            };
            if a == b {
                debug!(fragment = index, a = %bond.a, b = %bond.b, "dropped bond collapsed by fusion");
                continue;
            }
            bonds
                .entry(ordered(a, b))
                .and_modify(|order| {
                    if bond.order.value() > order.value() {
                        *order = bond.order;
                    }
                })
                .or_insert(bond.order);
        }
    }
    for ((a, b), order) in bonds {
        merged.add_bond(a, b, order)?;
    }
    merged.refresh_ring_flags();

    debug!(
        fragments = fragments.len(),
        fused = fused_ids.len(),
        atoms = merged.atom_count(),
        bonds = merged.bond_count(),
        "merged fragments"
    );
    Ok(merged)
}

fn check_correspondences(
    fragments: &[MolecularGraph],
    correspondences: &CorrespondenceMap,
) -> Result<(), Error> {
    for (slot, key) in correspondences.entries() {
        let Some(fragment) = fragments.get(slot.fragment) else {
            return Err(Error::malformed_correspondence(
                slot.fragment,
                slot.atom,
                format!(
                    "key {key} names fragment {} but only {} were given",
                    slot.fragment,
                    fragments.len()
                ),
            ));
        };
        if !fragment.contains_atom(slot.atom) {
            return Err(Error::malformed_correspondence(
                slot.fragment,
                slot.atom,
                format!(
                    "key {key} names an atom missing from a fragment of {} atoms",
                    fragment.atom_count()
                ),
            ));
        }
    }
    Ok(())
}

fn fuse(
    fragments: &[MolecularGraph],
    members: &std::collections::BTreeSet<FragmentAtom>,
    primary: usize,
) -> Result<Atom, Error> {
    let representative = members
        .iter()
        .find(|m| m.fragment == primary)
        .or_else(|| members.first())
        .copied()
        .ok_or_else(|| Error::invalid_graph("attachment key without members"))?;

    let atom_of = |m: &FragmentAtom| fragments.get(m.fragment).and_then(|f| f.atom(m.atom));
    let base = atom_of(&representative).ok_or_else(|| {
        Error::malformed_correspondence(
            representative.fragment,
            representative.atom,
            "atom vanished during merge",
        )
    })?;

    let protected = members
        .iter()
        .filter_map(|m| atom_of(m))
        .any(|atom| atom.protected);
    let fused: Vec<FragmentAtom> = members
        .iter()
        .copied()
        .filter(|m| *m != representative)
        .collect();

    Ok(Atom {
        protected,
        provenance: Provenance::Fragment {
            origin: representative,
            fused,
        },
        ..base.clone()
    })
}
