use super::aromatic;
use crate::model::atom::AtomId;
use crate::model::graph::{MolecularGraph, cycle_bonds, ordered};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

/// Classification of a perceived ring, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RingClass {
    Valid,
    Oversized,
    Undersized,
    Bridged,
    Spiro,
    NonAromatizable,
}

impl fmt::Display for RingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RingClass::Valid => "valid",
            RingClass::Oversized => "oversized",
            RingClass::Undersized => "undersized",
            RingClass::Bridged => "bridged",
            RingClass::Spiro => "spiro",
            RingClass::NonAromatizable => "non-aromatizable",
        };
        f.write_str(name)
    }
}

/// Size and fusion limits used to classify rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RingRules {
    pub min_size: usize,
    pub max_size: usize,
    /// Rings sharing more atoms than this with another ring are bridged.
    pub bridge_atom_cutoff: usize,
}

impl Default for RingRules {
    fn default() -> Self {
        Self {
            min_size: 3,
            max_size: 7,
            bridge_atom_cutoff: 2,
        }
    }
}

/// An ordered cycle of atom ids with its classification.
///
/// Atoms start at the smallest id and walk towards the smaller of its two
/// ring neighbours. Rings are derived views and never stored in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ring {
    pub atoms: Vec<AtomId>,
    pub class: RingClass,
}

impl Ring {
    pub fn size(&self) -> usize {
        self.atoms.len()
    }

    pub fn contains(&self, id: AtomId) -> bool {
        self.atoms.contains(&id)
    }

    pub fn min_atom(&self) -> Option<AtomId> {
        self.atoms.first().copied()
    }

    /// Ring bonds as ordered endpoint pairs, following the cycle.
    pub fn bonds(&self) -> impl Iterator<Item = (AtomId, AtomId)> + '_ {
        cycle_bonds(&self.atoms)
    }

    pub fn shared_atoms(&self, other: &Ring) -> Vec<AtomId> {
        let mine: BTreeSet<_> = self.atoms.iter().collect();
        let mut shared: Vec<_> = other
            .atoms
            .iter()
            .filter(|id| mine.contains(id))
            .copied()
            .collect();
        shared.sort();
        shared
    }

    /// Whether the ring size or fusion pattern needs a topology repair.
    pub fn needs_topology_repair(&self) -> bool {
        matches!(
            self.class,
            RingClass::Oversized | RingClass::Undersized | RingClass::Bridged
        )
    }
}

/// Perceives and classifies rings with the default [`RingRules`].
pub fn perceive_rings(graph: &MolecularGraph) -> Vec<Ring> {
    perceive_rings_with(graph, &RingRules::default())
}

/// Perceives and classifies rings, ordered by ascending minimum atom id.
pub fn perceive_rings_with(graph: &MolecularGraph, rules: &RingRules) -> Vec<Ring> {
    let cycles = graph.sssr();
    let sets: Vec<BTreeSet<AtomId>> = cycles
        .iter()
        .map(|c| c.iter().copied().collect())
        .collect();

    cycles
        .iter()
        .enumerate()
        .map(|(i, cycle)| {
            let overlaps: Vec<usize> = sets
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, other)| sets[i].intersection(other).count())
                .collect();
            let max_shared = overlaps.iter().copied().max().unwrap_or(0);

            let class = if cycle.len() > rules.max_size {
                RingClass::Oversized
            } else if cycle.len() < rules.min_size {
                RingClass::Undersized
            } else if max_shared > rules.bridge_atom_cutoff {
                RingClass::Bridged
            } else if aromatic::is_aromatic_ring(graph, cycle)
                && !aromatic::is_aromatizable(graph, cycle)
            {
                RingClass::NonAromatizable
            } else if overlaps.contains(&1) {
                RingClass::Spiro
            } else {
                RingClass::Valid
            };

            Ring {
                atoms: cycle.clone(),
                class,
            }
        })
        .collect()
}

/// Computes the smallest set of smallest rings.
///
/// Candidate cycles are generated from shortest-path trees rooted at every
/// atom; a cycle basis is then picked greedily by size using Gaussian
/// elimination over GF(2) on bond-incidence vectors.
pub(crate) fn find_sssr(graph: &MolecularGraph) -> Vec<Vec<AtomId>> {
    let bond_keys: Vec<(AtomId, AtomId)> = graph.bonds().map(|b| b.key()).collect();
    let cyclomatic = (bond_keys.len() + graph.component_count()).saturating_sub(graph.atom_count());
    if cyclomatic == 0 {
        return Vec::new();
    }

    let bond_index: BTreeMap<(AtomId, AtomId), usize> = bond_keys
        .iter()
        .enumerate()
        .map(|(i, key)| (*key, i))
        .collect();

    let mut candidates: BTreeSet<(usize, Vec<AtomId>)> = BTreeSet::new();
    for root in graph.atom_ids() {
        let parents = shortest_path_tree(graph, root);
        for &(u, v) in &bond_keys {
            if !parents.contains_key(&u) || !parents.contains_key(&v) {
                continue;
            }
            if parents[&u] == Some(v) || parents[&v] == Some(u) {
                continue;
            }
            let path_u = path_to_root(&parents, u);
            let path_v = path_to_root(&parents, v);
            let on_u: BTreeSet<_> = path_u.iter().collect();
            if path_v.iter().filter(|id| on_u.contains(id)).count() != 1 {
                continue;
            }

            let mut cycle: Vec<AtomId> = path_u.iter().rev().copied().collect();
            cycle.extend(path_v.iter().take(path_v.len() - 1));
            if cycle.len() >= 3 {
                let cycle = canonical_cycle(cycle);
                candidates.insert((cycle.len(), cycle));
            }
        }
    }

    let words = bond_keys.len().div_ceil(64);
    let mut basis: BTreeMap<usize, Vec<u64>> = BTreeMap::new();
    let mut rings = Vec::with_capacity(cyclomatic);

    for (_, cycle) in candidates {
        if rings.len() == cyclomatic {
            break;
        }
        let mut vector = vec![0u64; words];
        for key in cycle_bonds(&cycle) {
            if let Some(&i) = bond_index.get(&key) {
                vector[i / 64] ^= 1u64 << (i % 64);
            }
        }
        if insert_independent(&mut basis, vector) {
            rings.push(cycle);
        }
    }

    rings.sort_by(|a, b| (a[0], a.len(), a).cmp(&(b[0], b.len(), b)));
    rings
}

fn shortest_path_tree(
    graph: &MolecularGraph,
    root: AtomId,
) -> BTreeMap<AtomId, Option<AtomId>> {
    let mut parents = BTreeMap::from([(root, None)]);
    let mut queue = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
        for n in graph.neighbors(current) {
            if !parents.contains_key(&n) {
                parents.insert(n, Some(current));
                queue.push_back(n);
            }
        }
    }
    parents
}

/// Path from `id` up to the tree root, inclusive on both ends.
fn path_to_root(parents: &BTreeMap<AtomId, Option<AtomId>>, id: AtomId) -> Vec<AtomId> {
    let mut path = vec![id];
    let mut current = id;
    while let Some(Some(parent)) = parents.get(&current) {
        path.push(*parent);
        current = *parent;
    }
    path
}

fn canonical_cycle(mut cycle: Vec<AtomId>) -> Vec<AtomId> {
    let start = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, id)| **id)
        .map_or(0, |(i, _)| i);
    cycle.rotate_left(start);
    let n = cycle.len();
    if n > 2 && cycle[n - 1] < cycle[1] {
        cycle[1..].reverse();
    }
    cycle
}

/// Reduces `vector` against the basis; keeps it if anything survives.
fn insert_independent(basis: &mut BTreeMap<usize, Vec<u64>>, mut vector: Vec<u64>) -> bool {
    loop {
        let Some(pivot) = lowest_bit(&vector) else {
            return false;
        };
        match basis.get(&pivot) {
            Some(row) => {
                for (word, r) in vector.iter_mut().zip(row) {
                    *word ^= r;
                }
            }
            None => {
                basis.insert(pivot, vector);
                return true;
            }
        }
    }
}

fn lowest_bit(vector: &[u64]) -> Option<usize> {
    vector
        .iter()
        .enumerate()
        .find(|(_, w)| **w != 0)
        .map(|(i, w)| i * 64 + w.trailing_zeros() as usize)
}

/// Whether a bond lies on any perceived ring.
pub fn is_ring_bond(graph: &MolecularGraph, a: AtomId, b: AtomId) -> bool {
    let key = ordered(a, b);
    graph
        .sssr()
        .iter()
        .any(|ring| cycle_bonds(ring).any(|k| k == key))
}
