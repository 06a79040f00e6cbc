use super::atom::{Atom, AtomId};
use super::types::BondOrder;
use crate::error::Error;
use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::Write as _;

/// A bond between two distinct atoms.
///
/// Endpoints are always stored with `a < b` so that a bond has a single
/// identity regardless of the order it was created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub a: AtomId,
    pub b: AtomId,
    pub order: BondOrder,
    /// Set when the bond lies on a perceived ring; see [`MolecularGraph::refresh_ring_flags`].
    pub in_ring: bool,
}

impl Bond {
    pub fn new(a: AtomId, b: AtomId, order: BondOrder) -> Self {
        let (a, b) = ordered(a, b);
        Self {
            a,
            b,
            order,
            in_ring: false,
        }
    }

    #[inline]
    pub fn key(&self) -> (AtomId, AtomId) {
        (self.a, self.b)
    }

    #[inline]
    pub fn contains(&self, id: AtomId) -> bool {
        self.a == id || self.b == id
    }

    /// The endpoint opposite `id`, or `None` if `id` is not an endpoint.
    pub fn other(&self, id: AtomId) -> Option<AtomId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }

    #[inline]
    pub fn is_aromatic(&self) -> bool {
        self.order == BondOrder::Aromatic
    }
}

#[inline]
pub(crate) fn ordered(a: AtomId, b: AtomId) -> (AtomId, AtomId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Owning container for a molecule's atoms and bonds.
///
/// Atoms live in an id-keyed arena and bonds are keyed by their ordered
/// endpoint pair, so deleting or fusing atoms is plain map bookkeeping.
/// Ids are handed out monotonically and never reused. The smallest set of
/// smallest rings is computed lazily and dropped on every structural edit.
#[derive(Debug, Clone, Default)]
pub struct MolecularGraph {
    atoms: BTreeMap<AtomId, Atom>,
    bonds: BTreeMap<(AtomId, AtomId), Bond>,
    adjacency: BTreeMap<AtomId, BTreeSet<AtomId>>,
    next_id: u32,
    rings: OnceCell<Vec<Vec<AtomId>>>,
}

impl MolecularGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn add_atom(&mut self, atom: Atom) -> AtomId {
        let id = AtomId(self.next_id);
        self.next_id += 1;
        self.atoms.insert(id, atom);
        self.adjacency.insert(id, BTreeSet::new());
        self.invalidate_rings();
        id
    }

    /// Adds a bond, or overwrites the order of an existing one.
    pub fn add_bond(&mut self, a: AtomId, b: AtomId, order: BondOrder) -> Result<(), Error> {
        if a == b {
            return Err(Error::invalid_graph(format!("self bond on atom {a}")));
        }
        for id in [a, b] {
            if !self.atoms.contains_key(&id) {
                return Err(Error::invalid_graph(format!(
                    "bond {a}-{b} references missing atom {id}"
                )));
            }
        }

        let key = ordered(a, b);
        match self.bonds.get_mut(&key) {
            Some(existing) => existing.order = order,
            None => {
                self.bonds.insert(key, Bond::new(a, b, order));
                self.link(a, b);
                self.invalidate_rings();
            }
        }
        Ok(())
    }

    pub fn remove_bond(&mut self, a: AtomId, b: AtomId) -> Option<Bond> {
        let removed = self.bonds.remove(&ordered(a, b))?;
        if let Some(set) = self.adjacency.get_mut(&a) {
            set.remove(&b);
        }
        if let Some(set) = self.adjacency.get_mut(&b) {
            set.remove(&a);
        }
        self.invalidate_rings();
        Some(removed)
    }

    /// Removes an atom together with every bond touching it.
    pub fn remove_atom(&mut self, id: AtomId) -> Option<Atom> {
        let atom = self.atoms.remove(&id)?;
        let neighbors = self.adjacency.remove(&id).unwrap_or_default();
        for n in neighbors {
            self.bonds.remove(&ordered(id, n));
            if let Some(set) = self.adjacency.get_mut(&n) {
                set.remove(&id);
            }
        }
        self.invalidate_rings();
        Some(atom)
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(&id)
    }

    /// Mutable access to chemistry attributes. Does not touch topology, so
    /// the ring cache survives.
    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(&id)
    }

    pub fn contains_atom(&self, id: AtomId) -> bool {
        self.atoms.contains_key(&id)
    }

    pub fn atoms(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atoms.iter().map(|(id, atom)| (*id, atom))
    }

    pub fn atom_ids(&self) -> impl Iterator<Item = AtomId> + '_ {
        self.atoms.keys().copied()
    }

    pub fn bond(&self, a: AtomId, b: AtomId) -> Option<&Bond> {
        self.bonds.get(&ordered(a, b))
    }

    pub fn bond_mut(&mut self, a: AtomId, b: AtomId) -> Option<&mut Bond> {
        self.bonds.get_mut(&ordered(a, b))
    }

    pub fn bonds(&self) -> impl Iterator<Item = &Bond> {
        self.bonds.values()
    }

    /// Bonds touching `id`, ordered by the neighbour's id.
    pub fn bonds_of(&self, id: AtomId) -> impl Iterator<Item = &Bond> {
        self.neighbors(id)
            .filter_map(move |n| self.bonds.get(&ordered(id, n)))
    }

    pub fn neighbors(&self, id: AtomId) -> impl Iterator<Item = AtomId> + '_ {
        self.adjacency
            .get(&id)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    pub fn degree(&self, id: AtomId) -> usize {
        self.adjacency.get(&id).map_or(0, BTreeSet::len)
    }

    /// Number of connected components; zero for an empty graph.
    pub fn component_count(&self) -> usize {
        let mut seen = BTreeSet::new();
        let mut count = 0;
        for start in self.atoms.keys() {
            if seen.contains(start) {
                continue;
            }
            count += 1;
            let mut queue = VecDeque::from([*start]);
            seen.insert(*start);
            while let Some(current) = queue.pop_front() {
                for n in self.neighbors(current) {
                    if seen.insert(n) {
                        queue.push_back(n);
                    }
                }
            }
        }
        count
    }

    pub fn is_connected(&self) -> bool {
        self.component_count() <= 1
    }

    /// Whether `to` can be reached from `from` without walking the bond `skip`.
    pub fn reachable_without(&self, from: AtomId, to: AtomId, skip: (AtomId, AtomId)) -> bool {
        let skip = ordered(skip.0, skip.1);
        let mut seen = BTreeSet::from([from]);
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            if current == to {
                return true;
            }
            for n in self.neighbors(current) {
                if ordered(current, n) == skip {
                    continue;
                }
                if seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        false
    }

    /// Whether deleting the bond `a`-`b` leaves its endpoints connected.
    pub fn removal_keeps_connected(&self, a: AtomId, b: AtomId) -> bool {
        self.reachable_without(a, b, (a, b))
    }

    /// Smallest set of smallest rings, as ordered atom cycles.
    ///
    /// Computed on first access after any structural edit.
    pub fn sssr(&self) -> &[Vec<AtomId>] {
        self.rings
            .get_or_init(|| crate::perceive::rings::find_sssr(self))
    }

    /// Re-derives every bond's `in_ring` flag from the current ring set.
    pub fn refresh_ring_flags(&mut self) {
        let ring_bonds: BTreeSet<(AtomId, AtomId)> = self
            .sssr()
            .iter()
            .flat_map(|ring| cycle_bonds(ring))
            .collect();
        for (key, bond) in self.bonds.iter_mut() {
            bond.in_ring = ring_bonds.contains(key);
        }
    }

    /// Stable textual serialisation of atoms and bonds.
    ///
    /// Two graphs with the same ids, chemistry and bonds produce the same
    /// string. Coordinates and provenance are left out.
    pub fn canonical_form(&self) -> String {
        let mut out = String::new();
        for (id, atom) in &self.atoms {
            let _ = write!(
                out,
                "{}:{}{:+}{}h{}{};",
                id.0,
                atom.element.symbol(),
                atom.formal_charge,
                if atom.is_aromatic { "ar" } else { "" },
                atom.hydrogens,
                if atom.protected { "!" } else { "" },
            );
        }
        out.push('|');
        for bond in self.bonds.values() {
            let symbol = match bond.order {
                BondOrder::Single => '-',
                BondOrder::Double => '=',
                BondOrder::Triple => '#',
                BondOrder::Aromatic => ':',
            };
            let _ = write!(out, "{}{}{};", bond.a.0, symbol, bond.b.0);
        }
        out
    }

    fn link(&mut self, a: AtomId, b: AtomId) {
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
    }

    fn invalidate_rings(&mut self) {
        self.rings.take();
    }
}

/// Consecutive atom pairs of a closed cycle, as ordered bond keys.
pub(crate) fn cycle_bonds(ring: &[AtomId]) -> impl Iterator<Item = (AtomId, AtomId)> + '_ {
    let n = ring.len();
    (0..n).map(move |i| ordered(ring[i], ring[(i + 1) % n]))
}
