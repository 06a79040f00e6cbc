use super::Repair;
use crate::error::Error;
use crate::model::atom::AtomId;
use crate::model::graph::MolecularGraph;
use crate::model::types::BondOrder;
use crate::perceive::{Ring, RingClass, RingRules, Violation, ViolationKind, ViolationTarget, perceive_rings_with};
use std::cmp::Reverse;
use std::collections::BTreeSet;

/// Applies at most one ring topology repair.
///
/// Out-of-range rings are handled before bridged pairs, each in ascending
/// order of their smallest atom id.
pub(super) fn repair_once(graph: &mut MolecularGraph, rules: &RingRules) -> Result<Repair, Error> {
    let rings = perceive_rings_with(graph, rules);
    let problems = ring_violations(&rings);
    if problems.is_empty() {
        return Ok(Repair::Clean);
    }

    for ring in rings
        .iter()
        .filter(|r| matches!(r.class, RingClass::Oversized | RingClass::Undersized))
    {
        if let Some((a, b)) = safe_ring_bond(graph, &rings, ring) {
            graph.remove_bond(a, b);
            return Ok(Repair::Applied(format!(
                "removed bond {a}-{b} to open {} ring of size {}",
                ring.class,
                ring.size()
            )));
        }
        if let Some(id) = contract_ring(graph, ring)? {
            return Ok(Repair::Applied(format!(
                "deleted atom {id} to contract {} ring of size {}",
                ring.class,
                ring.size()
            )));
        }
    }

    for (i, first) in rings.iter().enumerate() {
        for second in &rings[i + 1..] {
            let shared = first.shared_atoms(second);
            if shared.len() <= rules.bridge_atom_cutoff {
                continue;
            }
            if let Some(description) = break_bridge(graph, first, second, &shared) {
                return Ok(Repair::Applied(description));
            }
        }
    }

    Ok(Repair::Stuck(problems))
}

/// One violation per ring whose topology needs repair.
pub(super) fn ring_violations(rings: &[Ring]) -> Vec<Violation> {
    rings
        .iter()
        .filter(|r| r.needs_topology_repair())
        .map(|r| {
            Violation::new(
                ViolationTarget::Ring(r.atoms.clone()),
                ViolationKind::InvalidRing(r.class),
            )
        })
        .collect()
}

/// A bond whose removal is safe: it lies on no other ring, neither end is
/// protected and the graph stays connected.
pub(super) fn is_safe_to_remove(
    graph: &MolecularGraph,
    rings: &[Ring],
    owner: Option<&Ring>,
    (a, b): (AtomId, AtomId),
) -> bool {
    let protected = |id: AtomId| graph.atom(id).is_some_and(|atom| atom.protected);
    if protected(a) || protected(b) {
        return false;
    }
    let in_other_ring = rings
        .iter()
        .filter(|r| owner.map_or(true, |o| o.atoms != r.atoms))
        .any(|r| r.bonds().any(|key| key == (a, b)));
    !in_other_ring && graph.removal_keeps_connected(a, b)
}

/// Highest-order safe bond of `ring`, ties broken by ascending endpoint pair.
fn safe_ring_bond(graph: &MolecularGraph, rings: &[Ring], ring: &Ring) -> Option<(AtomId, AtomId)> {
    let mut candidates: Vec<((AtomId, AtomId), u8)> = ring
        .bonds()
        .filter(|key| is_safe_to_remove(graph, rings, Some(ring), *key))
        .filter_map(|key| graph.bond(key.0, key.1).map(|bond| (key, order_rank(bond.order))))
        .collect();
    candidates.sort_by_key(|(key, rank)| (Reverse(*rank), *key));
    candidates.first().map(|(key, _)| *key)
}

/// Deletes the least-connected unprotected ring atom and bonds its two ring
/// neighbours together, shrinking the ring by one.
///
/// Atoms whose deletion keeps the graph in one piece are preferred. When
/// every candidate carries a substituent that would be cut off, the
/// substituents of the deleted atom move to the lower-id ring neighbour.
fn contract_ring(graph: &mut MolecularGraph, ring: &Ring) -> Result<Option<AtomId>, Error> {
    let n = ring.size();
    let neighbours = |index: usize| (ring.atoms[(index + n - 1) % n], ring.atoms[(index + 1) % n]);

    let mut victims: Vec<(usize, AtomId)> = ring
        .atoms
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, id)| graph.atom(*id).is_some_and(|atom| !atom.protected))
        .collect();
    victims.sort_by_key(|(_, id)| (graph.degree(*id), *id));

    let components = graph.component_count();
    let chosen = victims
        .iter()
        .copied()
        .find(|&(index, id)| {
            let (prev, next) = neighbours(index);
            let mut trial = graph.clone();
            trial.remove_atom(id);
            if prev != next && trial.bond(prev, next).is_none() {
                // Both endpoints survive the removal.
                let _ = trial.add_bond(prev, next, BondOrder::Single);
            }
            trial.component_count() <= components
        })
        .or_else(|| victims.first().copied());
    let Some((index, id)) = chosen else {
        return Ok(None);
    };

    let (prev, next) = neighbours(index);
    let anchor = prev.min(next);
    let substituents: Vec<(AtomId, BondOrder)> = graph
        .bonds_of(id)
        .filter_map(|bond| {
            let other = bond.other(id)?;
            (other != prev && other != next).then_some((other, bond.order))
        })
        .collect();

    graph.remove_atom(id);
    if prev != next && graph.bond(prev, next).is_none() {
        graph.add_bond(prev, next, BondOrder::Single)?;
    }
    if graph.component_count() > components {
        for (atom, order) in substituents {
            if atom != anchor && graph.bond(anchor, atom).is_none() {
                graph.add_bond(anchor, atom, order)?;
            }
        }
    }
    Ok(Some(id))
}

fn break_bridge(
    graph: &mut MolecularGraph,
    first: &Ring,
    second: &Ring,
    shared: &[AtomId],
) -> Option<String> {
    let second_bonds: BTreeSet<(AtomId, AtomId)> = second.bonds().collect();
    let mut shared_bonds: Vec<(AtomId, AtomId)> = first
        .bonds()
        .filter(|key| second_bonds.contains(key))
        .collect();
    shared_bonds.sort();

    let protected = |id: AtomId| graph.atom(id).is_some_and(|atom| atom.protected);
    let bond = shared_bonds
        .into_iter()
        .find(|&(a, b)| !protected(a) && !protected(b) && graph.removal_keeps_connected(a, b));
    if let Some((a, b)) = bond {
        graph.remove_bond(a, b);
        return Some(format!("removed shared bond {a}-{b} between bridged rings"));
    }

    let atom = shared
        .iter()
        .copied()
        .filter(|id| !protected(*id))
        .min_by_key(|id| (graph.degree(*id), *id))?;
    graph.remove_atom(atom);
    Some(format!("deleted shared atom {atom} between bridged rings"))
}

pub(super) fn order_rank(order: BondOrder) -> u8 {
    match order {
        BondOrder::Single => 1,
        BondOrder::Aromatic => 2,
        BondOrder::Double => 3,
        BondOrder::Triple => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::Atom;
    use crate::model::types::Element;

    fn cycle(n: u32, protected: &[u32]) -> MolecularGraph {
        let mut g = MolecularGraph::new();
        for i in 0..n {
            let atom = Atom::new(Element::C);
            g.add_atom(if protected.contains(&i) { atom.protected() } else { atom });
        }
        for i in 0..n {
            g.add_bond(AtomId(i), AtomId((i + 1) % n), BondOrder::Single)
                .unwrap();
        }
        g
    }

    #[test]
    fn clean_ring_needs_nothing() {
        let mut g = cycle(6, &[]);
        assert_eq!(repair_once(&mut g, &RingRules::default()).unwrap(), Repair::Clean);
    }

    #[test]
    fn oversized_ring_loses_highest_order_safe_bond() {
        let mut g = cycle(8, &[]);
        g.add_bond(AtomId(3), AtomId(4), BondOrder::Double).unwrap();
        let repair = repair_once(&mut g, &RingRules::default()).unwrap();
        assert!(matches!(repair, Repair::Applied(_)));
        assert!(g.bond(AtomId(3), AtomId(4)).is_none());
        assert!(g.sssr().is_empty());
        assert!(g.is_connected());
    }

    #[test]
    fn oversized_ring_ties_break_by_ascending_pair() {
        let mut g = cycle(8, &[]);
        repair_once(&mut g, &RingRules::default()).unwrap();
        assert!(g.bond(AtomId(0), AtomId(1)).is_none());
        assert_eq!(g.bond_count(), 7);
    }

    #[test]
    fn fully_guarded_ring_is_contracted() {
        // Every bond has a protected endpoint; atom 7 is the only deletable one.
        let mut g = cycle(8, &[0, 1, 2, 3, 4, 5, 6]);
        let repair = repair_once(&mut g, &RingRules::default()).unwrap();
        assert!(matches!(repair, Repair::Applied(_)));
        assert!(!g.contains_atom(AtomId(7)));
        assert!(g.bond(AtomId(6), AtomId(0)).is_some());
        assert_eq!(g.sssr().len(), 1);
        assert_eq!(g.sssr()[0].len(), 7);
    }

    #[test]
    fn contraction_prefers_an_atom_whose_loss_keeps_the_graph_whole() {
        // Atoms 1 and 3 are deletable and both of degree 3: atom 1 carries a
        // methyl, atom 3 is fused to a four-ring through 3-8-9-4.
        let mut g = cycle(8, &[0, 2, 4, 5, 6, 7]);
        let methyl = g.add_atom(Atom::new(Element::C));
        g.add_bond(AtomId(1), methyl, BondOrder::Single).unwrap();
        let y = g.add_atom(Atom::new(Element::C));
        let z = g.add_atom(Atom::new(Element::C));
        g.add_bond(AtomId(3), y, BondOrder::Single).unwrap();
        g.add_bond(y, z, BondOrder::Single).unwrap();
        g.add_bond(z, AtomId(4), BondOrder::Single).unwrap();

        repair_once(&mut g, &RingRules::default()).unwrap();
        assert!(g.contains_atom(AtomId(1)));
        assert!(!g.contains_atom(AtomId(3)));
        assert!(g.bond(AtomId(2), AtomId(4)).is_some());
        assert!(g.is_connected());
    }

    #[test]
    fn substituents_of_a_contracted_atom_are_reattached() {
        // Every deletable ring atom carries a methyl.
        let mut g = cycle(8, &[0, 2, 4, 6]);
        let methyls: Vec<AtomId> = [1, 3, 5, 7]
            .iter()
            .map(|&i| {
                let methyl = g.add_atom(Atom::new(Element::C));
                g.add_bond(AtomId(i), methyl, BondOrder::Single).unwrap();
                methyl
            })
            .collect();

        repair_once(&mut g, &RingRules::default()).unwrap();
        assert!(!g.contains_atom(AtomId(1)));
        assert!(g.bond(AtomId(0), AtomId(2)).is_some());
        assert!(g.bond(AtomId(0), methyls[0]).is_some());
        assert!(g.is_connected());
        assert_eq!(g.sssr()[0].len(), 7);
    }

    #[test]
    fn fully_protected_ring_is_stuck() {
        let mut g = cycle(9, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        let Repair::Stuck(violations) = repair_once(&mut g, &RingRules::default()).unwrap() else {
            panic!("expected a stuck repair");
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].kind,
            ViolationKind::InvalidRing(RingClass::Oversized)
        );
        let ViolationTarget::Ring(atoms) = &violations[0].target else {
            panic!("expected a ring target");
        };
        assert_eq!(atoms.len(), 9);
    }

    #[test]
    fn bridged_pair_loses_a_shared_bond() {
        let mut g = MolecularGraph::new();
        for _ in 0..8 {
            g.add_atom(Atom::new(Element::C));
        }
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0), (0, 6), (6, 7), (7, 3)] {
            g.add_bond(AtomId(a), AtomId(b), BondOrder::Single).unwrap();
        }
        let before = g.bond_count();
        let repair = repair_once(&mut g, &RingRules::default()).unwrap();
        assert!(matches!(repair, Repair::Applied(_)));
        assert_eq!(g.bond_count(), before - 1);
        assert!(g.is_connected());
    }
}
