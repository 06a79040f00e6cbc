use super::valence::clear_orphaned_aromatic_flags;
use crate::error::Error;
use crate::model::atom::AtomId;
use crate::model::graph::{MolecularGraph, cycle_bonds};
use crate::model::types::BondOrder;
use crate::perceive::aromatic::{is_aromatic_ring, is_aromatizable, stray_aromatic_atoms, stray_aromatic_bonds};
use crate::perceive::valence::{ValenceTable, free_valence};
use std::collections::BTreeSet;
use tracing::debug;

/// Outcome of one de-aromatisation sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) struct Sweep {
    pub repairs: usize,
    /// More problems were found than the budget allowed.
    pub exhausted: bool,
}

/// Rewrites every infeasible aromatic ring and stray aromatic bond as an
/// explicit Kekulé pattern, spending at most `budget` repairs.
pub(super) fn dearomatize(
    graph: &mut MolecularGraph,
    table: &ValenceTable,
    budget: usize,
) -> Result<Sweep, Error> {
    let aromatic_rings: Vec<Vec<AtomId>> = graph
        .sssr()
        .iter()
        .filter(|ring| is_aromatic_ring(graph, ring))
        .cloned()
        .collect();
    let (bad, good): (Vec<_>, Vec<_>) = aromatic_rings
        .into_iter()
        .partition(|ring| !is_aromatizable(graph, ring));
    let keep_flag: BTreeSet<AtomId> = good.iter().flatten().copied().collect();
    let keep_bonds: BTreeSet<(AtomId, AtomId)> =
        good.iter().flat_map(|ring| cycle_bonds(ring)).collect();

    let mut sweep = Sweep::default();
    for ring in &bad {
        if sweep.repairs == budget {
            sweep.exhausted = true;
            return Ok(sweep);
        }
        kekulize_ring(graph, table, ring, &keep_flag, &keep_bonds)?;
        sweep.repairs += 1;
    }

    for (a, b) in stray_aromatic_bonds(graph) {
        if sweep.repairs == budget {
            sweep.exhausted = true;
            return Ok(sweep);
        }
        if let Some(bond) = graph.bond_mut(a, b) {
            bond.order = BondOrder::Single;
        }
        clear_orphaned_aromatic_flags(graph, &[a, b]);
        debug!(a = %a, b = %b, "demoted stray aromatic bond to single");
        sweep.repairs += 1;
    }

    for id in stray_aromatic_atoms(graph) {
        if let Some(atom) = graph.atom_mut(id) {
            atom.is_aromatic = false;
        }
    }

    Ok(sweep)
}

/// Turns the ring's aromatic bonds into single bonds, then walks the ring
/// from its smallest atom placing double bonds between neighbours that both
/// still have free valence.
///
/// Bonds and atom flags shared with a ring that stays aromatic are left as
/// they are.
fn kekulize_ring(
    graph: &mut MolecularGraph,
    table: &ValenceTable,
    ring: &[AtomId],
    keep_flag: &BTreeSet<AtomId>,
    keep_bonds: &BTreeSet<(AtomId, AtomId)>,
) -> Result<(), Error> {
    for (a, b) in cycle_bonds(ring) {
        if keep_bonds.contains(&(a, b)) {
            continue;
        }
        if let Some(bond) = graph.bond_mut(a, b) {
            if bond.is_aromatic() {
                bond.order = BondOrder::Single;
            }
        }
    }
    for &id in ring {
        if keep_flag.contains(&id) {
            continue;
        }
        if let Some(atom) = graph.atom_mut(id) {
            atom.is_aromatic = false;
        }
    }

    let n = ring.len();
    for i in 0..n {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        let single = graph
            .bond(a, b)
            .is_some_and(|bond| bond.order == BondOrder::Single);
        if single && free_valence(graph, table, a)? >= 1 && free_valence(graph, table, b)? >= 1 {
            if let Some(bond) = graph.bond_mut(a, b) {
                bond.order = BondOrder::Double;
            }
        }
    }

    debug!(ring = ?ring, "de-aromatised ring");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::Atom;
    use crate::model::types::Element;
    use crate::perceive::{default_table, validate};

    fn aromatic_cycle(elements: &[(Element, u8)]) -> MolecularGraph {
        let mut g = MolecularGraph::new();
        let ids: Vec<_> = elements
            .iter()
            .map(|(e, h)| g.add_atom(Atom::new(*e).aromatic().with_hydrogens(*h)))
            .collect();
        for i in 0..ids.len() {
            g.add_bond(ids[i], ids[(i + 1) % ids.len()], BondOrder::Aromatic)
                .unwrap();
        }
        g
    }

    #[test]
    fn four_ring_becomes_alternating() {
        let mut g = aromatic_cycle(&[(Element::C, 1); 4]);
        let sweep = dearomatize(&mut g, default_table().unwrap(), 10).unwrap();
        assert_eq!(sweep, Sweep { repairs: 1, exhausted: false });

        let orders: Vec<_> = cycle_bonds(&[AtomId(0), AtomId(1), AtomId(2), AtomId(3)])
            .map(|(a, b)| g.bond(a, b).unwrap().order)
            .collect();
        assert_eq!(
            orders,
            vec![BondOrder::Double, BondOrder::Single, BondOrder::Double, BondOrder::Single]
        );
        assert!(g.atoms().all(|(_, atom)| !atom.is_aromatic));
        assert!(validate(&g).unwrap().is_empty());
    }

    #[test]
    fn fused_benzene_survives_its_four_ring() {
        // Benzocyclobutadiene: benzene 0..5 sharing the 0-5 bond with 0-6-7-5.
        let mut g = aromatic_cycle(&[
            (Element::C, 0),
            (Element::C, 1),
            (Element::C, 1),
            (Element::C, 1),
            (Element::C, 1),
            (Element::C, 0),
        ]);
        let c6 = g.add_atom(Atom::new(Element::C).aromatic().with_hydrogens(1));
        let c7 = g.add_atom(Atom::new(Element::C).aromatic().with_hydrogens(1));
        g.add_bond(AtomId(0), c6, BondOrder::Aromatic).unwrap();
        g.add_bond(c6, c7, BondOrder::Aromatic).unwrap();
        g.add_bond(c7, AtomId(5), BondOrder::Aromatic).unwrap();

        let sweep = dearomatize(&mut g, default_table().unwrap(), 10).unwrap();
        assert_eq!(sweep, Sweep { repairs: 1, exhausted: false });

        let benzene: Vec<AtomId> = (0..6).map(AtomId).collect();
        assert!(cycle_bonds(&benzene).all(|(a, b)| g.bond(a, b).unwrap().is_aromatic()));
        assert!(benzene.iter().all(|id| g.atom(*id).unwrap().is_aromatic));
        assert!(!g.atom(c6).unwrap().is_aromatic && !g.atom(c7).unwrap().is_aromatic);
        assert_eq!(g.bond(AtomId(0), c6).unwrap().order, BondOrder::Single);
        assert_eq!(g.bond(c6, c7).unwrap().order, BondOrder::Double);
        assert_eq!(g.bond(c7, AtomId(5)).unwrap().order, BondOrder::Single);
        assert!(validate(&g).unwrap().is_empty());
    }

    #[test]
    fn benzene_is_left_alone() {
        let mut g = aromatic_cycle(&[(Element::C, 1); 6]);
        let before = g.canonical_form();
        let sweep = dearomatize(&mut g, default_table().unwrap(), 10).unwrap();
        assert_eq!(sweep.repairs, 0);
        assert_eq!(g.canonical_form(), before);
    }

    #[test]
    fn budget_is_respected() {
        let mut g = aromatic_cycle(&[(Element::C, 1); 4]);
        let sweep = dearomatize(&mut g, default_table().unwrap(), 0).unwrap();
        assert!(sweep.exhausted);
        assert_eq!(sweep.repairs, 0);
    }
}
