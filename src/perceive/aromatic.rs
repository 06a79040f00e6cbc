//! Aromaticity feasibility tests for single rings.
//!
//! A ring counts as aromatic-flagged when every one of its bonds is aromatic.
//! Such a ring is aromatizable when its π-electron count satisfies Hückel's
//! 4n+2 rule and a Kekulé structure exists around the ring alone.

use crate::model::atom::AtomId;
use crate::model::graph::{MolecularGraph, cycle_bonds};
use crate::model::types::{BondOrder, Element};
use std::collections::BTreeSet;

pub fn is_aromatic_ring(graph: &MolecularGraph, ring: &[AtomId]) -> bool {
    !ring.is_empty()
        && cycle_bonds(ring).all(|(a, b)| graph.bond(a, b).is_some_and(|bond| bond.is_aromatic()))
}

pub fn is_aromatizable(graph: &MolecularGraph, ring: &[AtomId]) -> bool {
    let members: BTreeSet<AtomId> = ring.iter().copied().collect();
    let mut electrons = Vec::with_capacity(ring.len());
    for &id in ring {
        match pi_electrons(graph, id, &members) {
            Some(e) => electrons.push(e),
            None => return false,
        }
    }

    if satisfies_huckel_and_kekule(&electrons) {
        return true;
    }

    // A bare two-connected N or P may be a pyrrole-type donor whose hydrogen
    // was never recorded; connection tables routinely drop it.
    ring.iter()
        .enumerate()
        .filter(|(i, id)| electrons[*i] == 1 && is_bare_pnictogen(graph, **id))
        .any(|(i, _)| {
            let mut promoted = electrons.clone();
            promoted[i] = 2;
            satisfies_huckel_and_kekule(&promoted)
        })
}

fn satisfies_huckel_and_kekule(electrons: &[u8]) -> bool {
    let total: u32 = electrons.iter().map(|e| u32::from(*e)).sum();
    let huckel = total >= 2 && (total - 2) % 4 == 0;
    huckel && kekule_feasible(electrons)
}

fn is_bare_pnictogen(graph: &MolecularGraph, id: AtomId) -> bool {
    graph.atom(id).is_some_and(|atom| {
        matches!(atom.element, Element::N | Element::P)
            && atom.formal_charge == 0
            && atom.hydrogens == 0
            && graph.degree(id) == 2
    })
}

/// π electrons an atom donates to the ring it sits in, or `None` when the
/// element cannot take part in an aromatic system.
fn pi_electrons(graph: &MolecularGraph, id: AtomId, ring: &BTreeSet<AtomId>) -> Option<u8> {
    let atom = graph.atom(id)?;
    let exocyclic_double = graph.bonds_of(id).any(|bond| {
        bond.order == BondOrder::Double && bond.other(id).is_some_and(|n| !ring.contains(&n))
    });

    match atom.element {
        Element::C | Element::Si => {
            if exocyclic_double {
                return Some(0);
            }
            match atom.formal_charge {
                0 => Some(1),
                1 => Some(0),
                -1 => Some(2),
                _ => None,
            }
        }
        Element::N | Element::P => match atom.formal_charge {
            1 => Some(1),
            -1 => Some(2),
            0 if atom.hydrogens > 0 || graph.degree(id) >= 3 => Some(2),
            0 => Some(1),
            _ => None,
        },
        Element::O | Element::S | Element::Se => match atom.formal_charge {
            0 => Some(2),
            1 => Some(1),
            _ => None,
        },
        Element::B => Some(0),
        _ => None,
    }
}

/// Atoms donating exactly one electron need a ring double bond, so every
/// run of them along the cycle must pair up.
fn kekule_feasible(electrons: &[u8]) -> bool {
    let n = electrons.len();
    let needs: Vec<bool> = electrons.iter().map(|e| *e == 1).collect();
    let Some(anchor) = needs.iter().position(|need| !need) else {
        return n % 2 == 0;
    };

    let mut run = 0;
    for step in 1..=n {
        if needs[(anchor + step) % n] {
            run += 1;
        } else {
            if run % 2 != 0 {
                return false;
            }
            run = 0;
        }
    }
    run % 2 == 0
}

/// Aromatic bonds that do not sit on any aromatic-flagged ring.
pub fn stray_aromatic_bonds(graph: &MolecularGraph) -> Vec<(AtomId, AtomId)> {
    let covered = aromatic_ring_bonds(graph);
    graph
        .bonds()
        .filter(|bond| bond.is_aromatic() && !covered.contains(&bond.key()))
        .map(|bond| bond.key())
        .collect()
}

/// Atoms flagged aromatic that do not sit on any aromatic-flagged ring.
pub fn stray_aromatic_atoms(graph: &MolecularGraph) -> Vec<AtomId> {
    let covered: BTreeSet<AtomId> = graph
        .sssr()
        .iter()
        .filter(|ring| is_aromatic_ring(graph, ring))
        .flat_map(|ring| ring.iter().copied())
        .collect();
    graph
        .atoms()
        .filter(|(id, atom)| atom.is_aromatic && !covered.contains(id))
        .map(|(id, _)| id)
        .collect()
}

fn aromatic_ring_bonds(graph: &MolecularGraph) -> BTreeSet<(AtomId, AtomId)> {
    graph
        .sssr()
        .iter()
        .filter(|ring| is_aromatic_ring(graph, ring))
        .flat_map(|ring| cycle_bonds(ring).collect::<Vec<_>>())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::Atom;

    fn aromatic_ring(elements: &[(Element, u8)]) -> (MolecularGraph, Vec<AtomId>) {
        let mut g = MolecularGraph::new();
        let ids: Vec<_> = elements
            .iter()
            .map(|(e, h)| g.add_atom(Atom::new(*e).aromatic().with_hydrogens(*h)))
            .collect();
        for i in 0..ids.len() {
            g.add_bond(ids[i], ids[(i + 1) % ids.len()], BondOrder::Aromatic)
                .unwrap();
        }
        (g, ids)
    }

    #[test]
    fn benzene_is_aromatizable() {
        let (g, ring) = aromatic_ring(&[(Element::C, 1); 6]);
        assert!(is_aromatic_ring(&g, &ring));
        assert!(is_aromatizable(&g, &ring));
    }

    #[test]
    fn pyrrole_and_pyridine_are_aromatizable() {
        let (g, ring) = aromatic_ring(&[
            (Element::N, 1),
            (Element::C, 1),
            (Element::C, 1),
            (Element::C, 1),
            (Element::C, 1),
        ]);
        assert!(is_aromatizable(&g, &ring));

        let (g, ring) = aromatic_ring(&[
            (Element::N, 0),
            (Element::C, 1),
            (Element::C, 1),
            (Element::C, 1),
            (Element::C, 1),
            (Element::C, 1),
        ]);
        assert!(is_aromatizable(&g, &ring));
    }

    #[test]
    fn pyrrole_without_recorded_hydrogen_is_aromatizable() {
        let (g, ring) = aromatic_ring(&[
            (Element::N, 0),
            (Element::C, 1),
            (Element::C, 1),
            (Element::C, 1),
            (Element::C, 1),
        ]);
        assert!(is_aromatizable(&g, &ring));

        // Imidazole with neither nitrogen carrying a hydrogen.
        let (g, ring) = aromatic_ring(&[
            (Element::N, 0),
            (Element::C, 1),
            (Element::N, 0),
            (Element::C, 1),
            (Element::C, 1),
        ]);
        assert!(is_aromatizable(&g, &ring));
    }

    #[test]
    fn cyclobutadiene_fails_huckel() {
        let (g, ring) = aromatic_ring(&[(Element::C, 1); 4]);
        assert!(!is_aromatizable(&g, &ring));
    }

    #[test]
    fn all_carbon_five_ring_fails() {
        let (g, ring) = aromatic_ring(&[(Element::C, 1); 5]);
        assert!(!is_aromatizable(&g, &ring));
    }

    #[test]
    fn kekule_runs_must_pair() {
        assert!(kekule_feasible(&[1, 1, 1, 1, 1, 1]));
        assert!(kekule_feasible(&[2, 1, 1, 1, 1]));
        assert!(!kekule_feasible(&[2, 1, 1, 1, 2, 1]));
        assert!(!kekule_feasible(&[1, 1, 1]));
    }

    #[test]
    fn unsupported_element_is_not_aromatizable() {
        let (g, ring) = aromatic_ring(&[
            (Element::Fe, 0),
            (Element::C, 1),
            (Element::C, 1),
            (Element::C, 1),
            (Element::C, 1),
        ]);
        assert!(!is_aromatizable(&g, &ring));
    }

    #[test]
    fn stray_aromatic_bond_outside_ring() {
        let mut g = MolecularGraph::new();
        let a = g.add_atom(Atom::new(Element::C).aromatic());
        let b = g.add_atom(Atom::new(Element::C));
        g.add_bond(a, b, BondOrder::Aromatic).unwrap();
        assert_eq!(stray_aromatic_bonds(&g), vec![(a, b)]);
        assert_eq!(stray_aromatic_atoms(&g), vec![a]);

        let (ring_graph, _) = aromatic_ring(&[(Element::C, 1); 6]);
        assert!(stray_aromatic_bonds(&ring_graph).is_empty());
        assert!(stray_aromatic_atoms(&ring_graph).is_empty());
    }
}
