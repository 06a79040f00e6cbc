use super::Repair;
use super::rings::{is_safe_to_remove, order_rank};
use crate::error::Error;
use crate::model::atom::AtomId;
use crate::model::graph::MolecularGraph;
use crate::model::types::BondOrder;
use crate::perceive::{RingRules, ValenceTable, ViolationKind, perceive_rings_with, validate_with};
use std::cmp::Reverse;

/// Applies at most one valence repair.
///
/// Dangling attachments are deleted before any over-valent atom is touched.
/// An over-valent atom first sheds a hydrogen, then has one bond demoted,
/// and as a last resort loses a safe ring bond.
pub(super) fn repair_once(
    graph: &mut MolecularGraph,
    table: &ValenceTable,
    rules: &RingRules,
) -> Result<Repair, Error> {
    let violations = validate_with(graph, table)?;

    let dangling: Vec<AtomId> = violations
        .iter()
        .filter(|v| v.kind == ViolationKind::DanglingAttachment)
        .filter_map(|v| v.atom())
        .collect();
    let over_valent = violations
        .iter()
        .filter(|v| v.kind == ViolationKind::OverValent)
        .find_map(|v| v.atom());

    if dangling.is_empty() && over_valent.is_none() {
        return Ok(Repair::Clean);
    }

    if let Some(id) = dangling
        .iter()
        .copied()
        .find(|id| graph.atom(*id).is_some_and(|atom| !atom.protected))
    {
        graph.remove_atom(id);
        return Ok(Repair::Applied(format!("deleted dangling attachment {id}")));
    }

    let Some(id) = over_valent else {
        return Ok(Repair::Stuck(violations));
    };

    if let Some(atom) = graph.atom_mut(id).filter(|atom| atom.hydrogens > 0) {
        atom.hydrogens -= 1;
        return Ok(Repair::Applied(format!("removed a hydrogen from over-valent atom {id}")));
    }

    if let Some((a, b, demoted)) = demotion_candidate(graph, id) {
        let was_aromatic = graph.bond(a, b).is_some_and(|bond| bond.is_aromatic());
        if let Some(bond) = graph.bond_mut(a, b) {
            bond.order = demoted;
        }
        if was_aromatic {
            clear_orphaned_aromatic_flags(graph, &[a, b]);
        }
        return Ok(Repair::Applied(format!(
            "demoted bond {a}-{b} to {demoted} on over-valent atom {id}"
        )));
    }

    let rings = perceive_rings_with(graph, rules);
    let ring_bond = graph
        .bonds_of(id)
        .map(|bond| bond.key())
        .filter(|key| rings.iter().any(|r| r.bonds().any(|k| k == *key)))
        .find(|key| {
            let owner = rings.iter().find(|r| r.bonds().any(|k| k == *key));
            is_safe_to_remove(graph, &rings, owner, *key)
        });
    if let Some((a, b)) = ring_bond {
        graph.remove_bond(a, b);
        return Ok(Repair::Applied(format!(
            "removed ring bond {a}-{b} from over-valent atom {id}"
        )));
    }

    Ok(Repair::Stuck(violations))
}

/// The lowest-priority demotable bond on `id`.
///
/// Non-aromatic bonds go before aromatic ones, bonds to unprotected
/// neighbours before protected ones, higher orders first, then ascending
/// endpoint pair.
fn demotion_candidate(graph: &MolecularGraph, id: AtomId) -> Option<(AtomId, AtomId, BondOrder)> {
    let mut candidates: Vec<_> = graph
        .bonds_of(id)
        .filter_map(|bond| {
            let demoted = bond.order.demoted()?;
            let neighbor = bond.other(id)?;
            let neighbor_protected = graph.atom(neighbor).is_some_and(|atom| atom.protected);
            let key = (
                bond.is_aromatic(),
                neighbor_protected,
                Reverse(order_rank(bond.order)),
                bond.key(),
            );
            Some((key, demoted))
        })
        .collect();
    candidates.sort_by_key(|(key, _)| *key);
    candidates
        .first()
        .map(|((_, _, _, (a, b)), demoted)| (*a, *b, *demoted))
}

/// Clears the aromatic flag on atoms left without any aromatic bond.
pub(super) fn clear_orphaned_aromatic_flags(graph: &mut MolecularGraph, atoms: &[AtomId]) {
    for &id in atoms {
        let still_aromatic = graph.bonds_of(id).any(|bond| bond.is_aromatic());
        if let Some(atom) = graph.atom_mut(id) {
            if !still_aromatic {
                atom.is_aromatic = false;
            }
        }
    }
}
