use crate::error::Error;
use crate::model::atom::{Atom, AtomId};
use crate::model::graph::MolecularGraph;
use crate::model::types::Element;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::debug;

const DEFAULT_VALENCE_TOML: &str = include_str!("../../resources/valence.toml");

static DEFAULT_TABLE: OnceLock<Result<ValenceTable, Error>> = OnceLock::new();

/// Allowed valences for one element and how formal charge shifts them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValenceRule {
    pub valences: Vec<u8>,
    #[serde(default)]
    pub cation_shift: i8,
    #[serde(default)]
    pub anion_shift: i8,
}

impl ValenceRule {
    /// Allowed valences for the given formal charge, ascending.
    pub fn allowed(&self, formal_charge: i8) -> Vec<u8> {
        let charge = i32::from(formal_charge);
        let shift = match charge.cmp(&0) {
            Ordering::Greater => i32::from(self.cation_shift) * charge,
            Ordering::Less => i32::from(self.anion_shift) * -charge,
            Ordering::Equal => 0,
        };
        let mut allowed: Vec<u8> = self
            .valences
            .iter()
            .map(|v| i32::from(*v) + shift)
            .filter_map(|v| u8::try_from(v).ok())
            .collect();
        allowed.sort_unstable();
        allowed.dedup();
        allowed
    }
}

#[derive(Debug, Deserialize)]
struct RawValenceTable {
    elements: BTreeMap<String, ValenceRule>,
}

/// Per-element valence rules keyed by [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValenceTable {
    rules: BTreeMap<Element, ValenceRule>,
}

impl ValenceTable {
    pub fn from_toml(text: &str) -> Result<Self, Error> {
        let raw: RawValenceTable = toml::from_str(text)?;
        let mut rules = BTreeMap::new();
        for (symbol, rule) in raw.elements {
            let element = Element::from_str(&symbol)
                .map_err(|e| Error::Config(format!("valence table: {e}")))?;
            if rule.valences.is_empty() {
                return Err(Error::Config(format!(
                    "valence table: element {symbol} lists no valences"
                )));
            }
            rules.insert(element, rule);
        }
        Ok(Self { rules })
    }

    pub fn rule(&self, element: Element) -> Option<&ValenceRule> {
        self.rules.get(&element)
    }

    /// Allowed valences for an atom, ascending.
    pub fn allowed(&self, id: AtomId, atom: &Atom) -> Result<Vec<u8>, Error> {
        self.rule(atom.element)
            .map(|rule| rule.allowed(atom.formal_charge))
            .ok_or(Error::UnsupportedElement {
                atom: id,
                element: atom.element,
            })
    }
}

/// The embedded table shipped in `resources/valence.toml`, parsed once.
pub fn default_table() -> Result<&'static ValenceTable, Error> {
    DEFAULT_TABLE
        .get_or_init(|| ValenceTable::from_toml(DEFAULT_VALENCE_TOML))
        .as_ref()
        .map_err(Clone::clone)
}

/// Bond contribution to an atom's valence, hydrogens excluded.
///
/// `k` aromatic bonds count `floor(1.5 k)`, except a neutral pyrrole-type
/// donor with exactly two aromatic bonds, which counts `k`.
pub fn bond_valence(graph: &MolecularGraph, id: AtomId) -> u16 {
    let Some(atom) = graph.atom(id) else {
        return 0;
    };

    let mut integral = 0u16;
    let mut aromatic = 0u16;
    for bond in graph.bonds_of(id) {
        match bond.order.integral() {
            Some(order) => integral += u16::from(order),
            None => aromatic += 1,
        }
    }

    let donor = aromatic == 2
        && atom.formal_charge == 0
        && match atom.element {
            Element::N | Element::P => atom.hydrogens > 0 || integral > 0,
            Element::O | Element::S | Element::Se => true,
            _ => false,
        };
    let aromatic_part = if donor { aromatic } else { aromatic * 3 / 2 };
    integral + aromatic_part
}

pub fn valence(graph: &MolecularGraph, id: AtomId) -> u16 {
    let hydrogens = graph.atom(id).map_or(0, |atom| u16::from(atom.hydrogens));
    bond_valence(graph, id) + hydrogens
}

/// Valence the atom can still gain before reaching its next allowed value.
pub fn free_valence(graph: &MolecularGraph, table: &ValenceTable, id: AtomId) -> Result<u16, Error> {
    let Some(atom) = graph.atom(id) else {
        return Ok(0);
    };
    if atom.element.is_placeholder() {
        return Ok(0);
    }
    let current = valence(graph, id);
    let allowed = table.allowed(id, atom)?;
    Ok(allowed
        .iter()
        .map(|v| u16::from(*v))
        .find(|v| *v >= current)
        .map_or(0, |v| v - current))
}

/// Raises implicit hydrogen counts until every atom reaches its minimum
/// allowed valence. Returns the number of atoms adjusted.
///
/// Placeholders and explicit hydrogen atoms are left alone.
pub fn rebalance_hydrogens(graph: &mut MolecularGraph, table: &ValenceTable) -> Result<usize, Error> {
    let mut additions = Vec::new();
    for (id, atom) in graph.atoms() {
        if atom.element.is_placeholder() || atom.element == Element::H {
            continue;
        }
        let allowed = table.allowed(id, atom)?;
        let Some(minimum) = allowed.first().map(|v| u16::from(*v)) else {
            continue;
        };
        let current = valence(graph, id);
        if current < minimum {
            additions.push((id, minimum - current));
        }
    }

    for (id, missing) in &additions {
        if let Some(atom) = graph.atom_mut(*id) {
            let missing = u8::try_from(*missing).unwrap_or(u8::MAX);
            atom.hydrogens = atom.hydrogens.saturating_add(missing);
            debug!(atom = %id, added = missing, "filled implicit hydrogens");
        }
    }
    Ok(additions.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::BondOrder;

    #[test]
    fn embedded_table_loads() {
        let table = default_table().unwrap();
        assert_eq!(table.rule(Element::S).unwrap().valences, vec![2, 4, 6]);
        assert!(table.rule(Element::Fe).is_none());
    }

    #[test]
    fn charge_shifts_valences() {
        let table = default_table().unwrap();
        let n = table.rule(Element::N).unwrap();
        assert_eq!(n.allowed(0), vec![3]);
        assert_eq!(n.allowed(1), vec![4]);
        assert_eq!(n.allowed(-1), vec![2]);
        let c = table.rule(Element::C).unwrap();
        assert_eq!(c.allowed(1), vec![3]);
        assert_eq!(c.allowed(-1), vec![3]);
        let b = table.rule(Element::B).unwrap();
        assert_eq!(b.allowed(-1), vec![4]);
    }

    #[test]
    fn unsupported_element_is_an_error() {
        let table = default_table().unwrap();
        let atom = Atom::new(Element::Fe);
        let err = table.allowed(AtomId(3), &atom).unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedElement {
                atom: AtomId(3),
                element: Element::Fe
            }
        );
    }

    #[test]
    fn custom_table_rejects_unknown_symbols() {
        let err = ValenceTable::from_toml("[elements.Xx]\nvalences = [1]\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn aromatic_valence_follows_floor_rule() {
        let mut g = MolecularGraph::new();
        let ids: Vec<_> = (0..6)
            .map(|_| g.add_atom(Atom::new(Element::C).aromatic().with_hydrogens(1)))
            .collect();
        for i in 0..6 {
            g.add_bond(ids[i], ids[(i + 1) % 6], BondOrder::Aromatic).unwrap();
        }
        assert_eq!(valence(&g, ids[0]), 4);
    }

    #[test]
    fn pyrrole_nitrogen_counts_as_donor() {
        let mut g = MolecularGraph::new();
        let n = g.add_atom(Atom::new(Element::N).aromatic().with_hydrogens(1));
        let ids: Vec<_> = (0..4)
            .map(|_| g.add_atom(Atom::new(Element::C).aromatic().with_hydrogens(1)))
            .collect();
        let ring = [n, ids[0], ids[1], ids[2], ids[3]];
        for i in 0..5 {
            g.add_bond(ring[i], ring[(i + 1) % 5], BondOrder::Aromatic).unwrap();
        }
        assert_eq!(valence(&g, n), 3);
        assert_eq!(valence(&g, ids[0]), 4);
    }

    #[test]
    fn rebalance_fills_to_minimum_valence() {
        let table = default_table().unwrap();
        let mut g = MolecularGraph::new();
        let c = g.add_atom(Atom::new(Element::C));
        let o = g.add_atom(Atom::new(Element::O));
        let s = g.add_atom(Atom::new(Element::S));
        g.add_bond(c, o, BondOrder::Double).unwrap();
        g.add_bond(c, s, BondOrder::Single).unwrap();

        let changed = rebalance_hydrogens(&mut g, table).unwrap();
        assert_eq!(changed, 2);
        assert_eq!(g.atom(c).unwrap().hydrogens, 1);
        assert_eq!(g.atom(o).unwrap().hydrogens, 0);
        assert_eq!(g.atom(s).unwrap().hydrogens, 1);
        assert_eq!(free_valence(&g, table, c).unwrap(), 0);
        assert_eq!(rebalance_hydrogens(&mut g, table).unwrap(), 0);
    }
}
