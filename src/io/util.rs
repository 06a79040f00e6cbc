use crate::model::types::{BondOrder, Element};
use std::str::FromStr;

/// Resolves an element from a connection-table symbol or a PDB atom name.
///
/// Accepts exact symbols, upper-case symbols (`CL`), and names that carry a
/// numeric suffix (`C12`, `Cl3`). Placeholder symbols resolve to
/// [`Element::Dummy`].
pub fn guess_element_symbol(token: &str) -> Option<Element> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if let Ok(element) = Element::from_str(token) {
        return Some(element);
    }

    let letters: String = token
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let normalized = normalize_case(&letters);
    if let Ok(element) = Element::from_str(&normalized) {
        return Some(element);
    }

    let first = letters.chars().next()?.to_ascii_uppercase().to_string();
    Element::from_str(&first).ok()
}

fn normalize_case(symbol: &str) -> String {
    let mut chars = symbol.chars();
    match chars.next() {
        Some(first) => std::iter::once(first.to_ascii_uppercase())
            .chain(chars.map(|c| c.to_ascii_lowercase()))
            .collect(),
        None => String::new(),
    }
}

pub fn bond_order_from_ctfile(value: i32) -> Option<BondOrder> {
    match value {
        1 => Some(BondOrder::Single),
        2 => Some(BondOrder::Double),
        3 => Some(BondOrder::Triple),
        4 => Some(BondOrder::Aromatic),
        _ => None,
    }
}

pub fn bond_order_to_ctfile(order: BondOrder) -> i32 {
    match order {
        BondOrder::Single => 1,
        BondOrder::Double => 2,
        BondOrder::Triple => 3,
        BondOrder::Aromatic => 4,
    }
}

/// Decodes the atom-block charge field (`3` is +1, `5` is -1, `4` is a
/// doublet radical and carries no charge).
pub fn charge_from_ctfile(code: i32) -> Option<i8> {
    match code {
        0 | 4 => Some(0),
        1 => Some(3),
        2 => Some(2),
        3 => Some(1),
        5 => Some(-1),
        6 => Some(-2),
        7 => Some(-3),
        _ => None,
    }
}

pub fn charge_to_ctfile(charge: i8) -> i32 {
    match charge {
        3 => 1,
        2 => 2,
        1 => 3,
        -1 => 5,
        -2 => 6,
        -3 => 7,
        _ => 0,
    }
}

/// Pads an atom name into the four-column PDB name field.
///
/// One-letter elements start in the second column unless the name already
/// fills all four.
pub fn pad_atom_name(name: &str, element: Element) -> String {
    if name.len() >= 4 || element.symbol().len() == 2 {
        format!("{name:<4.4}")
    } else {
        format!(" {name:<3}")
    }
}
