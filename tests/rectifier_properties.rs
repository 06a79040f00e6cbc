use frag_forge::{
    Atom, AtomId, BondOrder, Element, MolecularGraph, Provenance, Rectifier, RectifierConfig,
    RectifierState, validate,
};
use proptest::prelude::*;

fn element() -> impl Strategy<Value = Element> {
    prop_oneof![
        4 => Just(Element::C),
        2 => Just(Element::N),
        2 => Just(Element::O),
        1 => Just(Element::S),
        1 => Just(Element::Dummy),
    ]
}

fn order() -> impl Strategy<Value = BondOrder> {
    prop_oneof![
        6 => Just(BondOrder::Single),
        2 => Just(BondOrder::Double),
        1 => Just(BondOrder::Triple),
        2 => Just(BondOrder::Aromatic),
    ]
}

/// Small graphs with arbitrary bonding, most of them chemically broken.
fn graph() -> impl Strategy<Value = MolecularGraph> {
    (2usize..9)
        .prop_flat_map(|n| {
            let atoms = proptest::collection::vec(
                (element(), 0u8..4, proptest::bool::weighted(0.2), any::<bool>()),
                n,
            );
            let bonds = proptest::collection::vec((0..n, 0..n, order()), 1..2 * n);
            (atoms, bonds)
        })
        .prop_map(|(atoms, bonds)| {
            let mut g = MolecularGraph::new();
            let ids: Vec<AtomId> = atoms
                .into_iter()
                .enumerate()
                .map(|(i, (element, hydrogens, protected, aromatic))| {
                    let mut atom = Atom::new(element)
                        .with_hydrogens(hydrogens)
                        .with_provenance(Provenance::fragment(i % 2, AtomId(i as u32)));
                    atom.protected = protected;
                    atom.is_aromatic = aromatic;
                    g.add_atom(atom)
                })
                .collect();
            for (a, b, order) in bonds {
                if a != b && g.bond(ids[a], ids[b]).is_none() {
                    g.add_bond(ids[a], ids[b], order).unwrap();
                }
            }
            g
        })
}

fn config() -> impl Strategy<Value = RectifierConfig> {
    (0usize..8).prop_map(|retry_cap| RectifierConfig {
        retry_cap,
        ..RectifierConfig::default()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn success_implies_no_violations(g in graph(), config in config()) {
        let mut rectifier = Rectifier::new(g, config);
        let clean = rectifier.fix().map(|fixed| validate(fixed).unwrap().is_empty());
        match clean {
            Ok(clean) => {
                prop_assert!(clean);
                prop_assert_eq!(rectifier.state(), RectifierState::Valid);
            }
            Err(_) => prop_assert_eq!(rectifier.state(), RectifierState::Failed),
        }
    }

    #[test]
    fn rectifying_a_valid_graph_changes_nothing(g in graph(), config in config()) {
        let mut rectifier = Rectifier::new(g, config.clone());
        if let Ok(fixed) = rectifier.fix() {
            let fixed = fixed.clone();
            let mut again = Rectifier::new(fixed.clone(), config);
            let refixed = again.fix().unwrap();
            prop_assert_eq!(refixed.canonical_form(), fixed.canonical_form());
            prop_assert_eq!(again.steps(), 0);
        }
    }

    #[test]
    fn identical_inputs_give_identical_outputs(g in graph(), config in config()) {
        let run = |graph: MolecularGraph| {
            let mut rectifier = Rectifier::new(graph, config.clone());
            let outcome = rectifier.fix().map(MolecularGraph::canonical_form);
            (outcome, rectifier.steps())
        };
        prop_assert_eq!(run(g.clone()), run(g));
    }

    #[test]
    fn repairs_are_bounded_by_three_caps(g in graph(), config in config()) {
        let bound = config.max_total_repairs();
        let mut rectifier = Rectifier::new(g, config);
        let _ = rectifier.fix();
        prop_assert!(rectifier.steps() <= bound);
    }

    #[test]
    fn surviving_atoms_keep_their_provenance(g in graph()) {
        let mut rectifier = Rectifier::new(g.clone(), RectifierConfig::default());
        let _ = rectifier.fix();
        for (id, atom) in rectifier.graph().atoms() {
            let original = g.atom(id);
            prop_assert!(original.is_some(), "atom {} was invented", id);
            prop_assert_eq!(&atom.provenance, &original.unwrap().provenance);
            prop_assert_eq!(atom.position, original.unwrap().position);
        }
    }
}
