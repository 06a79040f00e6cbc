use frag_forge::io::{pdb, sdf};
use frag_forge::{
    Atom, AtomId, BondOrder, CorrespondenceMap, CovalentLink, Element, Error, MergeOptions,
    MinimalPlacer, MolecularGraph, PlacementRequest, Placer, Provenance, Rectifier,
    RectifierConfig, RectifierState, ResidueRef, ViolationKind, ViolationTarget, merge, rectify,
    validate,
};
use std::io::Cursor;

fn cycle(size: usize, protected: impl Fn(usize) -> bool) -> MolecularGraph {
    let mut g = MolecularGraph::new();
    let ids: Vec<AtomId> = (0..size)
        .map(|i| {
            let atom = Atom::new(Element::C);
            g.add_atom(if protected(i) { atom.protected() } else { atom })
        })
        .collect();
    for i in 0..size {
        g.add_bond(ids[i], ids[(i + 1) % size], BondOrder::Single).unwrap();
    }
    g
}

#[test]
fn fused_three_ring_with_over_valent_carbon_is_demoted() {
    // a3-a0=a1-a2, plus b0=b1 closing a0 and a2 into a three-membered ring.
    let mut a = MolecularGraph::new();
    let a0 = a.add_atom(Atom::new(Element::C));
    let a1 = a.add_atom(Atom::new(Element::C));
    let a2 = a.add_atom(Atom::new(Element::C));
    let a3 = a.add_atom(Atom::new(Element::C));
    a.add_bond(a0, a1, BondOrder::Double).unwrap();
    a.add_bond(a1, a2, BondOrder::Single).unwrap();
    a.add_bond(a3, a0, BondOrder::Single).unwrap();

    let mut b = MolecularGraph::new();
    let b0 = b.add_atom(Atom::new(Element::C));
    let b1 = b.add_atom(Atom::new(Element::C));
    b.add_bond(b0, b1, BondOrder::Double).unwrap();

    let mut correspondences = CorrespondenceMap::new();
    correspondences.pair((0, a0), (1, b0)).unwrap();
    correspondences.pair((0, a2), (1, b1)).unwrap();

    let merged = merge(&[a, b], &correspondences, &MergeOptions::default()).unwrap();
    assert_eq!(merged.atom_count(), 4);
    let before = validate(&merged).unwrap();
    assert!(before
        .iter()
        .any(|v| v.kind == ViolationKind::OverValent && v.atom() == Some(AtomId(0))));

    let mut rectifier = Rectifier::new(merged, RectifierConfig::default());
    let fixed = rectifier.fix().unwrap().clone();
    assert_eq!(rectifier.state(), RectifierState::Valid);
    assert_eq!(rectifier.steps(), 1);
    assert_eq!(fixed.sssr().len(), 1);
    assert_eq!(fixed.sssr()[0].len(), 3);
    assert_eq!(
        fixed.bonds().filter(|bond| bond.order == BondOrder::Double).count(),
        1
    );
    assert!(validate(&fixed).unwrap().is_empty());
}

#[test]
fn eight_ring_without_a_safe_bond_is_contracted() {
    // Every bond touches a protected atom, so only atom deletion can help.
    let g = cycle(8, |i| i % 2 == 0);
    let fixed = rectify(g, &RectifierConfig::default()).unwrap();

    assert_eq!(fixed.atom_count(), 7);
    assert!(!fixed.contains_atom(AtomId(1)));
    assert!(fixed.bond(AtomId(0), AtomId(2)).is_some());
    assert!(fixed.is_connected());
    assert_eq!(fixed.sssr().len(), 1);
    assert_eq!(fixed.sssr()[0].len(), 7);
    assert!(validate(&fixed).unwrap().is_empty());
}

#[test]
fn fully_protected_eight_ring_fails_naming_the_ring() {
    let g = cycle(8, |_| true);
    let mut rectifier = Rectifier::new(g, RectifierConfig::default());
    let err = rectifier.fix().unwrap_err();

    let Error::RectificationFailed { state, violations } = &err else {
        panic!("unexpected error {err:?}");
    };
    assert_eq!(*state, RectifierState::RingReview);
    let expected: Vec<AtomId> = (0..8).map(AtomId).collect();
    assert!(violations.iter().any(|v| match &v.target {
        ViolationTarget::Ring(atoms) => {
            let mut atoms = atoms.clone();
            atoms.sort();
            atoms == expected
        }
        _ => false,
    }));
    assert_eq!(rectifier.state(), RectifierState::Failed);
}

/// Eight-ring 0..7 fused to the six-ring 0-1-8-9-10-11 through bond 0-1.
fn fused_eight_and_six(protected: impl Fn(usize) -> bool) -> MolecularGraph {
    let mut g = cycle(8, protected);
    let outer: Vec<AtomId> = (0..4).map(|_| g.add_atom(Atom::new(Element::C))).collect();
    g.add_bond(AtomId(1), outer[0], BondOrder::Single).unwrap();
    for pair in outer.windows(2) {
        g.add_bond(pair[0], pair[1], BondOrder::Single).unwrap();
    }
    g.add_bond(outer[3], AtomId(0), BondOrder::Single).unwrap();
    g
}

#[test]
fn eight_ring_fused_to_six_ring_keeps_the_shared_bond() {
    // Bond 0-1 is the only bond of the eight-ring without a protected end,
    // but the six-ring owns it too.
    let g = fused_eight_and_six(|i| i >= 2);
    assert_eq!(g.sssr().len(), 2);

    let mut rectifier = Rectifier::new(g, RectifierConfig::default());
    let fixed = rectifier.fix().unwrap().clone();

    assert_eq!(fixed.atom_count(), 11);
    assert!(!fixed.contains_atom(AtomId(0)));
    assert!(fixed.bond(AtomId(1), AtomId(7)).is_some());
    assert!(fixed.bond(AtomId(1), AtomId(8)).is_some());
    assert!(fixed.is_connected());
    assert_eq!(fixed.sssr().len(), 1);
    assert_eq!(fixed.sssr()[0].len(), 7);
    assert!(validate(&fixed).unwrap().is_empty());
}

#[test]
fn protected_eight_ring_fused_to_six_ring_fails_naming_only_the_eight_ring() {
    let g = fused_eight_and_six(|_| true);
    let err = rectify(g, &RectifierConfig::default()).unwrap_err();

    let Error::RectificationFailed { state, violations } = &err else {
        panic!("unexpected error {err:?}");
    };
    assert_eq!(*state, RectifierState::RingReview);
    let rings: Vec<Vec<AtomId>> = violations
        .iter()
        .filter_map(|v| match &v.target {
            ViolationTarget::Ring(atoms) => {
                let mut atoms = atoms.clone();
                atoms.sort();
                Some(atoms)
            }
            _ => None,
        })
        .collect();
    let expected: Vec<AtomId> = (0..8).map(AtomId).collect();
    assert_eq!(rings, vec![expected]);
}

#[test]
fn benzocyclobutadiene_keeps_its_benzene_aromatic() {
    // Benzene 0..5 with the four-ring 0-6-7-5 fused on bond 0-5.
    let mut g = MolecularGraph::new();
    let benzene: Vec<AtomId> = [0u8, 1, 1, 1, 1, 0]
        .iter()
        .map(|h| g.add_atom(Atom::new(Element::C).aromatic().with_hydrogens(*h)))
        .collect();
    for i in 0..6 {
        g.add_bond(benzene[i], benzene[(i + 1) % 6], BondOrder::Aromatic)
            .unwrap();
    }
    let c6 = g.add_atom(Atom::new(Element::C).aromatic().with_hydrogens(1));
    let c7 = g.add_atom(Atom::new(Element::C).aromatic().with_hydrogens(1));
    g.add_bond(benzene[0], c6, BondOrder::Aromatic).unwrap();
    g.add_bond(c6, c7, BondOrder::Aromatic).unwrap();
    g.add_bond(c7, benzene[5], BondOrder::Aromatic).unwrap();

    let fixed = rectify(g, &RectifierConfig::default()).unwrap();

    for i in 0..6 {
        let bond = fixed.bond(benzene[i], benzene[(i + 1) % 6]).unwrap();
        assert_eq!(bond.order, BondOrder::Aromatic);
        assert!(fixed.atom(benzene[i]).unwrap().is_aromatic);
    }
    assert_eq!(fixed.bond(benzene[0], c6).unwrap().order, BondOrder::Single);
    assert_eq!(fixed.bond(c6, c7).unwrap().order, BondOrder::Double);
    assert_eq!(fixed.bond(c7, benzene[5]).unwrap().order, BondOrder::Single);
    assert!(!fixed.atom(c6).unwrap().is_aromatic);
    assert!(!fixed.atom(c7).unwrap().is_aromatic);
    assert!(validate(&fixed).unwrap().is_empty());
}

const PYRROLE: &str = "\
pyrrole
  test

  5  5  0  0  0  0  0  0  0  0999 V2000
    0.0000    1.1200    0.0000 N   0  0  0  0  0  0  0  0  0  0  0  0
    1.0700    0.3500    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    0.6600   -0.9100    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
   -0.6600   -0.9100    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
   -1.0700    0.3500    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  4  0  0  0  0
  2  3  4  0  0  0  0
  3  4  4  0  0  0  0
  4  5  4  0  0  0  0
  5  1  4  0  0  0  0
M  END
$$$$
";

#[test]
fn pyrrole_read_without_its_nitrogen_hydrogen_stays_aromatic() {
    let g = sdf::read(Cursor::new(PYRROLE)).unwrap();
    assert_eq!(g.atom(AtomId(0)).unwrap().hydrogens, 0);

    let fixed = rectify(g, &RectifierConfig::default()).unwrap();
    assert!(fixed.bonds().all(|bond| bond.order == BondOrder::Aromatic));
    assert!(fixed.atoms().all(|(_, atom)| atom.is_aromatic));
    assert!(validate(&fixed).unwrap().is_empty());
}

#[test]
fn aromatic_four_ring_is_kekulized() {
    let mut g = MolecularGraph::new();
    let ids: Vec<AtomId> = (0..4)
        .map(|_| g.add_atom(Atom::new(Element::C).aromatic()))
        .collect();
    for i in 0..4 {
        g.add_bond(ids[i], ids[(i + 1) % 4], BondOrder::Aromatic).unwrap();
    }
    assert!(validate(&g)
        .unwrap()
        .iter()
        .any(|v| v.kind == ViolationKind::BadAromaticRing));

    let fixed = rectify(g, &RectifierConfig::default()).unwrap();
    assert!(fixed.atoms().all(|(_, atom)| !atom.is_aromatic && atom.hydrogens == 1));
    assert!(fixed.bonds().all(|bond| !bond.is_aromatic()));
    assert_eq!(
        fixed.bonds().filter(|bond| bond.order == BondOrder::Double).count(),
        2
    );
    assert!(validate(&fixed).unwrap().is_empty());
}

#[test]
fn correspondence_to_missing_atom_is_malformed() {
    let chain = |n: u32| {
        let mut g = MolecularGraph::new();
        let mut prev = g.add_atom(Atom::new(Element::C));
        for _ in 1..n {
            let next = g.add_atom(Atom::new(Element::C));
            g.add_bond(prev, next, BondOrder::Single).unwrap();
            prev = next;
        }
        g
    };
    let fragments = vec![chain(20), chain(5)];
    let snapshot: Vec<String> = fragments.iter().map(MolecularGraph::canonical_form).collect();

    let mut correspondences = CorrespondenceMap::new();
    correspondences.pair((0, AtomId(99)), (1, AtomId(0))).unwrap();

    let err = merge(&fragments, &correspondences, &MergeOptions::default()).unwrap_err();
    assert!(matches!(err, Error::MalformedCorrespondence { .. }));
    let after: Vec<String> = fragments.iter().map(MolecularGraph::canonical_form).collect();
    assert_eq!(after, snapshot);
}

const FRAGMENT_A: &str = "\
x0434
  test

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.5000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.0000    1.2000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0  0  0  0
  2  3  1  0  0  0  0
M  END
$$$$
";

const FRAGMENT_B: &str = "\
x0678
  test

  2  1  0  0  0  0  0  0  0  0999 V2000
    1.5100    0.0200    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.2000   -1.2000    0.0000 N   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0  0  0  0
M  END
> <protected>
2

$$$$
";

const RECEPTOR: &str = "\
HEADER    TEST RECEPTOR
ATOM      1  N   CYS A 145      10.000  10.000  10.000  1.00 20.00           N
ATOM      2  CA  CYS A 145      11.000  10.000  10.000  1.00 20.00           C
ATOM      3  SG  CYS A 145      12.000  11.000  10.000  1.00 20.00           S
END
";

#[test]
fn sdf_fragments_merge_rectify_and_place() {
    let a = sdf::read(Cursor::new(FRAGMENT_A)).unwrap();
    let b = sdf::read(Cursor::new(FRAGMENT_B)).unwrap();

    let mut correspondences = CorrespondenceMap::new();
    correspondences.pair((0, AtomId(1)), (1, AtomId(0))).unwrap();
    let merged = merge(&[a, b], &correspondences, &MergeOptions::default()).unwrap();
    let ligand = rectify(merged, &RectifierConfig::default()).unwrap();

    assert_eq!(ligand.atom_count(), 4);
    assert!(ligand.atom(AtomId(3)).unwrap().protected);
    match &ligand.atom(AtomId(1)).unwrap().provenance {
        Provenance::Fragment { origin, fused } => {
            assert_eq!(origin.fragment, 0);
            assert_eq!(fused.len(), 1);
            assert_eq!(fused[0].fragment, 1);
        }
        Provenance::Synthetic => panic!("fused atom lost its provenance"),
    }
    assert_eq!(ligand.atom(AtomId(1)).unwrap().position, Some([1.5, 0.0, 0.0]));

    let request = PlacementRequest::default()
        .with_covalent(CovalentLink::cysteine(ResidueRef::new(145, None), AtomId(0)));
    let complex = MinimalPlacer.insert(RECEPTOR, &ligand, &request).unwrap();
    assert!(complex.lines().any(|line| line.starts_with("LINK")));

    let block = pdb::parse(&complex).unwrap();
    let hetero: Vec<_> = block.atoms().filter(|atom| atom.hetero).collect();
    assert_eq!(hetero.len(), 4);
    assert_eq!(hetero[0].serial, 4);
    assert_eq!(block.connections.len(), 4);

    let mut written = Vec::new();
    sdf::write(&mut written, &ligand).unwrap();
    let reread = sdf::read(Cursor::new(written)).unwrap();
    assert_eq!(reread.atom_count(), 4);
    assert!(reread.atom(AtomId(3)).unwrap().protected);
}
