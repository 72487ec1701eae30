//! Inner rollup integration tests: tree effects across rollups and the
//! structural invariants the root verifier relies on.

use proptest::prelude::*;
use rollup_circuit::{
    create_rollup_tx, verify_rollup, verify_rollup_logic, InnerRollupTx, RollupError,
};
use rollup_core::{RollupConfig, RollupProofData};
use rollup_tests::{RollupFixture, RollupStructure};
use root_rollup_circuit::verify_logic;

fn build(fixture: &mut RollupFixture, txs: &[Vec<u8>]) -> Result<InnerRollupTx, RollupError> {
    create_rollup_tx(
        0,
        txs,
        &mut fixture.data_tree,
        &mut fixture.null_tree,
        &fixture.root_tree,
        &fixture.cd.inner,
    )
}

#[test]
fn spent_nullifier_cannot_enter_a_later_root_rollup() {
    let mut fixture = RollupFixture::new();
    let structure: RollupStructure = vec![vec![0, 1]];
    let tx = fixture.create_root_rollup_tx("double_spend", 0, &structure);
    assert!(verify_logic(&tx, &fixture.cd));

    let replay = fixture.tx_proofs[1].clone();
    let null_root = fixture.null_tree.root();
    assert!(matches!(
        build(&mut fixture, &[replay]),
        Err(RollupError::NullifierAlreadySpent { index: 0, .. })
    ));
    assert_eq!(fixture.null_tree.root(), null_root);
}

#[test]
fn stale_anchor_is_still_accepted() {
    let mut fixture = RollupFixture::new();
    let first = fixture.tx_proofs[0].clone();
    build(&mut fixture, &[first]).expect("first rollup");
    // Proof 1 is anchored at the empty data root, which is in the tree's history.
    let second = fixture.tx_proofs[1].clone();
    let rollup = build(&mut fixture, &[second]).expect("second rollup");
    assert_eq!(rollup.data_start_index, 2);
    assert!(verify_rollup_logic(&rollup, &fixture.cd.inner));
}

#[test]
fn empty_and_oversized_batches_are_rejected() {
    let mut fixture = RollupFixture::new();
    assert!(matches!(build(&mut fixture, &[]), Err(RollupError::EmptyBatch)));
    let txs = fixture.tx_proofs[..3].to_vec();
    assert!(matches!(
        build(&mut fixture, &txs),
        Err(RollupError::BatchTooLarge { count: 3, max: 2 })
    ));
    assert_eq!(fixture.data_tree.size(), 0);
}

#[test]
fn inner_proof_data_matches_tree_roots() {
    let mut fixture = RollupFixture::new();
    let txs = fixture.tx_proofs[..2].to_vec();
    let old_root = fixture.data_tree.root();
    let rollup = build(&mut fixture, &txs).expect("rollup");
    let result = verify_rollup(&rollup, &fixture.cd.inner, &fixture.system).expect("verify");
    assert!(result.verified);
    let (data, _) = RollupProofData::from_proof_data(&result.proof_data, false).expect("decode");
    assert_eq!(data.header.old_data_root, old_root);
    assert_eq!(data.header.new_data_root, fixture.data_tree.root());
    assert_eq!(data.header.new_null_root, fixture.null_tree.root());
    assert_eq!(data.header.old_data_roots_root, fixture.root_tree.root());
    assert_eq!(data.commitment_count(), 4);
}

#[test]
fn larger_rollups_follow_config() {
    let config = RollupConfig::new(4, 2);
    let mut fixture = RollupFixture::with_config(config);
    let structure: RollupStructure = vec![vec![0, 1, 2, 3], vec![4]];
    let tx = fixture.create_root_rollup_tx("k4_m2", 0, &structure);
    assert_eq!(tx.rollups.len(), 2);
    assert!(verify_logic(&tx, &fixture.cd));
}

#[test]
fn full_data_tree_leaves_nullifiers_unspent() {
    let config = RollupConfig {
        data_tree_depth: 3,
        ..RollupConfig::new(2, 2)
    };
    let mut fixture = RollupFixture::with_config(config);
    let first = fixture.tx_proofs[..2].to_vec();
    let second = fixture.tx_proofs[2..4].to_vec();
    build(&mut fixture, &first).expect("first rollup");
    build(&mut fixture, &second).expect("second rollup");
    assert_eq!(fixture.data_tree.size(), 8);

    let null_root = fixture.null_tree.root();
    let last = fixture.tx_proofs[4].clone();
    assert!(matches!(
        build(&mut fixture, &[last]),
        Err(RollupError::DataTreeFull { required: 10, .. })
    ));
    assert_eq!(fixture.null_tree.root(), null_root);
}

/// Splits `total` transactions into full inner rollups of two, the last one
/// possibly partial.
fn well_formed(total: usize) -> RollupStructure {
    (0..total)
        .collect::<Vec<_>>()
        .chunks(2)
        .map(|chunk| chunk.to_vec())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(6))]

    #[test]
    fn well_formed_structures_pass_logic(total in 1usize..=5) {
        let mut fixture = RollupFixture::new();
        let tx = fixture.create_root_rollup_tx("prop_well_formed", 0, &well_formed(total));
        prop_assert!(verify_logic(&tx, &fixture.cd));
    }

    #[test]
    fn swapping_real_rollups_breaks_logic(
        total in 3usize..=5,
        first in 0usize..3,
        second in 0usize..3,
    ) {
        let mut fixture = RollupFixture::new();
        let mut tx = fixture.create_root_rollup_tx("prop_swap", 0, &well_formed(total));
        let real = tx.num_inner_proofs as usize;
        let (a, b) = (first % real, second % real);
        prop_assume!(a != b);
        tx.rollups.swap(a, b);
        prop_assert!(!verify_logic(&tx, &fixture.cd));
    }
}
