//! Shared harness for the rollup integration tests.
//!
//! A [`RollupFixture`] owns the three trees, a seeded context, the circuit
//! data and a pool of transaction proofs. Tests describe a root rollup as a
//! [`RollupStructure`] and let the fixture build every inner rollup and the
//! root rollup transaction from it.

use reference_backend::ReferenceProofSystem;
use rollup_circuit::{create_rollup_tx, verify_rollup};
use rollup_core::fixtures::{compute_transaction_circuit_data, create_noop_transaction_proof};
use rollup_core::{compute_or_load, CircuitData, RollupConfig, RollupContext};
use root_rollup_circuit::{
    compute_circuit_data_from_config, create_root_rollup_tx, RootRollupCircuitData, RootRollupTx,
};
use state_merkle::MerkleTree;
use tracing_subscriber::EnvFilter;

/// Inner rollups of a root rollup, each listed as indices into the
/// fixture's transaction proofs.
pub type RollupStructure = Vec<Vec<usize>>;

pub const FIXTURE_SEED: u64 = 0x0dd_ba11;

/// Number of transaction proofs every fixture starts with.
pub const FIXTURE_TX_COUNT: usize = 5;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

pub struct RollupFixture {
    pub system: ReferenceProofSystem,
    pub config: RollupConfig,
    pub ctx: RollupContext,
    pub data_tree: MerkleTree,
    pub null_tree: MerkleTree,
    pub root_tree: MerkleTree,
    pub tx_cd: CircuitData<ReferenceProofSystem>,
    pub cd: RootRollupCircuitData<ReferenceProofSystem>,
    /// Noop transaction proofs anchored at the empty data tree.
    pub tx_proofs: Vec<Vec<u8>>,
}

impl RollupFixture {
    /// Two transactions per inner rollup, three inner rollups per root rollup.
    pub fn new() -> Self {
        Self::with_config(RollupConfig::default())
    }

    pub fn with_config(config: RollupConfig) -> Self {
        init_tracing();
        let system = ReferenceProofSystem::default();
        let cd = compute_circuit_data_from_config(&system, &config).expect("circuit data");
        let tx_cd = compute_transaction_circuit_data(&system);
        let mut fixture = Self {
            ctx: RollupContext::from_seed(FIXTURE_SEED),
            data_tree: MerkleTree::new(config.data_tree_depth).expect("data tree"),
            null_tree: MerkleTree::new(config.null_tree_depth).expect("null tree"),
            root_tree: MerkleTree::new(config.root_tree_depth).expect("root tree"),
            system,
            config,
            tx_cd,
            cd,
            tx_proofs: Vec::new(),
        };
        fixture.tx_proofs = fixture.fresh_tx_proofs(FIXTURE_TX_COUNT);
        fixture
    }

    /// Proves `count` new noop transactions anchored at the current data root.
    pub fn fresh_tx_proofs(&mut self, count: usize) -> Vec<Vec<u8>> {
        let anchor = self.data_tree.root();
        (0..count)
            .map(|_| {
                create_noop_transaction_proof(&mut self.ctx, &self.system, &self.tx_cd, anchor)
                    .expect("noop transaction proof")
                    .to_bytes()
            })
            .collect()
    }

    /// Builds and proves one inner rollup, returning its proof data. Proofs
    /// are cached under `key`; the trees are updated either way.
    pub fn create_inner_rollup(&mut self, key: &str, rollup_id: u32, txs: &[Vec<u8>]) -> Vec<u8> {
        let tx = create_rollup_tx(
            rollup_id,
            txs,
            &mut self.data_tree,
            &mut self.null_tree,
            &self.root_tree,
            &self.cd.inner,
        )
        .expect("inner rollup");
        let inner = &self.cd.inner;
        let system = &self.system;
        compute_or_load(self.ctx.cache.as_mut(), key, || {
            verify_rollup(&tx, inner, system).map(|result| {
                assert!(result.verified, "inner rollup {key} failed verification");
                result.proof_data
            })
        })
        .expect("inner rollup proof")
    }

    /// Builds every inner rollup in `structure` from the fixture's proofs,
    /// then the root rollup transaction over them.
    pub fn create_root_rollup_tx(
        &mut self,
        test_name: &str,
        rollup_id: u32,
        structure: &RollupStructure,
    ) -> RootRollupTx {
        let proofs = structure.iter().map(|indices| {
            indices
                .iter()
                .map(|index| self.tx_proofs[*index].clone())
                .collect::<Vec<_>>()
        });
        let proofs: Vec<Vec<Vec<u8>>> = proofs.collect();
        self.create_root_rollup_tx_from(test_name, rollup_id, &proofs)
    }

    /// Like [`Self::create_root_rollup_tx`] but with explicit transaction
    /// proofs for each inner rollup.
    pub fn create_root_rollup_tx_from(
        &mut self,
        test_name: &str,
        rollup_id: u32,
        rollups: &[Vec<Vec<u8>>],
    ) -> RootRollupTx {
        let inner_proofs: Vec<Vec<u8>> = rollups
            .iter()
            .enumerate()
            .map(|(i, txs)| {
                let key = format!("{test_name}/rollup_{rollup_id}_{i}");
                self.create_inner_rollup(&key, i as u32, txs)
            })
            .collect();
        tracing::debug!(test_name, rollup_id, inner = inner_proofs.len(), "built inner rollups");
        create_root_rollup_tx(
            rollup_id,
            &inner_proofs,
            &self.data_tree,
            &mut self.root_tree,
            &self.cd,
        )
        .expect("root rollup")
    }
}

impl Default for RollupFixture {
    fn default() -> Self {
        Self::new()
    }
}
