//! End-to-end protocol flows through the public entry points.

use std::sync::{Arc, Mutex};

use ars_core::config::{GovernanceParams, ProtocolConfig};
use ars_core::constants::ONE_ARU;
use ars_core::state::ProtocolParam;
use ars_core::types::Identity;
use ars_protocol::{
    PolicyType, Protocol, ProtocolError, ProtocolSnapshot, ProposalStatus, RebalanceSignal,
    SnapshotSink,
};

const ONE_USD: u64 = 1_000_000;

fn identity(byte: u8) -> Identity {
    Identity::from_public_key(&[byte; 32])
}

fn authority() -> Identity {
    identity(200)
}

/// Sink that records every emitted snapshot for inspection.
#[derive(Clone, Default)]
struct RecordingSink {
    snapshots: Arc<Mutex<Vec<ProtocolSnapshot>>>,
}

impl SnapshotSink for RecordingSink {
    fn publish(&mut self, snapshot: &ProtocolSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }
}

fn deployment(config: &ProtocolConfig) -> (Protocol, RecordingSink) {
    let sink = RecordingSink::default();
    let protocol = Protocol::with_sink(
        config,
        authority(),
        identity(201),
        1_000_000 * ONE_ARU,
        0,
        Box::new(sink.clone()),
    )
    .unwrap();
    (protocol, sink)
}

fn with_three_silver_agents(config: &ProtocolConfig) -> (Protocol, RecordingSink) {
    let (mut protocol, sink) = deployment(config);
    for i in 1..=3u8 {
        protocol.register_agent(identity(i), 5_000 * ONE_ARU, 0).unwrap();
    }
    (protocol, sink)
}

#[test]
fn test_oracle_governance_round_trip() {
    // 5% raw-stake quorum: 750 ARU of the 15,000 ARU registered.
    let config = ProtocolConfig {
        governance: GovernanceParams {
            quorum_bps: 500,
            ..GovernanceParams::default()
        },
        ..ProtocolConfig::default()
    };
    let (mut protocol, _sink) = with_three_silver_agents(&config);

    // Three Silver agents reach index consensus on the median.
    assert_eq!(
        protocol
            .submit_index_update(identity(1), 5000, 100, 100)
            .unwrap(),
        None
    );
    assert_eq!(
        protocol
            .submit_index_update(identity(2), 5100, 101, 101)
            .unwrap(),
        None
    );
    let outcome = protocol
        .submit_index_update(identity(3), 4900, 102, 102)
        .unwrap()
        .expect("third submission completes the quorum");
    assert_eq!(outcome.ili, 5000);
    assert_eq!(protocol.oracle().current_ili(), 5000);

    // A raised mint cap goes through governance.
    let id = protocol
        .create_proposal(
            identity(1),
            PolicyType::ParameterUpdate {
                param: ProtocolParam::MintCapBps,
                value: 300,
            },
            86_400,
            200,
        )
        .unwrap();

    let status = protocol
        .vote_on_proposal(identity(1), id, true, 1_000 * ONE_ARU, 210)
        .unwrap();
    assert_eq!(status, ProposalStatus::Active);
    // floor(sqrt(1,000,000,000)) = 31,622.
    let proposal = protocol.governance().get(id).unwrap();
    assert_eq!(proposal.yes_power, 31_622);

    protocol
        .vote_on_proposal(identity(2), id, false, 500 * ONE_ARU, 220)
        .unwrap();

    let status = protocol.finalize_proposal(id, 86_600).unwrap();
    assert_eq!(status, ProposalStatus::Passed);
    // Finalization released the vote commitments.
    assert_eq!(protocol.registry().get(&identity(1)).unwrap().committed_stake, 0);

    protocol.execute_proposal(id, 86_700).unwrap();
    assert_eq!(protocol.global().mint_cap_bps, 300);
    assert_eq!(protocol.supply().mint_cap_bps(), 300);
    assert_eq!(
        protocol.governance().get(id).unwrap().status,
        ProposalStatus::Executed
    );

    // At-most-once.
    let err = protocol.execute_proposal(id, 86_800).unwrap_err();
    assert!(matches!(err, ProtocolError::Governance(_)));
}

#[test]
fn test_governed_mint_and_rebalance_record() {
    let (mut protocol, _sink) = with_three_silver_agents(&ProtocolConfig::default());

    let id = protocol
        .create_proposal(
            identity(1),
            PolicyType::Mint {
                recipient: identity(1),
                amount: 10_000 * ONE_ARU,
            },
            86_400,
            0,
        )
        .unwrap();
    protocol
        .vote_on_proposal(identity(2), id, true, 2_000 * ONE_ARU, 10)
        .unwrap();
    protocol.finalize_proposal(id, 86_400).unwrap();
    protocol.execute_proposal(id, 86_401).unwrap();

    assert_eq!(protocol.supply().total_supply(), 1_010_000 * ONE_ARU);
    assert_eq!(protocol.supply().balance_of(&identity(1)), 10_000 * ONE_ARU);
    // Liability follows supply at par.
    assert_eq!(
        protocol.vault().liability_usd(),
        (1_010_000 * ONE_ARU) as u128
    );

    // A rebalance trigger only records; balances are untouched.
    let id = protocol
        .create_proposal(identity(1), PolicyType::RebalanceTrigger, 86_400, 86_500)
        .unwrap();
    protocol
        .vote_on_proposal(identity(2), id, true, 2_000 * ONE_ARU, 86_510)
        .unwrap();
    protocol.finalize_proposal(id, 172_900).unwrap();
    protocol.execute_proposal(id, 172_901).unwrap();
    assert_eq!(protocol.vault().last_rebalance_timestamp(), 172_901);
}

#[test]
fn test_direct_mint_respects_epoch_cap() {
    let (mut protocol, _sink) = deployment(&ProtocolConfig::default());

    // 2% of 1,000,000 ARU.
    protocol
        .mint_supply(authority(), identity(1), 20_000 * ONE_ARU, 100)
        .unwrap();
    let err = protocol
        .mint_supply(authority(), identity(1), ONE_ARU, 200)
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Supply(_)));
    assert!(!err.is_fatal());

    // The next epoch reopens the allowance against the new snapshot.
    protocol
        .mint_supply(authority(), identity(1), 20_400 * ONE_ARU, 86_400)
        .unwrap();
    assert_eq!(protocol.supply().epoch_index(), 1);
}

#[test]
fn test_collateral_flow_and_rebalance_signals() {
    // 1,000 ARU supply puts the liability at 1,000 USD.
    let sink = RecordingSink::default();
    let mut protocol = Protocol::with_sink(
        &ProtocolConfig::default(),
        authority(),
        identity(201),
        1_000 * ONE_ARU,
        0,
        Box::new(sink),
    )
    .unwrap();

    let vhr = protocol
        .deposit_collateral(authority(), "usdc", 1_550 * ONE_ARU, ONE_USD, 10)
        .unwrap();
    assert_eq!(vhr, 15_500);
    assert_eq!(protocol.check_rebalance(), RebalanceSignal::Balanced);

    // A withdrawal that would land below 150% is rejected whole.
    let err = protocol
        .withdraw_collateral(authority(), "usdc", 100 * ONE_ARU, 20)
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Vault(_)));
    assert_eq!(
        protocol.vault().asset("usdc").unwrap().balance,
        1_550 * ONE_ARU
    );

    // Down to exactly the minimum is allowed.
    let vhr = protocol
        .withdraw_collateral(authority(), "usdc", 50 * ONE_ARU, 30)
        .unwrap();
    assert_eq!(vhr, 15_000);
    assert_eq!(protocol.check_rebalance(), RebalanceSignal::TopUp);
}

#[test]
fn test_snapshot_emitted_after_every_successful_mutation() {
    let (mut protocol, sink) = deployment(&ProtocolConfig::default());

    protocol.register_agent(identity(1), 5_000 * ONE_ARU, 10).unwrap();
    protocol.register_agent(identity(2), 5_000 * ONE_ARU, 20).unwrap();
    protocol
        .adjust_stake(identity(1), (1_000 * ONE_ARU) as i128, 30)
        .unwrap();
    protocol
        .mint_supply(authority(), identity(1), 100 * ONE_ARU, 40)
        .unwrap();

    // A failed call emits nothing.
    assert!(protocol
        .register_agent(identity(1), 5_000 * ONE_ARU, 50)
        .is_err());

    let snapshots = sink.snapshots.lock().unwrap();
    assert_eq!(snapshots.len(), 4);

    let last = snapshots.last().unwrap();
    assert_eq!(last.emitted_at, 40);
    assert_eq!(last.agent_count, 2);
    assert_eq!(last.total_staked, (11_000 * ONE_ARU) as u128);
    assert_eq!(last.total_supply, 1_000_100 * ONE_ARU);
    assert_eq!(last.liability_usd, (1_000_100 * ONE_ARU) as u128);

    // Snapshots serialize cleanly, identity-keyed maps included.
    let json = serde_json::to_string(last).unwrap();
    assert!(json.contains("\"total_supply\""));
}

#[test]
fn test_stake_gates_span_components() {
    let (mut protocol, _sink) = with_three_silver_agents(&ProtocolConfig::default());

    let id = protocol
        .create_proposal(identity(1), PolicyType::RebalanceTrigger, 86_400, 0)
        .unwrap();
    protocol
        .vote_on_proposal(identity(1), id, true, 4_500 * ONE_ARU, 10)
        .unwrap();

    // Committed stake cannot be unstaked while the proposal is open.
    let err = protocol
        .adjust_stake(identity(1), -((1_000 * ONE_ARU) as i128), 20)
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Registry(_)));

    protocol.finalize_proposal(id, 86_400).unwrap();
    protocol
        .adjust_stake(identity(1), -((1_000 * ONE_ARU) as i128), 86_410)
        .unwrap();
}
