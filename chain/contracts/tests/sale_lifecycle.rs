//! Sale Lifecycle Tests
//!
//! End-to-end flows through the public API:
//! - Setup → reserve → close → staged release
//! - Reference scenarios for bounds, funds and release fractions
//! - Config-driven sale rounds
//! - Snapshot hand-off between hosts

use sale_contracts::asset::{AssetAccount, InMemoryAsset};
use sale_contracts::config::SaleConfig;
use sale_contracts::errors::{LimitKind, SaleError, TimingKind};
use sale_contracts::events::ContractEvent;
use sale_contracts::ledger::SaleLedger;
use sale_contracts::release::ReleaseSchedule;
use sale_contracts::snapshot::LedgerSnapshot;
use sale_types::ids::Address;
use sale_types::numeric::UnitScale;

const PRICE: u128 = 80_000; // 0.08 USDT (6 decimals) per whole unit
const START: i64 = 1_735_689_600;
const MONTH: i64 = 2_592_000;

type Ledger = SaleLedger<InMemoryAsset, InMemoryAsset>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn addr(s: &str) -> Address {
    Address::from(s)
}

fn scale() -> UnitScale {
    UnitScale::from_decimals(18).unwrap()
}

fn setup_ledger(interval: i64, total_releases: u64, supply_units: u128) -> Ledger {
    init_tracing();
    let schedule = ReleaseSchedule::new(START, interval, total_releases).unwrap();
    let mut ledger = SaleLedger::new(
        "admin",
        "sale",
        PRICE,
        scale(),
        schedule,
        InMemoryAsset::new("USDT"),
        InMemoryAsset::new("SALE"),
    );
    ledger
        .sale_asset_mut()
        .mint(&addr("sale"), supply_units * scale().factor())
        .unwrap();
    ledger
}

fn fund(ledger: &mut Ledger, who: &str, balance: u128, approved: u128) {
    ledger.payment_asset_mut().mint(&addr(who), balance).unwrap();
    ledger
        .payment_asset_mut()
        .approve(&addr(who), &addr("sale"), approved);
}

// ═══════════════════════════════════════════════════════════════════
// Reference Scenarios
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_buy_above_max_is_refused_without_side_effects() {
    let mut ledger = setup_ledger(0, 10, 1_000);
    fund(&mut ledger, "alice", 50 * PRICE, 50 * PRICE);
    ledger.add_participant(&addr("admin"), &addr("alice"), 1, 49).unwrap();
    let events_before = ledger.events().len();

    let err = ledger.lock_tokens(&addr("alice"), 50).unwrap_err();
    assert_eq!(err, SaleError::LimitExceeded(LimitKind::BuyHigh));
    assert_eq!(err.to_string(), "Limit exceeded: buy-high");

    assert_eq!(ledger.participant(&addr("alice")).unwrap().reserved, 0);
    assert_eq!(ledger.total_bought(), 0);
    assert_eq!(ledger.payment_asset().balance_of(&addr("alice")), 50 * PRICE);
    assert_eq!(ledger.events().len(), events_before);
}

#[test]
fn test_approved_but_underfunded_buyer_is_refused() {
    let mut ledger = setup_ledger(0, 10, 1_000);
    // Allowance covers 10 units, balance does not
    fund(&mut ledger, "alice", 10 * PRICE - 1, 10 * PRICE);
    ledger.add_participant(&addr("admin"), &addr("alice"), 1, 100).unwrap();

    let err = ledger.lock_tokens(&addr("alice"), 10).unwrap_err();
    assert!(matches!(err, SaleError::InsufficientFunds { .. }));
    assert_eq!(ledger.total_bought(), 0);
}

#[test]
fn test_reserve_then_release_ten_and_twenty_percent() {
    let mut ledger = setup_ledger(0, 10, 1_000);
    fund(&mut ledger, "alice", 1_000 * PRICE, 1_000 * PRICE);
    ledger.add_participant(&addr("admin"), &addr("alice"), 1, 100).unwrap();

    assert_eq!(ledger.lock_tokens(&addr("alice"), 23).unwrap(), 23);
    assert_eq!(ledger.participant(&addr("alice")).unwrap().reserved, 23);
    assert_eq!(
        ledger.payment_asset().balance_of(&addr("alice")),
        1_000 * PRICE - 23 * PRICE
    );

    ledger.close(&addr("admin")).unwrap();
    let full = 23 * scale().factor();

    ledger.release_tokens(&addr("admin"), START).unwrap();
    assert_eq!(ledger.sale_asset().balance_of(&addr("alice")), full / 10);

    ledger.release_tokens(&addr("admin"), START).unwrap();
    assert_eq!(ledger.sale_asset().balance_of(&addr("alice")), full * 2 / 10);
}

// ═══════════════════════════════════════════════════════════════════
// Full Lifecycle
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_monthly_vesting_lifecycle() {
    let mut ledger = setup_ledger(MONTH, 6, 10_000);
    for (who, units) in [("alice", 1_000u128), ("bob", 333), ("carol", 7)] {
        fund(&mut ledger, who, units * PRICE, units * PRICE);
        ledger.add_participant(&addr("admin"), &addr(who), 1, 5_000).unwrap();
        ledger.lock_tokens(&addr(who), units).unwrap();
    }
    assert_eq!(ledger.total_bought(), 1_340 * scale().factor());
    assert_eq!(ledger.payment_asset().balance_of(&addr("sale")), 1_340 * PRICE);

    ledger.close(&addr("admin")).unwrap();
    assert!(matches!(
        ledger.release_tokens(&addr("admin"), START - 1),
        Err(SaleError::TimingError(TimingKind::BeforeInitialDate { .. }))
    ));

    let mut now = START;
    for stage in 0..6u64 {
        assert_eq!(ledger.schedule().next_release_at().unwrap(), START + stage as i64 * MONTH);
        ledger.release_tokens(&addr("admin"), now).unwrap();
        now += MONTH;
    }

    for (who, units) in [("alice", 1_000u128), ("bob", 333), ("carol", 7)] {
        let record = ledger.participant(&addr(who)).unwrap();
        assert_eq!(record.sent, units * scale().factor());
        assert_eq!(ledger.sale_asset().balance_of(&addr(who)), units * scale().factor());
    }
    assert_eq!(ledger.outstanding_obligation(), 0);
    assert_eq!(ledger.sale_surplus(), 8_660 * scale().factor());

    // The payment asset can now be collected
    ledger
        .sweep_payment(&addr("admin"), &addr("treasury"), 1_340 * PRICE)
        .unwrap();
    assert_eq!(ledger.payment_asset().balance_of(&addr("treasury")), 1_340 * PRICE);

    let stages: Vec<u64> = ledger
        .events()
        .iter()
        .filter_map(|event| match event {
            ContractEvent::ReleaseFinished(finished) => Some(finished.stage),
            _ => None,
        })
        .collect();
    assert_eq!(stages, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_extra_releases_after_last_stage_are_harmless() {
    let mut ledger = setup_ledger(0, 2, 100);
    fund(&mut ledger, "alice", 3 * PRICE, 3 * PRICE);
    ledger.add_participant(&addr("admin"), &addr("alice"), 1, 10).unwrap();
    ledger.lock_tokens(&addr("alice"), 3).unwrap();
    ledger.close(&addr("admin")).unwrap();

    let mut paid = 0;
    for _ in 0..5 {
        paid += ledger.release_tokens(&addr("admin"), START).unwrap();
    }
    assert_eq!(paid, 3 * scale().factor());
    assert_eq!(ledger.schedule().current_release(), 5);
}

#[test]
fn test_supply_caps_aggregate_reservations() {
    let mut ledger = setup_ledger(0, 4, 30);
    for who in ["alice", "bob"] {
        fund(&mut ledger, who, 100 * PRICE, 100 * PRICE);
        ledger.add_participant(&addr("admin"), &addr(who), 1, 100).unwrap();
    }
    ledger.lock_tokens(&addr("alice"), 20).unwrap();

    let err = ledger.lock_tokens(&addr("bob"), 11).unwrap_err();
    assert_eq!(
        err,
        SaleError::InsufficientSupply {
            required: 31 * scale().factor(),
            available: 30 * scale().factor(),
        }
    );
    assert_eq!(ledger.lock_tokens(&addr("bob"), 10).unwrap(), 10);
}

// ═══════════════════════════════════════════════════════════════════
// Config & Snapshot
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_private_round_from_config() {
    init_tracing();
    let config = SaleConfig::from_json_str(
        r#"{
            "tier": "private",
            "unit_price": 120000,
            "sale_decimals": 18,
            "init_release_date": 1735689600,
            "release_interval": 0,
            "total_releases": 4,
            "participants": [
                { "address": "fund-a", "min_buy_allowed": 100, "max_buy_allowed": 10000 }
            ]
        }"#,
    )
    .unwrap();

    let mut sale = InMemoryAsset::new("SALE");
    sale.mint(&addr("private-sale"), 10_000 * scale().factor()).unwrap();
    let mut payment = InMemoryAsset::new("USDT");
    payment.mint(&addr("fund-a"), 100 * 120_000).unwrap();
    payment.approve(&addr("fund-a"), &addr("private-sale"), 100 * 120_000);

    let mut ledger = SaleLedger::from_config(&config, "admin", "private-sale", payment, sale).unwrap();
    assert_eq!(
        ledger.lock_tokens(&addr("fund-a"), 99),
        Err(SaleError::LimitExceeded(LimitKind::BelowMinimum))
    );
    assert_eq!(ledger.lock_tokens(&addr("fund-a"), 100).unwrap(), 100);
}

#[test]
fn test_snapshot_handoff_mid_vesting() {
    let mut ledger = setup_ledger(0, 4, 100);
    fund(&mut ledger, "alice", 40 * PRICE, 40 * PRICE);
    ledger.add_participant(&addr("admin"), &addr("alice"), 1, 40).unwrap();
    ledger.lock_tokens(&addr("alice"), 40).unwrap();
    ledger.close(&addr("admin")).unwrap();
    ledger.release_tokens(&addr("admin"), START).unwrap();

    let json = serde_json::to_string(&ledger.snapshot()).unwrap();
    let snapshot: LedgerSnapshot = serde_json::from_str(&json).unwrap();
    let payment = ledger.payment_asset().clone();
    let sale = ledger.sale_asset().clone();

    let mut restored = SaleLedger::restore(snapshot, payment, sale).unwrap();
    assert_eq!(restored.schedule().current_release(), 1);
    assert!(!restored.is_open());
    for _ in 0..3 {
        restored.release_tokens(&addr("admin"), START).unwrap();
    }
    assert_eq!(
        restored.sale_asset().balance_of(&addr("alice")),
        40 * scale().factor()
    );
}
