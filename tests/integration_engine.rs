//! End-to-end scenarios driven through the engine's command and tick API.

mod common;

use energy_tycoon::buildings::{Dwelling, DwellingId, DwellingTier, EnergyType};
use energy_tycoon::economy::TransactionKind;
use energy_tycoon::error::CommandError;
use energy_tycoon::map::Position;
use energy_tycoon::sim::kpi::KpiReport;
use energy_tycoon::sim::types::{Notification, SimState};

#[test]
fn plant_purchase_then_unaffordable_upgrade() {
    let mut config = common::quiet_config();
    config.player.initial_money = 1500;
    let mut engine = common::started(config);

    let id = engine
        .build_plant(EnergyType::Coal, Position::new(1, 1))
        .expect("coal plant should be affordable");
    assert_eq!(engine.player().money(), 500);

    let history = engine.market().history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, TransactionKind::Expense);
    assert_eq!(history[0].amount, 1000);

    // Level 2 coal costs 1000 × 1.5 × 0.6.
    let err = engine.upgrade_plant(id);
    assert_eq!(
        err,
        Err(CommandError::InsufficientFunds {
            needed: 900,
            available: 500,
        })
    );
    assert_eq!(engine.player().money(), 500);
    assert_eq!(engine.market().history().len(), 1);
    assert_eq!(engine.map().plant(id).map(|p| p.level().number()), Some(1));
}

#[test]
fn supplied_payment_is_capped_by_affordability() {
    let mut dwelling = Dwelling::with_values(DwellingId(1), DwellingTier::Basic, 100, 15);
    assert_eq!(dwelling.energy_payment(0.20), 0, "unsupplied dwellings pay nothing");

    dwelling.set_supplied(true);
    assert_eq!(dwelling.energy_payment(0.20), 15);
    assert_eq!(dwelling.energy_payment(0.10), 10);
}

#[test]
fn blackout_ends_the_game_exactly_once() {
    // Three dwellings and no plants: every tick loses 15 happiness.
    let mut engine = common::started(common::quiet_config());

    let reports = engine.run(50);
    assert_eq!(reports.len(), 4);
    assert_eq!(reports.last().map(|r| r.happiness), Some(15));
    assert_eq!(engine.state(), SimState::GameOver);
    assert!(engine.game_over_cause().is_some());

    let money = engine.player().money();
    let happiness = engine.happiness();
    for _ in 0..10 {
        assert!(engine.run_cycle().is_none());
    }
    assert_eq!(engine.player().money(), money);
    assert_eq!(engine.happiness(), happiness);
    assert_eq!(engine.ticks(), 4);

    let game_overs = engine
        .drain_notifications()
        .into_iter()
        .filter(|n| matches!(n, Notification::GameOver(_)))
        .count();
    assert_eq!(game_overs, 1);
}

#[test]
fn commands_are_rejected_after_game_over() {
    let mut engine = common::started(common::quiet_config());
    engine.run(50);
    assert!(engine.is_game_over());

    let money = engine.player().money();
    assert_eq!(
        engine.build_plant(EnergyType::Coal, Position::new(1, 1)),
        Err(CommandError::GameOver)
    );
    assert_eq!(engine.build_dwelling(Position::new(2, 2)), Err(CommandError::GameOver));
    assert_eq!(engine.player().money(), money);
}

#[test]
fn nuclear_city_never_runs_short() {
    let mut engine = common::started(common::config_with_plant(EnergyType::Nuclear, 6, 7));
    let reports = engine.run(48);
    assert_eq!(reports.len(), 48);

    let kpi = KpiReport::from_reports(&reports);
    assert_eq!(kpi.shortage_ticks, 0);
    assert!((kpi.average_supply_ratio - 1.0).abs() < f64::EPSILON);
    assert_eq!(kpi.unpaid_maintenance_ticks, 0);
    assert_eq!(kpi.max_happiness, 100);
    assert!(kpi.peak_population > 9, "a happy, powered city grows");
    assert_eq!(kpi.days, 4);
}

#[test]
fn ledger_balances_against_purse() {
    let mut engine = common::started(common::config_with_plant(EnergyType::Coal, 6, 7));
    engine
        .build_plant(EnergyType::Solar, Position::new(2, 2))
        .expect("solar plant should be affordable");
    let reports = engine.run(32);

    let net: i64 = engine
        .market()
        .history()
        .iter()
        .map(|t| t.signed_amount())
        .sum();
    // Every tick's maintenance was affordable, so ledger and purse agree.
    assert!(reports.iter().all(|r| r.maintenance_paid));
    assert_eq!(10_000 + net, engine.player().money());
}

#[test]
fn pause_freezes_the_city() {
    let mut engine = common::started(common::config_with_plant(EnergyType::Coal, 6, 7));
    engine.run_cycle();
    engine.pause();
    assert_eq!(engine.state(), SimState::Paused);

    let clock = engine.clock().to_string();
    let money = engine.player().money();
    assert!(engine.run_cycle().is_none());
    assert_eq!(engine.clock().to_string(), clock);
    assert_eq!(engine.player().money(), money);

    engine.pause();
    assert_eq!(engine.state(), SimState::Paused, "pausing twice is a no-op");
    engine.resume();
    assert!(engine.run_cycle().is_some());
    assert_eq!(
        engine.drain_notifications()
            .iter()
            .filter(|n| matches!(n, Notification::Paused | Notification::Resumed))
            .count(),
        2
    );
}

#[test]
fn routed_line_powers_a_remote_dwelling() {
    // Coal at the west edge; a dwelling far east is out of coverage.
    let mut config = common::quiet_config();
    config.city.starting_dwellings = 0;
    config.city.starting_plants.push(energy_tycoon::config::StartingPlant {
        kind: EnergyType::Coal,
        x: 1,
        y: 7,
    });
    let mut engine = common::started(config);

    let home = Position::new(15, 7);
    engine.build_dwelling(home).expect("free land");
    assert!(!engine.map().cell(home).is_some_and(|c| c.is_powered()));

    let line = engine
        .create_power_line(Position::new(1, 7), home)
        .expect("dry map has a straight route");
    assert!(engine.map().cell(home).is_some_and(|c| c.is_powered()));
    assert_eq!(
        engine.create_power_line(Position::new(1, 7), home),
        Err(CommandError::AlreadyPowered(home))
    );

    engine.remove_power_line(line).expect("line exists");
    assert!(!engine.map().cell(home).is_some_and(|c| c.is_powered()));
}
