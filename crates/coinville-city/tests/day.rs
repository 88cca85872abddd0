//! A whole simulated day, end to end: agents run concurrently, the stop
//! signal drains everyone, and the city's money is conserved.

use std::sync::Arc;
use std::time::Duration;

use coinville_city::{City, Simulation};
use coinville_domain::SimConfig;

fn small_day() -> SimConfig {
    SimConfig {
        day_duration_ms: 2_000,
        worker_work_duration_ms: 20,
        banks_count: 2,
        workers_count: 3,
        spenders_count: 2,
        bank_initial_money: 500,
        client_initial_money: 50,
        worker_salary: 10,
        worker_money_limit: 30,
        report_interval_ms: 500,
        rng_seed: 7,
    }
}

#[tokio::test(start_paused = true)]
async fn a_full_day_conserves_money() {
    let cfg = small_day();
    let city = Arc::new(City::build(&cfg).unwrap());
    let expected = city.total_money();

    let report = Simulation::new(city.clone(), cfg).run_day().await;

    assert_eq!(report.opening, expected);
    assert_eq!(report.closing, expected);
    assert!(report.is_balanced());
    assert_eq!(city.total_money(), expected);

    // Every claim was released on the way out.
    for worker in city.workers() {
        assert!(!worker.is_hired());
    }
    for bank in city.banks() {
        assert!(!bank.is_busy());
        assert!(bank.is_stopping());
    }

    // The economy actually moved: at least one account ended the day away
    // from its starting balance.
    let moved = city
        .banks()
        .iter()
        .any(|b| b.balance() != cfg_initial_bank())
        || city
            .workers()
            .iter()
            .any(|w| w.balance() != cfg_initial_client())
        || city
            .spenders()
            .iter()
            .any(|s| s.balance() != cfg_initial_client());
    assert!(moved);
}

fn cfg_initial_bank() -> i64 {
    small_day().bank_initial_money as i64
}

fn cfg_initial_client() -> i64 {
    small_day().client_initial_money as i64
}

#[tokio::test]
async fn a_short_real_time_day_joins_cleanly() {
    let cfg = SimConfig {
        day_duration_ms: 150,
        worker_work_duration_ms: 10,
        report_interval_ms: 0,
        ..small_day()
    };
    let city = Arc::new(City::build(&cfg).unwrap());
    let expected = city.total_money();

    let report = tokio::time::timeout(
        Duration::from_secs(30),
        Simulation::new(city.clone(), cfg).run_day(),
    )
    .await
    .expect("the day should stop and join, not hang");

    assert!(report.is_balanced());
    assert_eq!(report.closing, expected);
}
