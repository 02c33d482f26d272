//! Benchmark suite for the transaction engine hot paths
//!
//! This benchmark measures note allocation and mixed engine throughput
//! using the divan benchmarking framework. Everything runs in memory so
//! the numbers reflect engine work, not disk I/O.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//! ```

use atm_engine::core::allocator::allocate;
use atm_engine::core::{AccountLedger, CashInventory, TransactionEngine};
use atm_engine::types::Account;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

fn main() {
    divan::main();
}

fn bench_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
}

fn bench_engine() -> TransactionEngine {
    let accounts = (0..100)
        .map(|i| {
            Account::new(
                1000 + i,
                "1234",
                "Bench Holder",
                Decimal::new(1_000_000, 0),
                Decimal::new(1_000_000, 0),
                Decimal::new(1_000_000, 0),
                bench_date(),
            )
        })
        .collect::<Vec<_>>();
    let inventory = CashInventory::with_stock([
        (100, 100_000),
        (200, 100_000),
        (500, 100_000),
        (2000, 100_000),
    ]);
    TransactionEngine::new(AccountLedger::with_accounts(accounts), inventory)
}

/// Benchmark greedy allocation against a deep, well-stocked inventory
#[divan::bench]
fn allocate_well_stocked(bencher: divan::Bencher) {
    let counts = BTreeMap::from([(100, 100_000), (200, 100_000), (500, 100_000), (2000, 100_000)]);
    bencher.bench(|| allocate(divan::black_box(38_700), divan::black_box(&counts)));
}

/// Benchmark allocation when the large slots are nearly exhausted and most
/// of the amount falls to the smallest denomination
#[divan::bench]
fn allocate_small_notes_heavy(bencher: divan::Bencher) {
    let counts = BTreeMap::from([(100, 100_000), (500, 2), (2000, 1)]);
    bencher.bench(|| allocate(divan::black_box(50_000), divan::black_box(&counts)));
}

/// Benchmark a run of withdrawals spread across accounts
#[divan::bench]
fn engine_withdrawals(bencher: divan::Bencher) {
    bencher
        .with_inputs(bench_engine)
        .bench_local_values(|mut engine| {
            for i in 0..1_000u32 {
                engine
                    .withdraw(1000 + (i % 100), 700)
                    .expect("Withdrawal failed");
            }
            engine
        });
}

/// Benchmark a mixed session of deposits, withdrawals, and exchanges
#[divan::bench]
fn engine_mixed_operations(bencher: divan::Bencher) {
    bencher
        .with_inputs(bench_engine)
        .bench_local_values(|mut engine| {
            for i in 0..1_000u32 {
                let account = 1000 + (i % 100);
                match i % 3 {
                    0 => {
                        engine.deposit(account, 1_500).expect("Deposit failed");
                    }
                    1 => {
                        engine.withdraw(account, 2_700).expect("Withdrawal failed");
                    }
                    _ => {
                        engine.exchange(500, 100, 2).expect("Exchange failed");
                    }
                }
            }
            engine
        });
}
