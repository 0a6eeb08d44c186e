//! OTC escrow desk simulation.
//!
//! Walks the trade lifecycle against the in-memory ledger: escrow on create, proportional
//! partial fills, excess refunds, owner cancellation, and every rejection reason.
//! Pass a desk config TOML path as the first argument to run against other listings.

use anyhow::{bail, Context};
use otc_core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

const ALICE: AccountId = AccountId(1);
const BOB: AccountId = AccountId(2);
const CAROL: AccountId = AccountId(3);

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,otc_core=debug"));
    fmt().with_env_filter(filter).with_target(false).init();

    let config = match std::env::args().nth(1) {
        Some(path) => DeskConfig::load(Path::new(&path))?,
        None => DeskConfig::local(),
    };

    println!("OTC Escrow Desk Simulation");
    println!("Escrowed, partially fillable swaps between listed assets\n");

    scenario_1_partial_fill(&config)?;
    scenario_2_closing_fill(&config)?;
    scenario_3_funding_checks(&config)?;
    scenario_4_incorrect_asset(&config)?;
    scenario_5_excess_fill(&config)?;
    scenario_6_cancellation(&config)?;
    scenario_7_multiple_fillers(&config)?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

// the first two listed assets play "give" and "want"
struct Desk {
    engine: EscrowEngine<InMemoryLedger>,
    give: AssetId,
    want: AssetId,
}

impl Desk {
    fn open(config: &DeskConfig) -> anyhow::Result<Self> {
        if config.assets.len() < 2 {
            bail!("the simulation needs at least two listed assets");
        }
        let mut engine = config.build_engine()?;
        // trades and events carry wall-clock time in the simulation
        engine.set_time(Timestamp::now());
        Ok(Self {
            engine,
            give: AssetId(0),
            want: AssetId(1),
        })
    }

    fn info(&self, asset: AssetId) -> anyhow::Result<&AssetInfo> {
        self.engine
            .ledger()
            .asset_info(asset)
            .with_context(|| format!("{asset} is not listed"))
    }

    fn units(&self, asset: AssetId, units: Decimal) -> anyhow::Result<Amount> {
        let info = self.info(asset)?;
        info.to_base_units(units)
            .with_context(|| format!("{units} is not representable in {}", info.symbol))
    }

    fn show(&self, asset: AssetId, amount: Amount) -> String {
        match self.info(asset) {
            Ok(info) => info.format(amount),
            Err(_) => amount.to_string(),
        }
    }

    fn approve(&mut self, asset: AssetId, owner: AccountId, units: Decimal) -> anyhow::Result<()> {
        let amount = self.units(asset, units)?;
        self.engine.approve(asset, owner, amount)?;
        Ok(())
    }

    fn create(&mut self, give: Decimal, want: Decimal, caller: AccountId) -> anyhow::Result<Result<TradeId, EscrowError>> {
        let give_amount = self.units(self.give, give)?;
        let want_amount = self.units(self.want, want)?;
        Ok(self
            .engine
            .create_trade(self.give, give_amount, self.want, want_amount, caller))
    }

    fn fill(&mut self, id: TradeId, asset: AssetId, units: Decimal, filler: AccountId) -> anyhow::Result<Result<FillResult, EscrowError>> {
        let amount = self.units(asset, units)?;
        Ok(self.engine.fill_trade(id, asset, amount, filler))
    }

    fn print_balances(&self, accounts: &[(&str, AccountId)]) {
        let escrow = self.engine.escrow_account();
        for (name, account) in accounts.iter().copied().chain([("Escrow", escrow)]) {
            println!(
                "  {:<6} {:>20} | {:>20}",
                name,
                self.show(self.give, self.engine.balance_of(self.give, account)),
                self.show(self.want, self.engine.balance_of(self.want, account)),
            );
        }
        println!();
    }

    fn print_trade(&self, id: TradeId) {
        match self.engine.trade(id) {
            Some(trade) => println!(
                "  {} open: {} left for {} still wanted\n",
                id,
                self.show(trade.give_asset, trade.remaining_give_amount),
                self.show(trade.want_asset, trade.remaining_want_amount),
            ),
            None => println!("  {} is no longer active\n", id),
        }
    }
}

fn describe(result: &Result<impl std::fmt::Debug, EscrowError>) -> String {
    match result {
        Ok(_) => "accepted".to_string(),
        Err(e) => format!("rejected: {}", e.reason()),
    }
}

/// Alice escrows 1 give for 25 want, Bob fills 10 want.
fn scenario_1_partial_fill(config: &DeskConfig) -> anyhow::Result<()> {
    println!("Scenario 1: Partial Fill\n");

    let mut desk = Desk::open(config)?;
    desk.approve(desk.give, ALICE, dec!(1))?;
    let id = desk.create(dec!(1), dec!(25), ALICE)??;
    println!("  Alice offers 1 for 25 as {}", id);

    desk.approve(desk.want, BOB, dec!(10))?;
    let fill = desk.fill(id, desk.want, dec!(10), BOB)??;
    println!(
        "  Bob fills {}, receives {}",
        desk.show(desk.want, fill.actual_fill),
        desk.show(desk.give, fill.give_transferred)
    );

    desk.print_balances(&[("Alice", ALICE), ("Bob", BOB)]);
    desk.print_trade(id);
    Ok(())
}

/// Filling the rest closes the trade; the id stays issued but inactive.
fn scenario_2_closing_fill(config: &DeskConfig) -> anyhow::Result<()> {
    println!("Scenario 2: Closing Fill\n");

    let mut desk = Desk::open(config)?;
    desk.approve(desk.give, ALICE, dec!(1))?;
    desk.approve(desk.want, BOB, dec!(25))?;
    let id = desk.create(dec!(1), dec!(25), ALICE)??;

    desk.fill(id, desk.want, dec!(10), BOB)??;
    let fill = desk.fill(id, desk.want, dec!(15), BOB)??;
    println!(
        "  Bob fills the last {}, receives {}, closed: {}",
        desk.show(desk.want, fill.actual_fill),
        desk.show(desk.give, fill.give_transferred),
        fill.closed
    );

    let again = desk.fill(id, desk.want, dec!(1), BOB)?;
    println!("  Filling again is {}", describe(&again));
    println!("  Trades issued: {}", desk.engine.total_trades());

    desk.print_balances(&[("Alice", ALICE), ("Bob", BOB)]);
    Ok(())
}

/// Balance is checked before allowance.
fn scenario_3_funding_checks(config: &DeskConfig) -> anyhow::Result<()> {
    println!("Scenario 3: Funding Checks\n");

    let mut desk = Desk::open(config)?;
    let too_big = desk.create(dec!(5), dec!(25), ALICE)?;
    println!("  Alice offers 5 holding 2: {}", describe(&too_big));

    desk.approve(desk.give, ALICE, dec!(1))?;
    let over_allowance = desk.create(dec!(2), dec!(50), ALICE)?;
    println!("  Alice offers 2 with 1 approved: {}", describe(&over_allowance));
    println!("  Trades issued: {}\n", desk.engine.total_trades());
    Ok(())
}

/// Only the trade's want asset is accepted.
fn scenario_4_incorrect_asset(config: &DeskConfig) -> anyhow::Result<()> {
    println!("Scenario 4: Incorrect Asset\n");

    let mut desk = Desk::open(config)?;
    desk.approve(desk.give, ALICE, dec!(1))?;
    let id = desk.create(dec!(1), dec!(25), ALICE)??;

    let wrong = desk.fill(id, desk.give, dec!(1), BOB)?;
    println!("  Bob pays with the give asset: {}", describe(&wrong));
    desk.print_trade(id);
    Ok(())
}

/// Overpaying pulls the full amount and refunds the difference in the same call.
fn scenario_5_excess_fill(config: &DeskConfig) -> anyhow::Result<()> {
    println!("Scenario 5: Excess Fill\n");

    let mut desk = Desk::open(config)?;
    desk.approve(desk.give, ALICE, dec!(1))?;
    desk.approve(desk.want, BOB, dec!(30))?;
    let id = desk.create(dec!(1), dec!(25), ALICE)??;

    let fill = desk.fill(id, desk.want, dec!(30), BOB)??;
    println!(
        "  Bob sends 30, {} counted, {} refunded",
        desk.show(desk.want, fill.actual_fill),
        desk.show(desk.want, fill.refunded)
    );

    desk.print_balances(&[("Alice", ALICE), ("Bob", BOB)]);
    desk.print_trade(id);
    Ok(())
}

/// Only the owner cancels, and only once.
fn scenario_6_cancellation(config: &DeskConfig) -> anyhow::Result<()> {
    println!("Scenario 6: Cancellation\n");

    let mut desk = Desk::open(config)?;
    desk.approve(desk.give, ALICE, dec!(1))?;
    let id = desk.create(dec!(1), dec!(25), ALICE)??;

    let by_bob = desk.engine.cancel_trade(id, BOB);
    println!("  Bob cancels: {}", describe(&by_bob));

    let by_alice = desk.engine.cancel_trade(id, ALICE)?;
    println!("  Alice cancels, refunded {}", desk.show(by_alice.give_asset, by_alice.refunded));

    let twice = desk.engine.cancel_trade(id, ALICE);
    println!("  Alice cancels again: {}", describe(&twice));

    desk.print_balances(&[("Alice", ALICE), ("Bob", BOB)]);
    Ok(())
}

/// Two fillers share one trade, the owner cancels the remainder.
fn scenario_7_multiple_fillers(config: &DeskConfig) -> anyhow::Result<()> {
    println!("Scenario 7: Multiple Fillers\n");

    let mut desk = Desk::open(config)?;
    let want = desk.want;
    let carol_share = desk.units(want, dec!(25))?;
    desk.engine.transfer(want, BOB, CAROL, carol_share)?;

    desk.approve(desk.give, ALICE, dec!(2))?;
    desk.approve(want, BOB, dec!(15))?;
    desk.approve(want, CAROL, dec!(25))?;
    let id = desk.create(dec!(2), dec!(50), ALICE)??;
    println!("  Alice offers 2 for 50 as {}", id);

    for (name, filler, units) in [("Bob", BOB, dec!(15)), ("Carol", CAROL, dec!(25))] {
        let fill = desk.fill(id, want, units, filler)??;
        println!(
            "  {} fills {}, receives {}",
            name,
            desk.show(want, fill.actual_fill),
            desk.show(desk.give, fill.give_transferred)
        );
    }
    desk.print_trade(id);

    let cancelled = desk.engine.cancel_trade(id, ALICE)?;
    println!("  Alice cancels, refunded {}", desk.show(cancelled.give_asset, cancelled.refunded));
    desk.print_balances(&[("Alice", ALICE), ("Bob", BOB), ("Carol", CAROL)]);

    let active = (0..desk.engine.total_trades())
        .filter(|&n| desk.engine.trade(TradeId(n)).is_some())
        .count();
    println!("  Active trades: {}, events logged: {}", active, desk.engine.events().len());
    Ok(())
}
