//! A ledger that refuses to continue once its books stop balancing.
//!
//! # Running this Example
//!
//! ```bash
//! cargo run --example fatal_assert
//! ```
//!
//! The final transfer overdraws an account, so the process prints a stack
//! trace with the offending source lines and exits with status `1`. Run it
//! with `--features remove-asserts` to see the same program carry on with
//! books that no longer balance.

use std::io;

use hardstop::classify::kind;

#[derive(Debug)]
struct Ledger {
    balances: Vec<u64>,
    total: u64,
}

impl Ledger {
    fn new(balances: Vec<u64>) -> Self {
        let total = balances.iter().sum();
        Self { balances, total }
    }

    fn transfer(&mut self, from: usize, to: usize, amount: u64) {
        hardstop::assert(from != to);
        hardstop::assert(amount <= self.balances[from]);

        self.balances[from] = self.balances[from].saturating_sub(amount);
        self.balances[to] += amount;

        // Summing every account is too slow to keep in production builds.
        hardstop::x_assert(|| self.balances.iter().sum::<u64>() == self.total);
    }
}

fn open_journal() -> Result<(), io::Error> {
    Err(io::Error::new(io::ErrorKind::NotFound, "journal.log"))
}

fn main() {
    // A missing journal is expected on first start; anything else is not.
    if let Err(error) = open_journal() {
        hardstop::assert_err_is(&error, &[&kind(io::ErrorKind::NotFound)]);
        println!("starting without a journal");
    }

    let mut ledger = Ledger::new(vec![100, 50, 0]);
    ledger.transfer(0, 2, 40);
    ledger.transfer(1, 2, 50);
    println!("balances after two transfers: {:?}", ledger.balances);

    ledger.transfer(1, 0, 10);
    println!(
        "checks compiled out, {:?} now sums to {} instead of {}",
        ledger.balances,
        ledger.balances.iter().sum::<u64>(),
        ledger.total
    );
}
