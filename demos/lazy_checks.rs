//! Expensive validation that disappears from stripped builds.
//!
//! # Running this Example
//!
//! ```bash
//! cargo run --example lazy_checks
//! cargo run --example lazy_checks --features remove-asserts
//! ```
//!
//! The first run validates the index after every insert. The second compiles
//! the checks out: the validation closures and macro arguments are never
//! evaluated, which the counter at the end shows.

use std::cell::Cell;

use hardstop::{hard_assert, hard_assert_nil};

thread_local! {
    static VALIDATIONS: Cell<u32> = const { Cell::new(0) };
}

struct SortedIndex {
    keys: Vec<u32>,
}

impl SortedIndex {
    fn is_sorted(&self) -> bool {
        VALIDATIONS.with(|count| count.set(count.get() + 1));
        self.keys.windows(2).all(|pair| pair[0] < pair[1])
    }

    fn insert(&mut self, key: u32) {
        match self.keys.binary_search(&key) {
            Ok(_) => hardstop::maybe(true),
            Err(position) => self.keys.insert(position, key),
        }
        hardstop::x_assert(|| self.is_sorted());
    }

    fn duplicate(&self) -> Option<u32> {
        VALIDATIONS.with(|count| count.set(count.get() + 1));
        self.keys
            .windows(2)
            .find(|pair| pair[0] == pair[1])
            .map(|pair| pair[0])
    }
}

fn main() {
    let mut index = SortedIndex { keys: Vec::new() };
    for key in [42, 7, 19, 7, 88, 3] {
        index.insert(key);
    }

    hard_assert!(index.is_sorted());
    hard_assert_nil!(index.duplicate());

    println!("checks compiled in: {}", hardstop::ENABLED);
    println!("keys: {:?}", index.keys);
    println!(
        "validation passes run: {}",
        VALIDATIONS.with(|count| count.get())
    );
}
