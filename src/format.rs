//! Currency amounts and their two display modes.
//!
//! Answers use the full en-US form (`$1,696,424,899.00`); dashboard figures use
//! the compact short form (`$1.7B`). Both work from exact integer cents.

use std::iter::Sum;
use std::ops::Add;

use serde::{Serialize, Serializer};

/// A non-negative USD amount held as whole cents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Usd {
    cents: u128,
}

impl Usd {
    pub const ZERO: Usd = Usd { cents: 0 };

    pub fn from_dollars(dollars: u64) -> Self {
        Usd {
            cents: u128::from(dollars) * 100,
        }
    }

    pub fn from_cents(cents: u128) -> Self {
        Usd { cents }
    }

    pub fn cents(self) -> u128 {
        self.cents
    }

    /// Dollar part, truncating any cents
    pub fn whole_dollars(self) -> u128 {
        self.cents / 100
    }

    /// Divide by `count`, rounding half-up to the cent. Zero when `count` is zero.
    pub fn div_round(self, count: usize) -> Usd {
        if count == 0 {
            return Usd::ZERO;
        }
        let count = count as u128;
        Usd::from_cents(round_half_up(self.cents, count))
    }
}

impl Add for Usd {
    type Output = Usd;

    fn add(self, rhs: Usd) -> Usd {
        Usd {
            cents: self.cents + rhs.cents,
        }
    }
}

impl Sum for Usd {
    fn sum<I: Iterator<Item = Usd>>(iter: I) -> Usd {
        iter.fold(Usd::ZERO, Add::add)
    }
}

impl std::fmt::Display for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.whole_dollars(), self.cents() % 100)
    }
}

/// Serialized as a plain decimal string so large sums stay exact in JSON
impl Serialize for Usd {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Compact suffixes, largest first, with their size in dollars
const COMPACT_UNITS: [(u128, &str); 4] = [
    (1_000_000_000_000, "T"),
    (1_000_000_000, "B"),
    (1_000_000, "M"),
    (1_000, "K"),
];

/// Full-precision en-US currency, e.g. `$4,000,000,000.00`
pub fn format_currency_full(amount: Usd) -> String {
    format!(
        "${}.{:02}",
        group_thousands(amount.whole_dollars()),
        amount.cents() % 100
    )
}

/// Compact en-US currency with at most one fraction digit, e.g. `$1.7B`, `$672.8M`
pub fn format_currency_compact(amount: Usd) -> String {
    // Index of the first unit the amount reaches; past the end means no suffix
    let mut idx = COMPACT_UNITS
        .iter()
        .position(|&(size, _)| amount.cents >= size * 100)
        .unwrap_or(COMPACT_UNITS.len());

    loop {
        let (size, suffix) = COMPACT_UNITS.get(idx).copied().unwrap_or((1, ""));
        let tenths = round_half_up(amount.cents * 10, size * 100);

        // Rounding 999.95 up to 1000 belongs to the next unit
        if tenths >= 10_000 && idx > 0 {
            idx -= 1;
            continue;
        }

        let whole = group_thousands(tenths / 10);
        return match tenths % 10 {
            0 => format!("${whole}{suffix}"),
            frac => format!("${whole}.{frac}{suffix}"),
        };
    }
}

fn round_half_up(numerator: u128, denominator: u128) -> u128 {
    (numerator * 2 + denominator) / (denominator * 2)
}

/// `1234567` -> `1,234,567`
fn group_thousands(n: u128) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
