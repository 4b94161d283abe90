use std::fmt;

/// Money amount represented as **integer cents**.
///
/// Prices, receipt totals and revenue figures are all stored in minor units
/// to avoid floating-point drift.
///
/// ```rust
/// use engine::MoneyCents;
///
/// let rate = MoneyCents::new(50);
/// assert_eq!(rate.per_unit(200).unwrap().cents(), 10_000);
/// assert_eq!(rate.to_string(), "0.50€");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Total for `units` at this unit price; `None` on overflow or negative
    /// quantities.
    #[must_use]
    pub fn per_unit(self, units: i64) -> Option<MoneyCents> {
        if units < 0 {
            return None;
        }
        self.0.checked_mul(units).map(MoneyCents)
    }

    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(MoneyCents)
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}€", abs / 100, abs % 100)
    }
}
