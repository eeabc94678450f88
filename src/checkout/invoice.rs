//! Invoice number generation
//!
//! Format: `INV-<year>-<ddd><rrr>` where `ddd` is the zero-padded UTC
//! day of year and `rrr` a random 3-digit suffix. Uniqueness is enforced
//! by the database index; the checkout pipeline regenerates once on a
//! collision.

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;

/// Deterministic core, separated for tests
pub fn invoice_no_for(at: DateTime<Utc>, rand3: u32) -> String {
    format!("INV-{}-{:03}{:03}", at.year(), at.ordinal(), rand3 % 1000)
}

/// Generate an invoice number for now
pub fn generate_invoice_no() -> String {
    let rand3 = rand::thread_rng().gen_range(0..1000);
    invoice_no_for(Utc::now(), rand3)
}
