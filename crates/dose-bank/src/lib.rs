// ─────────────────────────────────────────────────────────────────────
// DOSE Kernel — Item Bank
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Mini-IPIP6 item bank: 24 items with Graded Response Model parameters
//! (discrimination α, six ordered thresholds β₁..β₆) from Sibley (2012),
//! four items per trait across the six HEXACO-style dimensions.
//!
//! The bank is process-wide, read-only data: materialize one `ItemBank`
//! at startup and share it by reference. No per-session copy is needed.

pub mod bank;
pub mod items;

pub use bank::ItemBank;
pub use items::{Item, ITEMS, ITEM_COUNT, ITEMS_PER_TRAIT};
