//! crates/store_bench_core/src/workload.rs
//!
//! Store-agnostic pieces of the synthetic workload: how much data each user
//! gets, how random values are drawn, and the notification text.

use rand::{seq::index, Rng};

/// Devices registered for every synthetic user.
pub const DEVICES_PER_USER: usize = 3;

/// Distinct books every synthetic user has reading history for.
pub const BOOKS_PER_USER: usize = 3;

/// `last_page_read` is drawn uniformly from `0..MAX_PAGE`.
pub const MAX_PAGE: i32 = 500;

pub fn random_last_page<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    rng.gen_range(0..MAX_PAGE)
}

/// Draws `amount` distinct indexes from `0..len` without replacement.
///
/// Returns `None` when `len` is smaller than `amount`.
pub fn pick_distinct_indexes<R: Rng + ?Sized>(
    rng: &mut R,
    len: usize,
    amount: usize,
) -> Option<Vec<usize>> {
    if len < amount {
        return None;
    }
    Some(index::sample(rng, len, amount).into_vec())
}

/// The notification text for the document store, which carries no genre or
/// device linkage into the message.
pub fn last_read_message(last_page_read: i32, title: &str, author: &str) -> String {
    format!(
        "Hey there! You last stopped at page {} in '{}' by {}. Can't wait to see you back!",
        last_page_read, title, author
    )
}
