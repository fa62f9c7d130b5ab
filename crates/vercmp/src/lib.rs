// SPDX-FileCopyrightText: Copyright © 2020-2024 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Three-way comparison of package version strings.
//!
//! Versions are compared segment-wise, where segments are separated by
//! `.` or `_` (the latter introduces the packaging revision). Numeric
//! segments compare numerically, so `1.10 > 1.9`, and an alphabetic
//! suffix sorts before the bare release, so `1.0alpha < 1.0`.

use std::cmp::Ordering;

use itertools::{EitherOrBoth, Itertools};

const SEPARATORS: &[char] = &['.', '_'];

/// Compare two package version strings.
///
/// Missing trailing segments count as `0`, making `1.0` and `1.0.0`
/// equal, and `1.0_1` greater than `1.0`.
pub fn compare(a: &str, b: &str) -> Ordering {
    a.split(SEPARATORS)
        .zip_longest(b.split(SEPARATORS))
        .map(|pair| match pair {
            EitherOrBoth::Both(x, y) => segment(x, y),
            EitherOrBoth::Left(x) => segment(x, "0"),
            EitherOrBoth::Right(y) => segment("0", y),
        })
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

fn segment(a: &str, b: &str) -> Ordering {
    let (a_number, a_suffix) = numeric_prefix(a);
    let (b_number, b_suffix) = numeric_prefix(b);

    match (a_number, b_number) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| suffix(a_suffix, b_suffix)),
        // A purely alphabetic segment sorts after a numeric one
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn numeric_prefix(segment: &str) -> (Option<u128>, &str) {
    let end = segment
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(segment.len());

    (segment[..end].parse().ok(), &segment[end..])
}

fn suffix(a: &str, b: &str) -> Ordering {
    // The bare release outranks any suffixed pre-release: "3" > "3alpha"
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(b),
    }
}
