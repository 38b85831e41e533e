// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Layout Value Object
//!
//! An ordered sequence of axis tags (§3). `Wildcard` (`?`) matches any single
//! tag; `Ellipsis` (`...`) matches zero or more unnamed axes and lets two
//! layouts unify across an inserted demultiplex prefix dimension (§4.1).

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisTag {
    N,
    C,
    H,
    W,
    D,
    Wildcard,
    Ellipsis,
    Custom(char),
}

impl AxisTag {
    fn matches(&self, other: &AxisTag) -> bool {
        matches!((self, other), (AxisTag::Wildcard, _) | (_, AxisTag::Wildcard)) || self == other
    }
}

impl Display for AxisTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisTag::N => write!(f, "N"),
            AxisTag::C => write!(f, "C"),
            AxisTag::H => write!(f, "H"),
            AxisTag::W => write!(f, "W"),
            AxisTag::D => write!(f, "D"),
            AxisTag::Wildcard => write!(f, "?"),
            AxisTag::Ellipsis => write!(f, "..."),
            AxisTag::Custom(c) => write!(f, "{c}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout(Vec<AxisTag>);

impl Layout {
    pub fn new(tags: Vec<AxisTag>) -> Self {
        Self(tags)
    }

    pub fn parse(s: &str) -> Self {
        let mut tags = Vec::new();
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '.' if chars.peek() == Some(&'.') => {
                    chars.next();
                    chars.next();
                    tags.push(AxisTag::Ellipsis);
                }
                '?' => tags.push(AxisTag::Wildcard),
                'N' => tags.push(AxisTag::N),
                'C' => tags.push(AxisTag::C),
                'H' => tags.push(AxisTag::H),
                'W' => tags.push(AxisTag::W),
                'D' => tags.push(AxisTag::D),
                other => tags.push(AxisTag::Custom(other)),
            }
        }
        Self(tags)
    }

    pub fn tags(&self) -> &[AxisTag] {
        &self.0
    }

    fn has_ellipsis(&self) -> bool {
        self.0.iter().any(|t| matches!(t, AxisTag::Ellipsis))
    }

    /// Element-wise layout compatibility (§3), honoring a leading/trailing
    /// `...` that stands for zero or more axes on either side.
    pub fn matches(&self, other: &Layout) -> bool {
        if !self.has_ellipsis() && !other.has_ellipsis() {
            return self.0.len() == other.0.len() && self.0.iter().zip(other.0.iter()).all(|(a, b)| a.matches(b));
        }
        Self::matches_with_ellipsis(&self.0, &other.0)
    }

    fn matches_with_ellipsis(a: &[AxisTag], b: &[AxisTag]) -> bool {
        match (a.first(), b.first()) {
            (Some(AxisTag::Ellipsis), _) => {
                // `...` absorbs zero or more axes from `b` until the remaining
                // suffix of `a` can match the remaining suffix of `b`.
                (0..=b.len()).any(|skip| Self::matches_with_ellipsis(&a[1..], &b[skip..]))
            }
            (_, Some(AxisTag::Ellipsis)) => Self::matches_with_ellipsis(b, a),
            (Some(x), Some(y)) => x.matches(y) && Self::matches_with_ellipsis(&a[1..], &b[1..]),
            (None, None) => true,
            _ => false,
        }
    }

    /// Prepends a shard-count axis, as a demultiplex node's output layout
    /// gains an unnamed leading dimension (§4.7).
    pub fn with_leading_wildcard(&self) -> Layout {
        let mut tags = vec![AxisTag::Wildcard];
        tags.extend(self.0.iter().cloned());
        Layout(tags)
    }
}

impl Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for t in &self.0 {
            write!(f, "{t}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_axes() {
        let l = Layout::parse("NCHW");
        assert_eq!(l.tags(), &[AxisTag::N, AxisTag::C, AxisTag::H, AxisTag::W]);
    }

    #[test]
    fn wildcard_matches_any_single_axis() {
        assert!(Layout::parse("N?HW").matches(&Layout::parse("NCHW")));
    }

    #[test]
    fn exact_match_required_without_wildcard_or_ellipsis() {
        assert!(!Layout::parse("NCHW").matches(&Layout::parse("NHWC")));
    }

    #[test]
    fn ellipsis_absorbs_inserted_prefix_axis() {
        let plain = Layout::parse("NCHW");
        let with_prefix = Layout::parse("...NCHW");
        assert!(with_prefix.matches(&plain.with_leading_wildcard()));
    }

    #[test]
    fn ellipsis_can_absorb_zero_axes() {
        assert!(Layout::parse("...NCHW").matches(&Layout::parse("NCHW")));
    }
}
