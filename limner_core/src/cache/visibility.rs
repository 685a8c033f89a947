// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The three-valued visibility lattice.

/// Whether a style element will ever paint anything.
///
/// A cache starts [`Undetermined`](Self::Undetermined) and settles into one
/// of the three other states on evaluation. Composite caches combine their
/// children with [`and`](Self::and) (every part must paint) or
/// [`or`](Self::or) (any part painting is enough).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Not evaluated yet.
    #[default]
    Undetermined,
    /// Paints for every feature.
    Always,
    /// Paints for no feature; nothing is retained to paint.
    Never,
    /// Whether it paints depends on the feature's attributes.
    DependsOnFeature,
}

impl Visibility {
    /// Conjunctive combination: both parts must be visible.
    ///
    /// `Never` absorbs everything. `Undetermined` is the identity.
    #[must_use]
    pub const fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::Never, _) | (_, Self::Never) => Self::Never,
            (Self::Undetermined, x) | (x, Self::Undetermined) => x,
            (Self::DependsOnFeature, _) | (_, Self::DependsOnFeature) => Self::DependsOnFeature,
            (Self::Always, Self::Always) => Self::Always,
        }
    }

    /// Disjunctive combination: either part being visible is enough.
    ///
    /// `Always` absorbs everything. `Undetermined` is the identity.
    #[must_use]
    pub const fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::Always, _) | (_, Self::Always) => Self::Always,
            (Self::Undetermined, x) | (x, Self::Undetermined) => x,
            (Self::DependsOnFeature, _) | (_, Self::DependsOnFeature) => Self::DependsOnFeature,
            (Self::Never, Self::Never) => Self::Never,
        }
    }

    /// Downgrades a decided-visible state to feature-dependent.
    ///
    /// `Never` stays `Never`.
    #[must_use]
    pub const fn escalate_to_dynamic(self) -> Self {
        match self {
            Self::Never => Self::Never,
            _ => Self::DependsOnFeature,
        }
    }

    /// Returns `true` for `Always` and `Never`.
    #[must_use]
    pub const fn is_decided(self) -> bool {
        matches!(self, Self::Always | Self::Never)
    }

    /// Returns `true` for `Never`.
    #[must_use]
    pub const fn is_never(self) -> bool {
        matches!(self, Self::Never)
    }
}
