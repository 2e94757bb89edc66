//! Tri-state freshness wrapper for soft-failing fetches.

/// A remotely fetched value that may deliberately be kept past a
/// failed refresh.
///
/// `Stale` makes the soft-fail policy visible to callers: a value kept
/// after a fetch error is distinguishable from one the last fetch
/// returned.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Freshness<T> {
    /// The last fetch returned this value.
    Fresh(T),
    /// Last known value, kept after a failed refresh or a process
    /// restart.
    Stale(T),
    #[default]
    Absent,
}

impl<T> Freshness<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Freshness::Fresh(v) | Freshness::Stale(v) => Some(v),
            Freshness::Absent => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Freshness::Fresh(v) | Freshness::Stale(v) => Some(v),
            Freshness::Absent => None,
        }
    }

    /// Demote a held value to `Stale`; `Absent` stays `Absent`.
    pub fn into_stale(self) -> Self {
        match self {
            Freshness::Fresh(v) | Freshness::Stale(v) => Freshness::Stale(v),
            Freshness::Absent => Freshness::Absent,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh(_))
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Freshness::Stale(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Freshness::Absent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_stale_keeps_value() {
        assert_eq!(Freshness::Fresh(1).into_stale(), Freshness::Stale(1));
        assert_eq!(Freshness::Stale(1).into_stale(), Freshness::Stale(1));
        assert_eq!(Freshness::<i32>::Absent.into_stale(), Freshness::Absent);
    }

    #[test]
    fn value_accessors() {
        assert_eq!(Freshness::Fresh(7).value(), Some(&7));
        assert_eq!(Freshness::Stale(7).value(), Some(&7));
        assert_eq!(Freshness::<i32>::Absent.value(), None);
        assert!(Freshness::<i32>::Absent.is_absent());
        assert!(Freshness::Stale(7).is_stale());
        assert!(!Freshness::Stale(7).is_fresh());
    }
}
