//! Entry lifetimes

use std::time::Duration;

/// Expiry requested for a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// Use the store-wide default
    #[default]
    Default,
    /// Expire after the given duration
    After(Duration),
    /// Never expire
    Never,
}

impl Ttl {
    /// Resolves to a concrete lifetime (`None` = never expires)
    pub fn resolve(self, store_default: Option<Duration>) -> Option<Duration> {
        match self {
            Ttl::Default => store_default,
            Ttl::After(ttl) => Some(ttl),
            Ttl::Never => None,
        }
    }
}

/// Lifetime classes for cached data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlClass {
    /// List/index data that changes often
    List,
    /// Individual items (reports, users, forecasts)
    Item,
    /// Rendered fragments, a pure function of their key
    Fragment,
}

/// Default lifetime per [`TtlClass`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub list: Duration,
    pub item: Duration,
    /// `None` keeps fragments until evicted
    pub fragment: Option<Duration>,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            list: Duration::from_secs(300),
            item: Duration::from_secs(3600),
            fragment: None,
        }
    }
}

impl TtlPolicy {
    pub fn ttl(&self, class: TtlClass) -> Ttl {
        match class {
            TtlClass::List => Ttl::After(self.list),
            TtlClass::Item => Ttl::After(self.item),
            TtlClass::Fragment => match self.fragment {
                Some(ttl) => Ttl::After(ttl),
                None => Ttl::Never,
            },
        }
    }
}

/// Remaining validity of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// No live entry (never stored, evicted or expired)
    Absent,
    /// Live entry without expiry
    Persistent,
    /// Live entry expiring after the given duration
    Remaining(Duration),
}

impl Validity {
    pub fn is_live(&self) -> bool {
        !matches!(self, Validity::Absent)
    }
}
