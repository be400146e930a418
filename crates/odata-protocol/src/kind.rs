//! Payload kind detection results.

use std::fmt;

/// Protocol-level classification of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Entry,
    Feed,
    Property,
    /// Raw `$value` body.
    Value,
    Collection,
    Error,
    Batch,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Entry => "entry",
            Self::Feed => "feed",
            Self::Property => "property",
            Self::Value => "value",
            Self::Collection => "collection",
            Self::Error => "error",
            Self::Batch => "batch",
        };
        f.write_str(name)
    }
}

/// Every kind a message signals. Detection may report several at once,
/// e.g. a raw value that is also flagged as a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadKinds(Vec<PayloadKind>);

impl PayloadKinds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, kind: PayloadKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PayloadKind> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<PayloadKind> for PayloadKinds {
    fn from_iter<I: IntoIterator<Item = PayloadKind>>(iter: I) -> Self {
        let mut kinds = Vec::new();
        for kind in iter {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Self(kinds)
    }
}

impl From<PayloadKind> for PayloadKinds {
    fn from(kind: PayloadKind) -> Self {
        Self(vec![kind])
    }
}

impl<const N: usize> From<[PayloadKind; N]> for PayloadKinds {
    fn from(kinds: [PayloadKind; N]) -> Self {
        kinds.into_iter().collect()
    }
}

impl fmt::Display for PayloadKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{kind}")?;
        }
        Ok(())
    }
}
