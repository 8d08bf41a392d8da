use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for shape and connection IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a string as an ID, or return the existing one.
            pub fn intern(s: &str) -> Self {
                $name(INTERNER.get_or_intern(s))
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &str {
                INTERNER.resolve(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "@{}", self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "@{}", self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok($name::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Identifier of a shape on the board. 4 bytes, Copy, O(1) Eq/Hash.
    ShapeId
);

interned_id!(
    /// Identifier of a directed connection between two shapes.
    ConnectionId
);

/// Source of fresh identifiers, injected into the stores.
///
/// Tests supply deterministic generators; hosts may plug in random or
/// server-issued IDs.
pub trait IdGenerator {
    /// Produce a new identifier string. `prefix` names the kind of
    /// element (`"shape"`, `"conn"`).
    fn next_id(&mut self, prefix: &str) -> String;
}

impl<F> IdGenerator for F
where
    F: FnMut(&str) -> String,
{
    fn next_id(&mut self, prefix: &str) -> String {
        self(prefix)
    }
}

/// Per-instance counter producing `prefix_1`, `prefix_2`, ...
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next += 1;
        format!("{prefix}_{}", self.next)
    }
}

/// Redraws granted to a generator that keeps returning taken IDs.
const MAX_REDRAWS: usize = 16;

/// Draw an ID string from `ids` that `taken` does not reject.
///
/// A generator that repeats itself more than `MAX_REDRAWS` times gets its
/// last answer suffixed with a counter until the result is free.
pub(crate) fn draw_unique(
    ids: &mut dyn IdGenerator,
    prefix: &str,
    taken: impl Fn(&str) -> bool,
) -> String {
    let mut last = String::new();
    for _ in 0..MAX_REDRAWS {
        let candidate = ids.next_id(prefix);
        if !taken(&candidate) {
            return candidate;
        }
        log::warn!("id generator repeated {candidate:?}, drawing another");
        last = candidate;
    }
    log::warn!("id generator stuck on {last:?}, suffixing");
    let mut n: u64 = 1;
    loop {
        let candidate = format!("{last}~{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
