use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares an opaque, copyable row identifier backed by a `u64`.
macro_rules! define_ids {
    ( $( $(#[$meta:meta])* $name:ident ),* $(,)? ) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub u64);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<u64> for $name {
                fn from(raw: u64) -> Self {
                    Self(raw)
                }
            }
        )*
    };
}

define_ids! {
    /// Identifies a user; supplied by the caller's authentication layer.
    UserId,
    ProjectId,
    DatabaseId,
    InstanceId,
    FunctionId,
    /// Brick ids are allocated in creation order.
    BrickId,
    ConnectionId,
}
