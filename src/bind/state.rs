//! Per-bind lifecycle.

use std::fmt;

use crate::error::{Error, Result};

/// Where a bind is in its single execution.
///
/// Every bind moves `Unbound -> Bound -> Executed -> Decoded -> Discarded`
/// one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindState {
    /// Descriptor constructed, nothing validated yet.
    Unbound,
    /// Validated and encoded for the wire.
    Bound,
    /// The backend call returned.
    Executed,
    /// The returned value (if any) has been materialized.
    Decoded,
    /// Ownership of the value moved to the result; the bind is spent.
    Discarded,
}

impl BindState {
    /// The only state this one may move to.
    pub fn next(self) -> Option<BindState> {
        match self {
            BindState::Unbound => Some(BindState::Bound),
            BindState::Bound => Some(BindState::Executed),
            BindState::Executed => Some(BindState::Decoded),
            BindState::Decoded => Some(BindState::Discarded),
            BindState::Discarded => None,
        }
    }

    /// Move to `to`, failing if that would skip or revisit a state.
    pub fn advance(&mut self, name: &str, to: BindState) -> Result<()> {
        if self.next() != Some(to) {
            return Err(Error::InvalidState {
                name: name.to_string(),
                from: *self,
                to,
            });
        }
        let from = *self;
        tracing::trace!(bind = name, %from, %to, "bind state");
        *self = to;
        Ok(())
    }
}

impl fmt::Display for BindState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BindState::Unbound => "UNBOUND",
            BindState::Bound => "BOUND",
            BindState::Executed => "EXECUTED",
            BindState::Decoded => "DECODED",
            BindState::Discarded => "DISCARDED",
        };
        f.write_str(name)
    }
}
