// SPDX-License-Identifier: Apache-2.0

//! Redacted configuration secrets
//!
//! Secrets are read from configuration but never written back out: the type
//! implements `Deserialize` only, so a config holding one cannot be
//! serialized by accident and lose the value.

use std::fmt::{self, Debug, Display, Formatter};

use serde::{Deserialize, Deserializer};

const REDACTED: &str = "[REDACTED]";

/// Database password or other secret loaded from configuration.
///
/// `Debug` and `Display` print a placeholder; [`Sensitive::expose`] is the
/// only way to the value.
#[derive(Clone, Default, Eq, PartialEq, Hash)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Hand the secret to the connector. Do not log the result.
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T> Debug for Sensitive<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> Display for Sensitive<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Self)
    }
}
