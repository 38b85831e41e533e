// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Generic ID Value Object
//!
//! A generic, type-safe ID built on ULID with a phantom category marker.
//! Concrete identifiers (`RequestId`, ...) are thin newtypes around
//! `GenericId<SomeMarker>`, giving each its own type while sharing one
//! validated, time-ordered representation.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use ulid::Ulid;

use crate::EngineError;

/// Category-specific behavior for a [`GenericId`] marker type.
pub trait IdCategory {
    fn category_name() -> &'static str;

    fn validate_id(ulid: &Ulid) -> Result<(), EngineError> {
        if *ulid == Ulid::nil() {
            return Err(EngineError::invalid_config(format!(
                "{} id cannot be nil",
                Self::category_name()
            )));
        }
        Ok(())
    }
}

/// A ULID-backed identifier, distinguished at compile time by `T`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct GenericId<T: IdCategory> {
    value: Ulid,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: IdCategory> Serialize for GenericId<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.value.to_string().serialize(serializer)
    }
}

impl<'de, T: IdCategory> Deserialize<'de> for GenericId<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let ulid = Ulid::from_string(&s).map_err(|e| serde::de::Error::custom(e.to_string()))?;
        Ok(Self { value: ulid, _phantom: std::marker::PhantomData })
    }
}

impl<T: IdCategory> GenericId<T> {
    pub fn new() -> Self {
        Self { value: Ulid::new(), _phantom: std::marker::PhantomData }
    }

    pub fn from_ulid(ulid: Ulid) -> Result<Self, EngineError> {
        T::validate_id(&ulid)?;
        Ok(Self { value: ulid, _phantom: std::marker::PhantomData })
    }

    pub fn from_string(s: &str) -> Result<Self, EngineError> {
        let ulid = Ulid::from_str(s).map_err(|e| EngineError::invalid_config(format!("invalid id: {}", e)))?;
        Self::from_ulid(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.value
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.value.timestamp_ms()
    }

    pub fn category(&self) -> &'static str {
        T::category_name()
    }

    pub fn is_nil(&self) -> bool {
        self.value.0 == 0
    }
}

impl<T: IdCategory> Default for GenericId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: IdCategory> Display for GenericId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T: IdCategory> Hash for GenericId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T: IdCategory> FromStr for GenericId<T> {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl<T: IdCategory> From<Ulid> for GenericId<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid).unwrap_or_else(|_| Self::new())
    }
}

impl<T: IdCategory> From<GenericId<T>> for Ulid {
    fn from(id: GenericId<T>) -> Self {
        id.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
    struct TestMarker;

    impl IdCategory for TestMarker {
        fn category_name() -> &'static str {
            "test"
        }
    }

    type TestId = GenericId<TestMarker>;

    #[test]
    fn ids_are_unique_and_time_ordered() {
        let a = TestId::new();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let b = TestId::new();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn nil_ulid_fails_category_validation() {
        assert!(TestId::from_ulid(Ulid::nil()).is_err());
    }

    #[test]
    fn round_trips_through_serde() {
        let id = TestId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: TestId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
