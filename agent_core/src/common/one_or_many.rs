// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use core::slice::Iter;

use serde::Deserialize;
use serde::Serialize;

/// A generic container that serializes a single `T` without the enclosing
/// JSON array brackets.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
  /// A single instance of `T`.
  One(T),
  /// Multiple (zero or more) instances of `T`.
  Many(Vec<T>),
}

impl<T> OneOrMany<T> {
  /// Returns the number of elements in the collection.
  pub fn len(&self) -> usize {
    match self {
      Self::One(_) => 1,
      Self::Many(inner) => inner.len(),
    }
  }

  /// Returns `true` if the collection is empty.
  pub fn is_empty(&self) -> bool {
    match self {
      Self::One(_) => false,
      Self::Many(inner) => inner.is_empty(),
    }
  }

  /// Returns a slice of the contained elements.
  pub fn as_slice(&self) -> &[T] {
    match self {
      Self::One(inner) => core::slice::from_ref(inner),
      Self::Many(inner) => inner,
    }
  }

  /// Returns an iterator over the contained elements.
  pub fn iter(&self) -> Iter<'_, T> {
    self.as_slice().iter()
  }

  /// Consumes the container and returns the elements as a `Vec`.
  pub fn into_vec(self) -> Vec<T> {
    match self {
      Self::One(inner) => vec![inner],
      Self::Many(inner) => inner,
    }
  }
}

impl<T: PartialEq> OneOrMany<T> {
  /// Returns `true` if the collection contains `value`.
  pub fn contains(&self, value: &T) -> bool {
    self.as_slice().contains(value)
  }
}

impl<T> From<T> for OneOrMany<T> {
  fn from(other: T) -> Self {
    Self::One(other)
  }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
  fn from(other: Vec<T>) -> Self {
    Self::Many(other)
  }
}

impl<T> Default for OneOrMany<T> {
  fn default() -> Self {
    Self::Many(Vec::new())
  }
}
