// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Definitions of common and general-purpose types.

mod one_or_many;
mod shared;
mod timestamp;

pub use self::one_or_many::OneOrMany;
pub use self::shared::Shared;
pub use self::timestamp::Timestamp;
