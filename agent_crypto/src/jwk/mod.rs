// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! JSON Web Keys (RFC 7517) and their RFC 7638 thumbprints.

mod curve;
mod key;
mod key_params;
mod key_type;

pub use self::curve::EcCurve;
pub use self::curve::EdCurve;
pub use self::key::Jwk;
pub use self::key_params::JwkParams;
pub use self::key_params::JwkParamsEc;
pub use self::key_params::JwkParamsOct;
pub use self::key_params::JwkParamsOkp;
pub use self::key_type::JwkType;
