// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::kurbo::{Affine, SvgParseError};
use thiserror::Error;

/// Errors produced while decoding attribute values or composing transforms.
///
/// None of these abort a render: the draw path turns them into a log record
/// and skips the offending element.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The transform has a zero (or non-finite) determinant.
    #[error("transform {0:?} is not invertible")]
    SingularTransform(Affine),
    /// An attribute value could not be interpreted.
    #[error("invalid value {value:?} for attribute `{name}`")]
    InvalidAttribute {
        /// Attribute name, lower case.
        name: &'static str,
        /// The raw value.
        value: String,
    },
    /// Path data could not be parsed.
    #[error("failed to parse path data: {0}")]
    PathData(#[from] SvgParseError),
    /// A length, number list, transform or color failed to parse.
    #[error("failed to parse attribute value: {0}")]
    Syntax(#[from] svgtypes::Error),
}

/// A specialized `Result` type for attribute decoding.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn invalid(name: &'static str, value: &str) -> Self {
        Self::InvalidAttribute {
            name,
            value: value.to_owned(),
        }
    }
}
