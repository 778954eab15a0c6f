// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    nested = { "weather/source.tar.gz" },
    flat = { "bundle.tar.gz" },
    dotted_name = { "a/.hidden" },
)]
fn accepts_relative_keys(key: &str) {
    assert!(validate_key(key).is_ok());
}

#[parameterized(
    empty = { "" },
    absolute = { "/etc/passwd" },
    parent = { "../outside" },
    nested_parent = { "a/../../b" },
    current_dir = { "./a" },
    directory = { "a/" },
)]
fn rejects_escaping_keys(key: &str) {
    assert!(matches!(
        validate_key(key),
        Err(ObjectStoreError::InvalidKey(_))
    ));
}
