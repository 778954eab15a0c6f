// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journaled store mutations

use crate::document::Document;
use serde::{Deserialize, Serialize};

/// A committed mutation, recorded with the document's post-image
///
/// Replaying the post-image keeps replay independent of the clock and
/// of how the update was expressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    Insert { document: Document },
    Update { document: Document },
}

impl Operation {
    pub fn document(&self) -> &Document {
        match self {
            Operation::Insert { document } | Operation::Update { document } => document,
        }
    }
}
