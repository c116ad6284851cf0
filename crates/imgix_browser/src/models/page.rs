// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::query::PAGE_SIZE;

/// Pagination position of the gallery.
///
/// `total_page_count` is stored exactly as computed from the last applied
/// response; zero means the record count could not be read.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub current_index: usize,
    pub total_page_count: u64,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            current_index: 0,
            total_page_count: 1,
        }
    }
}

/// Number of pages needed to show `total_records` at the fixed page size.
pub fn page_count(total_records: u64) -> u64 {
    total_records.div_ceil(PAGE_SIZE)
}
