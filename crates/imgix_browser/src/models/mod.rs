// SPDX-License-Identifier: Apache-2.0

pub mod asset;
pub mod page;
pub mod payload;
pub mod source;
