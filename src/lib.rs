// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Calling of structural variant breakpoints from read-graph partitions.
//!
//! The caller consumes partitions of alignments (built upstream), classifies
//! pairs of alignments into oriented breakpoint hypotheses, merges those
//! hypotheses into a consensus breakpoint per cluster and emits a
//! [`calling::ClusterCall`] whenever the read support is sufficient.

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate getset;
#[macro_use]
extern crate typed_builder;
#[cfg(test)]
#[macro_use]
extern crate approx;

pub mod annotation;
pub mod assembly;
pub mod breakpoints;
pub mod calling;
pub mod cli;
pub(crate) mod errors;
pub mod estimation;
pub mod evidence;
pub(crate) mod utils;

pub use crate::calling::params::CallParams;
pub use crate::estimation::insert_size::InsertSize;
pub use crate::utils::qname_hash;
