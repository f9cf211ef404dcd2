// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::errors::Error;

pub mod alignment_item;
pub mod classify;
pub mod consensus;
pub mod geometry;
pub mod soft_clips;

pub use alignment_item::AlignmentItem;
pub use classify::{classify, ClassifiedPair, Regime};
pub use consensus::{make_call, Breakpoints};

/// Structural variant type implied by a piece of evidence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SvType {
    Del,
    Dup,
    Ins,
    Inv,
    InvDup,
    Tra,
    Bnd,
}

impl fmt::Display for SvType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            SvType::Del => "DEL",
            SvType::Dup => "DUP",
            SvType::Ins => "INS",
            SvType::Inv => "INV",
            SvType::InvDup => "INV:DUP",
            SvType::Tra => "TRA",
            SvType::Bnd => "BND",
        })
    }
}

impl FromStr for SvType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "DEL" => SvType::Del,
            "DUP" => SvType::Dup,
            "INS" => SvType::Ins,
            "INV" => SvType::Inv,
            "INV:DUP" => SvType::InvDup,
            "TRA" => SvType::Tra,
            "BND" => SvType::Bnd,
            _ => {
                return Err(Error::InvalidSvType {
                    value: s.to_owned(),
                }
                .into())
            }
        })
    }
}

/// Breakpoint end orientation. Forward strand alignments are encoded as `Three`,
/// reverse strand alignments as `Five`, mirroring the 3'/5' notation of join types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum End {
    Three,
    Five,
}

impl End {
    pub fn from_reverse(is_reverse: bool) -> Self {
        if is_reverse {
            End::Five
        } else {
            End::Three
        }
    }

    pub fn code(self) -> u8 {
        match self {
            End::Three => 3,
            End::Five => 5,
        }
    }
}

/// Orientation of the joined ends of both breakpoints, written as e.g. `3to5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, new)]
pub struct JoinType {
    pub a: End,
    pub b: End,
}

impl JoinType {
    pub const THREE_TO_FIVE: JoinType = JoinType {
        a: End::Three,
        b: End::Five,
    };
    pub const FIVE_TO_THREE: JoinType = JoinType {
        a: End::Five,
        b: End::Three,
    };
    pub const THREE_TO_THREE: JoinType = JoinType {
        a: End::Three,
        b: End::Three,
    };
    pub const FIVE_TO_FIVE: JoinType = JoinType {
        a: End::Five,
        b: End::Five,
    };
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}to{}", self.a.code(), self.b.code())
    }
}

impl FromStr for JoinType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let end = |c: &str| match c {
            "3" => Some(End::Three),
            "5" => Some(End::Five),
            _ => None,
        };
        let mut parts = s.splitn(2, "to");
        match (parts.next().and_then(end), parts.next().and_then(end)) {
            (Some(a), Some(b)) => Ok(JoinType { a, b }),
            _ => Err(Error::InvalidJoinType {
                value: s.to_owned(),
            }
            .into()),
        }
    }
}

macro_rules! string_serde {
    ($type:ty) => {
        impl Serialize for $type {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $type {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                value.parse().map_err(de::Error::custom)
            }
        }
    };
}

string_serde!(SvType);
string_serde!(JoinType);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_type_roundtrip_notation() {
        assert_eq!(JoinType::THREE_TO_FIVE.to_string(), "3to5");
        assert_eq!("5to5".parse::<JoinType>().unwrap(), JoinType::FIVE_TO_FIVE);
        assert!("3to4".parse::<JoinType>().is_err());
        assert!("35".parse::<JoinType>().is_err());
    }

    #[test]
    fn test_svtype_notation() {
        assert_eq!(SvType::InvDup.to_string(), "INV:DUP");
        assert_eq!("TRA".parse::<SvType>().unwrap(), SvType::Tra);
        assert!("CNV".parse::<SvType>().is_err());
    }

    #[test]
    fn test_serde_as_strings() {
        let json = serde_json::to_string(&(SvType::Del, JoinType::THREE_TO_FIVE)).unwrap();
        assert_eq!(json, r#"["DEL","3to5"]"#);
        let (svtype, join): (SvType, JoinType) = serde_json::from_str(&json).unwrap();
        assert_eq!(svtype, SvType::Del);
        assert_eq!(join, JoinType::THREE_TO_FIVE);
    }
}
