use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Signal quality bucket. The derived `Ord` gives the total order
/// NONE < B < A < A+ used by the admission check.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Tier {
    #[strum(serialize = "NONE")]
    #[serde(rename = "NONE")]
    None,
    #[strum(serialize = "B")]
    B,
    #[strum(serialize = "A")]
    A,
    #[strum(to_string = "A+", serialize = "APLUS")]
    #[serde(rename = "A+")]
    APlus,
}
