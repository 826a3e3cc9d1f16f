use crate::consts::{GROUP_ID_1, GROUP_ID_2, GROUP_ID_3};
use serde::{Serialize, Serializer};
use std::fmt;

/// One of the three light banks selected with the top-row buttons of the
/// AwoX remote. Every control button press is addressed to the group of the
/// currently selected bank.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(u8)]
pub enum Bank {
    One = 1,
    Two = 2,
    Three = 3,
}

impl Bank {
    pub const ALL: [Bank; 3] = [Bank::One, Bank::Two, Bank::Three];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_group(group_id: u16) -> Option<Self> {
        match group_id {
            GROUP_ID_1 => Some(Bank::One),
            GROUP_ID_2 => Some(Bank::Two),
            GROUP_ID_3 => Some(Bank::Three),
            _ => None,
        }
    }

    /// Action name as exposed for this bank, eg. `red` -> `red_2`.
    pub fn suffix(self, action: &str) -> String {
        format!("{}_{}", action, self.number())
    }
}

#[cfg(test)]
impl Bank {
    pub fn from_number(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Bank::One),
            2 => Some(Bank::Two),
            3 => Some(Bank::Three),
            _ => None,
        }
    }

    pub fn group_id(self) -> u16 {
        match self {
            Bank::One => GROUP_ID_1,
            Bank::Two => GROUP_ID_2,
            Bank::Three => GROUP_ID_3,
        }
    }

    /// Inverse of `suffix`: split `red_2` into (`red`, Bank::Two).
    pub fn strip_suffix(action: &str) -> Option<(&str, Bank)> {
        let (base, number) = action.rsplit_once('_')?;
        let number = number.parse::<u8>().ok()?;
        Some((base, Bank::from_number(number)?))
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl Serialize for Bank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

/// Map the destination group of an incoming command to a bank.
///
/// Missing or unknown groups fall back to bank 1 without any diagnostics, so
/// the remote keeps working when the radio stack drops the addressing info.
pub fn resolve_bank(group_id: Option<u16>) -> Bank {
    group_id.and_then(Bank::from_group).unwrap_or(Bank::One)
}
