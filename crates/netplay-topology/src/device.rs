//! Device kinds that can be dropped onto the canvas.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Kind of network device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DeviceType {
    /// End station
    Host,
    /// Layer-2 switch
    L2Switch,
    /// Layer-1 hub
    L1Hub,
}

impl DeviceType {
    /// Every device kind, in palette order.
    pub const ALL: [Self; Self::COUNT] = [Self::Host, Self::L2Switch, Self::L1Hub];

    /// Number of device kinds.
    pub const COUNT: usize = 3;

    /// Wire name, as used by the palette and the persisted document.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Host => "host",
            DeviceType::L2Switch => "l2_switch",
            DeviceType::L1Hub => "l1_hub",
        }
    }

    /// Prefix of the node ids issued for this kind.
    pub const fn id_prefix(&self) -> &'static str {
        match self {
            DeviceType::Host => "host_",
            DeviceType::L2Switch => "l2sw",
            DeviceType::L1Hub => "l1hub",
        }
    }

    pub(crate) const fn index(&self) -> usize {
        match self {
            DeviceType::Host => 0,
            DeviceType::L2Switch => 1,
            DeviceType::L1Hub => 2,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownDevice(s.to_string()))
    }
}
