use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Commands understood by the bin controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceCommand {
    /// Ask for a full report
    Status,
    /// Open the lid
    Open,
    /// Close the lid
    Close,
}

impl DeviceCommand {
    /// Text sent on the wire, without the line terminator
    pub fn wire(&self) -> &'static str {
        match self {
            DeviceCommand::Status => "STATUS",
            DeviceCommand::Open => "BUKA",
            DeviceCommand::Close => "TUTUP",
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire())
    }
}

impl FromStr for DeviceCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "STATUS" => Ok(DeviceCommand::Status),
            "BUKA" | "OPEN" => Ok(DeviceCommand::Open),
            "TUTUP" | "CLOSE" => Ok(DeviceCommand::Close),
            other => Err(format!(
                "Unknown command '{}'. Expected one of: STATUS, BUKA, TUTUP",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_text() {
        assert_eq!(DeviceCommand::Status.wire(), "STATUS");
        assert_eq!(DeviceCommand::Open.wire(), "BUKA");
        assert_eq!(DeviceCommand::Close.to_string(), "TUTUP");
    }

    #[test]
    fn test_parse_accepts_aliases() {
        assert_eq!("buka".parse::<DeviceCommand>(), Ok(DeviceCommand::Open));
        assert_eq!(" close ".parse::<DeviceCommand>(), Ok(DeviceCommand::Close));
        assert_eq!("STATUS".parse::<DeviceCommand>(), Ok(DeviceCommand::Status));
        assert!("reboot".parse::<DeviceCommand>().is_err());
    }
}
