use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::PortSpecError;

/// Ports to poll on every host
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum PortSpec {
    /// inclusive
    Range(u16, u16),
    List(Vec<u16>),
    Single(u16),
}

impl PortSpec {
    pub fn ports(&self) -> Vec<u16> {
        match self {
            Self::Range(start, end) => (*start..=*end).collect(),
            Self::List(ports) => ports.clone(),
            Self::Single(port) => vec![*port],
        }
    }
}

fn parse_port(s: &str) -> Result<u16, PortSpecError> {
    let s = s.trim();
    s.parse()
        .map_err(|_| PortSpecError::InvalidPort(s.to_string()))
}

impl FromStr for PortSpec {
    type Err = PortSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PortSpecError::Empty);
        }

        if let Some((start, end)) = s.split_once("..") {
            let (start, end) = (parse_port(start)?, parse_port(end)?);
            if start > end {
                return Err(PortSpecError::ReversedRange(start, end));
            }
            Ok(Self::Range(start, end))
        } else if s.contains(',') {
            Ok(Self::List(
                s.split(',').map(parse_port).collect::<Result<_, _>>()?,
            ))
        } else {
            Ok(Self::Single(parse_port(s)?))
        }
    }
}

impl TryFrom<String> for PortSpec {
    type Error = PortSpecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PortSpec> for String {
    fn from(value: PortSpec) -> Self {
        match value {
            PortSpec::Range(start, end) => format!("{start}..{end}"),
            PortSpec::List(ports) => ports
                .iter()
                .map(u16::to_string)
                .collect::<Vec<_>>()
                .join(","),
            PortSpec::Single(port) => port.to_string(),
        }
    }
}
