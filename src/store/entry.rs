use std::fmt;

use crate::parser::Sample;

/// Where and when a batch was collected. Shared by every observation in
/// the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub host: String,
    pub port: u16,
    /// unix seconds
    pub timestamp: i64,
}

impl Origin {
    /// Encodes one observation as `host:port:timestamp:value `. The trailing
    /// space separates it from the next token in a store entry.
    pub fn token(&self, value: &str) -> String {
        format!("{self}:{value} ")
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.host, self.port, self.timestamp)
    }
}

/// Samples from one poll of one target
#[derive(Debug, Clone)]
pub struct Batch {
    pub origin: Origin,
    pub samples: Vec<Sample>,
}

impl Batch {
    pub fn new(origin: Origin, samples: impl IntoIterator<Item = Sample>) -> Self {
        Self {
            origin,
            samples: samples.into_iter().collect(),
        }
    }

    /// (stack, encoded token) in sample order
    pub fn tokens(&self) -> impl Iterator<Item = (&str, String)> {
        self.samples
            .iter()
            .map(|s| (s.stack.as_str(), self.origin.token(&s.value)))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
