/// Lines at the top of every payload that carry no samples
pub const HEADER_LINES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub stack: String,
    pub value: String,
}

/// Lazily parses the sample lines of a payload, skipping the header.
/// Lines that are not valid UTF-8 or don't split into exactly
/// `stack value` are dropped.
pub fn parse(payload: &[u8]) -> Samples<'_> {
    let mut lines = Lines { rest: payload };
    for _ in 0..HEADER_LINES {
        lines.next();
    }
    Samples { lines, dropped: 0 }
}

/// Number of stacks reported by a payload (every line past the header,
/// malformed or not)
pub fn stack_count(payload: &[u8]) -> usize {
    Lines { rest: payload }.count().saturating_sub(HEADER_LINES)
}

pub struct Samples<'a> {
    lines: Lines<'a>,
    dropped: usize,
}

impl Samples<'_> {
    /// malformed lines skipped so far
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl Iterator for Samples<'_> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        loop {
            let line = self.lines.next()?;
            match parse_line(line) {
                Some(sample) => return Some(sample),
                None => self.dropped += 1,
            }
        }
    }
}

fn parse_line(line: &[u8]) -> Option<Sample> {
    let line = std::str::from_utf8(line).ok()?;
    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(stack), Some(value), None) => Some(Sample {
            stack: stack.to_string(),
            value: value.to_string(),
        }),
        _ => None,
    }
}

/// Splits on `\n`, `\r\n` or a lone `\r`. A trailing terminator does not
/// yield an extra empty line.
struct Lines<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.rest.is_empty() {
            return None;
        }

        match self.rest.iter().position(|b| *b == b'\n' || *b == b'\r') {
            Some(i) => {
                let line = &self.rest[..i];
                let crlf = self.rest[i] == b'\r' && self.rest.get(i + 1) == Some(&b'\n');
                self.rest = &self.rest[i + if crlf { 2 } else { 1 }..];
                Some(line)
            }
            None => {
                let line = self.rest;
                self.rest = &[];
                Some(line)
            }
        }
    }
}
