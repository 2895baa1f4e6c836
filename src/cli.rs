use crate::error::{MetricsError, Result};

/// One command-line token: a `--flag` (with its `=value` if given inline) or
/// a positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg<'a> {
    Flag(&'a str, Option<&'a str>),
    Positional(&'a str),
}

/// Walks `--flag value`, `--flag=value` and positional arguments in order.
#[derive(Debug)]
pub struct Args<'a> {
    raw: &'a [String],
    idx: usize,
}

impl<'a> Args<'a> {
    pub fn new(raw: &'a [String]) -> Self {
        Self { raw, idx: 0 }
    }

    /// Value for `flag`: the inline part if present, otherwise the next token.
    pub fn value(&mut self, flag: &str, inline: Option<&'a str>) -> Result<&'a str> {
        let value = match inline {
            Some(value) => value,
            None => {
                let next = self.raw.get(self.idx).map(String::as_str);
                self.idx += 1;
                next.unwrap_or_default()
            }
        };
        if value.trim().is_empty() {
            return Err(MetricsError::InvalidRequest(format!("{flag} needs a value")));
        }
        Ok(value)
    }
}

impl<'a> Iterator for Args<'a> {
    type Item = Arg<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.raw.get(self.idx)?.as_str();
        self.idx += 1;
        if !raw.starts_with("--") {
            return Some(Arg::Positional(raw));
        }
        Some(match raw.split_once('=') {
            Some((flag, value)) => Arg::Flag(flag, Some(value)),
            None => Arg::Flag(raw, None),
        })
    }
}
