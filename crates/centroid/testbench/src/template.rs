//! `$NAME` testbench templates.
//!
//! `$$` renders a literal dollar, `$NAME` and `${NAME}` are replaced from
//! the substitution map. Any other `$` is an error, as is a name with no
//! value.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::error::{TestbenchError, TestbenchResult};

const PLACEHOLDER: &str =
    r"\$(?:(?P<escaped>\$)|(?P<named>[_A-Za-z][_A-Za-z0-9]*)|\{(?P<braced>[_A-Za-z][_A-Za-z0-9]*)\}|(?P<invalid>))";

fn placeholder() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(PLACEHOLDER).expect("placeholder pattern is valid"))
}

/// A testbench template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    text: String,
}

impl Template {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read a template from disk.
    pub fn load(path: &Path) -> TestbenchResult<Self> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Names referenced by the template, sorted and deduplicated.
    pub fn placeholders(&self) -> BTreeSet<&str> {
        placeholder()
            .captures_iter(&self.text)
            .filter_map(|caps| caps.name("named").or_else(|| caps.name("braced")))
            .map(|m| m.as_str())
            .collect()
    }

    /// Render with every placeholder replaced.
    pub fn substitute(&self, values: &HashMap<String, String>) -> TestbenchResult<String> {
        let mut rendered = String::with_capacity(self.text.len());
        let mut last = 0;

        for caps in placeholder().captures_iter(&self.text) {
            let whole = caps.get(0).map(|m| m.range()).unwrap_or(last..last);
            rendered.push_str(&self.text[last..whole.start]);
            rendered.push_str(&self.replacement(&caps, whole.start, values)?);
            last = whole.end;
        }

        rendered.push_str(&self.text[last..]);
        Ok(rendered)
    }

    fn replacement(
        &self,
        caps: &Captures<'_>,
        offset: usize,
        values: &HashMap<String, String>,
    ) -> TestbenchResult<String> {
        if caps.name("escaped").is_some() {
            return Ok("$".to_string());
        }
        if let Some(name) = caps.name("named").or_else(|| caps.name("braced")) {
            return values
                .get(name.as_str())
                .cloned()
                .ok_or_else(|| TestbenchError::MissingPlaceholder(name.as_str().to_string()));
        }
        let (line, column) = self.position(offset);
        Err(TestbenchError::InvalidPlaceholder { line, column })
    }

    /// One-based line and column of a byte offset.
    fn position(&self, offset: usize) -> (usize, usize) {
        let before = &self.text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        (line, column)
    }
}
