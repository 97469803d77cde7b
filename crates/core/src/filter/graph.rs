//! Typed filtergraph model.
//!
//! Graphs are assembled from [`Filter`]s grouped into [`FilterChain`]s whose
//! inputs and outputs are explicit [`StreamRef`]s and [`PadLabel`]s. Text is
//! only produced by `render()`, so tests can inspect the shape of a graph
//! without parsing ffmpeg syntax.

use std::collections::HashSet;
use std::fmt;

/// Elementary stream type of an input reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    fn specifier(&self) -> &'static str {
        match self {
            Self::Video => "v",
            Self::Audio => "a",
        }
    }
}

/// A named link between two chains, rendered as `[name]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PadLabel(String);

impl PadLabel {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PadLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

/// Where a chain reads from: an input file stream or a labeled pad.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StreamRef {
    Input { index: usize, kind: StreamKind },
    Pad(PadLabel),
}

impl StreamRef {
    pub fn video(index: usize) -> Self {
        Self::Input {
            index,
            kind: StreamKind::Video,
        }
    }

    pub fn audio(index: usize) -> Self {
        Self::Input {
            index,
            kind: StreamKind::Audio,
        }
    }

    pub fn pad(label: &PadLabel) -> Self {
        Self::Pad(label.clone())
    }

    /// The label this reference consumes, if it is a pad.
    pub fn label(&self) -> Option<&PadLabel> {
        match self {
            Self::Pad(label) => Some(label),
            Self::Input { .. } => None,
        }
    }
}

impl fmt::Display for StreamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input { index, kind } => write!(f, "[{}:{}]", index, kind.specifier()),
            Self::Pad(label) => label.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FilterArg {
    Positional(String),
    Keyed(String, String),
}

/// A single filter invocation such as `scale=1080:1920`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    name: String,
    args: Vec<FilterArg>,
}

impl Filter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.args.push(FilterArg::Positional(value.to_string()));
        self
    }

    /// Appends a `key=value` option.
    pub fn opt(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.args
            .push(FilterArg::Keyed(key.into(), value.to_string()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of a keyed option.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.args.iter().find_map(|arg| match arg {
            FilterArg::Keyed(k, v) if k == key => Some(v.as_str()),
            _ => None,
        })
    }

    /// Value of the n-th positional argument.
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.args
            .iter()
            .filter_map(|arg| match arg {
                FilterArg::Positional(v) => Some(v.as_str()),
                FilterArg::Keyed(..) => None,
            })
            .nth(index)
    }

    pub fn render(&self) -> String {
        if self.args.is_empty() {
            return self.name.clone();
        }
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| match arg {
                FilterArg::Positional(v) => escape_value(v),
                FilterArg::Keyed(k, v) => format!("{}={}", k, escape_value(v)),
            })
            .collect();
        format!("{}={}", self.name, args.join(":"))
    }
}

/// Quotes values containing filtergraph metacharacters.
fn escape_value(value: &str) -> String {
    const SPECIAL: &[char] = &[':', ',', ';', '[', ']', '=', '\'', '\\', ' '];
    if value.contains(SPECIAL) {
        format!("'{}'", value.replace('\'', r"'\''"))
    } else {
        value.to_string()
    }
}

/// A linear sequence of filters with explicit input and output pads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    inputs: Vec<StreamRef>,
    filters: Vec<Filter>,
    outputs: Vec<PadLabel>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, stream: StreamRef) -> Self {
        self.inputs.push(stream);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn output(mut self, label: &PadLabel) -> Self {
        self.outputs.push(label.clone());
        self
    }

    pub fn inputs(&self) -> &[StreamRef] {
        &self.inputs
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn outputs(&self) -> &[PadLabel] {
        &self.outputs
    }

    /// First filter with the given name.
    pub fn find(&self, name: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.name() == name)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for input in &self.inputs {
            out.push_str(&input.to_string());
        }
        let filters: Vec<String> = self.filters.iter().map(Filter::render).collect();
        out.push_str(&filters.join(","));
        for output in &self.outputs {
            out.push_str(&output.to_string());
        }
        out
    }
}

/// A complete multi-chain graph for `-filter_complex`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterGraph {
    chains: Vec<FilterChain>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chain: FilterChain) {
        self.chains.push(chain);
    }

    pub fn chain(mut self, chain: FilterChain) -> Self {
        self.push(chain);
        self
    }

    pub fn chains(&self) -> &[FilterChain] {
        &self.chains
    }

    /// All filters with the given name, in graph order.
    pub fn filters_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Filter> + 'a {
        self.chains
            .iter()
            .flat_map(|c| c.filters.iter())
            .filter(move |f| f.name() == name)
    }

    /// Output pads no other chain consumes; these are what `-map` selects.
    pub fn result_pads(&self) -> Vec<&PadLabel> {
        let consumed: HashSet<&PadLabel> = self
            .chains
            .iter()
            .flat_map(|c| c.inputs.iter().filter_map(StreamRef::label))
            .collect();
        self.chains
            .iter()
            .flat_map(|c| c.outputs.iter())
            .filter(|label| !consumed.contains(label))
            .collect()
    }

    /// Verifies every consumed pad is produced by an earlier chain, exactly once.
    pub fn check_wiring(&self) -> Result<(), String> {
        let mut produced: HashSet<&PadLabel> = HashSet::new();
        let mut consumed: HashSet<&PadLabel> = HashSet::new();
        for chain in &self.chains {
            for label in chain.inputs.iter().filter_map(StreamRef::label) {
                if !produced.contains(label) {
                    return Err(format!("pad {} consumed before it is produced", label));
                }
                if !consumed.insert(label) {
                    return Err(format!("pad {} consumed more than once", label));
                }
            }
            for label in &chain.outputs {
                if !produced.insert(label) {
                    return Err(format!("pad {} produced more than once", label));
                }
            }
        }
        Ok(())
    }

    pub fn render(&self) -> String {
        self.chains
            .iter()
            .map(FilterChain::render)
            .collect::<Vec<_>>()
            .join(";")
    }
}
