//! Engine argument construction.
//!
//! [`build_arguments`] is a pure function of the options and the resolved
//! bibliography path. Its output order is fixed so that the same request
//! always produces a byte-identical command line:
//!
//! ```text
//! --standalone
//! --biblatex, --natbib
//! --pdf-engine=xelatex
//! filters: pandoc-crossref, pandoc-citeproc
//! --bibliography=<path>
//! --csl=<path>
//! ```
//!
//! Arguments are kept as a structured vector and handed to the process
//! without a shell, so path values are never quoted into the argv itself.
//! [`shell_quote`] exists for the human-readable rendering used in logs,
//! which must survive a copy-paste into a shell.

use crate::options::ConversionOptions;
use std::fmt;
use std::path::{Path, PathBuf};

/// A post-processing filter run by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Crossref,
    Citeproc,
}

impl Filter {
    pub fn name(&self) -> &'static str {
        match self {
            Filter::Crossref => "pandoc-crossref",
            Filter::Citeproc => "pandoc-citeproc",
        }
    }
}

/// One engine argument, before rendering to strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineArg {
    Standalone,
    Biblatex,
    Natbib,
    /// `--pdf-engine=<name>`
    PdfEngine(&'static str),
    Filter(Filter),
    Bibliography(PathBuf),
    Csl(String),
}

impl EngineArg {
    /// Render as argv entries. `builtin_citeproc` selects pandoc's native
    /// `--citeproc` over the external filter executable.
    pub fn render(&self, builtin_citeproc: bool) -> Vec<String> {
        match self {
            EngineArg::Standalone => vec!["--standalone".into()],
            EngineArg::Biblatex => vec!["--biblatex".into()],
            EngineArg::Natbib => vec!["--natbib".into()],
            EngineArg::PdfEngine(engine) => vec![format!("--pdf-engine={engine}")],
            EngineArg::Filter(Filter::Citeproc) if builtin_citeproc => vec!["--citeproc".into()],
            EngineArg::Filter(f) => vec!["--filter".into(), f.name().into()],
            EngineArg::Bibliography(p) => vec![format!("--bibliography={}", p.display())],
            EngineArg::Csl(s) => vec![format!("--csl={s}")],
        }
    }
}

/// Ordered engine arguments for one conversion. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentSet {
    items: Vec<EngineArg>,
}

impl ArgumentSet {
    pub fn items(&self) -> &[EngineArg] {
        &self.items
    }

    /// Filters in the order they will run.
    pub fn filters(&self) -> Vec<Filter> {
        self.items
            .iter()
            .filter_map(|a| match a {
                EngineArg::Filter(f) => Some(*f),
                _ => None,
            })
            .collect()
    }

    /// Path passed via `--bibliography`, if any.
    pub fn bibliography(&self) -> Option<&Path> {
        self.items.iter().find_map(|a| match a {
            EngineArg::Bibliography(p) => Some(p.as_path()),
            _ => None,
        })
    }

    /// Flatten to argv entries.
    pub fn to_argv(&self, builtin_citeproc: bool) -> Vec<String> {
        self.items
            .iter()
            .flat_map(|a| a.render(builtin_citeproc))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for ArgumentSet {
    /// Shell-quoted rendering with external filters, for logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self.to_argv(false).iter().map(|a| shell_quote(a)).collect();
        f.write_str(&quoted.join(" "))
    }
}

/// Build the engine arguments for a request.
pub fn build_arguments(options: &ConversionOptions, bibliography: Option<&Path>) -> ArgumentSet {
    let mut items = Vec::new();

    if options.standalone {
        items.push(EngineArg::Standalone);
    }
    if options.use_biblatex {
        items.push(EngineArg::Biblatex);
    }
    if options.use_natbib {
        items.push(EngineArg::Natbib);
    }
    if options.use_xelatex {
        items.push(EngineArg::PdfEngine("xelatex"));
    }

    if options.use_crossref {
        items.push(EngineArg::Filter(Filter::Crossref));
    }
    if options.use_citeproc {
        items.push(EngineArg::Filter(Filter::Citeproc));
    }

    if let Some(path) = bibliography {
        items.push(EngineArg::Bibliography(path.to_path_buf()));
    }
    if let Some(ref csl) = options.csl_path {
        items.push(EngineArg::Csl(csl.clone()));
    }

    ArgumentSet { items }
}

/// Quote `s` for a POSIX shell. Bare words made only of safe characters
/// are left alone; everything else is single-quoted.
pub fn shell_quote(s: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c);
    if !s.is_empty() && s.chars().all(safe) {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}
