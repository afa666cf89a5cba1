//! Project container for debug and editor requests.
//!
//! A `Project` maps file names to parsed and bound files. Type evaluation is
//! lazy and per request: `ProjectFile::checker` hands out a fresh
//! `CheckerState` borrowing the file's tree and bindings.

use std::path::Path;

use anyhow::{Context, Result};
use pyz_checker::{BinderState, CheckerState};
use pyz_common::LineMap;
use pyz_parser::{NodeArena, NodeIndex, ParseResults, parse_file};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Parsed file state used by requests.
pub struct ProjectFile {
    pub(crate) file_name: String,
    pub(crate) module_name: String,
    pub(crate) parse_results: ParseResults,
    pub(crate) binder: BinderState,
}

impl ProjectFile {
    /// Parse and bind a single source file.
    pub fn new(file_name: String, source_text: String) -> Self {
        let parse_results = parse_file(&file_name, &source_text);
        let mut binder = BinderState::new();
        binder.bind_module(&parse_results.arena, parse_results.parse_tree);
        let module_name = module_name_for(&file_name);

        debug!(
            file = %file_name,
            module = %module_name,
            tokens = parse_results.tokens().len(),
            nodes = parse_results.arena.len(),
            "parsed project file"
        );

        Self {
            file_name,
            module_name,
            parse_results,
            binder,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Module name used for fully qualified names, taken from the file stem.
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn parse_results(&self) -> &ParseResults {
        &self.parse_results
    }

    /// Root node of the parse tree.
    pub fn root(&self) -> NodeIndex {
        self.parse_results.parse_tree
    }

    pub fn arena(&self) -> &NodeArena {
        &self.parse_results.arena
    }

    pub fn binder(&self) -> &BinderState {
        &self.binder
    }

    /// Line map for offset -> position conversions.
    pub fn line_map(&self) -> &LineMap {
        self.parse_results.lines()
    }

    pub fn source_text(&self) -> &str {
        &self.parse_results.text
    }

    /// Replace the file's contents, re-parsing and re-binding it.
    pub fn update_source(&mut self, source_text: String) {
        self.parse_results = parse_file(&self.file_name, &source_text);
        self.binder
            .bind_module(&self.parse_results.arena, self.parse_results.parse_tree);
    }

    /// A fresh evaluator over this file. Results are memoized for the
    /// lifetime of the returned state only.
    pub fn checker(&self) -> CheckerState<'_> {
        CheckerState::new(&self.parse_results.arena, &self.binder, &self.module_name)
    }
}

fn module_name_for(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name)
        .to_string()
}

/// Multi-file container, keyed by the name a file was registered under.
#[derive(Default)]
pub struct Project {
    pub(crate) files: FxHashMap<String, ProjectFile>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of files tracked by the project.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Add or replace a file, re-parsing and re-binding its contents.
    pub fn set_file(&mut self, file_name: String, source_text: String) {
        let file = ProjectFile::new(file_name.clone(), source_text);
        self.files.insert(file_name, file);
    }

    /// Read a file from disk and register it under its path as given.
    pub fn open_file(&mut self, path: &Path) -> Result<&ProjectFile> {
        let source_text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path.to_string_lossy().into_owned();
        let file = ProjectFile::new(file_name.clone(), source_text);
        Ok(self.files.entry(file_name).insert_entry(file).into_mut())
    }

    /// Remove a file from the project.
    pub fn remove_file(&mut self, file_name: &str) -> Option<ProjectFile> {
        self.files.remove(file_name)
    }

    /// Fetch a file by name.
    pub fn file(&self, file_name: &str) -> Option<&ProjectFile> {
        self.files.get(file_name)
    }

    pub fn file_mut(&mut self, file_name: &str) -> Option<&mut ProjectFile> {
        self.files.get_mut(file_name)
    }
}
