//! File discovery and traversal with gitignore support.
//!
//! Gitignore-aware walking with glob-based include/exclude filtering
//! and language detection from the [`crate::language`] registry.

use crate::language::{self, LanguageInfo};
use globset::{Glob, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileWalkerError {
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        source: globset::Error,
    },

    #[error("walk error: {0}")]
    Walk(#[from] ignore::Error),
}

/// A discovered file with its detected language. `language.0` is
/// `false` when the registry has no entry for this file — the
/// orchestrator decides whether to skip it or scan it as `unknown`.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub language_known: bool,
    pub language: LanguageInfo,
}

impl FileEntry {
    pub fn new(path: PathBuf) -> Self {
        let (language_known, language) = language::from_file_name(&path);
        Self {
            path,
            language_known,
            language,
        }
    }
}

/// Iterator over discovered files honoring `.gitignore` and the
/// caller's include/exclude globs.
pub struct FileWalker {
    walker: ignore::Walk,
    include_set: Option<globset::GlobSet>,
    exclude_set: Option<globset::GlobSet>,
}

impl FileWalker {
    /// `include` empty means "include everything"; `.git/**` is always
    /// excluded in addition to the caller's `exclude` patterns.
    pub fn new(root: &Path, include: &[String], exclude: &[String]) -> Result<Self, FileWalkerError> {
        let walker = WalkBuilder::new(root).hidden(false).git_ignore(true).build();

        let include_set = if include.is_empty() {
            None
        } else {
            Some(Self::build_globset(include)?)
        };

        let mut exclude_patterns = exclude.to_vec();
        exclude_patterns.push("**/.git/**".to_string());
        let exclude_set = Some(Self::build_globset(&exclude_patterns)?);

        Ok(Self {
            walker,
            include_set,
            exclude_set,
        })
    }

    fn build_globset(patterns: &[String]) -> Result<globset::GlobSet, FileWalkerError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| FileWalkerError::InvalidGlob {
                pattern: pattern.clone(),
                source: e,
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|e| FileWalkerError::InvalidGlob {
            pattern: "<globset>".to_string(),
            source: e,
        })
    }

    pub fn walk(self) -> impl Iterator<Item = Result<FileEntry, FileWalkerError>> {
        let include_set = self.include_set;
        let exclude_set = self.exclude_set;

        self.walker.filter_map(move |result| match result {
            Ok(entry) => {
                if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                    return None;
                }
                let path = entry.path();

                if let Some(include_set) = &include_set {
                    if !include_set.is_match(path) {
                        return None;
                    }
                }
                if let Some(exclude_set) = &exclude_set {
                    if exclude_set.is_match(path) {
                        return None;
                    }
                }

                Some(Ok(FileEntry::new(path.to_path_buf())))
            }
            Err(e) => Some(Err(FileWalkerError::Walk(e))),
        })
    }
}
