#![forbid(unsafe_code)]

//! Language Registry — maps filenames/extensions to language name and
//! comment syntax.
//!
//! The core consumes this table as an opaque oracle (§4.1): it never
//! needs to know how a language is detected, only the tuple the
//! registry hands back.

use crate::types::LanguageName;
use std::path::Path;

/// What kind of file a language entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Code,
    Build,
    Manifest,
    Unknown,
}

/// Comment syntax and classification for one language.
#[derive(Debug, Clone)]
pub struct LanguageInfo {
    pub name: LanguageName,
    pub comment_prefix: Option<&'static str>,
    pub comment_suffix: Option<&'static str>,
    pub inline_comment: Option<&'static str>,
    pub file_type: FileType,
}

impl LanguageInfo {
    fn unknown() -> Self {
        Self {
            name: LanguageName::new("unknown"),
            comment_prefix: None,
            comment_suffix: None,
            inline_comment: None,
            file_type: FileType::Unknown,
        }
    }

    /// True when the language has no way to enter a comment at all —
    /// `scope_match` treats every offset as accepted in this case
    /// (§4.2).
    pub fn has_comment_syntax(&self) -> bool {
        self.comment_prefix.is_some() || self.inline_comment.is_some()
    }
}

struct Entry {
    name: &'static str,
    extensions: &'static [&'static str],
    filenames: &'static [&'static str],
    comment_prefix: Option<&'static str>,
    comment_suffix: Option<&'static str>,
    inline_comment: Option<&'static str>,
    file_type: FileType,
}

// Static table. Exact filename entries win over extension entries
// (checked in that order by `from_file_name`).
static TABLE: &[Entry] = &[
    Entry {
        name: "rust",
        extensions: &["rs"],
        filenames: &[],
        comment_prefix: Some("/*"),
        comment_suffix: Some("*/"),
        inline_comment: Some("//"),
        file_type: FileType::Code,
    },
    Entry {
        name: "typescript",
        extensions: &["ts", "tsx"],
        filenames: &[],
        comment_prefix: Some("/*"),
        comment_suffix: Some("*/"),
        inline_comment: Some("//"),
        file_type: FileType::Code,
    },
    Entry {
        name: "javascript",
        extensions: &["js", "jsx", "mjs", "cjs"],
        filenames: &[],
        comment_prefix: Some("/*"),
        comment_suffix: Some("*/"),
        inline_comment: Some("//"),
        file_type: FileType::Code,
    },
    Entry {
        name: "python",
        extensions: &["py", "pyi"],
        filenames: &[],
        comment_prefix: None,
        comment_suffix: None,
        inline_comment: Some("#"),
        file_type: FileType::Code,
    },
    Entry {
        name: "go",
        extensions: &["go"],
        filenames: &[],
        comment_prefix: Some("/*"),
        comment_suffix: Some("*/"),
        inline_comment: Some("//"),
        file_type: FileType::Code,
    },
    Entry {
        name: "c",
        extensions: &["c", "h"],
        filenames: &[],
        comment_prefix: Some("/*"),
        comment_suffix: Some("*/"),
        inline_comment: Some("//"),
        file_type: FileType::Code,
    },
    Entry {
        name: "cpp",
        extensions: &["cpp", "cc", "cxx", "hpp", "hxx"],
        filenames: &[],
        comment_prefix: Some("/*"),
        comment_suffix: Some("*/"),
        inline_comment: Some("//"),
        file_type: FileType::Code,
    },
    Entry {
        name: "java",
        extensions: &["java"],
        filenames: &[],
        comment_prefix: Some("/*"),
        comment_suffix: Some("*/"),
        inline_comment: Some("//"),
        file_type: FileType::Code,
    },
    Entry {
        name: "ruby",
        extensions: &["rb"],
        filenames: &[],
        comment_prefix: Some("=begin"),
        comment_suffix: Some("=end"),
        inline_comment: Some("#"),
        file_type: FileType::Code,
    },
    Entry {
        name: "shell",
        extensions: &["sh", "bash", "zsh"],
        filenames: &[],
        comment_prefix: None,
        comment_suffix: None,
        inline_comment: Some("#"),
        file_type: FileType::Code,
    },
    Entry {
        name: "yaml",
        extensions: &["yaml", "yml"],
        filenames: &[],
        comment_prefix: None,
        comment_suffix: None,
        inline_comment: Some("#"),
        file_type: FileType::Unknown,
    },
    Entry {
        name: "json",
        extensions: &["json"],
        filenames: &[],
        comment_prefix: None,
        comment_suffix: None,
        inline_comment: None,
        file_type: FileType::Unknown,
    },
    Entry {
        name: "toml",
        extensions: &["toml"],
        filenames: &[],
        comment_prefix: None,
        comment_suffix: None,
        inline_comment: Some("#"),
        file_type: FileType::Unknown,
    },
    Entry {
        name: "markdown",
        extensions: &["md", "markdown"],
        filenames: &[],
        comment_prefix: Some("<!--"),
        comment_suffix: Some("-->"),
        inline_comment: None,
        file_type: FileType::Unknown,
    },
    Entry {
        name: "html",
        extensions: &["html", "htm"],
        filenames: &[],
        comment_prefix: Some("<!--"),
        comment_suffix: Some("-->"),
        inline_comment: None,
        file_type: FileType::Code,
    },
    Entry {
        name: "xml",
        extensions: &["xml"],
        filenames: &[],
        comment_prefix: Some("<!--"),
        comment_suffix: Some("-->"),
        inline_comment: None,
        file_type: FileType::Manifest,
    },
    Entry {
        name: "xml",
        extensions: &[],
        filenames: &["pom.xml"],
        comment_prefix: Some("<!--"),
        comment_suffix: Some("-->"),
        inline_comment: None,
        file_type: FileType::Manifest,
    },
    Entry {
        name: "json",
        extensions: &[],
        filenames: &["package.json"],
        comment_prefix: None,
        comment_suffix: None,
        inline_comment: None,
        file_type: FileType::Manifest,
    },
    Entry {
        name: "toml",
        extensions: &[],
        filenames: &["Cargo.toml"],
        comment_prefix: None,
        comment_suffix: None,
        inline_comment: Some("#"),
        file_type: FileType::Manifest,
    },
    Entry {
        name: "make",
        extensions: &[],
        filenames: &["Makefile", "makefile", "GNUmakefile"],
        comment_prefix: None,
        comment_suffix: None,
        inline_comment: Some("#"),
        file_type: FileType::Build,
    },
    Entry {
        name: "docker",
        extensions: &[],
        filenames: &["Dockerfile"],
        comment_prefix: None,
        comment_suffix: None,
        inline_comment: Some("#"),
        file_type: FileType::Build,
    },
];

fn to_info(entry: &Entry) -> LanguageInfo {
    LanguageInfo {
        name: LanguageName::new(entry.name),
        comment_prefix: entry.comment_prefix,
        comment_suffix: entry.comment_suffix,
        inline_comment: entry.inline_comment,
        file_type: entry.file_type,
    }
}

/// Looks up a file's language by filename first, then by extension.
///
/// Returns `(found, info)`. When `found` is `false` and the caller has
/// not enabled "scan unknown" mode, the file should be skipped rather
/// than analyzed with a degenerate `unknown` [`LanguageInfo`].
pub fn from_file_name(path: &Path) -> (bool, LanguageInfo) {
    let file_name = path.file_name().and_then(|n| n.to_str());

    if let Some(file_name) = file_name {
        for entry in TABLE {
            if entry.filenames.contains(&file_name) {
                return (true, to_info(entry));
            }
        }
    }

    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        let ext_lower = ext.to_ascii_lowercase();
        for entry in TABLE {
            if entry.extensions.iter().any(|e| *e == ext_lower) {
                return (true, to_info(entry));
            }
        }
    }

    (false, LanguageInfo::unknown())
}
