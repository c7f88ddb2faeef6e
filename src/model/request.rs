//! Export requests and the on-disk location of exported artifacts.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

use super::AnswerSet;

/// Everything needed to export one draft.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Source template (read-only)
    pub template_path: PathBuf,
    /// Draft identifier, used verbatim as the output file stem
    pub draft_id: String,
    /// Owning user identifier, used verbatim as the output subdirectory
    pub user_id: String,
    /// Answers to fill in
    pub answers: AnswerSet,
    /// Optional raster image stamped on page one
    pub drawing_path: Option<PathBuf>,
    /// Application content root the storage tree hangs off
    pub content_root: PathBuf,
}

impl ExportRequest {
    /// Create a request with no answers and no drawing.
    pub fn new(
        template_path: impl Into<PathBuf>,
        draft_id: impl Into<String>,
        user_id: impl Into<String>,
        content_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            template_path: template_path.into(),
            draft_id: draft_id.into(),
            user_id: user_id.into(),
            answers: AnswerSet::new(),
            drawing_path: None,
            content_root: content_root.into(),
        }
    }

    /// Set the answers.
    pub fn with_answers(mut self, answers: AnswerSet) -> Self {
        self.answers = answers;
        self
    }

    /// Set the drawing asset.
    pub fn with_drawing(mut self, drawing_path: impl Into<PathBuf>) -> Self {
        self.drawing_path = Some(drawing_path.into());
        self
    }

    /// Where this request's artifact lives.
    pub fn location(&self) -> Result<ExportLocation> {
        ExportLocation::resolve(&self.content_root, &self.user_id, &self.draft_id)
    }
}

/// Resolved output directory and file for one draft/user pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLocation {
    /// `<contentRoot>/../../storage/exports/<userId>`
    pub directory: PathBuf,
    /// `<directory>/<draftId>.pdf`
    pub file: PathBuf,
}

impl ExportLocation {
    /// Derive the export location. The layout is shared with the file-serving
    /// side and must not change.
    pub fn resolve(content_root: &Path, user_id: &str, draft_id: &str) -> Result<Self> {
        validate_identifier("user", user_id)?;
        validate_identifier("draft", draft_id)?;

        let root = absolute(content_root)?;
        let directory = normalize(
            &root
                .join("..")
                .join("..")
                .join("storage")
                .join("exports")
                .join(user_id),
        );
        let file = directory.join(format!("{}.pdf", draft_id));

        Ok(Self { directory, file })
    }
}

/// Reject identifiers that cannot name exactly one entry under the exports tree.
fn validate_identifier(kind: &'static str, value: &str) -> Result<()> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', '\0']);

    if invalid {
        return Err(Error::InvalidIdentifier {
            kind,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Collapse `.` and `..` without touching the filesystem; the directories
/// may not exist yet.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
