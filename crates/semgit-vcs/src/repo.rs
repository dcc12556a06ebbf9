use std::path::{Path, PathBuf};

use git2::{Delta, DiffFindOptions, DiffOptions, Oid};
use semgit_core::{ChangeKind, ChangeRecord, ContentStore, SemgitError};

/// One side of a tree-to-tree comparison.
///
/// `Empty` stands in for a tree with zero files. It is used when the "from"
/// ref does not resolve (first commit, or a repository with no history at
/// all), so every path on the "to" side is reported as added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeRef {
    /// A tree containing no files.
    Empty,
    /// A concrete tree snapshot.
    Tree(Oid),
}

/// The current HEAD commit, as much of it as the pipeline needs.
#[derive(Debug, Clone)]
pub struct HeadCommit {
    /// Full hex commit id.
    pub id: String,
    /// Tree of the first parent, absent for a root commit.
    pub parent_tree: Option<Oid>,
    /// Tree of the commit itself.
    pub tree: Oid,
    /// Commit time in epoch seconds.
    pub time_epoch: i64,
}

/// A git repository opened for diff resolution and content loading.
pub struct Repository {
    inner: git2::Repository,
}

impl Repository {
    /// Discover and open the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SemgitError::Git`] when `path` is not inside a git
    /// repository.
    pub fn discover(path: &Path) -> Result<Self, SemgitError> {
        let inner = git2::Repository::discover(path)
            .map_err(|e| SemgitError::Git(format!("failed to open repository: {e}")))?;
        Ok(Self { inner })
    }

    /// The repository working-tree root (the `.git` parent for bare-less
    /// repositories).
    pub fn root(&self) -> PathBuf {
        self.inner
            .workdir()
            .unwrap_or_else(|| self.inner.path())
            .to_path_buf()
    }

    /// Resolve `name^{tree}`, treating an unresolvable ref as the empty
    /// tree sentinel rather than an error. This keeps `HEAD~1` usable on
    /// the very first commit.
    pub fn resolve_tree(&self, name: &str) -> TreeRef {
        match self.inner.revparse_single(&format!("{name}^{{tree}}")) {
            Ok(obj) => TreeRef::Tree(obj.id()),
            Err(_) => TreeRef::Empty,
        }
    }

    /// The tree behind HEAD.
    ///
    /// # Errors
    ///
    /// Returns [`SemgitError::NoHeadCommit`] when the repository has no
    /// resolvable HEAD.
    pub fn head_tree(&self) -> Result<TreeRef, SemgitError> {
        match self.inner.revparse_single("HEAD^{tree}") {
            Ok(obj) => Ok(TreeRef::Tree(obj.id())),
            Err(_) => Err(SemgitError::NoHeadCommit),
        }
    }

    /// Write the current index as a tree and return it.
    ///
    /// # Errors
    ///
    /// Returns [`SemgitError::Git`] when the index cannot be read or
    /// written (e.g. unresolved merge conflicts).
    pub fn index_tree(&self) -> Result<TreeRef, SemgitError> {
        let mut index = self
            .inner
            .index()
            .map_err(|e| SemgitError::Git(format!("failed to read index: {e}")))?;
        let oid = index
            .write_tree()
            .map_err(|e| SemgitError::Git(format!("failed to write index tree: {e}")))?;
        Ok(TreeRef::Tree(oid))
    }

    /// Diff two tree snapshots into ordered path-level change records.
    ///
    /// Rename and copy detection is delegated to libgit2; callers must not
    /// assume renames are always detected and should treat Renamed/Copied
    /// like Modified when counting.
    ///
    /// # Errors
    ///
    /// Returns [`SemgitError::Git`] when a tree cannot be loaded or the
    /// diff fails.
    pub fn diff(&self, from: TreeRef, to: TreeRef) -> Result<Vec<ChangeRecord>, SemgitError> {
        let from_tree = self.find_tree(from)?;
        let to_tree = self.find_tree(to)?;

        let mut diff_opts = DiffOptions::new();
        let mut diff = self
            .inner
            .diff_tree_to_tree(from_tree.as_ref(), to_tree.as_ref(), Some(&mut diff_opts))
            .map_err(|e| SemgitError::Git(format!("failed to compute diff: {e}")))?;

        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true).copies(true);
        diff.find_similar(Some(&mut find_opts))
            .map_err(|e| SemgitError::Git(format!("failed to detect renames: {e}")))?;

        let mut records = Vec::with_capacity(diff.deltas().len());
        for delta in diff.deltas() {
            if let Some(record) = record_from_delta(&delta) {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Diff the staged index against the committed HEAD tree.
    ///
    /// With no commits yet, the HEAD side is the empty tree, so every
    /// staged path comes back as added.
    ///
    /// # Errors
    ///
    /// Returns [`SemgitError::Git`] when the index cannot be materialized.
    pub fn diff_staged(&self) -> Result<Vec<ChangeRecord>, SemgitError> {
        let head = self.head_tree().unwrap_or(TreeRef::Empty);
        let index = self.index_tree()?;
        self.diff(head, index)
    }

    /// The current HEAD commit, or `None` for an unborn branch.
    ///
    /// # Errors
    ///
    /// Returns [`SemgitError::Git`] when HEAD exists but cannot be peeled
    /// to a commit.
    pub fn head_commit(&self) -> Result<Option<HeadCommit>, SemgitError> {
        let head = match self.inner.head() {
            Ok(reference) => reference,
            Err(_) => return Ok(None),
        };
        let commit = head
            .peel_to_commit()
            .map_err(|e| SemgitError::Git(format!("failed to resolve HEAD commit: {e}")))?;
        let parent_tree = commit.parent(0).ok().map(|p| p.tree_id());
        Ok(Some(HeadCommit {
            id: commit.id().to_string(),
            parent_tree,
            tree: commit.tree_id(),
            time_epoch: commit.time().seconds(),
        }))
    }

    /// Load blob content behind a hex id.
    ///
    /// # Errors
    ///
    /// Returns [`SemgitError::Git`] when the id is malformed or does not
    /// name a blob in the object store.
    pub fn load_content(&self, id: &str) -> Result<Vec<u8>, SemgitError> {
        let oid =
            Oid::from_str(id).map_err(|e| SemgitError::Git(format!("invalid blob id: {e}")))?;
        let blob = self
            .inner
            .find_blob(oid)
            .map_err(|e| SemgitError::Git(format!("failed to load blob {id}: {e}")))?;
        Ok(blob.content().to_vec())
    }

    fn find_tree(&self, tree_ref: TreeRef) -> Result<Option<git2::Tree<'_>>, SemgitError> {
        match tree_ref {
            TreeRef::Empty => Ok(None),
            TreeRef::Tree(oid) => {
                let tree = self
                    .inner
                    .find_tree(oid)
                    .map_err(|e| SemgitError::Git(format!("failed to load tree {oid}: {e}")))?;
                Ok(Some(tree))
            }
        }
    }
}

impl ContentStore for Repository {
    fn read_content(&self, id: &str) -> Result<Vec<u8>, SemgitError> {
        self.load_content(id)
    }
}

fn record_from_delta(delta: &git2::DiffDelta<'_>) -> Option<ChangeRecord> {
    let kind = match delta.status() {
        Delta::Added => ChangeKind::Added,
        Delta::Deleted => ChangeKind::Deleted,
        Delta::Modified => ChangeKind::Modified,
        Delta::Renamed => ChangeKind::Renamed,
        Delta::Copied => ChangeKind::Copied,
        _ => ChangeKind::Modified,
    };

    let old_path = path_string(delta.old_file());
    let new_path = path_string(delta.new_file());
    // Uphold the record invariants regardless of what libgit2 fills in.
    let (old_path, new_path) = match kind {
        ChangeKind::Added => (None, new_path),
        ChangeKind::Deleted => (old_path, None),
        _ => (old_path, new_path),
    };
    if old_path.is_none() && new_path.is_none() {
        return None;
    }

    Some(ChangeRecord {
        kind,
        old_path,
        new_path,
        old_id: content_id(delta.old_file()),
        new_id: content_id(delta.new_file()),
    })
}

fn path_string(file: git2::DiffFile<'_>) -> Option<String> {
    file.path()
        .map(|p| p.to_string_lossy().into_owned())
        .filter(|p| !p.is_empty())
}

fn content_id(file: git2::DiffFile<'_>) -> Option<String> {
    let id = file.id();
    if id.is_zero() {
        None
    } else {
        Some(id.to_string())
    }
}
