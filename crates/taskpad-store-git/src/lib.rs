//! Git-backed document collections for taskpad.
//!
//! Each collection is a linear chain of commits under
//! `refs/taskpad/collections/<name>`. Every commit has an empty tree and carries
//! one JSON document in its message body, so a collection can be shipped to a
//! remote with an ordinary push of the ref.

mod error;

pub use error::{GitCollectionError, Result};

use git2::{Commit, ErrorCode, Oid, Repository, Signature, Sort};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use taskpad_core::TaskDocument;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info};

const DOCUMENT_CACHE_CAPACITY: usize = 256;
const REF_PREFIX: &str = "refs/taskpad/collections/";
const MESSAGE_PREFIX: &str = "taskpad-document: ";

/// Committer identity used when none is configured.
pub const DEFAULT_AUTHOR_NAME: &str = "taskpad";
/// Committer email used when none is configured.
pub const DEFAULT_AUTHOR_EMAIL: &str = "taskpad@example.invalid";

/// A document read back from a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Commit holding the document.
    pub id: String,
    /// Collection the document belongs to.
    pub collection: String,
    /// Commit time in RFC 3339.
    pub stored_rfc3339: Option<String>,
    /// Document payload.
    pub document: TaskDocument,
}

/// Document collections stored as commits in a Git repository.
///
/// The repository is reopened for every operation so the collection can be
/// shared across threads.
pub struct GitCollection {
    git_dir: PathBuf,
    author_name: String,
    author_email: String,
    document_cache: Mutex<LruCache<Oid, StoredDocument>>,
}

impl GitCollection {
    /// Discover the repository from `cwd_or_repo`.
    ///
    /// # Errors
    /// Returns an error if no Git repository can be discovered from the path.
    pub fn open(cwd_or_repo: impl AsRef<Path>) -> Result<Self> {
        let repo = Repository::discover(cwd_or_repo)?;
        let capacity = NonZeroUsize::new(DOCUMENT_CACHE_CAPACITY)
            .ok_or_else(|| GitCollectionError::Other("cache capacity must be non-zero".into()))?;
        Ok(Self {
            git_dir: repo.path().to_path_buf(),
            author_name: DEFAULT_AUTHOR_NAME.to_owned(),
            author_email: DEFAULT_AUTHOR_EMAIL.to_owned(),
            document_cache: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// Override the identity recorded on document commits.
    #[must_use]
    pub fn with_author(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author_name = name.into();
        self.author_email = email.into();
        self
    }

    /// Path of the underlying `.git` directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn repo(&self) -> Result<Repository> {
        Ok(Repository::open(&self.git_dir)?)
    }

    fn refname(collection: &str) -> Result<String> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(GitCollectionError::InvalidCollection(collection.to_owned()));
        }
        Ok(format!("{REF_PREFIX}{collection}"))
    }

    fn cached_document(&self, oid: Oid) -> Option<StoredDocument> {
        self.document_cache
            .lock()
            .ok()
            .and_then(|mut cache| cache.get(&oid).cloned())
    }

    fn cache_document(&self, oid: Oid, doc: StoredDocument) {
        if let Ok(mut cache) = self.document_cache.lock() {
            cache.put(oid, doc);
        }
    }

    fn document_from_commit(commit: &Commit<'_>) -> Result<Option<StoredDocument>> {
        let oid = commit.id();
        let Some(message) = commit.message() else {
            return Ok(None);
        };
        let Some((head, body)) = message.split_once("\n\n") else {
            return Ok(None);
        };
        let Some(collection) = head.strip_prefix(MESSAGE_PREFIX) else {
            return Ok(None);
        };

        let document: TaskDocument = serde_json::from_str(body).map_err(|source| GitCollectionError::Parse {
            oid: oid.to_string(),
            source,
        })?;
        let stored_rfc3339 = OffsetDateTime::from_unix_timestamp(commit.time().seconds())
            .ok()
            .and_then(|ts| ts.format(&Rfc3339).ok());
        Ok(Some(StoredDocument {
            id: oid.to_string(),
            collection: collection.trim().to_owned(),
            stored_rfc3339,
            document,
        }))
    }

    /// Append a document as a single commit on top of the collection ref.
    ///
    /// # Errors
    /// Returns an error for an invalid collection name, a serialization
    /// failure, or any Git object manipulation failure.
    pub fn append_document(&self, collection: &str, document: &TaskDocument) -> Result<Oid> {
        let refname = Self::refname(collection)?;
        let repo = self.repo()?;

        let sig = Signature::now(&self.author_name, &self.author_email)?;

        let tree_oid = repo.treebuilder(None)?.write()?;
        let tree = repo.find_tree(tree_oid)?;

        let parents: Vec<Commit<'_>> = match repo.find_reference(&refname) {
            Ok(r) => {
                let target = r
                    .target()
                    .ok_or_else(|| GitCollectionError::Other(format!("Ref {refname} has no target")))?;
                vec![repo.find_commit(target)?]
            }
            Err(err) if err.code() == ErrorCode::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        let body = serde_json::to_string_pretty(document).map_err(GitCollectionError::Serialize)?;
        let msg = format!("{MESSAGE_PREFIX}{collection}\n\n{body}");

        let parent_refs: Vec<&Commit<'_>> = parents.iter().collect();
        let oid = repo.commit(Some(&refname), &sig, &sig, &msg, &tree, &parent_refs)?;

        if let Some(stored) = Self::document_from_commit(&repo.find_commit(oid)?)? {
            self.cache_document(oid, stored);
        }
        info!(%oid, %refname, "Appended document");
        Ok(oid)
    }

    /// Load every document of a collection, oldest first.
    ///
    /// A collection that was never written to is empty.
    ///
    /// # Errors
    /// Returns an error if the commit history cannot be traversed or a
    /// document body fails to parse.
    pub fn load_documents(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let refname = Self::refname(collection)?;
        let repo = self.repo()?;
        let tip = match repo.find_reference(&refname) {
            Ok(r) => r
                .target()
                .ok_or_else(|| GitCollectionError::Other(format!("Ref {refname} has no target")))?,
            Err(err) if err.code() == ErrorCode::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut rev = repo.revwalk()?;
        rev.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        rev.push(tip)?;

        let mut out = Vec::new();
        for oid in rev {
            let oid = oid?;
            if let Some(doc) = self.cached_document(oid) {
                out.push(doc);
                continue;
            }
            match Self::document_from_commit(&repo.find_commit(oid)?)? {
                Some(doc) => {
                    self.cache_document(oid, doc.clone());
                    out.push(doc);
                }
                None => debug!(%oid, "Skipping commit without document"),
            }
        }
        Ok(out)
    }

    /// Names of every collection holding at least one document.
    ///
    /// # Errors
    /// Returns an error if reference enumeration fails.
    pub fn list_collections(&self) -> Result<Vec<String>> {
        let repo = self.repo()?;
        let mut names = Vec::new();
        for r in repo.references_glob(&format!("{REF_PREFIX}*"))? {
            let r = r?;
            if let Some(name) = r.name().and_then(|name| name.strip_prefix(REF_PREFIX)) {
                names.push(name.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Push every collection ref to the named remote (or a repository path/URL).
    ///
    /// # Errors
    /// Returns an error if the remote cannot be resolved or the push is rejected.
    pub fn push(&self, remote: &str) -> Result<()> {
        let repo = self.repo()?;
        let refspecs: Vec<String> = self
            .list_collections()?
            .into_iter()
            .map(|name| format!("+{REF_PREFIX}{name}:{REF_PREFIX}{name}"))
            .collect();
        if refspecs.is_empty() {
            debug!(remote, "Nothing to push");
            return Ok(());
        }

        let mut target = repo
            .find_remote(remote)
            .or_else(|_| repo.remote_anonymous(remote))?;
        target.push(&refspecs, None)?;
        info!(remote, refs = refspecs.len(), "Pushed collections");
        Ok(())
    }
}
