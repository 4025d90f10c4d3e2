use std::{
    fs::OpenOptions,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    error::StoreError,
    post::{parse_post, render_post_file, sort_posts, FrontMatter, Post},
    tombstone::{Tombstones, TOMBSTONE_FILE},
};

pub(crate) const POSTS_DIR: &str = "posts";

/// A post about to be written: the id it should get if free, its header and
/// its markdown body.
#[derive(Debug, Clone)]
pub(crate) struct NewArticle {
    pub slug: String,
    pub front_matter: FrontMatter,
    pub body: String,
}

#[derive(Serialize, Debug, Clone)]
pub(crate) struct CreatedPost {
    pub id: String,
    pub filename: String,
    pub path: PathBuf,
}

#[derive(Serialize, Debug, Clone)]
pub(crate) struct ListedPost {
    #[serde(flatten)]
    pub post: Post,
    pub deleted: bool,
}

/// Markdown posts under `<content>/posts` plus the soft-delete list kept
/// next to them.
#[derive(Debug)]
pub(crate) struct PostStore {
    posts_dir: PathBuf,
    tombstones: Tombstones,
}

impl PostStore {
    pub fn open(content_dir: &Path) -> Self {
        Self {
            posts_dir: content_dir.join(POSTS_DIR),
            tombstones: Tombstones::new(content_dir.join(TOMBSTONE_FILE)),
        }
    }

    pub fn posts_dir(&self) -> &Path {
        &self.posts_dir
    }

    /// Every readable post on disk, soft-deleted ones included. Files whose
    /// header fails to parse are skipped.
    fn read_all(&self) -> Result<Vec<Post>, StoreError> {
        let entries = match std::fs::read_dir(&self.posts_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut posts = vec![];
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let filename = entry.file_name().to_string_lossy().to_string();
            if !filename.ends_with(".md") {
                continue;
            }
            let content = match std::fs::read_to_string(entry.path()) {
                Ok(content) => content,
                Err(e) => {
                    warn!("skipping {filename}: {e}");
                    continue;
                }
            };
            match parse_post(&filename, &content) {
                Ok(post) => posts.push(post),
                Err(e) => warn!("skipping {filename}: {e}"),
            }
        }
        posts.sort_by(sort_posts);
        Ok(posts)
    }

    /// Posts shown on the public site.
    pub fn list_visible(&self) -> Result<Vec<Post>, StoreError> {
        let deleted = self.tombstones.list()?;
        let mut posts = self.read_all()?;
        posts.retain(|p| !deleted.contains(&p.filename));
        Ok(posts)
    }

    /// Every post, flagged with its soft-delete state.
    pub fn list_all(&self) -> Result<Vec<ListedPost>, StoreError> {
        let deleted = self.tombstones.list()?;
        Ok(self
            .read_all()?
            .into_iter()
            .map(|post| {
                let deleted = deleted.contains(&post.filename);
                ListedPost { post, deleted }
            })
            .collect())
    }

    pub fn get(&self, id: &str) -> Result<Post, StoreError> {
        let filename = format!("{id}.md");
        validate_filename(&filename)?;
        if self.tombstones.list()?.contains(&filename) {
            return Err(StoreError::NotFound(filename));
        }
        let content = match std::fs::read_to_string(self.posts_dir.join(&filename)) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(filename))
            }
            Err(e) => return Err(e.into()),
        };
        parse_post(&filename, &content).map_err(|e| StoreError::front_matter(&filename, e))
    }

    pub fn by_category(&self, category: &str) -> Result<Vec<Post>, StoreError> {
        let mut posts = self.list_visible()?;
        posts.retain(|p| p.in_category(category));
        Ok(posts)
    }

    pub fn by_tag(&self, tag: &str) -> Result<Vec<Post>, StoreError> {
        let mut posts = self.list_visible()?;
        posts.retain(|p| p.has_tag(tag));
        Ok(posts)
    }

    /// Posts flagged `featured` first, then the latest of the rest.
    pub fn featured(&self, limit: usize) -> Result<Vec<Post>, StoreError> {
        let (mut featured, rest): (Vec<Post>, Vec<Post>) =
            self.list_visible()?.into_iter().partition(|p| p.featured);
        featured.extend(rest);
        featured.truncate(limit);
        Ok(featured)
    }

    /// Writes a new post. An existing file is never overwritten: the id gets
    /// a `-2`, `-3`, ... suffix until a free name is found.
    pub fn create(&self, article: &NewArticle) -> Result<CreatedPost, StoreError> {
        std::fs::create_dir_all(&self.posts_dir)?;
        let content = render_post_file(&article.front_matter, &article.body)
            .map_err(|e| StoreError::front_matter(format!("{}.md", article.slug), e))?;

        let mut attempt = 1;
        loop {
            let id = if attempt == 1 {
                article.slug.clone()
            } else {
                format!("{}-{attempt}", article.slug)
            };
            let filename = format!("{id}.md");
            validate_filename(&filename)?;
            let path = self.posts_dir.join(&filename);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut fd) => {
                    fd.write_all(content.as_bytes())?;
                    // a leftover entry for a file that no longer existed would hide the new post
                    if self.tombstones.remove(&filename)? {
                        warn!("dropped stale deleted-posts entry for {filename}");
                    }
                    info!("created post {filename}");
                    return Ok(CreatedPost { id, filename, path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("{filename} already exists");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Removes the file for good, along with any soft-delete entry for it.
    pub fn hard_delete(&self, filename: &str) -> Result<(), StoreError> {
        validate_filename(filename)?;
        match std::fs::remove_file(self.posts_dir.join(filename)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(filename.to_string()))
            }
            Err(e) => return Err(e.into()),
        }
        self.tombstones.remove(filename)?;
        info!("deleted post {filename}");
        Ok(())
    }

    /// Hides a post. Returns false when it was already hidden.
    pub fn soft_delete(&self, filename: &str) -> Result<bool, StoreError> {
        validate_filename(filename)?;
        if !self.posts_dir.join(filename).is_file() {
            return Err(StoreError::NotFound(filename.to_string()));
        }
        let added = self.tombstones.add(filename)?;
        if added {
            info!("soft-deleted post {filename}");
        }
        Ok(added)
    }

    /// Shows a soft-deleted post again. Returns false when it was not hidden.
    pub fn restore(&self, filename: &str) -> Result<bool, StoreError> {
        validate_filename(filename)?;
        let removed = self.tombstones.remove(filename)?;
        if removed {
            info!("restored post {filename}");
        }
        Ok(removed)
    }

    pub fn deleted(&self) -> Result<Vec<String>, StoreError> {
        self.tombstones.list()
    }
}

/// Only bare `*.md` names inside the posts directory are accepted.
pub(crate) fn validate_filename(filename: &str) -> Result<(), StoreError> {
    let stem = filename.strip_suffix(".md").unwrap_or("");
    let bare = !stem.is_empty()
        && !filename.contains(['/', '\\', '\0'])
        && !filename.starts_with('.');
    if bare {
        Ok(())
    } else {
        Err(StoreError::InvalidFilename(filename.to_string()))
    }
}
