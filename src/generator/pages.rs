use std::path::Path;

use log::warn;

use crate::post::{parse_post, Post};

use super::sections::SECTIONS;

/// Names the generator already writes at the site root.
const RESERVED: &[&str] = &["index", "posts", "category", "tags", "feed"];

fn reserved(id: &str) -> bool {
    RESERVED.contains(&id) || SECTIONS.iter().any(|s| s.slug == id)
}

/// Stand-alone pages (contact, privacy, terms, ...) from `pages_dir/*.md`,
/// rendered to `/<name>.html` and linked from the footer. Same front matter
/// as posts; only the title, date and body are used.
pub(super) fn load_pages(pages_dir: &Path) -> anyhow::Result<Vec<Post>> {
    let entries = match std::fs::read_dir(pages_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(e.into()),
    };

    let mut pages = vec![];
    for entry in entries {
        let entry = entry?;
        let filename = entry.file_name().to_string_lossy().to_string();
        if !filename.ends_with(".md") || !entry.file_type()?.is_file() {
            continue;
        }
        let content = match std::fs::read_to_string(entry.path()) {
            Ok(content) => content,
            Err(e) => {
                warn!("skipping page {filename}: {e}");
                continue;
            }
        };
        let page = match parse_post(&filename, &content) {
            Ok(page) => page,
            Err(e) => {
                warn!("skipping page {filename}: {e}");
                continue;
            }
        };
        if reserved(&page.id) {
            warn!("skipping page {filename}: /{}.html is a generated page", page.id);
            continue;
        }
        pages.push(page);
    }
    pages.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_sorted_and_reserved_names_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("terms.md"), "---\ntitle: Terms of Service\n---\nBe nice.\n").unwrap();
        std::fs::write(dir.path().join("contact.md"), "---\ntitle: Contact Us\n---\nWrite to us.\n").unwrap();
        std::fs::write(dir.path().join("news.md"), "---\ntitle: News\n---\nclash\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a page").unwrap();

        let pages = load_pages(dir.path()).unwrap();
        let ids: Vec<_> = pages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["contact", "terms"]);
        assert_eq!(pages[0].title, "Contact Us");
    }

    #[test]
    fn missing_dir_means_no_pages() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_pages(&dir.path().join("pages")).unwrap().is_empty());
    }
}
