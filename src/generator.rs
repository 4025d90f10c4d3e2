use std::{
    collections::BTreeMap,
    fs::OpenOptions,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use chrono::Utc;
use fs_extra::dir::CopyOptions;
use log::{debug, info};
use serde::Serialize;

use crate::{
    context::Context,
    i18n,
    post::{render_markdown, Post},
    slug::slugify,
};

mod data;
mod feed;
mod pages;
pub(crate) mod sections;

use data::{
    ArticlePageData, GroupData, IndexPageData, ListPageData, NavLink, SiteData,
    StaticPageData, TagLink,
};
use sections::SECTIONS;

const LATEST_ON_INDEX: usize = 6;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BuildReport {
    pub posts: usize,
    pub pages: usize,
}

fn render_page<T: Serialize>(
    s: &Context,
    template: &str,
    data: &T,
    out_path: &Path,
) -> anyhow::Result<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let fd = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(out_path)
        .with_context(|| format!("opening {out_path:?}"))?;
    s.handlebars
        .render_to_write(template, data, fd)
        .with_context(|| format!("while generating {out_path:?}"))?;
    debug!("wrote {out_path:?}");
    Ok(())
}

fn category_href(category: &str) -> String {
    format!("/category/{}.html", slugify(category))
}

fn tag_href(tag: &str) -> String {
    format!("/tags/{}.html", slugify(tag))
}

fn sibling_dir(out_dir: &Path, suffix: &str) -> PathBuf {
    let mut name = out_dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "out".into());
    name.push(suffix);
    out_dir.with_file_name(name)
}

/// Sibling directory the site is assembled in before replacing `out_dir`,
/// so a server reading `out_dir` never sees a half-written site.
fn staging_dir(out_dir: &Path) -> PathBuf {
    sibling_dir(out_dir, ".staging")
}

/// Moves the finished staging tree into `out_dir`. The previous build is
/// renamed aside first, so `out_dir` is only missing between two renames.
fn swap_in(staging: &Path, out_dir: &Path) -> anyhow::Result<()> {
    let retired = sibling_dir(out_dir, ".old");
    fs_extra::dir::remove(&retired)?;
    if out_dir.exists() {
        std::fs::rename(out_dir, &retired)
            .with_context(|| format!("moving {out_dir:?} aside"))?;
    }
    std::fs::rename(staging, out_dir)
        .with_context(|| format!("moving {staging:?} to {out_dir:?}"))?;
    fs_extra::dir::remove(&retired)?;
    Ok(())
}

fn group_by<'a>(posts: &'a [Post], keys: impl Fn(&'a Post) -> Vec<&'a str>) -> Grouped<'a> {
    let mut groups: BTreeMap<String, (&str, Vec<&Post>)> = BTreeMap::new();
    for post in posts {
        for key in keys(post) {
            let slug = slugify(key);
            if slug.is_empty() {
                continue;
            }
            let entry = groups.entry(slug).or_insert_with(|| (key, vec![]));
            if !entry.1.iter().any(|p| p.id == post.id) {
                entry.1.push(post);
            }
        }
    }
    groups
}

type Grouped<'a> = BTreeMap<String, (&'a str, Vec<&'a Post>)>;

/// `<dir>.html`: links to every page under `<dir>/`.
fn render_index(
    s: &Context,
    site: &SiteData,
    staging: &Path,
    dir: &str,
    groups: &Grouped,
) -> anyhow::Result<usize> {
    let label = if dir == "tags" { "tag" } else { "category" };
    let data = ListPageData {
        site,
        title: site.labels[label].to_string(),
        path: PathBuf::from(format!("/{dir}.html")),
        posts: vec![],
        groups: vec![],
        links: groups
            .iter()
            .map(|(slug, (name, _))| TagLink {
                name,
                href: format!("/{dir}/{slug}.html"),
            })
            .collect(),
    };
    render_page(s, "list", &data, &staging.join(format!("{dir}.html")))?;
    Ok(1)
}

pub(crate) fn generate(s: &Context) -> anyhow::Result<BuildReport> {
    let config = &s.config;
    let staging = staging_dir(&config.out_dir);
    fs_extra::dir::remove(&staging)?;
    fs_extra::dir::create_all(&staging, false)?;

    // copy `public_dir`
    let mut cp_opts = CopyOptions::new();
    cp_opts.content_only = true;
    cp_opts.overwrite = true;
    fs_extra::dir::copy(&config.public_dir, &staging, &cp_opts)
        .with_context(|| format!("copying {:?}", config.public_dir))?;

    let posts = s.store.list_visible().context("loading posts")?;
    let pages = pages::load_pages(&config.content_dir.join("pages")).context("loading pages")?;
    let mut report = BuildReport {
        posts: posts.len(),
        pages: 0,
    };

    let site = SiteData {
        name: &config.site_name,
        url: &config.site_url,
        language: &config.language,
        labels: i18n::labels(&config.language),
        nav: SECTIONS
            .iter()
            .map(|section| NavLink {
                href: format!("/{}.html", section.slug),
                label: section.label,
            })
            .collect(),
        footer: pages
            .iter()
            .map(|page| TagLink {
                name: &page.title,
                href: format!("/{}.html", page.id),
            })
            .collect(),
    };

    // static pages
    for page in pages.iter() {
        let file = format!("{}.html", page.id);
        let data = StaticPageData {
            site: &site,
            title: &page.title,
            path: PathBuf::from("/").join(&file),
            body: render_markdown(&page.body),
            page,
        };
        render_page(s, "page", &data, &staging.join(&file))?;
        report.pages += 1;
    }

    // article pages
    for post in posts.iter() {
        let data = ArticlePageData {
            site: &site,
            path: PathBuf::from("/posts").join(format!("{}.html", post.id)),
            body: render_markdown(&post.body),
            post,
            category_href: category_href(&post.category),
            tags: post
                .tags
                .iter()
                .filter(|t| !slugify(t).is_empty())
                .map(|t| TagLink {
                    name: t,
                    href: tag_href(t),
                })
                .collect(),
        };
        render_page(
            s,
            "article",
            &data,
            &staging.join("posts").join(format!("{}.html", post.id)),
        )?;
        report.pages += 1;
    }

    // index page
    {
        let featured = posts.iter().find(|p| p.featured).or_else(|| posts.first());
        let data = IndexPageData {
            site: &site,
            path: PathBuf::from("/"),
            featured,
            latest: posts.iter().take(LATEST_ON_INDEX).collect(),
        };
        render_page(s, "index", &data, &staging.join("index.html"))?;
        report.pages += 1;
    }

    // all posts; kept outside `posts/` so no post id can collide with it
    {
        let data = ListPageData {
            site: &site,
            title: site.labels["allPosts"].to_string(),
            path: PathBuf::from("/posts.html"),
            posts: posts.iter().collect(),
            groups: vec![],
            links: vec![],
        };
        render_page(s, "list", &data, &staging.join("posts.html"))?;
        report.pages += 1;
    }

    // section pages
    for section in SECTIONS {
        let members: Vec<&Post> = posts.iter().filter(|p| (section.member)(p)).collect();
        let groups = section
            .groups
            .iter()
            .map(|group| GroupData {
                title: site.labels.get(group.label).copied().unwrap_or(group.label),
                posts: members
                    .iter()
                    .copied()
                    .filter(|p| (group.member)(p))
                    .collect(),
            })
            .collect();
        let data = ListPageData {
            site: &site,
            title: site
                .labels
                .get(section.label)
                .copied()
                .unwrap_or(section.label)
                .to_string(),
            path: PathBuf::from(format!("/{}.html", section.slug)),
            posts: members,
            groups,
            links: vec![],
        };
        render_page(
            s,
            "list",
            &data,
            &staging.join(format!("{}.html", section.slug)),
        )?;
        report.pages += 1;
    }

    // category pages
    let categories = group_by(&posts, |p| vec![p.category.as_str()]);
    report.pages += render_index(s, &site, &staging, "category", &categories)?;
    for (slug, (name, members)) in categories {
        let data = ListPageData {
            site: &site,
            title: format!("{}: {name}", site.labels["category"]),
            path: PathBuf::from("/category").join(format!("{slug}.html")),
            posts: members,
            groups: vec![],
            links: vec![],
        };
        render_page(
            s,
            "list",
            &data,
            &staging.join("category").join(format!("{slug}.html")),
        )?;
        report.pages += 1;
    }

    // tag pages
    let tags = group_by(&posts, |p| p.tags.iter().map(String::as_str).collect());
    report.pages += render_index(s, &site, &staging, "tags", &tags)?;
    for (slug, (name, members)) in tags {
        let data = ListPageData {
            site: &site,
            title: format!("{}: {name}", site.labels["tag"]),
            path: PathBuf::from("/tags").join(format!("{slug}.html")),
            posts: members,
            groups: vec![],
            links: vec![],
        };
        render_page(
            s,
            "list",
            &data,
            &staging.join("tags").join(format!("{slug}.html")),
        )?;
        report.pages += 1;
    }

    // atom feed
    {
        let feed = feed::build_feed(config, &posts, Utc::now());
        let fd = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(staging.join("feed.xml"))?;
        feed.write_to(fd).context("while writing feed.xml")?;
    }

    // swap in
    swap_in(&staging, &config.out_dir)?;

    info!(
        "generated {} pages for {} posts into {:?}",
        report.pages, report.posts, config.out_dir
    );
    Ok(report)
}
