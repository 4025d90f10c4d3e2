use atom_syndication::{Category, Entry, Feed, Link, Person, Text};
use chrono::{DateTime, FixedOffset, Utc};

use crate::{config::Config, post::Post};

pub(super) const FEED_LENGTH: usize = 20;

fn link(href: String) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link
}

/// Atom feed of the latest posts; `posts` must already be sorted newest first.
pub(super) fn build_feed(config: &Config, posts: &[Post], now: DateTime<Utc>) -> Feed {
    let fallback: DateTime<FixedOffset> = now.fixed_offset();

    let entries: Vec<Entry> = posts
        .iter()
        .take(FEED_LENGTH)
        .map(|post| {
            let url = format!("{}/posts/{}.html", config.site_url, post.id);
            let mut entry = Entry::default();
            entry.set_id(url.clone());
            entry.set_title(post.title.clone());
            entry.set_updated(post.date.unwrap_or(fallback));
            entry.set_links(vec![link(url)]);
            if !post.excerpt.is_empty() {
                entry.set_summary(Some(Text::plain(post.excerpt.clone())));
            }
            let mut author = Person::default();
            author.set_name(post.author.clone());
            entry.set_authors(vec![author]);
            let mut category = Category::default();
            category.set_term(post.category.clone());
            entry.set_categories(vec![category]);
            entry
        })
        .collect();

    let mut feed = Feed::default();
    feed.set_id(format!("{}/", config.site_url));
    feed.set_title(config.site_name.clone());
    feed.set_updated(
        posts
            .iter()
            .filter_map(|p| p.date)
            .max()
            .unwrap_or(fallback),
    );
    feed.set_links(vec![link(format!("{}/", config.site_url))]);
    feed.set_entries(entries);
    feed
}
