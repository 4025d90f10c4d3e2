use crate::post::Post;

/// A public listing page selecting posts by category and tags.
pub(crate) struct Section {
    pub slug: &'static str,
    pub label: &'static str,
    pub member: fn(&Post) -> bool,
    pub groups: &'static [Group],
}

pub(crate) struct Group {
    pub label: &'static str,
    pub member: fn(&Post) -> bool,
}

fn any_tag(post: &Post, tags: &[&str]) -> bool {
    tags.iter().any(|t| post.has_tag(t))
}

fn tag_or_title(post: &Post, word: &str) -> bool {
    post.has_tag(word) || post.title_contains(word)
}

pub(crate) const SECTIONS: &[Section] = &[
    Section {
        slug: "news",
        label: "news",
        member: |p| {
            p.in_category("news")
                || p.in_category(crate::post::DEFAULT_CATEGORY)
                || p.has_tag("news")
        },
        groups: &[],
    },
    Section {
        slug: "transfers",
        label: "transfers",
        member: |p| {
            p.in_category("transfer") || p.in_category("transfers") || any_tag(p, &["transfer", "transfers"])
        },
        groups: &[
            Group {
                label: "confirmed",
                member: |p| any_tag(p, &["confirmed", "completed"]),
            },
            Group {
                label: "rumors",
                member: |p| any_tag(p, &["rumor", "rumors"]),
            },
        ],
    },
    Section {
        slug: "matches",
        label: "matches",
        member: |p| {
            p.in_category("match")
                || p.in_category("matches")
                || any_tag(p, &["match", "preview", "report", "analysis"])
        },
        groups: &[
            Group {
                label: "previews",
                member: |p| tag_or_title(p, "preview"),
            },
            Group {
                label: "reports",
                member: |p| tag_or_title(p, "report"),
            },
            Group {
                label: "analysis",
                member: |p| tag_or_title(p, "analysis"),
            },
        ],
    },
    Section {
        slug: "analysis",
        label: "analysis",
        member: |p| {
            p.in_category("analysis") || any_tag(p, &["analysis", "tactical", "opinion", "expert"])
        },
        groups: &[
            Group {
                label: "tactical",
                member: |p| tag_or_title(p, "tactical"),
            },
            Group {
                label: "opinion",
                member: |p| tag_or_title(p, "opinion"),
            },
            Group {
                label: "playerAnalysis",
                member: |p| p.has_tag("player") && p.has_tag("analysis"),
            },
            Group {
                label: "teamAnalysis",
                member: |p| p.has_tag("team") && p.has_tag("analysis"),
            },
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::parse_post;

    fn post(front_matter: &str) -> Post {
        parse_post("p.md", &format!("---\n{front_matter}\n---\nbody")).unwrap()
    }

    fn section(slug: &str) -> &'static Section {
        SECTIONS.iter().find(|s| s.slug == slug).unwrap()
    }

    #[test]
    fn uncategorised_posts_are_news() {
        assert!((section("news").member)(&post("title: x")));
        assert!(!(section("news").member)(&post("category: transfer")));
    }

    #[test]
    fn webhook_transfer_lands_in_rumors() {
        let p = post("category: transfer\ntags: [transfer, rumor]");
        let transfers = section("transfers");
        assert!((transfers.member)(&p));
        assert!((transfers.groups[1].member)(&p));
        assert!(!(transfers.groups[0].member)(&p));
    }

    #[test]
    fn match_groups_use_title_words() {
        let p = post("title: \"Preview: A vs B\"\ncategory: match");
        let matches = section("matches");
        assert!((matches.member)(&p));
        assert!((matches.groups[0].member)(&p));
        assert!(!(matches.groups[1].member)(&p));
    }
}
