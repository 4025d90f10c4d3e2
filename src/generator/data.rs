use serde::Serialize;
use std::{collections::BTreeMap, path::PathBuf};

use crate::post::Post;

#[derive(Serialize, Debug)]
pub(super) struct SiteData<'a> {
    pub name: &'a str,
    pub url: &'a str,
    pub language: &'a str,
    pub labels: BTreeMap<&'static str, &'static str>,
    pub nav: Vec<NavLink>,
    pub footer: Vec<TagLink<'a>>,
}

#[derive(Serialize, Debug, Clone)]
pub(super) struct NavLink {
    pub href: String,
    pub label: &'static str,
}

#[derive(Serialize, Debug)]
pub(super) struct ArticlePageData<'a> {
    pub site: &'a SiteData<'a>,
    pub path: PathBuf,
    pub body: String,
    pub post: &'a Post,
    pub category_href: String,
    pub tags: Vec<TagLink<'a>>,
}

#[derive(Serialize, Debug)]
pub(super) struct TagLink<'a> {
    pub name: &'a str,
    pub href: String,
}

#[derive(Serialize, Debug)]
pub(super) struct IndexPageData<'a> {
    pub site: &'a SiteData<'a>,
    pub path: PathBuf,
    pub featured: Option<&'a Post>,
    pub latest: Vec<&'a Post>,
}

#[derive(Serialize, Debug)]
pub(super) struct GroupData<'a> {
    pub title: &'static str,
    pub posts: Vec<&'a Post>,
}

#[derive(Serialize, Debug)]
pub(super) struct ListPageData<'a> {
    pub site: &'a SiteData<'a>,
    pub title: String,
    pub path: PathBuf,
    pub posts: Vec<&'a Post>,
    pub groups: Vec<GroupData<'a>>,
    pub links: Vec<TagLink<'a>>,
}

#[derive(Serialize, Debug)]
pub(super) struct StaticPageData<'a> {
    pub site: &'a SiteData<'a>,
    pub title: &'a str,
    pub path: PathBuf,
    pub body: String,
    pub page: &'a Post,
}
