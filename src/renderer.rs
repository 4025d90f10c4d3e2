use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use handlebars::{handlebars_helper, Handlebars};

use crate::post::parse_date;

handlebars_helper!(breadcrumbs: |path: PathBuf| {
    let mut current_path = PathBuf::from("/");
    let mut res = String::new();
    let components: Vec<_> = path
        .components()
        .filter(|c| !matches!(c, std::path::Component::RootDir))
        .collect();
    res.push_str("<a href=\"/\">/</a> ");
    for (i, c) in components.iter().enumerate() {
        current_path.push(c);
        let label = current_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        // directories are listed by the page of the same name next to them
        let href = if i + 1 < components.len() {
            format!("{}.html", current_path.to_string_lossy())
        } else {
            current_path.to_string_lossy().to_string()
        };
        let _ = write!(
            res,
            "{}<a href=\"{}\">{}</a>",
            if i == 0 {""} else {" / "},
            href,
            handlebars::html_escape(&label)
        );
    }

    res
});

handlebars_helper!(format_date: |value: str| {
    parse_date(value)
        .map(|d| d.format("%-d %B %Y").to_string())
        .unwrap_or_default()
});

pub(crate) fn generate_renderer(template_dir: &Path) -> anyhow::Result<Handlebars<'static>> {
    let mut handlebars = handlebars::Handlebars::new();
    handlebars.set_strict_mode(false);
    handlebars.register_helper("breadcrumbs", Box::new(breadcrumbs));
    handlebars.register_helper("format_date", Box::new(format_date));
    for name in ["index", "article", "list", "page"] {
        let file = format!("{name}.hbs");
        handlebars
            .register_template_file(name, template_dir.join(&file))
            .context(file)?;
    }
    handlebars.register_partial(
        "layout",
        std::fs::read_to_string(template_dir.join("layout.hbs")).context("layout.hbs")?,
    )?;
    handlebars.register_partial(
        "card",
        std::fs::read_to_string(template_dir.join("card.hbs")).context("card.hbs")?,
    )?;

    Ok(handlebars)
}
