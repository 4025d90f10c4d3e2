use crate::{config::Config, renderer::generate_renderer, store::PostStore};

/// Everything a site build or a request handler needs, built once at startup.
#[derive(Debug)]
pub(crate) struct Context {
    pub config: Config,
    pub store: PostStore,
    pub handlebars: handlebars::Handlebars<'static>,
}

impl Context {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let handlebars = generate_renderer(&config.template_dir)?;
        let store = PostStore::open(&config.content_dir);
        Ok(Self {
            config,
            store,
            handlebars,
        })
    }
}
