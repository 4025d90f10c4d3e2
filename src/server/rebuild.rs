use std::sync::Arc;

use log::{error, info};
use tokio::sync::Notify;

use crate::{context::Context, generator::generate};

/// Requests a site rebuild after content changes. Requests made while a
/// build is running collapse into a single follow-up build.
#[derive(Debug, Clone, Default)]
pub(crate) struct RebuildHandle {
    notify: Arc<Notify>,
}

impl RebuildHandle {
    pub fn request(&self) {
        self.notify.notify_one();
    }
}

pub(crate) fn spawn_rebuild_worker(ctx: Arc<Context>) -> RebuildHandle {
    let handle = RebuildHandle::default();
    let notify = handle.notify.clone();
    tokio::spawn(async move {
        loop {
            notify.notified().await;
            let ctx = ctx.clone();
            match tokio::task::spawn_blocking(move || generate(&ctx)).await {
                Ok(Ok(report)) => info!(
                    "site rebuilt: {} posts, {} pages",
                    report.posts, report.pages
                ),
                Ok(Err(e)) => error!("site rebuild failed: {e:?}"),
                Err(e) => error!("site rebuild task panicked: {e}"),
            }
        }
    });
    handle
}
