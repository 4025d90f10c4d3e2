use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context as _;
use clap::{command, value_parser, Arg, ArgAction, Command};
use config::{Config, ServeConfig};
use context::Context;
use generator::generate;
use log::info;

mod config;
mod context;
mod error;
mod generator;
mod i18n;
mod post;
mod renderer;
mod server;
mod slug;
mod store;
mod tombstone;
mod webhook;

fn path_arg(id: &'static str, long: &'static str, help: &'static str, default: &'static str) -> Arg {
    Arg::new(id)
        .long(long)
        .help(help)
        .global(true)
        .action(ArgAction::Set)
        .value_parser(value_parser!(PathBuf))
        .default_value(default)
}

fn cli() -> Command {
    command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .args([
            path_arg(
                "content_dir",
                "content-dir",
                "Directory holding posts/ and the deleted-posts list",
                "content",
            )
            .env("FOOTBALLFEED_CONTENT_DIR"),
            path_arg(
                "out_dir",
                "out-dir",
                "Directory path of output. Existing contents will be replaced.",
                "out",
            )
            .env("FOOTBALLFEED_OUT_DIR"),
            path_arg(
                "public_dir",
                "public-dir",
                "Directory path of public. Contents will be copied as it is.",
                "public",
            )
            .env("FOOTBALLFEED_PUBLIC_DIR"),
            path_arg("template_dir", "template-dir", "Directory of templates", "templates")
                .env("FOOTBALLFEED_TEMPLATE_DIR"),
            Arg::new("site_name")
                .long("site-name")
                .help("Site title shown in pages and the feed")
                .global(true)
                .env("SITE_NAME")
                .default_value("Football Feed Club"),
            Arg::new("site_url")
                .long("site-url")
                .help("Absolute base URL used in the feed")
                .global(true)
                .env("SITE_URL")
                .default_value("http://localhost:3000"),
            Arg::new("language")
                .long("language")
                .help("Language code for UI labels")
                .global(true)
                .env("SITE_LANGUAGE")
                .default_value(i18n::DEFAULT_LANGUAGE),
        ])
        .subcommand(Command::new("build").about("Render the static site once and exit"))
        .subcommand(
            Command::new("serve")
                .about("Serve the site with webhook and admin endpoints")
                .args([
                    Arg::new("listen")
                        .long("listen")
                        .help("Address to bind")
                        .env("FOOTBALLFEED_LISTEN")
                        .value_parser(value_parser!(SocketAddr))
                        .default_value("127.0.0.1:3000"),
                    Arg::new("webhook_secret")
                        .long("webhook-secret")
                        .help("Bearer token required by webhook and post management calls")
                        .env("WEBHOOK_SECRET")
                        .hide_env_values(true),
                    Arg::new("admin_password")
                        .long("admin-password")
                        .help("Password for the admin dashboard; defaults to the webhook secret")
                        .env("ADMIN_PASSWORD")
                        .hide_env_values(true),
                ]),
        )
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = cli().get_matches();
    let (name, sub_matches) = matches.subcommand().context("a subcommand is required")?;
    let config = Config::from_matches(sub_matches)?;
    let ctx = Context::new(config)?;

    match name {
        "build" => {
            let report = generate(&ctx)?;
            info!(
                "built {} posts into {} pages at {:?}",
                report.posts, report.pages, ctx.config.out_dir
            );
            Ok(())
        }
        "serve" => {
            let serve_config = ServeConfig::from_matches(sub_matches)?;
            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("starting runtime")?
                .block_on(server::serve(ctx, serve_config))
        }
        other => anyhow::bail!("unknown subcommand {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn globals_reach_subcommands() {
        let matches = cli()
            .try_get_matches_from(["footballfeed", "build", "--content-dir", "news", "--language", "ms"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "build");
        assert_eq!(sub.get_one::<PathBuf>("content_dir").unwrap(), &PathBuf::from("news"));
        assert_eq!(sub.get_one::<String>("language").unwrap(), "ms");
        assert_eq!(sub.get_one::<PathBuf>("out_dir").unwrap(), &PathBuf::from("out"));
    }

    #[test]
    fn serve_parses_listen_address() {
        let matches = cli()
            .try_get_matches_from(["footballfeed", "serve", "--listen", "0.0.0.0:8080", "--webhook-secret", "s"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let serve = ServeConfig::from_matches(sub).unwrap();
        assert_eq!(serve.listen, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(serve.admin_password, "s");
    }
}
