use anyhow::Result;
use clap::{App, Arg};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use stele::build::build_site;
use stele::config::Config;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let matches = App::new("stele")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compiles a directory of markdown posts into a static blog")
        .arg(
            Arg::with_name("project")
                .help("The project directory (or any directory beneath it)")
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .help("The output directory"),
        )
        .arg(
            Arg::with_name("drafts")
                .long("drafts")
                .help("Include posts marked `draft: true`"),
        )
        .get_matches();

    let config = Config::from_directory(
        Path::new(matches.value_of("project").unwrap_or(".")),
        Path::new(matches.value_of("output").unwrap_or("_site")),
        matches.is_present("drafts"),
    )?;

    build_site(config)?;
    Ok(())
}
