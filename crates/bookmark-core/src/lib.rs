pub mod actions;
pub mod cli;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod error;
pub mod hooks;
pub mod ids;
pub mod item;
pub mod link;
pub mod render;
pub mod seed;
pub mod session;
pub mod store;
pub mod view;

#[cfg(test)]
mod test_support;

use std::ffi::OsString;
use std::fs::File;
use std::io::{
  self,
  BufReader
};

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use error::{
  StoreError,
  StoreResult
};
pub use item::{
  Item,
  ItemId,
  ItemKind,
  ItemType
};
pub use session::Session;
pub use store::ItemStore;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting bookmark shell"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.bookmarkrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let root_name = cfg.root_name();
  let ids = Box::new(
    ids::TimestampIds::default()
  );
  let clock =
    Box::new(datetime::SystemClock);
  let store =
    if cli.empty || !cfg.seed_enabled()
    {
      store::ItemStore::new(
        &root_name, ids, clock
      )
    } else {
      store::ItemStore::seeded(
        &root_name, ids, clock
      )
      .context(
        "failed to build the demo \
         tree"
      )?
    };

  let mut session =
    session::Session::with_settings(
      store,
      cfg.view_settings()?,
      Box::new(cfg.favicons()?)
    );
  session.subscribe(|event| {
    debug!(event = event.name(), ?event, "store changed");
  });

  let renderer =
    render::Renderer::new(&cfg)?;
  let stdout = io::stdout();
  let mut out = stdout.lock();

  let failures = match cli.script {
    | Some(path) => {
      let file = File::open(&path)
        .with_context(|| {
          format!(
            "failed to open script {}",
            path.display()
          )
        })?;
      commands::run_script(
        &mut session,
        &renderer,
        BufReader::new(file),
        &mut out
      )?
    }
    | None => {
      commands::run_script(
        &mut session,
        &renderer,
        io::stdin().lock(),
        &mut out
      )?
    }
  };

  info!(failures, "done");
  Ok(())
}
