use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::link::{
  DEFAULT_FAVICON_SERVICE,
  DEFAULT_FAVICON_SIZE,
  TemplateFavicons
};
use crate::session::ViewSettings;

const RC_ENV_VAR: &str = "BOOKMARKRC";
const RC_FILE_NAME: &str = ".bookmarkrc";
const DEFAULT_ROOT_NAME: &str =
  "Bookmark Pro";

#[derive(Debug, Clone)]
pub struct Config {
  map:              HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    for (key, value) in [
      ("root.name", DEFAULT_ROOT_NAME),
      ("seed", "on"),
      ("sort.mode", "sort-by-name"),
      ("sort.direction", "asc"),
      ("search.filter", "all"),
      (
        "favicon.service",
        DEFAULT_FAVICON_SERVICE
      ),
      ("color", "on")
    ] {
      map.insert(
        key.to_string(),
        value.to_string()
      );
    }
    map.insert(
      "favicon.size".to_string(),
      DEFAULT_FAVICON_SIZE.to_string()
    );

    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let rc =
      resolve_rc_path(rc_override)?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading bookmarkrc");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no bookmarkrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  /// Parses `key` with `FromStr`; a
  /// missing key yields `None`.
  pub fn get_parsed<T>(
    &self,
    key: &str
  ) -> anyhow::Result<Option<T>>
  where
    T: std::str::FromStr,
    T::Err: std::fmt::Display
  {
    let Some(raw) = self.map.get(key)
    else {
      return Ok(None);
    };
    raw.parse::<T>().map(Some).map_err(
      |err| {
        anyhow!(
          "invalid value for {key}: \
           {err}"
        )
      }
    )
  }

  pub fn root_name(&self) -> String {
    self
      .get("root.name")
      .filter(|name| {
        !name.trim().is_empty()
      })
      .unwrap_or_else(|| {
        DEFAULT_ROOT_NAME.to_string()
      })
  }

  pub fn seed_enabled(&self) -> bool {
    self.get_bool("seed").unwrap_or(true)
  }

  pub fn view_settings(
    &self
  ) -> anyhow::Result<ViewSettings> {
    let defaults =
      ViewSettings::default();
    Ok(ViewSettings {
      sort_mode:      self
        .get_parsed("sort.mode")?
        .unwrap_or(defaults.sort_mode),
      sort_direction: self
        .get_parsed("sort.direction")?
        .unwrap_or(
          defaults.sort_direction
        ),
      search_filter:  self
        .get_parsed("search.filter")?
        .unwrap_or(
          defaults.search_filter
        )
    })
  }

  pub fn favicons(
    &self
  ) -> anyhow::Result<TemplateFavicons> {
    let service = self
      .get("favicon.service")
      .unwrap_or_else(|| {
        DEFAULT_FAVICON_SERVICE
          .to_string()
      });
    let size = self
      .get_parsed::<u32>("favicon.size")?
      .unwrap_or(DEFAULT_FAVICON_SIZE);
    if !service.contains("{host}") {
      warn!(
        service = %service,
        "favicon.service has no {{host}} \
         placeholder"
      );
    }
    Ok(TemplateFavicons::new(
      service, size
    ))
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    if self.loaded_files.contains(&path)
    {
      warn!(file = %path.display(), "rc file already loaded; skipping include cycle");
      return Ok(());
    }
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let line = strip_comment(raw_line);
      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

/// Drops a trailing `# comment`. A `#`
/// glued to the value (as in a URL
/// fragment) is kept.
fn strip_comment(raw: &str) -> &str {
  let line = raw.trim();
  if line.starts_with('#') {
    return "";
  }
  match line.find(" #") {
    | Some(idx) => line[..idx].trim(),
    | None => line
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null"
      || rc_env.trim().is_empty()
    {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping bookmarkrc"
    );
    return Ok(None);
  };
  let candidate =
    home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}
