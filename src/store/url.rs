use std::fmt;
use std::str::FromStr;

/// Parsed store connection string.
///
/// Accepted forms:
/// - `sqlite://<path>` or a bare path: SQLite database file
/// - `sqlite::memory:`: SQLite database held in memory
/// - `memory://`: in-process store, nothing touches disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUrl {
  Sqlite(String),
  SqliteMemory,
  Memory,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreUrlError {
  #[error("store connection string is empty")]
  Empty,
  #[error("unsupported store scheme: {0}")]
  UnsupportedScheme(String),
  #[error("missing database path in {0}")]
  MissingPath(String),
}

impl FromStr for StoreUrl {
  type Err = StoreUrlError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.is_empty() {
      return Err(StoreUrlError::Empty);
    }
    if s == "sqlite::memory:" || s == ":memory:" || s == "sqlite://:memory:" {
      return Ok(Self::SqliteMemory);
    }
    if s == "memory://" || s == "memory" {
      return Ok(Self::Memory);
    }
    if let Some(path) = s.strip_prefix("sqlite://") {
      if path.is_empty() {
        return Err(StoreUrlError::MissingPath(s.to_string()));
      }
      return Ok(Self::Sqlite(path.to_string()));
    }
    if let Some((scheme, _)) = s.split_once("://") {
      return Err(StoreUrlError::UnsupportedScheme(scheme.to_string()));
    }
    Ok(Self::Sqlite(s.to_string()))
  }
}

impl fmt::Display for StoreUrl {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Sqlite(path) => write!(f, "sqlite://{}", path),
      Self::SqliteMemory => f.write_str("sqlite::memory:"),
      Self::Memory => f.write_str("memory://"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_sqlite_forms() {
    assert_eq!(
      "sqlite://data/cad.db".parse::<StoreUrl>().unwrap(),
      StoreUrl::Sqlite("data/cad.db".into())
    );
    assert_eq!(
      "cad.db".parse::<StoreUrl>().unwrap(),
      StoreUrl::Sqlite("cad.db".into())
    );
    assert_eq!(
      "sqlite::memory:".parse::<StoreUrl>().unwrap(),
      StoreUrl::SqliteMemory
    );
  }

  #[test]
  fn test_parse_memory() {
    assert_eq!("memory://".parse::<StoreUrl>().unwrap(), StoreUrl::Memory);
  }

  #[test]
  fn test_parse_errors() {
    assert_eq!("".parse::<StoreUrl>(), Err(StoreUrlError::Empty));
    assert_eq!(
      "mongodb+srv://cluster0.example.net".parse::<StoreUrl>(),
      Err(StoreUrlError::UnsupportedScheme("mongodb+srv".into()))
    );
    assert!(matches!(
      "sqlite://".parse::<StoreUrl>(),
      Err(StoreUrlError::MissingPath(_))
    ));
  }

  #[test]
  fn test_display_round_trips() {
    for url in [
      StoreUrl::Sqlite("cad.db".into()),
      StoreUrl::SqliteMemory,
      StoreUrl::Memory,
    ] {
      assert_eq!(url.to_string().parse::<StoreUrl>().unwrap(), url);
    }
  }
}
