//! Persistence for the dose log.
//!
//! A store holds two renderings of the log: the authoritative JSON file and a
//! human-readable text file regenerated on every save. The JSON file is
//! always written first; if it fails nothing else is attempted. If it
//! succeeds and the text file fails, the save is reported as partial since
//! the stored state has already changed.

use crate::ops::sort_chronologically;
use crate::view::{self, ViewSpec};
use crate::{format, Dose, Error, RenderOptions, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Locations written by a successful save
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveReport {
    pub locations: Vec<String>,
}

/// Authoritative serialized form of the log
pub fn render_primary(doses: &[Dose]) -> Result<String> {
    format::to_json(doses)
}

/// Human-readable form of the log: every dose, newest first, compact times
pub fn render_secondary(doses: &[Dose]) -> String {
    let spec = ViewSpec {
        start_at_top: true,
        final_reverse: true,
        render: RenderOptions {
            compact_time: true,
            ..RenderOptions::default()
        },
        ..ViewSpec::default()
    };
    view::apply(doses, &spec)
        .iter()
        .map(|dose| dose.render(&spec.render) + "\n")
        .collect()
}

/// Parse the primary form and restore timestamp order
pub fn parse_primary(contents: &str) -> Result<Vec<Dose>> {
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut doses: Vec<Dose> = serde_json::from_str(contents)?;
    sort_chronologically(&mut doses);
    Ok(doses)
}

/// Somewhere the log can be loaded from and saved to
pub trait DoseStore {
    fn load(&self) -> Result<Vec<Dose>>;

    /// Write the JSON form; returns where it was written
    fn write_primary(&self, content: &str) -> Result<String>;

    /// Write the text form; returns where it was written
    fn write_secondary(&self, content: &str) -> Result<String>;

    fn save(&self, doses: &[Dose]) -> Result<SaveReport> {
        let primary = self.write_primary(&render_primary(doses)?)?;

        match self.write_secondary(&render_secondary(doses)) {
            Ok(secondary) => {
                tracing::info!("Saved {} doses to {} and {}", doses.len(), primary, secondary);
                Ok(SaveReport {
                    locations: vec![primary, secondary],
                })
            }
            Err(e) => {
                tracing::warn!("Saved {} but the text rendering failed: {}", primary, e);
                Err(Error::PartialSave {
                    saved: vec![primary],
                    reason: e.to_string(),
                })
            }
        }
    }
}

// ============================================================================
// Local files
// ============================================================================

/// Log stored as `doses.json` + `doses.txt` in a local directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn json_path(&self) -> PathBuf {
        self.dir.join("doses.json")
    }

    pub fn text_path(&self) -> PathBuf {
        self.dir.join("doses.txt")
    }
}

/// Atomically replace a file: temp file in the same directory, sync, rename
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::Other(format!("{:?} has no parent directory", path)))?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;
    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    tracing::debug!("Wrote {:?}", path);
    Ok(())
}

impl DoseStore for FileStore {
    fn load(&self) -> Result<Vec<Dose>> {
        let path = self.json_path();
        if !path.exists() {
            tracing::info!("No log found at {:?}, starting empty", path);
            return Ok(Vec::new());
        }

        let file = File::open(&path)?;
        file.lock_shared()?;
        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let doses = parse_primary(&contents)?;
        tracing::debug!("Loaded {} doses from {:?}", doses.len(), path);
        Ok(doses)
    }

    fn write_primary(&self, content: &str) -> Result<String> {
        let path = self.json_path();
        write_atomic(&path, content)?;
        Ok(path.display().to_string())
    }

    fn write_secondary(&self, content: &str) -> Result<String> {
        let path = self.text_path();
        write_atomic(&path, content)?;
        Ok(path.display().to_string())
    }
}

// ============================================================================
// fs-over-http
// ============================================================================

/// Log served by an fs-over-http server
///
/// Reads are plain GETs of the JSON URL. Writes POST a form with a single
/// `content` field to the same path under `public/`, authenticated by the
/// `Auth` header.
pub struct HttpStore {
    url: String,
    token: Option<String>,
    client: reqwest::blocking::Client,
}

impl HttpStore {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Http(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            token: token.filter(|t| !t.is_empty()),
            client,
        })
    }

    /// URL the text rendering lives at
    pub fn text_url(&self) -> String {
        let base = self.url.strip_suffix(".json").unwrap_or(&self.url);
        format!("{}.txt", base)
    }

    fn post(&self, url: &str, content: &str) -> Result<String> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| Error::Config(format!("a token is required to save to {}", url)))?;

        let upload_url = upload_url(url);
        let response = self
            .client
            .post(&upload_url)
            .header("Auth", token)
            .form(&[("content", content)])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Http(format!(
                "{} returned {}: {}",
                upload_url,
                status,
                body.trim()
            )));
        }

        Ok(upload_url)
    }
}

/// Writable counterpart of a served `media/` path
pub fn upload_url(url: &str) -> String {
    url.replacen("media/", "public/media/", 1)
}

impl DoseStore for HttpStore {
    fn load(&self) -> Result<Vec<Dose>> {
        let response = self.client.get(&self.url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(format!("{} returned {}", self.url, status)));
        }

        let body = response.text()?;
        let doses = parse_primary(&body)?;
        tracing::debug!("Loaded {} doses from {}", doses.len(), self.url);
        Ok(doses)
    }

    fn write_primary(&self, content: &str) -> Result<String> {
        self.post(&self.url, content)
    }

    fn write_secondary(&self, content: &str) -> Result<String> {
        self.post(&self.text_url(), content)
    }
}
