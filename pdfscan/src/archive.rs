use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::errors::{ScanError, ScanResult};
use crate::results::display_name;

/// Bundles a set of files into one archive
pub trait ArchiveWriter {
    fn write_archive(&self, output: &Path, files: &[PathBuf]) -> ScanResult<()>;
}

/// `search_results_<YYYYmmddHHMMSS>.zip` for the given instant
pub fn default_archive_name(now: DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!("search_results_{}.zip", now.format("%Y%m%d%H%M%S")))
}

/// Deflate-compressed zip with every file stored flat under its file name
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveWriter;

impl ZipArchiveWriter {
    pub fn new() -> Self {
        Self
    }

    fn options() -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644)
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn write_archive(&self, output: &Path, files: &[PathBuf]) -> ScanResult<()> {
        let fail = |e: &dyn std::fmt::Display| ScanError::archive_write(output, e);

        let file = File::create(output).map_err(|e| fail(&e))?;
        let mut zip = ZipWriter::new(BufWriter::new(file));
        let mut used = HashSet::new();

        for path in files {
            let name = unique_entry_name(&display_name(path), &mut used);
            debug!("Adding {} as {}", path.display(), name);

            let mut source = File::open(path)
                .map_err(|e| fail(&format!("{}: {}", path.display(), e)))?;
            zip.start_file(name, Self::options()).map_err(|e| fail(&e))?;
            io::copy(&mut source, &mut zip).map_err(|e| fail(&e))?;
        }

        zip.finish().map_err(|e| fail(&e))?;
        info!("Wrote {} files to {}", files.len(), output.display());
        Ok(())
    }
}

/// `name`, or `stem (n).ext` for the first free n when `name` is taken
fn unique_entry_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
        _ => (name, ""),
    };
    let mut n = 1;
    loop {
        let candidate = format!("{} ({}){}", stem, n, ext);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
