//! Course content import
//!
//! Reads the `第*天*.md` files from the content directory and upserts them
//! into `daily_content`.

use std::fs;
use std::path::{Path, PathBuf};

use ckn_admin_shared::content::{extract_title, is_day_file, number_day_files};
use ckn_admin_shared::DailyContent;
use tracing::{info, instrument, warn};

use crate::error::{AdminError, AdminResult};
use crate::report;
use crate::repositories::DailyContentRepository;
use crate::supabase::SupabaseClient;

/// A day file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayFile {
    pub day_number: u32,
    pub path: PathBuf,
}

impl DayFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Outcome of an import run
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub total: usize,
    pub imported: Vec<u32>,
    /// Day number and error message for each skipped file
    pub failed: Vec<(u32, String)>,
}

pub struct ImportService;

impl ImportService {
    /// List the day files in `dir`, numbered and in day order
    pub fn scan_directory(dir: &Path, max_day: u32) -> AdminResult<Vec<DayFile>> {
        if !dir.is_dir() {
            return Err(AdminError::NotFound(format!(
                "content directory '{}' does not exist",
                dir.display()
            )));
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_day_file(&name) {
                names.push(name);
            }
        }
        names.sort();

        Ok(number_day_files(&names, max_day)?
            .into_iter()
            .map(|(day_number, name)| DayFile {
                day_number,
                path: dir.join(name),
            })
            .collect())
    }

    /// Read one day file into a `daily_content` row
    pub fn read_day(file: &DayFile) -> AdminResult<DailyContent> {
        let content = fs::read_to_string(&file.path)?;
        Ok(DailyContent {
            day_number: file.day_number as i32,
            title: extract_title(&content),
            content,
        })
    }

    /// Import every day file, skipping files that fail
    #[instrument(skip(db))]
    pub async fn import_content(
        db: &SupabaseClient,
        dir: &Path,
        max_day: u32,
    ) -> AdminResult<ImportSummary> {
        report::banner("Importing course content");

        let files = Self::scan_directory(dir, max_day)?;
        println!("Found {} day files in {}", files.len(), dir.display());

        let mut summary = ImportSummary {
            total: files.len(),
            ..Default::default()
        };

        for file in &files {
            let result = match Self::read_day(file) {
                Ok(row) => DailyContentRepository::upsert(db, &row).await.map(|_| row),
                Err(e) => Err(e),
            };

            match result {
                Ok(row) => {
                    report::ok(format!("Day {}: {}", row.day_number, row.title));
                    summary.imported.push(file.day_number);
                }
                Err(e) => {
                    warn!(day = file.day_number, file = %file.file_name(), error = %e, "Import failed");
                    report::fail(format!("Day {} ({}): {e}", file.day_number, file.file_name()));
                    summary.failed.push((file.day_number, e.to_string()));
                }
            }
        }

        println!();
        println!("Imported {}/{} days", summary.imported.len(), summary.total);
        info!(
            imported = summary.imported.len(),
            total = summary.total,
            "Content import finished"
        );
        Ok(summary)
    }
}
