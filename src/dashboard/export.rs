//! CSV and XLSX downloads of the dashboard result sets

use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use tracing::info;

use super::page::{render_page, ExportLinks};
use crate::analytics::{AnalyticsFilter, CountBucket, DashboardData};
use crate::models::ViolationType;
use crate::types::HrmError;

/// Which result set to export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Violations,
    Countries,
    Timeline,
}

impl ExportKind {
    pub const ALL: [ExportKind; 3] = [Self::Violations, Self::Countries, Self::Timeline];

    pub fn stem(&self) -> &'static str {
        match self {
            Self::Violations => "violations",
            Self::Countries => "countries",
            Self::Timeline => "timeline",
        }
    }

    /// Header of the key column
    pub fn key_header(&self) -> &'static str {
        match self {
            Self::Violations => "Violation Type",
            Self::Countries => "Country",
            Self::Timeline => "Date",
        }
    }

    pub fn from_stem(stem: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.stem() == stem)
    }

    pub fn rows<'a>(&self, data: &'a DashboardData) -> &'a [CountBucket] {
        match self {
            Self::Violations => &data.violations,
            Self::Countries => &data.countries,
            Self::Timeline => &data.timeline,
        }
    }

    /// Display form of a bucket key
    pub fn display_key(&self, key: &str) -> String {
        match self {
            Self::Violations => key
                .parse::<ViolationType>()
                .map(|v| v.label().to_string())
                .unwrap_or_else(|_| key.to_string()),
            Self::Countries | Self::Timeline => key.to_string(),
        }
    }
}

/// Download format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [Self::Csv, Self::Xlsx];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }
}

/// Parse `violations.csv` style names
pub fn parse_export_name(name: &str) -> Option<(ExportKind, ExportFormat)> {
    let (stem, ext) = name.rsplit_once('.')?;
    Some((ExportKind::from_stem(stem)?, ExportFormat::from_extension(ext)?))
}

pub fn file_name(kind: ExportKind, format: ExportFormat) -> String {
    format!("{}.{}", kind.stem(), format.extension())
}

pub fn to_csv(kind: ExportKind, rows: &[CountBucket]) -> Result<Vec<u8>, HrmError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([kind.key_header(), "Count"])
        .map_err(csv_error)?;
    for row in rows {
        writer
            .write_record([kind.display_key(&row.key), row.count.to_string()])
            .map_err(csv_error)?;
    }
    writer
        .into_inner()
        .map_err(|e| HrmError::Internal(format!("CSV export failed: {}", e)))
}

fn csv_error(e: csv::Error) -> HrmError {
    HrmError::Internal(format!("CSV export failed: {}", e))
}

pub fn to_xlsx(kind: ExportKind, rows: &[CountBucket]) -> Result<Vec<u8>, HrmError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(kind.stem()).map_err(xlsx_error)?;
    sheet.write_string(0, 0, kind.key_header()).map_err(xlsx_error)?;
    sheet.write_string(0, 1, "Count").map_err(xlsx_error)?;

    for (i, row) in rows.iter().enumerate() {
        let line = (i + 1) as u32;
        sheet
            .write_string(line, 0, kind.display_key(&row.key))
            .map_err(xlsx_error)?;
        sheet
            .write_number(line, 1, row.count as f64)
            .map_err(xlsx_error)?;
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}

fn xlsx_error(e: rust_xlsxwriter::XlsxError) -> HrmError {
    HrmError::Internal(format!("XLSX export failed: {}", e))
}

pub fn render(
    kind: ExportKind,
    format: ExportFormat,
    data: &DashboardData,
) -> Result<Vec<u8>, HrmError> {
    let rows = kind.rows(data);
    match format {
        ExportFormat::Csv => to_csv(kind, rows),
        ExportFormat::Xlsx => to_xlsx(kind, rows),
    }
}

/// Write all six exports plus `dashboard.html` into `dir`
pub async fn write_all(
    dir: &Path,
    filter: &AnalyticsFilter,
    data: &DashboardData,
) -> Result<Vec<PathBuf>, HrmError> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        HrmError::Storage(format!("Cannot create export dir {}: {}", dir.display(), e))
    })?;

    let mut written = Vec::new();
    for kind in ExportKind::ALL {
        for format in ExportFormat::ALL {
            let path = dir.join(file_name(kind, format));
            tokio::fs::write(&path, render(kind, format, data)?).await?;
            written.push(path);
        }
    }

    let page = dir.join("dashboard.html");
    tokio::fs::write(&page, render_page(filter, data, ExportLinks::Files)).await?;
    written.push(page);

    info!(dir = %dir.display(), files = written.len(), "Dashboard exported");
    Ok(written)
}
