use std::io::Write;
use std::path::Path;

use super::projector::TableRow;
use crate::errors::AppError;

pub const DEFAULT_EXPORT_FILE: &str = "eligibility_results.csv";

pub const EXPORT_HEADER: [&str; 7] = [
    "First Name",
    "Last Name",
    "Phone",
    "Email",
    "Purpose ID",
    "Eligibility Code",
    "Eligibility Description",
];

fn csv_error(e: ::csv::Error) -> AppError {
    AppError::Internal(anyhow::Error::new(e).context("failed to write CSV export"))
}

/// Write one record per table row under [`EXPORT_HEADER`].
pub fn write_csv<W: Write>(rows: &[TableRow], out: W) -> Result<(), AppError> {
    let mut writer = ::csv::Writer::from_writer(out);
    writer.write_record(EXPORT_HEADER).map_err(csv_error)?;

    for row in rows {
        writer
            .write_record([
                row.first_name.as_str(),
                row.last_name.as_str(),
                row.phone.as_str(),
                row.email.as_str(),
                row.purpose_id.as_str(),
                row.code.as_str(),
                row.description.as_str(),
            ])
            .map_err(csv_error)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn export_to_file(rows: &[TableRow], path: &Path) -> Result<(), AppError> {
    let file = std::fs::File::create(path)?;
    write_csv(rows, std::io::BufWriter::new(file))?;
    tracing::info!(path = %path.display(), rows = rows.len(), "exported results");
    Ok(())
}
