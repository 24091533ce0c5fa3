//! CSV input and output.

use std::{fs::File, path::Path};

use polars::prelude::*;
use tracing::info;

use crate::UtilsError;

/// Read a CSV file with a header row.
///
/// # Errors
/// Returns `UtilsError::Polars` if the file cannot be read or parsed.
pub fn read_csv(path: impl AsRef<Path>) -> Result<DataFrame, UtilsError> {
    let path = path.as_ref();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    info!(path = %path.display(), rows = df.height(), columns = df.width(), "read csv");
    Ok(df)
}

/// Write a frame to a CSV file with a header row, replacing the file.
///
/// # Errors
/// Returns `UtilsError::Io` if the file cannot be created and
/// `UtilsError::Polars` if writing fails.
pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<(), UtilsError> {
    let path = path.as_ref();
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    info!(path = %path.display(), rows = df.height(), "wrote csv");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use ikaros_primitives::Date;

    use super::*;
    use crate::frame_to_panel;

    #[test]
    fn written_frame_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.csv");

        let mut df = df! {
            "date" => &["2024-01-02", "2024-01-03"],
            "AAA" => &[0.5, -0.25],
            "BBB" => &[-0.5, 0.25],
        }
        .unwrap();
        write_csv(&mut df, &path).unwrap();

        let back = read_csv(&path).unwrap();
        assert_eq!(back.shape(), (2, 3));
        let panel = frame_to_panel(&back).unwrap();
        assert_eq!(panel.dates()[1], Date::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(panel.values()[[1, 0]], -0.25);
    }

    #[test]
    fn empty_cells_become_missing_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "date,AAA,BBB\n2024-01-02,10.0,\n2024-01-03,10.5,20.0").unwrap();
        drop(file);

        let panel = frame_to_panel(&read_csv(&path).unwrap()).unwrap();
        assert!(panel.values()[[0, 1]].is_nan());
        assert_eq!(panel.values()[[1, 1]], 20.0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_csv(dir.path().join("absent.csv")).is_err());
    }
}
