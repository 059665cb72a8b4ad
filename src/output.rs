use crate::prelude::*;
use csv::Writer;
use std::path::Path;

/// Writes one `epoch,error` row per epoch, epochs counted from 1.
pub fn write_errors_to_csv<P: AsRef<Path>>(errors: &[f64], file_path: P) -> Result<()> {
    let mut wtr = Writer::from_path(file_path)?;
    wtr.write_record(["epoch", "error"])?;
    for (epoch, error) in errors.iter().enumerate() {
        wtr.write_record(&[(epoch + 1).to_string(), error.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn writes_header_and_rows() {
        let path = std::env::temp_dir().join(format!("bpnet-errors-{}.csv", std::process::id()));
        write_errors_to_csv(&[1.5, 0.25], &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(text, "epoch,error\n1,1.5\n2,0.25\n");
    }
}
