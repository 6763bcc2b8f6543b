use crate::data::DataRecord;
use crate::error::ObservationError;

use serde::Deserialize;
use std::io::{Read, Write};

/// JD values above this are converted to MJD
const MJD_OFFSET: f64 = 2400000.5;

#[derive(Deserialize)]
struct CsvRow {
    epoch: Option<f64>,
    object: Option<i64>,
    #[serde(default)]
    raoff: Option<f64>,
    #[serde(default)]
    raoff_err: Option<f64>,
    #[serde(default)]
    decoff: Option<f64>,
    #[serde(default)]
    decoff_err: Option<f64>,
    #[serde(default)]
    sep: Option<f64>,
    #[serde(default)]
    sep_err: Option<f64>,
    #[serde(default)]
    pa: Option<f64>,
    #[serde(default)]
    pa_err: Option<f64>,
    #[serde(default)]
    rv: Option<f64>,
    #[serde(default)]
    rv_err: Option<f64>,
}

/// Read an observation table in CSV format
///
/// The header must have `epoch` and `object` columns, and any of the measurement column pairs
/// `raoff`/`decoff`, `sep`/`pa`, `rv`, each value followed by its error column (`raoff_err` etc.).
/// Columns without data may be omitted, cells without data are left empty:
///
/// ```text
/// epoch,object,raoff,raoff_err,decoff,decoff_err,sep,sep_err,pa,pa_err,rv,rv_err
/// 1234,1,0.010,0.005,0.50,0.05,,,,,,
/// 1235,1,,,,,1.0,0.005,89.0,0.1,,
/// 1237,0,,,,,,,,,10,0.1
/// ```
///
/// Every row produces one record for its astrometry, RA/Dec taking precedence over
/// separation/PA, and another one for its RV value if present. Epochs larger than 2400000.5 are
/// assumed to be JD and converted to MJD. Rows with no complete measurement are skipped.
pub fn read_formatted_csv<R>(reader: R) -> Result<Vec<DataRecord>, ObservationError>
where
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = vec![];
    for (row_index, row) in csv_reader.deserialize().enumerate() {
        let row: CsvRow = row?;
        records.extend(row_to_records(row_index, row)?);
    }
    Ok(records)
}

fn row_to_records(row_index: usize, row: CsvRow) -> Result<Vec<DataRecord>, ObservationError> {
    let epoch = row.epoch.ok_or(ObservationError::MissingColumn {
        row: row_index,
        column: "epoch",
    })?;
    let epoch = if epoch > MJD_OFFSET {
        epoch - MJD_OFFSET
    } else {
        epoch
    };
    let object = row.object.ok_or(ObservationError::MissingColumn {
        row: row_index,
        column: "object",
    })?;
    let object = u32::try_from(object).map_err(|_| ObservationError::InvalidObjectId {
        row: row_index,
        object,
    })?;

    let mut records = Vec::with_capacity(2);
    match (row.raoff, row.decoff, row.sep, row.pa) {
        (Some(raoff), Some(decoff), _, _) => records.push(DataRecord::radec(
            epoch,
            object,
            raoff,
            required_error(row_index, row.raoff_err, "raoff_err")?,
            decoff,
            required_error(row_index, row.decoff_err, "decoff_err")?,
        )),
        (_, _, Some(sep), Some(pa)) => records.push(DataRecord::seppa(
            epoch,
            object,
            sep,
            required_error(row_index, row.sep_err, "sep_err")?,
            pa,
            required_error(row_index, row.pa_err, "pa_err")?,
        )),
        _ => {}
    }
    if let Some(rv) = row.rv {
        records.push(DataRecord::rv(
            epoch,
            object,
            rv,
            required_error(row_index, row.rv_err, "rv_err")?,
        ));
    }
    Ok(records)
}

fn required_error(
    row: usize,
    value: Option<f64>,
    column: &'static str,
) -> Result<f64, ObservationError> {
    value.ok_or(ObservationError::MissingColumn { row, column })
}

/// Write records as the normalized observation table
///
/// Columns are `epoch, object, quant1, quant1_err, quant2, quant2_err, quant_type`, the second
/// component of RV rows is left empty. [read_normalized_csv] reads the table back.
pub fn write_normalized_csv<'a, W>(
    records: impl IntoIterator<Item = &'a DataRecord>,
    writer: W,
) -> Result<(), ObservationError>
where
    W: Write,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Read the normalized observation table written by [write_normalized_csv]
///
/// Records are returned as they are, validation happens in
/// [ObservationSet::new](crate::ObservationSet::new).
pub fn read_normalized_csv<R>(reader: R) -> Result<Vec<DataRecord>, ObservationError>
where
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let records = csv_reader
        .deserialize()
        .collect::<Result<Vec<DataRecord>, csv::Error>>()?;
    Ok(records)
}
