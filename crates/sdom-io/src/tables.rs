//! CSV table readers for the fixed input schemas.
//!
//! Every reader rounds numerics to 5 decimals, matching the original case
//! files, and reports schema problems as ConfigError and bad values as
//! ParseError with the offending file and row.

use sdom_core::{SdomError, SdomResult};
use std::collections::HashMap;
use std::path::Path;

/// Round to 5 decimals, the precision the case files are shipped with.
pub fn round5(v: f64) -> f64 {
    (v * 1e5).round() / 1e5
}

fn open(path: &Path) -> SdomResult<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|e| SdomError::Config(format!("cannot open {}: {e}", path.display())))
}

fn parse_cell(path: &Path, row: usize, cell: &str) -> SdomResult<f64> {
    cell.parse::<f64>().map(round5).map_err(|_| {
        SdomError::Parse(format!(
            "{} row {}: '{cell}' is not a number",
            path.display(),
            row + 2
        ))
    })
}

/// Two-column (name, value) table. Keys are returned verbatim.
pub fn read_scalars(path: &Path) -> SdomResult<HashMap<String, f64>> {
    let mut reader = open(path)?;
    let mut out = HashMap::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() < 2 || record[0].is_empty() {
            continue;
        }
        let value = parse_cell(path, i, &record[1])?;
        out.insert(record[0].to_string(), value);
    }
    if out.is_empty() {
        return Err(SdomError::Config(format!(
            "{} contains no scalar rows",
            path.display()
        )));
    }
    Ok(out)
}

/// (component, formulation) rows, component keys lowercased.
pub fn read_formulations(path: &Path) -> SdomResult<HashMap<String, String>> {
    let mut reader = open(path)?;
    let mut out = HashMap::new();
    for record in reader.records() {
        let record = record?;
        if record.len() < 2 {
            continue;
        }
        out.insert(record[0].to_lowercase(), record[1].to_string());
    }
    Ok(out)
}

/// (hour, value) series, 1-indexed hours. Requires complete coverage of
/// `1..=n_hours`; hours beyond the horizon are ignored.
pub fn read_hourly_series(path: &Path, n_hours: usize) -> SdomResult<Vec<f64>> {
    let mut reader = open(path)?;
    let mut series = vec![f64::NAN; n_hours];
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() < 2 || record[0].is_empty() {
            continue;
        }
        let hour: usize = record[0].parse().map_err(|_| {
            SdomError::Parse(format!(
                "{} row {}: '{}' is not an hour index",
                path.display(),
                i + 2,
                &record[0]
            ))
        })?;
        if hour == 0 {
            return Err(SdomError::Parse(format!(
                "{} row {}: hours are 1-indexed",
                path.display(),
                i + 2
            )));
        }
        if hour <= n_hours {
            series[hour - 1] = parse_cell(path, i, &record[1])?;
        }
    }
    if let Some(missing) = series.iter().position(|v| v.is_nan()) {
        return Err(SdomError::Data(format!(
            "{} is missing hour {}",
            path.display(),
            missing + 1
        )));
    }
    Ok(series)
}

/// Hour-by-plant capacity factor matrix. The first column is the hour; the
/// remaining header cells are plant ids. Returns ids in file order.
pub fn read_cf_matrix(
    path: &Path,
    n_hours: usize,
) -> SdomResult<(Vec<String>, HashMap<String, Vec<f64>>)> {
    let mut reader = open(path)?;
    let headers = reader
        .headers()
        .map_err(|e| SdomError::Config(format!("{}: {e}", path.display())))?
        .clone();
    if headers.len() < 2 {
        return Err(SdomError::Config(format!(
            "{} must have an hour column and at least one plant column",
            path.display()
        )));
    }
    let plant_ids: Vec<String> = headers.iter().skip(1).map(|s| s.to_string()).collect();
    let mut profiles: HashMap<String, Vec<f64>> = plant_ids
        .iter()
        .map(|id| (id.clone(), vec![f64::NAN; n_hours]))
        .collect();

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() == 0 || record[0].is_empty() {
            continue;
        }
        let hour: usize = record[0].parse().map_err(|_| {
            SdomError::Parse(format!(
                "{} row {}: '{}' is not an hour index",
                path.display(),
                i + 2,
                &record[0]
            ))
        })?;
        if hour == 0 || hour > n_hours {
            continue;
        }
        for (j, id) in plant_ids.iter().enumerate() {
            // Empty cells stay NaN; the loader drops incomplete plants.
            let cell = record.get(j + 1).unwrap_or("");
            if cell.is_empty() {
                continue;
            }
            let value = parse_cell(path, i, cell)?;
            profiles.get_mut(id).unwrap()[hour - 1] = value;
        }
    }
    Ok((plant_ids, profiles))
}

/// One row of a VRE capacity/cost table. Numeric fields stay optional so the
/// loader can drop incomplete plants instead of failing.
#[derive(Debug, Clone)]
pub struct PlantRow {
    pub id: String,
    pub capacity_mw: Option<f64>,
    pub capex_per_kw: Option<f64>,
    pub fom_per_kw_yr: Option<f64>,
    pub trans_cap_cost: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Per-plant attribute table (`CapSolar` / `CapWind` schema).
pub fn read_plant_table(path: &Path) -> SdomResult<Vec<PlantRow>> {
    let mut reader = open(path)?;
    let headers = reader
        .headers()
        .map_err(|e| SdomError::Config(format!("{}: {e}", path.display())))?
        .clone();
    let col = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let id_col = col("sc_gid").ok_or_else(|| {
        SdomError::Config(format!("{} is missing the sc_gid column", path.display()))
    })?;
    let required = ["capacity", "CAPEX_M", "FOM_M", "trans_cap_cost"];
    let mut required_cols = Vec::new();
    for name in required {
        required_cols.push(col(name).ok_or_else(|| {
            SdomError::Config(format!("{} is missing the {name} column", path.display()))
        })?);
    }
    let lat_col = col("latitude");
    let lon_col = col("longitude");

    let optional_number = |record: &csv::StringRecord, idx: Option<usize>| -> Option<f64> {
        idx.and_then(|i| record.get(i))
            .filter(|cell| !cell.is_empty())
            .and_then(|cell| cell.parse::<f64>().ok())
            .map(round5)
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let id = record.get(id_col).unwrap_or("").to_string();
        if id.is_empty() {
            continue;
        }
        rows.push(PlantRow {
            id,
            capacity_mw: optional_number(&record, Some(required_cols[0])),
            capex_per_kw: optional_number(&record, Some(required_cols[1])),
            fom_per_kw_yr: optional_number(&record, Some(required_cols[2])),
            trans_cap_cost: optional_number(&record, Some(required_cols[3])),
            latitude: optional_number(&record, lat_col),
            longitude: optional_number(&record, lon_col),
        });
    }
    Ok(rows)
}

/// Parameter-by-column matrix (`StorageData` / `Data_BalancingUnits` schema):
/// the first cell of each row names a parameter, the header names the
/// technologies/units. Returns column names in file order plus a
/// (parameter, column) -> value map.
pub fn read_param_matrix(
    path: &Path,
) -> SdomResult<(Vec<String>, HashMap<(String, String), f64>)> {
    let mut reader = open(path)?;
    let headers = reader
        .headers()
        .map_err(|e| SdomError::Config(format!("{}: {e}", path.display())))?
        .clone();
    if headers.len() < 2 {
        return Err(SdomError::Config(format!(
            "{} must have a parameter column and at least one technology column",
            path.display()
        )));
    }
    let columns: Vec<String> = headers.iter().skip(1).map(|s| s.to_string()).collect();
    let mut values = HashMap::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() == 0 || record[0].is_empty() {
            continue;
        }
        let param = record[0].to_string();
        for (j, column) in columns.iter().enumerate() {
            let cell = record.get(j + 1).unwrap_or("");
            if cell.is_empty() {
                continue;
            }
            values.insert((param.clone(), column.clone()), parse_cell(path, i, cell)?);
        }
    }
    Ok((columns, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_scalars() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(
            tmp.path(),
            "Scalars.csv",
            "Parameter,Value\nr,0.06\nGenMix_Target,0.85\n",
        );
        let scalars = read_scalars(&path).unwrap();
        assert_eq!(scalars["r"], 0.06);
        assert_eq!(scalars["GenMix_Target"], 0.85);
    }

    #[test]
    fn test_read_scalars_bad_number() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(tmp.path(), "Scalars.csv", "Parameter,Value\nr,abc\n");
        assert!(matches!(read_scalars(&path), Err(SdomError::Parse(_))));
    }

    #[test]
    fn test_read_hourly_series() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(
            tmp.path(),
            "Load_hourly.csv",
            "*Hour,Load\n1,100\n2,110\n3,105\n4,98\n",
        );
        let series = read_hourly_series(&path, 3).unwrap();
        assert_eq!(series, vec![100.0, 110.0, 105.0]);
    }

    #[test]
    fn test_read_hourly_series_missing_hour() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(tmp.path(), "Load_hourly.csv", "*Hour,Load\n1,100\n3,105\n");
        let err = read_hourly_series(&path, 3).unwrap_err();
        assert!(err.to_string().contains("missing hour 2"));
    }

    #[test]
    fn test_read_cf_matrix() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(
            tmp.path(),
            "CFSolar.csv",
            "Hour,101,102\n1,0.0,0.1\n2,0.5,0.6\n",
        );
        let (ids, profiles) = read_cf_matrix(&path, 2).unwrap();
        assert_eq!(ids, vec!["101", "102"]);
        assert_eq!(profiles["101"], vec![0.0, 0.5]);
        assert_eq!(profiles["102"], vec![0.1, 0.6]);
    }

    #[test]
    fn test_read_plant_table_keeps_incomplete_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(
            tmp.path(),
            "CapSolar.csv",
            "sc_gid,capacity,CAPEX_M,trans_cap_cost,FOM_M,latitude,longitude\n\
             101,50,800,0,10,35.1,-106.6\n\
             102,60,,0,11,,\n",
        );
        let rows = read_plant_table(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].capacity_mw, Some(50.0));
        assert!(rows[1].capex_per_kw.is_none());
        assert_eq!(rows[0].latitude, Some(35.1));
    }

    #[test]
    fn test_read_plant_table_missing_column() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(tmp.path(), "CapSolar.csv", "sc_gid,capacity\n101,50\n");
        assert!(matches!(read_plant_table(&path), Err(SdomError::Config(_))));
    }

    #[test]
    fn test_read_param_matrix() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(
            tmp.path(),
            "StorageData.csv",
            ",Li-Ion,H2\nP_Capex,300,1500\nEff,0.85,0.45\n",
        );
        let (cols, values) = read_param_matrix(&path).unwrap();
        assert_eq!(cols, vec!["Li-Ion", "H2"]);
        assert_eq!(values[&("Eff".to_string(), "H2".to_string())], 0.45);
    }

    #[test]
    fn test_round5() {
        assert_eq!(round5(0.123456789), 0.12346);
        assert_eq!(round5(1.0), 1.0);
    }
}
