//! Default data source for a bare `load-claims` run.

use crate::source::FileFormat;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Where claims come from when no file is given
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultSource {
    File { path: PathBuf, format: FileFormat },
    Sample,
}

/// Prefer `claims.json`, then `claims.csv` in `data_dir`, else the built-in sample
pub fn locate_default_source(data_dir: &Path) -> DefaultSource {
    [("claims.json", FileFormat::Json), ("claims.csv", FileFormat::Csv)]
        .into_iter()
        .map(|(name, format)| (data_dir.join(name), format))
        .find(|(path, _)| path.is_file())
        .map_or(DefaultSource::Sample, |(path, format)| DefaultSource::File { path, format })
}

/// Three demo claims, in the same raw shape an import file would have
pub fn sample_records() -> Vec<Value> {
    vec![
        json!({
            "id": "30001",
            "patient_name": "Virginia Rhodes",
            "billed_amount": "639787.37",
            "paid_amount": "16001.57",
            "status": "Denied",
            "insurer_name": "United Healthcare",
            "discharge_date": "2022-12-19",
            "cpt_codes": "99204, 82947, 99406",
            "denial_reason": "Policy terminated before service date"
        }),
        json!({
            "id": "30002",
            "patient_name": "Maria Chen",
            "billed_amount": "3400.00",
            "paid_amount": "0.00",
            "status": "Denied",
            "insurer_name": "Aetna",
            "discharge_date": "2023-07-16",
            "cpt_codes": "99213, 80053",
            "denial_reason": "Coverage not verified at time of service"
        }),
        json!({
            "id": "30003",
            "patient_name": "Ravi Kumar",
            "billed_amount": "5725.00",
            "paid_amount": "2000.00",
            "status": "Under Review",
            "insurer_name": "Cigna",
            "discharge_date": "2023-06-30",
            "cpt_codes": "99215, 93000",
            "denial_reason": ""
        }),
    ]
}
