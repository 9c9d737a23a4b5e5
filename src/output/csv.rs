//! CSV export of the regression artifacts.
//!
//! Six flat tables, each keyed like its source table:
//! - raw pooled posterior (one row per draw)
//! - hyperparameter percentiles and mean
//! - hyperparameter percentile grid
//! - cell attenuation summary (by `cellid`)
//! - per-record coefficients (by `rsn`)
//! - per-record residuals (by `rsn`)

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::posterior::PosteriorSamples;
use crate::result::{
    CellAttenuationRow, CoefficientRow, HyperparameterTable, RecordSite, RegressionOutcome,
    ResidualRow,
};
use crate::statistics::Summary;

/// Record metadata columns shared by the coefficient and residual tables.
const SITE_COLUMNS: [&str; 9] =
    ["eqLat", "eqLon", "staLat", "staLon", "eqX", "eqY", "staX", "staY", "UTMzone"];

/// Quote a free-text field if it contains a separator, quote or line break.
fn quoted(field: &str) -> Cow<'_, str> {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Site columns of one record; lat/lon fields are empty without a location.
fn site_fields(site: &RecordSite) -> Vec<String> {
    let (lat_lon, utm_zone) = match &site.location {
        Some(loc) => (
            [loc.eq_lat, loc.eq_lon, loc.sta_lat, loc.sta_lon].map(|v| v.to_string()),
            quoted(&loc.utm_zone).into_owned(),
        ),
        None => (Default::default(), String::new()),
    };
    let mut fields = lat_lon.to_vec();
    fields.extend([site.eq_x, site.eq_y, site.sta_x, site.sta_y].map(|v| v.to_string()));
    fields.push(utm_zone);
    fields
}

fn record_header() -> Vec<String> {
    ["rsn", "eqid", "ssn"].iter().chain(&SITE_COLUMNS).map(|c| c.to_string()).collect()
}

/// Write the pooled posterior, one row per draw, columns in layout order.
pub fn write_posterior<W: Write>(samples: &PosteriorSamples, mut writer: W) -> io::Result<()> {
    writeln!(writer, "{}", samples.layout().names().join(","))?;

    let draws = samples.draws();
    for row in draws.row_iter() {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(writer, "{}", line.join(","))?;
    }
    writer.flush()
}

/// Write a hyperparameter table; `index` names the row-label column.
pub fn write_hyperparameters<W: Write>(
    table: &HyperparameterTable,
    index: &str,
    mut writer: W,
) -> io::Result<()> {
    writeln!(writer, "{},{}", index, table.names.join(","))?;
    for row in &table.rows {
        let values: Vec<String> = row.values.iter().map(|v| v.to_string()).collect();
        writeln!(writer, "{},{}", row.label, values.join(","))?;
    }
    writer.flush()
}

/// Write the cell attenuation summary.
pub fn write_cells<W: Write>(rows: &[CellAttenuationRow], mut writer: W) -> io::Result<()> {
    writeln!(
        writer,
        "cellid,cellname,mptLat,mptLon,mptX,mptY,mptZ,UTMzone,c_a_erg,c_cap_mean,c_cap_med,c_cap_sig"
    )?;
    for r in rows {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            r.cellid,
            quoted(&r.name),
            r.mpt_lat,
            r.mpt_lon,
            r.mpt_x,
            r.mpt_y,
            r.mpt_z,
            quoted(&r.utm_zone),
            r.c_a_erg,
            r.c_cap.mean,
            r.c_cap.median,
            r.c_cap.std,
        )?;
    }
    writer.flush()
}

/// Write the per-record coefficients: all means, then medians, then stds.
pub fn write_coefficients<W: Write>(rows: &[CoefficientRow], mut writer: W) -> io::Result<()> {
    const TERMS: [&str; 5] = ["dc_0", "dc_1e", "dc_1as", "dc_1bs", "Lc_ca"];

    let mut header = record_header();
    for stat in ["mean", "med", "sig"] {
        header.extend(TERMS.iter().map(|t| format!("{}_{}", t, stat)));
    }
    header.push("nerg_mu".to_string());
    writeln!(writer, "{}", header.join(","))?;

    for r in rows {
        let terms: [&Summary; 5] = [&r.dc_0, &r.dc_1e, &r.dc_1as, &r.dc_1bs, &r.lc_ca];
        let mut fields = vec![r.rsn.to_string(), r.eqid.to_string(), r.ssn.to_string()];
        fields.extend(site_fields(&r.site));
        fields.extend(terms.iter().map(|s| s.mean.to_string()));
        fields.extend(terms.iter().map(|s| s.median.to_string()));
        fields.extend(terms.iter().map(|s| s.std.to_string()));
        fields.push(r.prediction_mean.to_string());
        writeln!(writer, "{}", fields.join(","))?;
    }
    writer.flush()
}

/// Write the residual decomposition.
pub fn write_residuals<W: Write>(rows: &[ResidualRow], mut writer: W) -> io::Result<()> {
    let mut header = record_header();
    header.extend(["nerg_mu", "res_tot", "res_between", "res_within"].map(String::from));
    writeln!(writer, "{}", header.join(","))?;
    for r in rows {
        let mut fields = vec![r.rsn.to_string(), r.eqid.to_string(), r.ssn.to_string()];
        fields.extend(site_fields(&r.site));
        let values = [r.prediction_mean, r.total, r.inter_event, r.intra_event];
        fields.extend(values.map(|v| v.to_string()));
        writeln!(writer, "{}", fields.join(","))?;
    }
    writer.flush()
}

fn create(dir: &Path, name: &str, suffix: &str) -> io::Result<(PathBuf, BufWriter<File>)> {
    let path = dir.join(format!("{}_{}.csv", name, suffix));
    let file = File::create(&path)?;
    Ok((path, BufWriter::new(file)))
}

/// Write all six artifacts to `dir`, named `<output_name>_<artifact>.csv`.
///
/// Returns the paths written, in the order listed in the module docs.
pub fn write_all(outcome: &RegressionOutcome, dir: &Path) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let name = outcome.metadata.output_name.as_str();
    let mut written = Vec::with_capacity(6);

    let (path, w) = create(dir, name, "posterior_raw")?;
    write_posterior(&outcome.posterior, w)?;
    written.push(path);

    let (path, w) = create(dir, name, "hyperparameters")?;
    write_hyperparameters(&outcome.hyperparameters, "stat", w)?;
    written.push(path);

    let (path, w) = create(dir, name, "hyperposterior")?;
    write_hyperparameters(&outcome.hyperposterior, "prc", w)?;
    written.push(path);

    let (path, w) = create(dir, name, "catten")?;
    write_cells(&outcome.cells, w)?;
    written.push(path);

    let (path, w) = create(dir, name, "coefficients")?;
    write_coefficients(&outcome.coefficients, w)?;
    written.push(path);

    let (path, w) = create(dir, name, "residuals")?;
    write_residuals(&outcome.residuals, w)?;
    written.push(path);

    tracing::info!(dir = %dir.display(), files = written.len(), "wrote regression artifacts");
    Ok(written)
}
