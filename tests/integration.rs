//! End-to-end runs through assembly, sampling, extraction and decomposition.

mod common;

use common::{
    assert_close, record, three_record_fixture, FailingSampler, SyntheticSampler,
    UnreachableSampler,
};
use nonergodic_gmm::data::{self, CellDistanceTable, EarthquakeTable, RecordTable};
use nonergodic_gmm::output;
use nonergodic_gmm::{
    DistanceMatrix, EngineVersion, Error, FitOrigin, FitSource, JsonFitCache, MemoryFitCache,
    ModelInputs, NoCache, NonErgodicRegression, ParallelChains,
};

fn regression(output_name: &str) -> NonErgodicRegression {
    NonErgodicRegression::new()
        .n_iter(200)
        .n_chains(1)
        .configure(|c| c.output_name(output_name))
}

// =============================================================================
// Assembly
// =============================================================================

#[test]
fn test_payload_drops_uncrossed_cell() {
    let fixture = three_record_fixture();
    let model = regression("payload").assemble(&fixture.inputs()).unwrap();
    let payload = &model.payload;

    assert_eq!(payload.n_records, 3);
    assert_eq!(payload.n_eq, 2);
    assert_eq!(payload.n_sta, 2);
    assert_eq!(payload.n_cell, 2);
    assert_eq!(payload.eq, vec![1, 1, 2]);
    assert_eq!(payload.stat, vec![1, 2, 2]);

    assert_eq!(model.cells.valid_ids, vec![1, 2]);
    assert_eq!(model.cells.excluded_ids, vec![3]);
    assert_eq!(model.diagnostics.n_cells_excluded, 1);
    assert_eq!(model.diagnostics.excluded_cells, vec![3]);

    // Rows follow the records table, not the distance table
    let expected = [[10.0, 5.0], [0.0, 20.0], [7.0, 3.0]];
    for (i, row) in expected.iter().enumerate() {
        for (j, &d) in row.iter().enumerate() {
            assert_close(payload.rc[(i, j)], d, 1e-12);
        }
    }

    assert_eq!(payload.y.as_slice(), &[0.3, -0.2, 0.1]);
    assert!(payload.rec_mu.iter().all(|&m| m == 0.0));
    assert!(model.diagnostics.path_misfit_ok);
    assert!(model.diagnostics.max_path_misfit < 1e-12);
}

#[test]
fn test_wire_mapping_keys() {
    let fixture = three_record_fixture();
    let model = regression("wire").assemble(&fixture.inputs()).unwrap();
    let json = model.payload.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    for key in ["N", "NEQ", "NSTAT", "NCELL", "eq", "stat", "X_e", "X_s", "X_c", "rec_mu", "RC", "c_a_erg", "Y"] {
        assert!(value.get(key).is_some(), "missing key {}", key);
    }
    assert_eq!(value["NCELL"], 2);
    assert_eq!(value["RC"][2][0], 7.0);
}

#[test]
fn test_missing_earthquake_aborts_before_sampling() {
    let mut fixture = three_record_fixture();
    let only_first = RecordTable::new(vec![record(101, 1, 10, 15.0, 0.3)]).unwrap();
    fixture.earthquakes = EarthquakeTable::from_records(&only_first);

    let err = regression("missing")
        .run(&fixture.inputs(), &UnreachableSampler, &NoCache)
        .unwrap_err();
    assert!(err.is_alignment());
    assert!(matches!(err, Error::MissingEarthquake { record: 103, eqid: 2 }));
}

#[test]
fn test_missing_distance_row_is_alignment_error() {
    let fixture = three_record_fixture();
    let extra = RecordTable::new(vec![
        record(101, 1, 10, 15.0, 0.3),
        record(102, 1, 20, 20.0, -0.2),
        record(103, 2, 20, 10.0, 0.1),
        record(104, 2, 10, 5.0, 0.0),
    ])
    .unwrap();
    let inputs = ModelInputs { records: &extra, ..fixture.inputs() };

    let err = regression("norow").assemble(&inputs).unwrap_err();
    assert!(err.is_alignment());
    assert!(matches!(err, Error::MissingDistanceRow { record: 104 }));
}

#[test]
fn test_path_through_unlisted_cell_aborts_before_sampling() {
    let mut fixture = three_record_fixture();
    fixture.distances = CellDistanceTable::new(
        vec![103, 101, 102],
        ["c.1", "c.2", "c.3", "c.9"].iter().map(|s| s.to_string()).collect(),
        DistanceMatrix::from_row_slice(3, 4, &[
            7.0, 3.0, 0.0, 50.0, //
            10.0, 5.0, 0.0, 50.0, //
            0.0, 20.0, 0.0, 50.0,
        ]),
    )
    .unwrap();

    let err = regression("unlisted")
        .run(&fixture.inputs(), &UnreachableSampler, &NoCache)
        .unwrap_err();
    assert!(err.is_alignment());
    assert!(matches!(err, Error::UnknownCell { record: 101, ref cell } if cell == "c.9"));
}

// =============================================================================
// Full pipeline
// =============================================================================

#[test]
fn test_prediction_is_sum_of_term_means() {
    let fixture = three_record_fixture();
    let outcome = regression("sum")
        .run(&fixture.inputs(), &SyntheticSampler::new(7), &NoCache)
        .unwrap();

    assert_eq!(outcome.metadata.n_draws, 200);
    assert_eq!(outcome.metadata.fit_origin, FitOrigin::Sampled);
    assert_eq!(outcome.coefficients.len(), 3);
    assert_eq!(outcome.cells.len(), 2);

    let c_cap: Vec<f64> = outcome.cells.iter().map(|c| c.c_cap.mean).collect();
    let paths = [[10.0, 5.0], [0.0, 20.0], [7.0, 3.0]];

    for (row, path) in outcome.coefficients.iter().zip(paths.iter()) {
        let lc_ca = path[0] * c_cap[0] + path[1] * c_cap[1];
        assert_close(row.lc_ca.mean, lc_ca, 1e-9);

        let sum = row.dc_0.mean + row.dc_1e.mean + row.dc_1as.mean + row.dc_1bs.mean + row.lc_ca.mean;
        assert_close(row.prediction_mean, sum, 1e-12);
    }

    // Records 102 and 103 share station 20
    let (a, b) = (&outcome.coefficients[1], &outcome.coefficients[2]);
    assert_eq!(a.dc_1as, b.dc_1as);
    assert_eq!(a.dc_1bs, b.dc_1bs);
    assert_ne!(a.dc_1e, b.dc_1e);
}

#[test]
fn test_residuals_use_event_terms() {
    let fixture = three_record_fixture();
    let outcome = regression("res")
        .run(&fixture.inputs(), &SyntheticSampler::new(11), &NoCache)
        .unwrap();

    let y = [0.3, -0.2, 0.1];
    for (row, (&obs, coef)) in outcome.residuals.iter().zip(y.iter().zip(&outcome.coefficients)) {
        assert_close(row.total, obs - coef.prediction_mean, 1e-12);
        assert_close(row.total, row.inter_event + row.intra_event, 1e-12);
    }
    // Same earthquake, same between-event residual
    assert_eq!(outcome.residuals[0].inter_event, outcome.residuals[1].inter_event);
    assert_ne!(outcome.residuals[0].inter_event, outcome.residuals[2].inter_event);
    assert!(outcome.max_decomposition_error() < 1e-12);
}

#[test]
fn test_engine_orientation_does_not_change_outcome() {
    let fixture = three_record_fixture();
    let v2 = regression("v2")
        .configure(|c| c.engine(EngineVersion::V2))
        .run(&fixture.inputs(), &SyntheticSampler::new(3), &NoCache)
        .unwrap();
    let v3 = regression("v3")
        .configure(|c| c.engine(EngineVersion::V3))
        .run(&fixture.inputs(), &SyntheticSampler::new(3), &NoCache)
        .unwrap();

    assert_eq!(v2.metadata.engine, EngineVersion::V2);
    assert_eq!(v3.metadata.engine, EngineVersion::V3);
    assert_eq!(v2.posterior.draws(), v3.posterior.draws());
    assert_eq!(v2.coefficients, v3.coefficients);
    assert_eq!(v2.residuals, v3.residuals);
    assert_eq!(v2.cells, v3.cells);
}

#[test]
fn test_sampler_failure_propagates() {
    let fixture = three_record_fixture();
    let err = regression("fail")
        .run(&fixture.inputs(), &FailingSampler, &NoCache)
        .unwrap_err();
    assert!(matches!(err, Error::Sampler(ref msg) if msg.contains("divergent")));
}

#[test]
fn test_parallel_chains_pool_draws() {
    let fixture = three_record_fixture();
    let outcome = NonErgodicRegression::new()
        .n_iter(50)
        .n_chains(3)
        .configure(|c| c.engine(EngineVersion::V3).available_cores(4))
        .run(&fixture.inputs(), &ParallelChains::new(SyntheticSampler::new(5)), &NoCache)
        .unwrap();

    assert_eq!(outcome.metadata.n_draws, 150);
    assert_eq!(outcome.posterior.n_draws(), 150);
    assert!(outcome.max_decomposition_error() < 1e-12);
}

#[test]
fn test_convenience_run() {
    let fixture = three_record_fixture();
    let outcome = nonergodic_gmm::run(&fixture.inputs(), &SyntheticSampler::new(1)).unwrap();
    assert_eq!(outcome.metadata.n_draws, 600);
    assert_eq!(outcome.residuals.len(), 3);
}

// =============================================================================
// Fit reuse
// =============================================================================

#[test]
fn test_reuse_from_memory_cache() {
    let fixture = three_record_fixture();
    let cache = MemoryFitCache::new();

    let sampled = regression("mem")
        .run(&fixture.inputs(), &SyntheticSampler::new(9), &cache)
        .unwrap();
    let reused = regression("mem")
        .configure(|c| c.fit_source(FitSource::Reuse))
        .run(&fixture.inputs(), &UnreachableSampler, &cache)
        .unwrap();

    assert_eq!(sampled.metadata.fit_origin, FitOrigin::Sampled);
    assert_eq!(reused.metadata.fit_origin, FitOrigin::Cached);
    assert_eq!(sampled.coefficients, reused.coefficients);
    assert_eq!(sampled.residuals, reused.residuals);
}

#[test]
fn test_reuse_from_json_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache = JsonFitCache::new(dir.path());
    let fixture = three_record_fixture();

    let sampled = regression("disk")
        .run(&fixture.inputs(), &SyntheticSampler::new(21), &cache)
        .unwrap();
    assert!(dir.path().join("disk_fit.json").exists());

    let reused = regression("disk")
        .configure(|c| c.fit_source(FitSource::Reuse))
        .run(&fixture.inputs(), &UnreachableSampler, &cache)
        .unwrap();

    assert_eq!(reused.metadata.fit_origin, FitOrigin::Cached);
    for (a, b) in sampled.residuals.iter().zip(&reused.residuals) {
        assert_close(a.total, b.total, 1e-12);
        assert_close(a.inter_event, b.inter_event, 1e-12);
    }
}

#[test]
fn test_reuse_without_cached_fit() {
    let fixture = three_record_fixture();
    let err = regression("absent")
        .configure(|c| c.fit_source(FitSource::Reuse))
        .run(&fixture.inputs(), &UnreachableSampler, &MemoryFitCache::new())
        .unwrap_err();
    assert!(matches!(err, Error::CacheMiss { ref key } if key == "absent"));
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn test_csv_inputs_to_csv_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let records_path = dir.path().join("records.csv");
    let cells_path = dir.path().join("cells.csv");
    let distances_path = dir.path().join("distances.csv");

    std::fs::write(
        &records_path,
        "\
rsn,eqid,mag,eqX,eqY,ssn,Vs30,staX,staY,Rrup,res,eqLat,eqLon,staLat,staLon,UTMzone
1,5,6.0,0.0,0.0,70,400,10.0,0.0,10.0,0.4,34.0,-118.0,34.1,-118.5,11S
2,5,6.0,0.0,0.0,71,500,0.0,12.0,12.0,-0.1,34.0,-118.0,34.3,-118.2,11S
3,6,5.2,4.0,4.0,70,400,10.0,0.0,8.0,0.2,34.2,-118.1,34.1,-118.5,11S
",
    )
    .unwrap();
    std::fs::write(
        &cells_path,
        "cellid,cellname,mptX,mptY\n1,c.1,5.0,0.0\n2,c.2,0.0,6.0\n3,c.3,50.0,50.0\n",
    )
    .unwrap();
    std::fs::write(
        &distances_path,
        "rsn,c.1,c.2,c.3\n3,8.0,0.0,0.0\n1,10.0,0.0,0.0\n2,0.0,12.0,0.0\n",
    )
    .unwrap();

    let records = data::csv::load_records(&records_path, "res").unwrap();
    let earthquakes = EarthquakeTable::from_records(&records);
    let stations = data::StationTable::from_records(&records);
    let cells = data::csv::load_cell_info(&cells_path).unwrap();
    let distances = data::csv::load_cell_distances(&distances_path).unwrap();
    let inputs = ModelInputs {
        records: &records,
        earthquakes: &earthquakes,
        stations: &stations,
        cells: &cells,
        distances: &distances,
    };

    let outcome = regression("files")
        .run(&inputs, &SyntheticSampler::new(2), &NoCache)
        .unwrap();
    assert_eq!(outcome.metadata.n_cells, 2);
    assert_eq!(outcome.diagnostics.excluded_cells, vec![3]);

    let out_dir = dir.path().join("out");
    let written = output::csv::write_all(&outcome, &out_dir).unwrap();
    assert_eq!(written.len(), 6);
    for suffix in ["posterior_raw", "hyperparameters", "hyperposterior", "catten", "coefficients", "residuals"] {
        assert!(out_dir.join(format!("files_{}.csv", suffix)).exists(), "{}", suffix);
    }

    let residuals = std::fs::read_to_string(out_dir.join("files_residuals.csv")).unwrap();
    let mut lines = residuals.lines();
    assert_eq!(
        lines.next(),
        Some(
            "rsn,eqid,ssn,eqLat,eqLon,staLat,staLon,eqX,eqY,staX,staY,UTMzone,\
             nerg_mu,res_tot,res_between,res_within"
        )
    );
    assert!(lines.next().unwrap().starts_with("1,5,70,34,-118,34.1,-118.5,0,0,10,0,11S,"));
    assert_eq!(residuals.lines().count(), 4);

    let coefficients = std::fs::read_to_string(out_dir.join("files_coefficients.csv")).unwrap();
    let third = coefficients.lines().nth(3).unwrap();
    assert!(third.starts_with("3,6,70,34.2,-118.1,34.1,-118.5,4,4,10,0,11S,"));
    assert_eq!(
        outcome.coefficients[2].site.location.as_ref().map(|l| l.utm_zone.as_str()),
        Some("11S")
    );

    let json = output::to_json(&outcome).unwrap();
    assert!(json.contains("\"output_name\":\"files\""));
}
