//! Shared fixtures for integration tests.
#![allow(dead_code)]

use nonergodic_gmm::data::{
    CellDistanceTable, CellInfo, CellInfoTable, EarthquakeTable, Record, RecordTable, StationTable,
};
use nonergodic_gmm::{
    ChainSampler, DistanceMatrix, EngineVersion, ModelInputs, ModelPayload, ParamArray,
    PosteriorFit, Result, Sampler, SamplerRun, HYPERPARAMETERS,
};
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Owned input tables.
pub struct Fixture {
    pub records: RecordTable,
    pub earthquakes: EarthquakeTable,
    pub stations: StationTable,
    pub cells: CellInfoTable,
    pub distances: CellDistanceTable,
}

impl Fixture {
    pub fn inputs(&self) -> ModelInputs<'_> {
        ModelInputs {
            records: &self.records,
            earthquakes: &self.earthquakes,
            stations: &self.stations,
            cells: &self.cells,
            distances: &self.distances,
        }
    }
}

pub fn record(rsn: u64, eqid: u64, ssn: u64, rrup: f64, residual: f64) -> Record {
    Record {
        rsn,
        eqid,
        mag: 4.0 + eqid as f64 * 0.1,
        eq_x: eqid as f64 * 3.0,
        eq_y: eqid as f64 * -2.0,
        ssn,
        vs30: 300.0 + ssn as f64,
        sta_x: ssn as f64,
        sta_y: ssn as f64 * 0.5,
        rrup,
        residual,
        location: None,
    }
}

pub fn cell(cellid: u64) -> CellInfo {
    CellInfo {
        cellid,
        name: format!("c.{}", cellid),
        mpt_x: cellid as f64 * 25.0,
        mpt_y: 50.0,
        mpt_z: 0.0,
        mpt_lat: 34.0,
        mpt_lon: -118.0 + cellid as f64 * 0.25,
        utm_zone: "11S".to_string(),
    }
}

/// Three records, two earthquakes, two stations, three cells; cell 3 carries no path.
///
/// The distance table lists the records in a different order than the flatfile.
pub fn three_record_fixture() -> Fixture {
    let records = RecordTable::new(vec![
        record(101, 1, 10, 15.0, 0.3),
        record(102, 1, 20, 20.0, -0.2),
        record(103, 2, 20, 10.0, 0.1),
    ])
    .unwrap();
    let earthquakes = EarthquakeTable::from_records(&records);
    let stations = StationTable::from_records(&records);
    let cells = CellInfoTable::new(vec![cell(1), cell(2), cell(3)]).unwrap();
    let distances = CellDistanceTable::new(
        vec![103, 101, 102],
        vec!["c.1".to_string(), "c.2".to_string(), "c.3".to_string()],
        DistanceMatrix::from_row_slice(3, 3, &[
            7.0, 3.0, 0.0, //
            10.0, 5.0, 0.0, //
            0.0, 20.0, 0.0,
        ]),
    )
    .unwrap();
    Fixture { records, earthquakes, stations, cells, distances }
}

/// Random flatfile: `n_eq` earthquakes each recorded by a random subset of `n_sta` stations.
pub fn random_fixture(seed: u64, n_eq: u64, n_sta: u64, n_cells: u64) -> Fixture {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut rows = Vec::new();
    let mut dist = Vec::new();
    let mut rsn = 1;
    for eqid in 1..=n_eq {
        for ssn in 1..=n_sta {
            let z: f64 = StandardNormal.sample(&mut rng);
            if z < -0.3 {
                continue;
            }
            // Last cell is never crossed
            let row: Vec<f64> = (0..n_cells)
                .map(|c| {
                    let u: f64 = StandardNormal.sample(&mut rng);
                    if c + 1 == n_cells || u < 0.0 { 0.0 } else { u * 10.0 }
                })
                .collect();
            let rrup = row.iter().sum::<f64>();
            rows.push(record(rsn * 7 + 1000, eqid * 11, ssn * 3, rrup, z * 0.6));
            dist.push(row);
            rsn += 1;
        }
    }

    let records = RecordTable::new(rows).unwrap();
    let earthquakes = EarthquakeTable::from_records(&records);
    let stations = StationTable::from_records(&records);
    let cells = CellInfoTable::new((1..=n_cells).map(|c| cell(c * 100)).collect()).unwrap();
    let flat: Vec<f64> = dist.iter().flatten().copied().collect();
    let distances = CellDistanceTable::new(
        records.rows().iter().map(|r| r.rsn).collect(),
        cells.rows().iter().map(|c| c.name.clone()).collect(),
        DistanceMatrix::from_row_slice(dist.len(), n_cells as usize, &flat),
    )
    .unwrap();
    Fixture { records, earthquakes, stations, cells, distances }
}

/// Gaussian draws around fixed per-term means, in the orientation of `run.engine`.
///
/// Hyperparameter `k` is centred on `k / 10`; per-group parameters on
/// `offset(term) + group / 100`.
#[derive(Debug, Clone)]
pub struct SyntheticSampler {
    pub seed: u64,
}

impl SyntheticSampler {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn draws(&self, payload: &ModelPayload, run: &SamplerRun, seed: u64) -> PosteriorFit {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let n = run.n_iter;
        let mut noise = |centre: f64| {
            let z: f64 = StandardNormal.sample(&mut rng);
            centre + 0.05 * z
        };

        let mut fit = PosteriorFit::for_engine(run.engine);
        for (k, name) in HYPERPARAMETERS.iter().enumerate() {
            let draws = (0..n).map(|_| noise(k as f64 / 10.0)).collect();
            fit.insert(*name, ParamArray::scalar(draws));
        }

        let terms = [
            ("dc_1e", payload.n_eq, 0.2),
            ("dc_1as", payload.n_sta, -0.1),
            ("dc_1bs", payload.n_sta, 0.05),
            ("c_cap", payload.n_cell, -0.003),
            ("dB", payload.n_eq, 0.15),
        ];
        for (name, groups, offset) in terms {
            // Draws x groups, row-major
            let leading: Vec<f64> = (0..n)
                .flat_map(|_| (0..groups).map(|g| offset + g as f64 / 100.0).collect::<Vec<_>>())
                .map(&mut noise)
                .collect();
            let array = match run.engine {
                EngineVersion::V2 => ParamArray::matrix(n, groups, leading).unwrap(),
                EngineVersion::V3 => {
                    ParamArray::matrix(n, groups, leading).unwrap().transposed().unwrap()
                }
            };
            fit.insert(name, array);
        }
        fit
    }
}

impl Sampler for SyntheticSampler {
    fn sample(&self, payload: &ModelPayload, run: &SamplerRun) -> Result<PosteriorFit> {
        Ok(self.draws(payload, run, self.seed))
    }
}

impl ChainSampler for SyntheticSampler {
    fn sample_chain(
        &self,
        payload: &ModelPayload,
        run: &SamplerRun,
        chain: usize,
    ) -> Result<PosteriorFit> {
        Ok(self.draws(payload, run, self.seed.wrapping_add(chain as u64)))
    }
}

/// Sampler that always fails.
pub struct FailingSampler;

impl Sampler for FailingSampler {
    fn sample(&self, _payload: &ModelPayload, _run: &SamplerRun) -> Result<PosteriorFit> {
        Err(nonergodic_gmm::Error::Sampler("divergent transitions".to_string()))
    }
}

/// Sampler that panics if called.
pub struct UnreachableSampler;

impl Sampler for UnreachableSampler {
    fn sample(&self, _payload: &ModelPayload, _run: &SamplerRun) -> Result<PosteriorFit> {
        panic!("sampler must not be called")
    }
}

pub fn assert_close(a: f64, b: f64, tol: f64) {
    assert!((a - b).abs() < tol, "{} != {} (tol {})", a, b, tol);
}
