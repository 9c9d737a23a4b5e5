//! Residual decomposition into between- and within-event parts.

use crate::assembly::AssembledModel;
use crate::constants::{PHI_0, TAU_0};
use crate::error::{Error, Result};
use crate::posterior::PosteriorSamples;
use crate::result::{AleatoryTerms, CoefficientRow, ResidualRow};
use crate::statistics::mean;

use super::coefficients::GroupSummaries;

/// Split each record's residual against the mean prediction.
///
/// `total = y - prediction_mean`, `inter_event` is the mean `dB` of the
/// record's earthquake and `intra_event = total - inter_event`.
pub fn decompose_residuals(
    model: &AssembledModel,
    coefficients: &[CoefficientRow],
    summaries: &GroupSummaries,
) -> Result<Vec<ResidualRow>> {
    let observed = &model.payload.y;
    if coefficients.len() != observed.len() {
        return Err(Error::ShapeMismatch {
            what: "coefficient rows vs records".to_string(),
            expected: observed.len(),
            actual: coefficients.len(),
        });
    }

    let event_terms = model.eq_index.broadcast(&summaries.event_term)?;

    let rows = coefficients
        .iter()
        .zip(observed.iter())
        .zip(&event_terms)
        .map(|((coeff, &y), db)| {
            let total = y - coeff.prediction_mean;
            let inter_event = db.mean;
            ResidualRow {
                rsn: coeff.rsn,
                eqid: coeff.eqid,
                ssn: coeff.ssn,
                site: coeff.site.clone(),
                prediction_mean: coeff.prediction_mean,
                total,
                inter_event,
                intra_event: total - inter_event,
            }
        })
        .collect();
    Ok(rows)
}

/// Posterior means of `phi_0` and `tau_0`.
pub fn aleatory_terms(samples: &PosteriorSamples) -> Result<AleatoryTerms> {
    let column_mean = |name: &str| {
        samples
            .column_named(name)
            .map(mean)
            .ok_or_else(|| Error::MissingParameter { name: name.to_string() })
    };
    Ok(AleatoryTerms { phi_0: column_mean(PHI_0)?, tau_0: column_mean(TAU_0)? })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posterior::ColumnLayout;
    use crate::types::DrawMatrix;

    #[test]
    fn test_aleatory_terms_are_posterior_means() {
        let layout = ColumnLayout::new(0, 0, &[]);
        let phi = layout.position(PHI_0).unwrap();
        let tau = layout.position(TAU_0).unwrap();
        let draws = DrawMatrix::from_fn(4, layout.len(), |d, j| match j {
            j if j == phi => 0.4 + d as f64 * 0.1,
            j if j == tau => 0.3,
            _ => 0.0,
        });
        let samples = PosteriorSamples::new(draws, layout).unwrap();

        let terms = aleatory_terms(&samples).unwrap();
        assert!((terms.phi_0 - 0.55).abs() < 1e-12);
        assert!((terms.tau_0 - 0.3).abs() < 1e-12);
    }
}
