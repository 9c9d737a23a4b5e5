//! JSON serialization for regression outcomes.

use crate::result::RegressionOutcome;

/// Serialize a RegressionOutcome to a compact JSON string.
///
/// The raw posterior matrix is not included; write it with
/// [`write_posterior`](crate::output::csv::write_posterior).
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for RegressionOutcome).
pub fn to_json(outcome: &RegressionOutcome) -> Result<String, serde_json::Error> {
    serde_json::to_string(outcome)
}

/// Serialize a RegressionOutcome to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for RegressionOutcome).
pub fn to_json_pretty(outcome: &RegressionOutcome) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::sample_outcome;

    #[test]
    fn test_to_json() {
        let json = to_json(&sample_outcome()).unwrap();
        assert!(json.contains("\"phi_0\":0.5"));
        assert!(json.contains("\"fit_origin\":\"Sampled\""));
        assert!(!json.contains("\"posterior\""));
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json_pretty(&sample_outcome()).unwrap();
        assert!(json.contains('\n')); // Pretty print has newlines
        assert!(json.contains("hyperparameters"));
    }
}
