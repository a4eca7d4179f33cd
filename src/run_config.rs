//! # Run configuration: visits, filter, detectors
//!
//! A run is described by a small YAML document listing the visits and detectors to process
//! in one filter, plus optional reference values for the validation:
//!
//! ```yaml
//! visits: [849375, 850587]
//! filter: 'r'
//! ccd: [12, 13, 14, 21, 22, 23]
//! good_mag_limit: 21.0
//! medianAstromscatterRef: 25
//! medianPhotoscatterRef: 25
//! matchRef: 5000
//! ```
//!
//! Detector key
//! -----------------
//! Camera mappings name the detector part of a data ID differently (`ccd` for CFHT,
//! `ccdnum` for DECam, `camcol` for SDSS). The first of `ccd`, `ccdnum`, `camcol` present in
//! the document is used; if none is, the key is `ccd` and is then reported missing.
//!
//! From a configuration, [`RunConfig::data_ids`] expands every visit × detector combination
//! and [`RunConfig::run_list`] produces the `--id` arguments of a processing run, one line per
//! visit with the detectors joined by `^`.
use std::fmt;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{DetectorId, Magnitude, VisitId},
    validate_errors::ValidateError,
};

/// Detector key names, in lookup order.
pub const CCD_KEY_NAMES: [&str; 3] = ["ccd", "ccdnum", "camcol"];

/// Key used when no detector key is present.
pub const DEFAULT_CCD_KEY: &str = "ccd";

/// One visit/detector combination in a filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataId {
    pub filter: String,
    pub visit: VisitId,
    pub ccd_key: String,
    pub ccd: DetectorId,
}

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "filter={} visit={} {}={}",
            self.filter, self.visit, self.ccd_key, self.ccd
        )
    }
}

/// Every combination of visit and detector in one filter, visit-major.
///
/// Arguments
/// ---------
/// * `filter`: the filter name, e.g. `"r"` or `"r-1692 CFHT"`
/// * `visits`: the visits
/// * `ccds`: the detectors of each visit
/// * `ccd_key`: the detector key name, e.g. `"ccd"` or `"ccdnum"`
///
/// Return
/// ------
/// * `visits.len() × ccds.len()` data IDs, ordered by visit then detector.
pub fn construct_data_ids(
    filter: &str,
    visits: &[VisitId],
    ccds: &[DetectorId],
    ccd_key: &str,
) -> Vec<DataId> {
    visits
        .iter()
        .flat_map(|&visit| {
            ccds.iter().map(move |&ccd| DataId {
                filter: filter.to_string(),
                visit,
                ccd_key: ccd_key.to_string(),
                ccd,
            })
        })
        .collect()
}

/// `--id` arguments of a processing run, one line per visit.
///
/// ```rust
/// use validate_drp::run_config::construct_run_list;
///
/// let run_list = construct_run_list(&[100, 200], &[10, 11, 12], "ccdnum");
/// assert_eq!(
///     run_list,
///     vec!["--id visit=100 ccdnum=10^11^12", "--id visit=200 ccdnum=10^11^12"]
/// );
/// ```
pub fn construct_run_list(visits: &[VisitId], ccds: &[DetectorId], ccd_key: &str) -> Vec<String> {
    let joined = ccds
        .iter()
        .map(DetectorId::to_string)
        .collect::<Vec<_>>()
        .join("^");
    visits
        .iter()
        .map(|visit| format!("--id visit={visit} {ccd_key}={joined}"))
        .collect()
}

/// YAML layout, every key optional so that missing ones are reported by name.
#[derive(Debug, Deserialize)]
struct RawRunConfig {
    visits: Option<Vec<VisitId>>,
    filter: Option<String>,
    ccd: Option<Vec<DetectorId>>,
    ccdnum: Option<Vec<DetectorId>>,
    camcol: Option<Vec<DetectorId>>,
    good_mag_limit: Option<Magnitude>,
    #[serde(rename = "medianAstromscatterRef")]
    median_astrom_scatter_ref: Option<f64>,
    #[serde(rename = "medianPhotoscatterRef")]
    median_photo_scatter_ref: Option<f64>,
    #[serde(rename = "matchRef")]
    match_ref: Option<u64>,
}

impl RawRunConfig {
    fn ccds(&self, key: &str) -> Option<&Vec<DetectorId>> {
        match key {
            "ccd" => self.ccd.as_ref(),
            "ccdnum" => self.ccdnum.as_ref(),
            "camcol" => self.camcol.as_ref(),
            _ => None,
        }
    }
}

/// A run description loaded from YAML.
///
/// Fields
/// -----------------
/// * `visits`, `filter`, `ccds` – the data to process.
/// * `ccd_key` – the detector key name found in the document.
/// * `good_mag_limit` – faint limit for the stars used by the validation.
/// * `median_astrom_scatter_ref` – reference median astrometric scatter (mas).
/// * `median_photo_scatter_ref` – reference median photometric scatter (mmag).
/// * `match_ref` – reference number of matched stars.
///
/// The four reference values are optional: a run list can be built from a document that only
/// names the data. A validation run that compares against them reads them through
/// [`RunConfig::references`], which reports the first missing one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    pub visits: Vec<VisitId>,
    pub filter: String,
    pub ccd_key: String,
    pub ccds: Vec<DetectorId>,
    pub good_mag_limit: Option<Magnitude>,
    pub median_astrom_scatter_ref: Option<f64>,
    pub median_photo_scatter_ref: Option<f64>,
    pub match_ref: Option<u64>,
}

/// Reference values a validation run compares its metrics against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidationReferences {
    pub good_mag_limit: Magnitude,
    pub median_astrom_scatter_ref: f64,
    pub median_photo_scatter_ref: f64,
    pub match_ref: u64,
}

impl RunConfig {
    /// Parse a run description.
    ///
    /// Return
    /// ------
    /// * [`ValidateError::ConfigParse`] if the document is not valid YAML or a value has the
    ///   wrong type,
    /// * [`ValidateError::MissingConfigKey`] if `visits`, `filter` or the detector list is
    ///   absent.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ValidateError> {
        let raw: RawRunConfig = serde_yml::from_str(yaml)?;

        let ccd_key = CCD_KEY_NAMES
            .into_iter()
            .find(|key| raw.ccds(key).is_some())
            .unwrap_or(DEFAULT_CCD_KEY);
        let ccds = raw
            .ccds(ccd_key)
            .cloned()
            .ok_or_else(|| ValidateError::MissingConfigKey(ccd_key.to_string()))?;
        let visits = raw
            .visits
            .ok_or_else(|| ValidateError::MissingConfigKey("visits".into()))?;
        let filter = raw
            .filter
            .ok_or_else(|| ValidateError::MissingConfigKey("filter".into()))?;

        Ok(RunConfig {
            visits,
            filter,
            ccd_key: ccd_key.to_string(),
            ccds,
            good_mag_limit: raw.good_mag_limit,
            median_astrom_scatter_ref: raw.median_astrom_scatter_ref,
            median_photo_scatter_ref: raw.median_photo_scatter_ref,
            match_ref: raw.match_ref,
        })
    }

    /// Read and parse a run description file.
    pub fn from_file(path: &Utf8Path) -> Result<Self, ValidateError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Reference values of a validation run, all required.
    ///
    /// Return
    /// ------
    /// * [`ValidateError::MissingConfigKey`] with the YAML key name of the first absent value.
    pub fn references(&self) -> Result<ValidationReferences, ValidateError> {
        fn require<T: Copy>(value: Option<T>, key: &str) -> Result<T, ValidateError> {
            value.ok_or_else(|| ValidateError::MissingConfigKey(key.to_string()))
        }

        Ok(ValidationReferences {
            good_mag_limit: require(self.good_mag_limit, "good_mag_limit")?,
            median_astrom_scatter_ref: require(
                self.median_astrom_scatter_ref,
                "medianAstromscatterRef",
            )?,
            median_photo_scatter_ref: require(self.median_photo_scatter_ref, "medianPhotoscatterRef")?,
            match_ref: require(self.match_ref, "matchRef")?,
        })
    }

    pub fn data_ids(&self) -> Vec<DataId> {
        construct_data_ids(&self.filter, &self.visits, &self.ccds, &self.ccd_key)
    }

    pub fn run_list(&self) -> Vec<String> {
        construct_run_list(&self.visits, &self.ccds, &self.ccd_key)
    }
}

#[cfg(test)]
mod run_config_test {
    use super::*;

    #[test]
    fn test_construct_data_ids() {
        let ids = construct_data_ids("r", &[100, 200], &[10, 11], "ccd");
        assert_eq!(ids.len(), 4);
        assert!(ids.iter().all(|id| id.filter == "r" && id.ccd_key == "ccd"));
        let pairs: Vec<_> = ids.iter().map(|id| (id.visit, id.ccd)).collect();
        assert_eq!(pairs, vec![(100, 10), (100, 11), (200, 10), (200, 11)]);
        assert_eq!(ids[1].to_string(), "filter=r visit=100 ccd=11");

        assert!(construct_data_ids("r", &[], &[10], "ccd").is_empty());
    }

    #[test]
    fn test_construct_run_list() {
        assert_eq!(
            construct_run_list(&[100, 200], &[10, 11, 12], "ccd"),
            vec!["--id visit=100 ccd=10^11^12", "--id visit=200 ccd=10^11^12"]
        );
        assert_eq!(construct_run_list(&[7], &[3], "camcol"), vec!["--id visit=7 camcol=3"]);
    }

    #[test]
    fn test_from_yaml_ccdnum() {
        let yaml = "visits: [176837, 176846]\nfilter: 'z'\nccdnum: [10, 11, 12]\n";
        let config = RunConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.ccd_key, "ccdnum");
        assert_eq!(config.ccds, vec![10, 11, 12]);
        assert_eq!(config.good_mag_limit, None);
        assert_eq!(config.data_ids().len(), 6);
        assert_eq!(config.run_list()[1], "--id visit=176846 ccdnum=10^11^12");
    }

    #[test]
    fn test_ccd_key_lookup_order() {
        let yaml = "visits: [1]\nfilter: g\ncamcol: [4]\nccd: [1, 2]\n";
        let config = RunConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.ccd_key, "ccd");
        assert_eq!(config.ccds, vec![1, 2]);
    }

    #[test]
    fn test_missing_keys() {
        assert_eq!(
            RunConfig::from_yaml_str("visits: [1]\nfilter: r\n"),
            Err(ValidateError::MissingConfigKey("ccd".into()))
        );
        assert_eq!(
            RunConfig::from_yaml_str("filter: r\nccd: [1]\n"),
            Err(ValidateError::MissingConfigKey("visits".into()))
        );
        assert_eq!(
            RunConfig::from_yaml_str("visits: [1]\nccd: [1]\n"),
            Err(ValidateError::MissingConfigKey("filter".into()))
        );
    }

    #[test]
    fn test_references_require_every_key() {
        let base = "visits: [1]\nfilter: r\nccd: [1]\n";
        let full = format!(
            "{base}good_mag_limit: 21.0\nmedianAstromscatterRef: 25\n\
             medianPhotoscatterRef: 20\nmatchRef: 5000\n"
        );
        let refs = RunConfig::from_yaml_str(&full).unwrap().references().unwrap();
        assert_eq!(refs.good_mag_limit, 21.0);
        assert_eq!(refs.median_astrom_scatter_ref, 25.0);
        assert_eq!(refs.median_photo_scatter_ref, 20.0);
        assert_eq!(refs.match_ref, 5000);

        let config = RunConfig::from_yaml_str(base).unwrap();
        assert_eq!(
            config.references(),
            Err(ValidateError::MissingConfigKey("good_mag_limit".into()))
        );

        let partial = format!("{base}good_mag_limit: 21.0\nmedianAstromscatterRef: 25\n");
        assert_eq!(
            RunConfig::from_yaml_str(&partial).unwrap().references(),
            Err(ValidateError::MissingConfigKey("medianPhotoscatterRef".into()))
        );
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            RunConfig::from_yaml_str("visits: [1, two]\nfilter: r\nccd: [1]\n"),
            Err(ValidateError::ConfigParse(_))
        ));
    }
}
