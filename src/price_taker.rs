//! Price-taker model builder
//!
//! [`PriceTakerModel`] is the immutable context threaded through the build:
//! seed, horizon length and clustering settings. Each stage takes its
//! inputs explicitly and returns a new artifact, in the order
//!
//! 1. price loading ([`PriceTakerModel::load_prices`])
//! 2. multi-period build ([`PriceTakerModel::build_multiperiod_model`])
//! 3. ramping and startup/shutdown ([`MultiPeriodModel::with_ramping`],
//!    [`MultiPeriodModel::with_startup_shutdown`])
//! 4. cash flows ([`MultiPeriodModel::with_cashflows`])

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clustering::KMeans;
use crate::domain::{DailyTable, PriceParameterSet, RawSeries, RepresentativeDaySet, DEFAULT_HORIZON_LENGTH};
use crate::error::{Error, Result};
use crate::multiperiod::{MultiPeriodModel, UnitRegistry};
use crate::optimizer::{CashflowObjective, CashflowParams, RampingLimits, UpDownTimes};
use crate::prices::{
    ClusterCountResult, ClusterCountSelector, ColumnSelector, PriceLoader, PriceTable, RepresentativeDayClusterer,
};

pub const DEFAULT_SEED: u64 = 20;

/// K-means sweep and fit settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringSettings {
    pub kmin: Option<usize>,
    /// Falls back to 30 with a warning when unset
    pub kmax: Option<usize>,
    pub n_init: usize,
    pub max_iter: usize,
}

impl Default for ClusteringSettings {
    fn default() -> Self {
        let kmeans = KMeans::default();
        Self {
            kmin: None,
            kmax: None,
            n_init: kmeans.n_init,
            max_iter: kmeans.max_iter,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceTakerModel {
    seed: u64,
    horizon_length: usize,
    clustering: ClusteringSettings,
}

impl Default for PriceTakerModel {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            horizon_length: DEFAULT_HORIZON_LENGTH,
            clustering: ClusteringSettings::default(),
        }
    }
}

impl PriceTakerModel {
    pub fn new(seed: u64, horizon_length: usize) -> Result<Self> {
        Self::default().with_seed(seed).with_horizon_length(horizon_length)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_horizon_length(mut self, horizon_length: usize) -> Result<Self> {
        if horizon_length == 0 {
            return Err(Error::config("horizon_length must be > 0, but 0 is provided"));
        }
        self.horizon_length = horizon_length;
        Ok(self)
    }

    pub fn with_clustering(mut self, settings: ClusteringSettings) -> Result<Self> {
        if settings.n_init == 0 || settings.max_iter == 0 {
            return Err(Error::config("n_init and max_iter must be >= 1"));
        }
        self.clustering = settings;
        Ok(self)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn horizon_length(&self) -> usize {
        self.horizon_length
    }

    pub fn clustering(&self) -> &ClusteringSettings {
        &self.clustering
    }

    fn clusterer(&self) -> KMeans {
        KMeans::new(self.clustering.n_init, self.clustering.max_iter)
    }

    /// Split `raw` into whole days of `horizon_length` samples
    pub fn reconfigure_raw_data(&self, raw: &RawSeries) -> Result<DailyTable> {
        DailyTable::from_series(raw, self.horizon_length)
    }

    /// Elbow of the k-means inertia curve over the days of `raw`
    pub fn optimal_n_clusters(&self, raw: &RawSeries) -> Result<ClusterCountResult> {
        let daily = self.reconfigure_raw_data(raw)?;
        let clusterer = self.clusterer();
        ClusterCountSelector::new(self.clustering.kmin, self.clustering.kmax, self.seed)
            .select(&daily, &clusterer)
    }

    /// Representative days and their weights
    pub fn cluster_lmp_data(&self, raw: &RawSeries, n_clusters: usize) -> Result<RepresentativeDaySet> {
        let clusterer = self.clusterer();
        RepresentativeDayClusterer::new(self.horizon_length, self.seed).cluster(raw, n_clusters, &clusterer)
    }

    /// Load prices from `table` into a [`PriceParameterSet`].
    ///
    /// `horizon_override` replaces the model horizon for this load only.
    pub fn load_prices(
        &self,
        table: &PriceTable,
        columns: &ColumnSelector,
        n_clusters: Option<usize>,
        horizon_override: Option<usize>,
    ) -> Result<PriceParameterSet> {
        let clusterer = self.clusterer();
        PriceLoader::new(self.horizon_length, self.seed, &clusterer).load(
            table,
            columns,
            n_clusters,
            horizon_override,
        )
    }

    /// One period per price key, weighted by representative-day occurrence
    pub fn build_multiperiod_model(&self, params: &PriceParameterSet, units: &UnitRegistry) -> Result<MultiPeriodModel> {
        MultiPeriodModel::build(params, units, true)
    }

    /// Run every build stage on already-loaded prices.
    ///
    /// `objective` is parsed before anything is built.
    pub fn build_price_taker(
        &self,
        params: &PriceParameterSet,
        units: &UnitRegistry,
        stages: &BuildStages,
        objective: &str,
    ) -> Result<MultiPeriodModel> {
        let cashflow = CashflowParams {
            objective: CashflowObjective::parse(objective)?,
            ..stages.cashflow
        };
        stages.ramping.validate()?;
        stages.startup_shutdown.validate()?;
        cashflow.validate()?;

        let model = self
            .build_multiperiod_model(params, units)?
            .with_ramping(&stages.ramping)?
            .with_startup_shutdown(&stages.startup_shutdown)?
            .with_cashflows(&cashflow)?;
        info!(
            objective = %cashflow.objective,
            n_vars = model.model().n_vars(),
            n_constraints = model.model().constraints().len(),
            "price-taker model assembled"
        );
        Ok(model)
    }
}

/// Parameters of the stages that follow the multi-period build
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BuildStages {
    pub ramping: RampingLimits,
    pub startup_shutdown: UpDownTimes,
    pub cashflow: CashflowParams,
}
