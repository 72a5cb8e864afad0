use anyhow::{Context, Result};
use price_taker::{config, optimizer, prices, telemetry};
use config::Config;
use prices::PriceTable;
use price_taker::multiperiod::UnitRegistry;
use telemetry::init_tracing;
use tracing::{info, warn};

fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::load().context("loading config/default.toml")?;
    let builder = cfg.price_taker()?;
    let stages = cfg.stages()?;

    let mut table = PriceTable::from_csv_path(&cfg.data.path)
        .with_context(|| format!("reading price table {}", cfg.data.path.display()))?;
    if let Some(scenario) = &cfg.data.scenario {
        table = table.filter_scenario(scenario)?;
    }

    let n_clusters = if cfg.data.auto_clusters {
        let column = match &cfg.data.columns {
            prices::ColumnSelector::Single(name) => name.clone(),
            prices::ColumnSelector::Years(_) => {
                anyhow::bail!("auto_clusters needs a single price column")
            }
        };
        let result = builder.optimal_n_clusters(&table.series(&column)?)?;
        Some(result.n_clusters)
    } else {
        cfg.data.n_clusters
    };

    let params = builder.load_prices(&table, &cfg.data.columns, n_clusters, cfg.data.horizon_override)?;
    let units = UnitRegistry::new().with_unit(cfg.unit.clone());
    let model = builder.build_price_taker(&params, &units, &stages, &cfg.cashflow.objective)?;

    info!(
        n_periods = model.n_periods(),
        n_vars = model.model().n_vars(),
        n_constraints = model.model().constraints().len(),
        "model ready"
    );

    if !cfg.solver.enabled {
        warn!("solver disabled - skipping LP relaxation");
        return Ok(());
    }

    let solution = optimizer::LpRelaxationSolver::new()
        .solve(model.model())
        .context("solving LP relaxation")?;

    let mut summary = serde_json::json!({
        "objective": cfg.cashflow.objective,
        "objective_value": solution.objective_value,
        "n_periods": model.n_periods(),
    });
    if let Some(vars) = model.cashflow_vars() {
        summary["net_cash_inflow"] = solution.value(vars.net_cash_inflow).into();
        summary["net_profit"] = solution.value(vars.net_profit).into();
        summary["corp_tax"] = solution.value(vars.corp_tax).into();
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
