//! # Default Dashboard Statements
//!
//! Fixed PostgreSQL aggregations over `attribute_data` backing the overview
//! charts. The server loads them as configuration defaults, so a deployment
//! can replace any of them (e.g. with SQLite-compatible SQL for a local copy).

use crate::types::DashboardQuery;

/// Count of assessment units per state and category.
pub const PIE_SQL: &str = "
SELECT state, categorization, COUNT(*) AS count
FROM attribute_data
WHERE categorization IS NOT NULL
GROUP BY state, categorization
ORDER BY count DESC";

/// Total recharge and extraction per year over the last ten years. Values that
/// are not plain decimals count as zero.
pub const TREND_SQL: &str = "
SELECT
    year,
    SUM(CASE WHEN total_annual_ground_water_recharge_ham::text ~ '^[0-9.]+$' THEN total_annual_ground_water_recharge_ham::numeric ELSE 0 END) AS recharge,
    SUM(CASE WHEN total_extraction_ham::text ~ '^[0-9.]+$' THEN total_extraction_ham::numeric ELSE 0 END) AS extraction
FROM attribute_data
WHERE year ~ '^[0-9]{4}$' AND year::integer >= EXTRACT(YEAR FROM CURRENT_DATE) - 9
GROUP BY year
ORDER BY year::integer";

/// The ten most stressed assessment units in 2024.
pub const BAR_SQL: &str = "
SELECT
    assessment_unit_name AS block,
    state,
    CASE
        WHEN stage_of_ground_water_extraction_pct IS NULL
             OR stage_of_ground_water_extraction_pct::text = 'NaN'
        THEN 0
        ELSE stage_of_ground_water_extraction_pct
    END AS stage_of_ground_water_extraction_pct
FROM attribute_data
WHERE year = '2024'
ORDER BY stage_of_ground_water_extraction_pct DESC
LIMIT 10";

/// Share of safe assessment units per state.
pub const MAP_SQL: &str = "
SELECT
    state,
    COUNT(*) AS total_blocks,
    SUM(CASE WHEN categorization = 'safe' THEN 1 ELSE 0 END) AS safe_blocks,
    ROUND(100.0 * SUM(CASE WHEN categorization = 'safe' THEN 1 ELSE 0 END) / NULLIF(COUNT(*), 0), 2) AS percent_safe
FROM attribute_data
WHERE categorization IS NOT NULL
GROUP BY state
ORDER BY state";

/// The built-in dashboards, keyed by the name served at `/dashboard/{name}`.
pub fn default_dashboards() -> Vec<(&'static str, DashboardQuery)> {
    vec![
        ("pie", DashboardQuery::new(PIE_SQL)),
        ("trend", DashboardQuery::new(TREND_SQL)),
        (
            "bar",
            DashboardQuery::new(BAR_SQL).zero_fill(["stage_of_ground_water_extraction_pct"]),
        ),
        ("map", DashboardQuery::new(MAP_SQL)),
    ]
}
