use minijinja::{context, Environment};
use tracing::debug;

use crate::core::config::AnalyticsConfig;
use crate::core::error::{AppError, Result};
use crate::features::analytics::dtos::AnalyticsViewDto;
use crate::shared::validation::WAREHOUSE_IDENTIFIER_REGEX;

/// Years pivoted into columns by the performance view
const PERFORMANCE_YEARS: i32 = 3;

/// Ratio groups unpivoted by the ratios view, as (document key, label)
const RATIO_CATEGORIES: &[(&str, &str)] = &[
    ("liquidez", "Liquidez"),
    ("rentabilidad", "Rentabilidad"),
    ("solvencia", "Solvencia"),
    ("apalancamiento", "Apalancamiento"),
];

struct ViewTemplate {
    template: &'static str,
    name: &'static str,
    title: &'static str,
    source: &'static str,
}

const VIEW_TEMPLATES: &[ViewTemplate] = &[
    ViewTemplate {
        template: "metricas_generales.sql.jinja",
        name: "vw_metricas_generales",
        title: "General metrics",
        source: include_str!("../../../../templates/analytics/metricas_generales.sql.jinja"),
    },
    ViewTemplate {
        template: "detalle_solicitud.sql.jinja",
        name: "vw_detalle_solicitud",
        title: "Request terms",
        source: include_str!("../../../../templates/analytics/detalle_solicitud.sql.jinja"),
    },
    ViewTemplate {
        template: "rendimiento_anual.sql.jinja",
        name: "vw_rendimiento_3_anios",
        title: "Annual performance (3 periods pivoted)",
        source: include_str!("../../../../templates/analytics/rendimiento_anual.sql.jinja"),
    },
    ViewTemplate {
        template: "razones_financieras.sql.jinja",
        name: "vw_razones_financieras",
        title: "Financial ratios",
        source: include_str!("../../../../templates/analytics/razones_financieras.sql.jinja"),
    },
];

/// Renders the warehouse views dashboards read study data through
pub struct AnalyticsService {
    config: AnalyticsConfig,
    env: Environment<'static>,
}

impl AnalyticsService {
    pub fn new(config: AnalyticsConfig) -> Result<Self> {
        for (label, value) in [
            ("project", &config.project),
            ("dataset", &config.dataset),
            ("source table", &config.source_table),
        ] {
            if !WAREHOUSE_IDENTIFIER_REGEX.is_match(value) {
                return Err(AppError::Validation(format!(
                    "Invalid analytics {}: '{}'",
                    label, value
                )));
            }
        }

        let mut env = Environment::new();
        for view in VIEW_TEMPLATES {
            env.add_template(view.template, view.source)
                .map_err(|e| AppError::Internal(format!("Invalid view template: {}", e)))?;
        }

        Ok(Self { config, env })
    }

    /// Render every view; the performance view pivots the three years
    /// ending at `latest_year`
    pub fn views(&self, latest_year: i32) -> Result<Vec<AnalyticsViewDto>> {
        let years: Vec<i32> = (latest_year - PERFORMANCE_YEARS + 1..=latest_year).collect();
        let ctx = context! {
            project => &self.config.project,
            dataset => &self.config.dataset,
            source_table => &self.config.source_table,
            years => years,
            categories => RATIO_CATEGORIES,
        };

        VIEW_TEMPLATES
            .iter()
            .map(|view| {
                let sql = self
                    .env
                    .get_template(view.template)
                    .and_then(|template| template.render(&ctx))
                    .map_err(|e| {
                        AppError::Internal(format!("Failed to render {}: {}", view.template, e))
                    })?;
                debug!("Rendered analytics view {}", view.name);

                Ok(AnalyticsViewDto {
                    name: view.name.to_string(),
                    title: view.title.to_string(),
                    sql,
                })
            })
            .collect()
    }
}
