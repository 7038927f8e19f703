//! Recommendation builder: shapes raw model output into the final window
//! and ranked alternatives
//!
//! The principal window is the predicted optimal date plus/minus a
//! configured tolerance, clamped to the crop's valid sowing period for the
//! campaign target year. Alternatives come from a documented catalog of
//! climate scenarios, ranked by how relevant each scenario is to the
//! parcel's observed climate window.

use chrono::{Days, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use shared::{
    Alternative, ClimateScenario, ParcelContext, RecommendationWindow, RISK_INSUFFICIENT_DATA,
};

use crate::config::RecommendationConfig;
use crate::error::{AppError, AppResult};
use crate::services::scoring::RawPrediction;

/// Daily precipitation (mm) considered climatically neutral for the pampas
const NEUTRAL_PRECIPITATION_MM: f64 = 3.0;

/// Mean temperature (°C) considered neutral at sowing time
const NEUTRAL_TEMPERATURE_C: f64 = 18.0;

/// Below this mean daily precipitation the result carries a drought risk
const DROUGHT_RISK_MM: f64 = 1.0;

/// Below this mean temperature the result carries a frost risk
const FROST_RISK_C: f64 = 10.0;

/// Confidence penalty applied to alternatives by rank (first, second, ...)
const ALTERNATIVE_PENALTIES: [f64; 3] = [0.85, 0.75, 0.65];

/// A climate scenario from the documented catalog, with the date shift it
/// implies and its agronomic trade-offs
struct ScenarioDef {
    name: &'static str,
    description: &'static str,
    precipitation_factor: f64,
    temperature_adjustment: f64,
    /// Days the optimal date moves under this scenario.
    day_shift: i64,
    pros: &'static [&'static str],
    contras: &'static [&'static str],
}

/// Catalog of extreme-but-realistic scenarios considered for alternatives
const SCENARIOS: [ScenarioDef; 6] = [
    ScenarioDef {
        name: "Sequía severa",
        description: "Precipitaciones 50% por debajo del promedio y temperaturas 4°C más altas",
        precipitation_factor: 0.5,
        temperature_adjustment: 4.0,
        day_shift: -7,
        pros: &[
            "Menor riesgo de anegamiento",
            "Reducción de enfermedades fúngicas",
        ],
        contras: &[
            "Severo estrés hídrico durante ciclo",
            "Germinación comprometida",
            "Rendimientos significativamente reducidos",
        ],
    },
    ScenarioDef {
        name: "Año húmedo extremo",
        description: "Precipitaciones 60% por encima del promedio y temperaturas 2°C más bajas",
        precipitation_factor: 1.6,
        temperature_adjustment: -2.0,
        day_shift: 7,
        pros: &[
            "Excelente disponibilidad hídrica",
            "Sin limitaciones por agua durante ciclo",
        ],
        contras: &[
            "Alto riesgo de enfermedades fúngicas",
            "Posible anegamiento en lotes bajos",
            "Dificultades en labores de campo",
        ],
    },
    ScenarioDef {
        name: "Riesgo de heladas tardías",
        description: "Temperaturas 5°C por debajo del promedio en periodo crítico",
        precipitation_factor: 1.0,
        temperature_adjustment: -5.0,
        day_shift: 10,
        pros: &["Buena humedad en suelo", "Menor evapotranspiración"],
        contras: &[
            "Alto riesgo de daño por heladas",
            "Desarrollo inicial muy lento",
            "Posible pérdida total del cultivo",
        ],
    },
    ScenarioDef {
        name: "Ola de calor temprana",
        description: "Temperaturas 6°C por encima del promedio y baja humedad",
        precipitation_factor: 0.7,
        temperature_adjustment: 6.0,
        day_shift: -10,
        pros: &["Germinación muy rápida", "Desarrollo inicial acelerado"],
        contras: &[
            "Severo estrés térmico e hídrico",
            "Agotamiento rápido de humedad",
            "Acortamiento significativo del ciclo",
        ],
    },
    ScenarioDef {
        name: "Año Niña moderado",
        description: "Año La Niña típico con precipitaciones reducidas y temperaturas elevadas",
        precipitation_factor: 0.72,
        temperature_adjustment: 2.8,
        day_shift: -4,
        pros: &["Menor riesgo de anegamiento", "Germinación más rápida"],
        contras: &[
            "Disponibilidad hídrica limitada",
            "Mayor estrés durante floración",
        ],
    },
    ScenarioDef {
        name: "Primavera inestable",
        description: "Alta variabilidad: precipitaciones excesivas y temperaturas erráticas",
        precipitation_factor: 1.4,
        temperature_adjustment: 0.0,
        day_shift: 4,
        pros: &["Buena recarga de humedad", "Temperaturas moderadas"],
        contras: &[
            "Alta variabilidad climática",
            "Dificultad en planificación de labores",
            "Riesgo de enfermedades por humedad",
        ],
    },
];

/// Builds recommendation windows and alternatives from raw predictions
#[derive(Debug, Clone)]
pub struct RecommendationBuilder {
    tolerance_days: i64,
    max_alternatives: usize,
    min_completeness: f64,
}

impl RecommendationBuilder {
    pub fn new(config: &RecommendationConfig) -> Self {
        Self {
            tolerance_days: config.window_tolerance_days,
            max_alternatives: config.max_alternatives,
            min_completeness: config.min_completeness,
        }
    }

    /// Shape a raw prediction into the principal window plus alternatives.
    pub fn build(
        &self,
        ctx: &ParcelContext,
        raw: &RawPrediction,
    ) -> AppResult<(RecommendationWindow, Vec<Alternative>)> {
        let target_year = ctx.campaign.target_year();
        let (period_start, period_end) = ctx.crop.sowing_period(target_year);

        let predicted = day_of_year_to_date(raw.optimal_day_of_year, target_year)?;
        let optimal = clamp_date(predicted, period_start, period_end);

        let start = clamp_date(shift_date(optimal, -self.tolerance_days), period_start, optimal);
        let end = clamp_date(shift_date(optimal, self.tolerance_days), optimal, period_end);

        let confidence = (raw.model_confidence * ctx.completeness).clamp(0.0, 1.0);

        let mut risks = derive_risks(ctx);
        if ctx.completeness < self.min_completeness {
            risks.push(RISK_INSUFFICIENT_DATA.to_string());
        }

        let mut indicators = raw.indicators.clone();
        indicators.insert("completitud_datos".to_string(), ctx.completeness);
        indicators.insert("confianza_modelo".to_string(), raw.model_confidence);

        let principal = RecommendationWindow {
            optimal_date: optimal,
            start,
            end,
            confidence,
            justification: format!(
                "Fecha óptima de siembra de {} estimada por el modelo {} para la campaña {}, \
                 ajustada al período de siembra válido del cultivo",
                ctx.crop, raw.model_version, ctx.campaign
            ),
            risks,
            indicators,
        };

        let alternatives =
            self.build_alternatives(ctx, &principal, period_start, period_end);

        debug_assert!(shared::validate_window(&principal).is_ok());
        debug_assert!(
            shared::validate_alternatives(&principal, &alternatives, self.max_alternatives)
                .is_ok()
        );

        Ok((principal, alternatives))
    }

    /// Rank the scenario catalog by relevance to the observed climate and
    /// derive one alternative per retained scenario.
    fn build_alternatives(
        &self,
        ctx: &ParcelContext,
        principal: &RecommendationWindow,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Vec<Alternative> {
        let precip_anomaly = ctx
            .mean_precipitation_mm()
            .and_then(|d| d.to_f64())
            .map(|p| (p - NEUTRAL_PRECIPITATION_MM) / NEUTRAL_PRECIPITATION_MM)
            .unwrap_or(0.0);
        let temp_anomaly = ctx
            .mean_temperature_celsius()
            .and_then(|d| d.to_f64())
            .map(|t| (t - NEUTRAL_TEMPERATURE_C) / NEUTRAL_TEMPERATURE_C)
            .unwrap_or(0.0);

        let mut ranked: Vec<(f64, &ScenarioDef)> = SCENARIOS
            .iter()
            .map(|s| (scenario_relevance(s, precip_anomaly, temp_anomaly), s))
            .collect();
        // Stable ordering: relevance descending, catalog order breaks ties.
        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut alternatives = Vec::new();
        for (_, scenario) in ranked {
            if alternatives.len() >= self.max_alternatives {
                break;
            }
            let date = clamp_date(
                shift_date(principal.optimal_date, scenario.day_shift),
                period_start,
                period_end,
            );
            // Clamping can collapse the shift onto the principal date; such
            // a scenario adds no information.
            if date == principal.optimal_date {
                continue;
            }

            let penalty = ALTERNATIVE_PENALTIES
                .get(alternatives.len())
                .copied()
                .unwrap_or(0.5);

            alternatives.push(Alternative {
                date,
                start: clamp_date(shift_date(date, -self.tolerance_days), period_start, date),
                end: clamp_date(shift_date(date, self.tolerance_days), date, period_end),
                confidence: (principal.confidence * penalty).clamp(0.0, 1.0),
                pros: scenario.pros.iter().map(|s| s.to_string()).collect(),
                contras: scenario.contras.iter().map(|s| s.to_string()).collect(),
                scenario: Some(ClimateScenario {
                    name: scenario.name.to_string(),
                    description: scenario.description.to_string(),
                    precipitation_factor: scenario.precipitation_factor,
                    temperature_adjustment_celsius: scenario.temperature_adjustment,
                }),
            });
        }

        alternatives
    }
}

/// Relevance of a scenario given how wet/warm the observed window is
/// relative to neutral. A dry scenario scores higher on a dry window.
fn scenario_relevance(scenario: &ScenarioDef, precip_anomaly: f64, temp_anomaly: f64) -> f64 {
    let precip_dir = -(scenario.precipitation_factor - 1.0);
    let temp_dir = scenario.temperature_adjustment / 6.0;
    precip_dir * -precip_anomaly + temp_dir * temp_anomaly
}

/// Risk flags derived directly from the observed climate window
fn derive_risks(ctx: &ParcelContext) -> Vec<String> {
    let mut risks = Vec::new();
    if let Some(p) = ctx.mean_precipitation_mm().and_then(|d| d.to_f64()) {
        if p < DROUGHT_RISK_MM {
            risks.push("deficit_hidrico".to_string());
        }
    }
    if let Some(t) = ctx.mean_temperature_celsius().and_then(|d| d.to_f64()) {
        if t < FROST_RISK_C {
            risks.push("riesgo_heladas".to_string());
        }
    }
    risks
}

/// Convert a 1-based day of year into a date in `year`
fn day_of_year_to_date(day_of_year: u32, year: i32) -> AppResult<NaiveDate> {
    if !(1..=365).contains(&day_of_year) {
        return Err(AppError::Internal(format!(
            "model returned day_of_year out of range: {}",
            day_of_year
        )));
    }
    NaiveDate::from_yo_opt(year, day_of_year)
        .ok_or_else(|| AppError::Internal(format!("invalid date for year {}", year)))
}

fn shift_date(date: NaiveDate, days: i64) -> NaiveDate {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64)).unwrap_or(date)
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
            .unwrap_or(date)
    }
}

fn clamp_date(date: NaiveDate, min: NaiveDate, max: NaiveDate) -> NaiveDate {
    date.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn day_of_year_conversion() {
        let d = day_of_year_to_date(274, 2026).unwrap();
        assert_eq!(d.month(), 10);
        assert_eq!(d.day(), 1);
        assert!(day_of_year_to_date(0, 2026).is_err());
        assert!(day_of_year_to_date(366, 2026).is_err());
    }

    #[test]
    fn clamp_respects_bounds() {
        let min = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let max = NaiveDate::from_ymd_opt(2026, 12, 15).unwrap();
        let before = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let after = NaiveDate::from_ymd_opt(2026, 12, 30).unwrap();
        assert_eq!(clamp_date(before, min, max), min);
        assert_eq!(clamp_date(after, min, max), max);
    }

    #[test]
    fn dry_window_prefers_dry_scenarios() {
        // Strongly dry and hot observation: drought-style scenarios first.
        let dry_hot = SCENARIOS
            .iter()
            .map(|s| (scenario_relevance(s, -0.8, 0.3), s.name))
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap())
            .unwrap();
        assert!(
            dry_hot.1 == "Sequía severa" || dry_hot.1 == "Ola de calor temprana",
            "got {}",
            dry_hot.1
        );
    }
}
