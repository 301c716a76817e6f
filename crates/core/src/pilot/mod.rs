//! Pilot rollout support: health monitoring, ROI estimate and A/B assignment.

pub mod experiment;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use experiment::{ExperimentConfig, CONTROL_VARIANT};

pub const DEVELOPMENT_COSTS: f64 = 50_000.0;
pub const OPERATIONAL_COSTS_MONTHLY: f64 = 5_000.0;
pub const DEFAULT_AVERAGE_ORDER_VALUE: f64 = 25.0;
/// Weeks of revenue attributed to the pilot itself.
pub const PILOT_WEEKS: f64 = 4.0;

/// Thresholds that trigger an automatic rollback.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RollbackTriggers {
    pub complaint_rate: f64,
    pub system_error_rate: f64,
    /// Rollback when AOV lift falls below this (negative) value.
    pub negative_aov_impact: f64,
}

impl Default for RollbackTriggers {
    fn default() -> Self {
        Self { complaint_rate: 0.05, system_error_rate: 0.01, negative_aov_impact: -0.02 }
    }
}

/// Targets the pilot must meet to count as a success.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuccessCriteria {
    pub min_aov_increase: f64,
    pub min_ctr: f64,
    pub max_complaint_rate: f64,
    pub min_customer_satisfaction: f64,
}

impl Default for SuccessCriteria {
    fn default() -> Self {
        Self {
            min_aov_increase: 0.05,
            min_ctr: 0.15,
            max_complaint_rate: 0.02,
            min_customer_satisfaction: 4.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PilotConfig {
    pub duration_days: u32,
    pub test_percentage: f64,
    pub test_stores: Vec<String>,
    pub control_stores: Vec<String>,
    pub success_criteria: SuccessCriteria,
    pub rollback_triggers: RollbackTriggers,
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            duration_days: 14,
            test_percentage: 0.05,
            test_stores: vec!["2156".to_string(), "1419".to_string(), "2249".to_string()],
            control_stores: vec!["2513".to_string(), "4915".to_string(), "949".to_string()],
            success_criteria: SuccessCriteria::default(),
            rollback_triggers: RollbackTriggers::default(),
        }
    }
}

/// Live readings from a running pilot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PilotMetrics {
    #[serde(default)]
    pub complaint_rate: f64,
    #[serde(default)]
    pub system_error_rate: f64,
    /// Relative change in average order value versus control.
    #[serde(default)]
    pub aov_lift: f64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub customer_satisfaction: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    fn recommendations(&self) -> [&'static str; 3] {
        match self {
            Self::Critical => [
                "Immediate rollback recommended",
                "Investigate root cause of performance issues",
                "Review system configuration and data",
            ],
            Self::Warning => [
                "Monitor closely for next 24 hours",
                "Consider algorithm adjustments",
                "Increase customer feedback collection",
            ],
            Self::Healthy => [
                "Continue pilot as planned",
                "Maintain current monitoring level",
                "Prepare for potential scale-up",
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthAlert {
    pub level: HealthStatus,
    pub metric: String,
    pub current_value: f64,
    pub threshold: f64,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub alerts: Vec<HealthAlert>,
    pub recommendations: Vec<String>,
    pub should_continue: bool,
    pub should_rollback: bool,
}

pub fn monitor_health(config: &PilotConfig, metrics: &PilotMetrics) -> HealthReport {
    let triggers = &config.rollback_triggers;
    let criteria = &config.success_criteria;
    let mut alerts = Vec::new();

    let mut critical = |metric: &str, current_value: f64, threshold: f64, breached: bool| {
        if breached {
            alerts.push(HealthAlert {
                level: HealthStatus::Critical,
                metric: metric.to_string(),
                current_value,
                threshold,
                message: format!("{metric} has breached rollback threshold"),
            });
        }
    };
    critical(
        "complaint_rate",
        metrics.complaint_rate,
        triggers.complaint_rate,
        metrics.complaint_rate > triggers.complaint_rate,
    );
    critical(
        "system_error_rate",
        metrics.system_error_rate,
        triggers.system_error_rate,
        metrics.system_error_rate > triggers.system_error_rate,
    );
    critical(
        "negative_aov_impact",
        metrics.aov_lift,
        triggers.negative_aov_impact,
        metrics.aov_lift < triggers.negative_aov_impact,
    );

    let mut warning = |metric: &str, current_value: f64, threshold: f64, missed: bool, below: bool| {
        if missed {
            let direction = if below { "below target - needs attention" } else { "above target - monitor closely" };
            alerts.push(HealthAlert {
                level: HealthStatus::Warning,
                metric: metric.to_string(),
                current_value,
                threshold,
                message: format!("{metric} {direction}"),
            });
        }
    };
    warning(
        "min_aov_increase",
        metrics.aov_lift,
        criteria.min_aov_increase,
        metrics.aov_lift < criteria.min_aov_increase,
        true,
    );
    warning("min_ctr", metrics.ctr, criteria.min_ctr, metrics.ctr < criteria.min_ctr, true);
    warning(
        "max_complaint_rate",
        metrics.complaint_rate,
        criteria.max_complaint_rate,
        metrics.complaint_rate > criteria.max_complaint_rate,
        false,
    );
    warning(
        "min_customer_satisfaction",
        metrics.customer_satisfaction,
        criteria.min_customer_satisfaction,
        metrics.customer_satisfaction < criteria.min_customer_satisfaction,
        true,
    );

    let overall_status =
        alerts.iter().map(|alert| alert.level).max().unwrap_or(HealthStatus::Healthy);
    let should_rollback = overall_status == HealthStatus::Critical;

    if should_rollback {
        warn!(
            event_name = "pilot.health.rollback",
            alerts = alerts.len(),
            complaint_rate = metrics.complaint_rate,
            system_error_rate = metrics.system_error_rate,
            aov_lift = metrics.aov_lift,
            "pilot breached a rollback trigger"
        );
    } else {
        info!(
            event_name = "pilot.health.checked",
            status = overall_status.as_str(),
            alerts = alerts.len(),
            "pilot health evaluated"
        );
    }

    HealthReport {
        overall_status,
        recommendations: overall_status.recommendations().iter().map(|s| s.to_string()).collect(),
        alerts,
        should_continue: !should_rollback,
        should_rollback,
    }
}

/// Inputs for the ROI estimate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PilotResults {
    /// Without order volume no revenue impact is estimated.
    #[serde(default)]
    pub average_monthly_orders: Option<f64>,
    #[serde(default)]
    pub aov_lift: f64,
    #[serde(default = "default_average_order_value")]
    pub average_order_value: f64,
}

fn default_average_order_value() -> f64 {
    DEFAULT_AVERAGE_ORDER_VALUE
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessCase {
    StrongPositive,
    Positive,
    Marginal,
    Negative,
}

impl BusinessCase {
    pub fn from_roi_percentage(roi: f64) -> Self {
        if roi > 200.0 {
            Self::StrongPositive
        } else if roi > 100.0 {
            Self::Positive
        } else if roi > 50.0 {
            Self::Marginal
        } else {
            Self::Negative
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Self::StrongPositive => "Strong positive case - recommend full rollout",
            Self::Positive => "Positive case - recommend gradual rollout",
            Self::Marginal => "Marginal case - recommend optimization",
            Self::Negative => "Negative case - recommend reassessment",
        }
    }

    pub fn next_steps(&self) -> [&'static str; 3] {
        match self {
            Self::StrongPositive => [
                "Immediate rollout to all stores",
                "Expand to all channels",
                "Invest in advanced features",
            ],
            Self::Positive => [
                "Gradual rollout with continued monitoring",
                "Optimize based on learnings",
                "Consider additional features",
            ],
            Self::Marginal => [
                "Optimize recommendation algorithms",
                "Conduct extended pilot",
                "Focus on high-impact improvements",
            ],
            Self::Negative => [
                "Analyze failure points",
                "Redesign approach",
                "Consider alternative strategies",
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiAnalysis {
    pub aov_improvement: f64,
    pub estimated_annual_revenue_lift: f64,
    pub pilot_revenue_impact: f64,
    pub development_costs: f64,
    pub operational_costs_monthly: f64,
    pub total_annual_costs: f64,
    pub roi_percentage: f64,
    /// `None` when the pilot produced no positive monthly revenue lift.
    pub payback_period_months: Option<f64>,
    pub business_case: BusinessCase,
    pub business_case_summary: String,
    pub next_steps: Vec<String>,
}

pub fn calculate_roi(results: &PilotResults) -> RoiAnalysis {
    let total_annual_costs = DEVELOPMENT_COSTS + OPERATIONAL_COSTS_MONTHLY * 12.0;

    let (monthly_lift, annual_lift) = match results.average_monthly_orders {
        Some(orders) => {
            let monthly = orders * results.average_order_value * results.aov_lift;
            (monthly, monthly * 12.0)
        }
        None => (0.0, 0.0),
    };

    let roi_percentage = annual_lift / total_annual_costs * 100.0;
    let payback_period_months =
        if monthly_lift > 0.0 { Some(total_annual_costs / monthly_lift) } else { None };
    let business_case = BusinessCase::from_roi_percentage(roi_percentage);

    info!(
        event_name = "pilot.roi.calculated",
        roi_percentage,
        business_case = business_case.summary(),
        "pilot ROI estimated"
    );

    RoiAnalysis {
        aov_improvement: results.aov_lift,
        estimated_annual_revenue_lift: annual_lift,
        pilot_revenue_impact: monthly_lift * PILOT_WEEKS,
        development_costs: DEVELOPMENT_COSTS,
        operational_costs_monthly: OPERATIONAL_COSTS_MONTHLY,
        total_annual_costs,
        roi_percentage,
        payback_period_months,
        business_case,
        business_case_summary: business_case.summary().to_string(),
        next_steps: business_case.next_steps().iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy_metrics() -> PilotMetrics {
        PilotMetrics {
            complaint_rate: 0.01,
            system_error_rate: 0.001,
            aov_lift: 0.08,
            ctr: 0.2,
            customer_satisfaction: 4.5,
        }
    }

    #[test]
    fn healthy_pilot_continues() {
        let report = monitor_health(&PilotConfig::default(), &healthy_metrics());

        assert_eq!(report.overall_status, HealthStatus::Healthy);
        assert!(report.alerts.is_empty());
        assert!(report.should_continue);
        assert!(!report.should_rollback);
        assert_eq!(report.recommendations[0], "Continue pilot as planned");
    }

    #[test]
    fn missed_target_is_a_warning() {
        let metrics = PilotMetrics { ctr: 0.1, ..healthy_metrics() };

        let report = monitor_health(&PilotConfig::default(), &metrics);

        assert_eq!(report.overall_status, HealthStatus::Warning);
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].metric, "min_ctr");
        assert!(!report.should_rollback);
    }

    #[test]
    fn breached_trigger_requests_rollback() {
        let metrics = PilotMetrics { aov_lift: -0.05, ..healthy_metrics() };

        let report = monitor_health(&PilotConfig::default(), &metrics);

        assert_eq!(report.overall_status, HealthStatus::Critical);
        assert!(report.should_rollback);
        assert!(!report.should_continue);
        assert!(report
            .alerts
            .iter()
            .any(|alert| alert.metric == "negative_aov_impact" && alert.level == HealthStatus::Critical));
        assert_eq!(report.recommendations[0], "Immediate rollback recommended");
    }

    #[test]
    fn roi_tiers_follow_annual_lift() {
        let results = PilotResults {
            average_monthly_orders: Some(100_000.0),
            aov_lift: 0.05,
            average_order_value: 25.0,
        };

        let roi = calculate_roi(&results);

        // 100k orders * $25 * 5% = $125k per month, $1.5M per year against $110k costs.
        assert!((roi.estimated_annual_revenue_lift - 1_500_000.0).abs() < 1e-6);
        assert!((roi.pilot_revenue_impact - 500_000.0).abs() < 1e-6);
        assert!((roi.total_annual_costs - 110_000.0).abs() < 1e-9);
        assert_eq!(roi.business_case, BusinessCase::StrongPositive);
        assert!((roi.payback_period_months.unwrap() - 0.88).abs() < 1e-9);
    }

    #[test]
    fn zero_lift_has_no_payback() {
        let roi = calculate_roi(&PilotResults {
            average_monthly_orders: Some(10_000.0),
            aov_lift: 0.0,
            average_order_value: 25.0,
        });

        assert_eq!(roi.payback_period_months, None);
        assert_eq!(roi.roi_percentage, 0.0);
        assert_eq!(roi.business_case, BusinessCase::Negative);
    }

    #[test]
    fn business_case_thresholds_are_exclusive() {
        assert_eq!(BusinessCase::from_roi_percentage(200.0), BusinessCase::Positive);
        assert_eq!(BusinessCase::from_roi_percentage(100.5), BusinessCase::Positive);
        assert_eq!(BusinessCase::from_roi_percentage(50.0), BusinessCase::Negative);
        assert_eq!(BusinessCase::from_roi_percentage(75.0), BusinessCase::Marginal);
    }
}
