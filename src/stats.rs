use crate::models::{AccessibilityLevel, Location, RegionalStatistic, Volunteer};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessibilitySummary {
    pub total: usize,
    pub accessible: usize,
    /// Everything below the accessible threshold, partial ratings included.
    pub non_accessible: usize,
    pub partial: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolunteerSummary {
    pub total: usize,
    pub available: usize,
    pub unavailable: usize,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub locations: AccessibilitySummary,
    pub volunteers: VolunteerSummary,
    pub regions: Vec<RegionalStatistic>,
}

pub fn accessibility_summary(locations: &[Location]) -> AccessibilitySummary {
    let mut summary = AccessibilitySummary {
        total: locations.len(),
        accessible: 0,
        non_accessible: 0,
        partial: 0,
    };
    for location in locations {
        match location.accessibility() {
            AccessibilityLevel::Accessible => summary.accessible += 1,
            AccessibilityLevel::Partial => {
                summary.partial += 1;
                summary.non_accessible += 1;
            }
            AccessibilityLevel::NotAccessible => summary.non_accessible += 1,
        }
    }
    summary
}

pub fn volunteer_summary(volunteers: &[Volunteer]) -> VolunteerSummary {
    let available = volunteers.iter().filter(|v| v.available).count();
    let rating_sum: f64 = volunteers.iter().map(|v| v.rating).sum();
    VolunteerSummary {
        total: volunteers.len(),
        available,
        unavailable: volunteers.len() - available,
        average_rating: ratio(rating_sum, volunteers.len()),
    }
}

/// Percentage of `matching` over `total`, `0.0` for an empty collection.
pub fn rate(matching: usize, total: usize) -> f64 {
    ratio(matching as f64 * 100.0, total)
}

/// One-decimal percentage text; an empty collection renders as plain `0`.
pub fn format_rate(matching: usize, total: usize) -> String {
    if total == 0 {
        "0".to_string()
    } else {
        format!("{:.1}", rate(matching, total))
    }
}

pub fn build_dashboard(
    locations: &[Location],
    volunteers: &[Volunteer],
    regions: Vec<RegionalStatistic>,
) -> DashboardSummary {
    DashboardSummary {
        locations: accessibility_summary(locations),
        volunteers: volunteer_summary(volunteers),
        regions,
    }
}

fn ratio(sum: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}
