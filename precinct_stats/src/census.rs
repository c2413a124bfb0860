use log::{debug, info};

use std::collections::BTreeMap;

use crate::config::*;
use crate::safe_ratio;

// Education levels counted as higher education, matched on lowercase labels.
const HIGHER_EDUCATION_MARKERS: [&str; 6] = [
    "bachelor",
    "master",
    "doctor",
    "professional",
    "graduate degree",
    "postgraduate",
];

/// Attaches census estimates to an aggregate.
///
/// The unregistered population of the county is allocated to each precinct in
/// proportion to its share of the registered voters. Returns a new aggregate,
/// the input is left untouched.
pub fn integrate_census(aggregate: &GlobalAggregate, census: &CensusRecord) -> GlobalAggregate {
    let precincts = aggregate.precincts();
    let total_registered: u64 = precincts.values().map(|p| p.registered_voters).sum();
    let total_unregistered = census
        .voting_age_population
        .saturating_sub(total_registered);
    info!(
        "integrate_census: {} registered, {} voting age population, {} unregistered",
        total_registered, census.voting_age_population, total_unregistered
    );

    let county_education = higher_education_share(&census.education_levels);

    let mut res = CensusIntegration {
        total_unregistered,
        ..CensusIntegration::default()
    };
    let mut income: Vec<f64> = Vec::new();
    let mut education: Vec<f64> = Vec::new();
    let mut turnout: Vec<f64> = Vec::new();

    for (pid, p) in precincts.iter() {
        let share = safe_ratio(p.registered_voters as f64, total_registered as f64);
        let unregistered = (total_unregistered as f64 * share).round() as u64;
        let voting_age = (census.voting_age_population as f64 * share).round() as u64;
        // Over-registration is possible and is not clamped.
        let registration_rate = safe_ratio(p.registered_voters as f64, voting_age as f64);
        debug!(
            "integrate_census: precinct {}: share {} unregistered {} voting age {} rate {}",
            pid, share, unregistered, voting_age, registration_rate
        );
        res.unregistered_voters.insert(pid.clone(), unregistered);
        res.estimated_voting_age.insert(pid.clone(), voting_age);
        res.registration_rate.insert(pid.clone(), registration_rate);

        let estimate = census.precinct_estimates.get(pid);
        income.push(
            estimate
                .and_then(|e| e.median_income)
                .unwrap_or(census.median_income),
        );
        education.push(
            estimate
                .and_then(|e| e.higher_education_share)
                .unwrap_or(county_education),
        );
        turnout.push(safe_ratio(
            p.voted_count as f64,
            p.registered_voters as f64,
        ));
    }

    let pids: Vec<String> = precincts.keys().cloned().collect();
    res.income_turnout = correlation_summary(&pids, income, &turnout);
    res.education_turnout = correlation_summary(&pids, education, &turnout);
    info!(
        "integrate_census: income/turnout r={} education/turnout r={}",
        res.income_turnout.coefficient, res.education_turnout.coefficient
    );

    let mut integrated = aggregate.clone();
    integrated.census = Some(res);
    integrated
}

/// Census data is optional: without it, the aggregate is returned as is.
pub fn integrate_census_opt(
    aggregate: &GlobalAggregate,
    census: Option<&CensusRecord>,
) -> GlobalAggregate {
    match census {
        Some(c) => integrate_census(aggregate, c),
        None => {
            info!("integrate_census_opt: no census record, skipping");
            aggregate.clone()
        }
    }
}

fn correlation_summary(pids: &[String], factor: Vec<f64>, turnout: &[f64]) -> CorrelationSummary {
    let coefficient = pearson_correlation(&factor, turnout);
    CorrelationSummary {
        precincts: pids.to_vec(),
        factor,
        turnout: turnout.to_vec(),
        coefficient,
    }
}

/// Share of the population in the higher education levels.
pub fn higher_education_share(levels: &BTreeMap<String, f64>) -> f64 {
    let total: f64 = levels.values().sum();
    let higher: f64 = levels
        .iter()
        .filter(|(label, _)| {
            let l = label.to_lowercase();
            HIGHER_EDUCATION_MARKERS.iter().any(|m| l.contains(m))
        })
        .map(|(_, v)| *v)
        .sum();
    safe_ratio(higher, total)
}

/// Pearson correlation coefficient.
///
/// Returns 0 when it is not defined: mismatched lengths, fewer than two
/// points, or a constant series.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return 0.0;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        0.0
    } else {
        cov / (var_x.sqrt() * var_y.sqrt())
    }
}
