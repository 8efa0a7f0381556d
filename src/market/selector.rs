use crate::errors::{EngineError, EngineResult};
use crate::state::Contract;
use chrono::NaiveDate;

/// Reject expirations further than this from the requested date.
pub const MAX_EXPIRATION_DISTANCE_DAYS: i64 = 365;

/// Pick the expiration closest to `target` in calendar days.
/// Ties keep the earliest-listed candidate.
pub fn select_expiration(target: NaiveDate, candidates: &[NaiveDate]) -> EngineResult<NaiveDate> {
    let (closest, distance) = candidates
        .iter()
        .map(|&d| (d, (d - target).num_days().abs()))
        .reduce(|best, next| if next.1 < best.1 { next } else { best })
        .ok_or_else(|| EngineError::NoSuitableExpiration(format!("no expirations listed (target {target})")))?;

    if distance > MAX_EXPIRATION_DISTANCE_DAYS {
        return Err(EngineError::NoSuitableExpiration(format!(
            "closest expiration {closest} is {distance} days from target {target}"
        )));
    }

    Ok(closest)
}

/// Median-by-position placeholder policy: sort by strike ascending and take
/// index `len / 2` (floor). Not an optimal selection; kept fixed for reproducibility.
pub fn select_median_strike(contracts: &[Contract]) -> EngineResult<Contract> {
    if contracts.is_empty() {
        return Err(EngineError::NoContracts("option chain is empty".into()));
    }

    let mut sorted: Vec<&Contract> = contracts.iter().collect();
    sorted.sort_by(|a, b| a.strike.total_cmp(&b.strike));

    Ok(sorted[sorted.len() / 2].clone())
}

/// Full selection over a mixed list: closest expiration to `target`, then the
/// median-by-position strike among contracts at that expiration.
pub fn select_contract(target: NaiveDate, contracts: &[Contract]) -> EngineResult<Contract> {
    if contracts.is_empty() {
        return Err(EngineError::NoContracts(format!("no contracts listed (target {target})")));
    }

    let mut expirations: Vec<NaiveDate> = Vec::new();
    for c in contracts {
        if !expirations.contains(&c.expiration) {
            expirations.push(c.expiration);
        }
    }

    let expiration = select_expiration(target, &expirations)?;
    let at_expiration: Vec<Contract> = contracts
        .iter()
        .filter(|c| c.expiration == expiration)
        .cloned()
        .collect();

    let selected = select_median_strike(&at_expiration)?;
    tracing::debug!(
        %expiration,
        strike = selected.strike,
        premium = selected.premium,
        candidates = at_expiration.len(),
        "contract selected"
    );
    Ok(selected)
}
