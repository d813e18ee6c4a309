//! Body-metric formulas and recommended goal targets.
//!
//! Targets are anchored on an ideal BMI of 22 and a waist-to-height
//! ratio of 0.45, then capped by a safe weekly rate so a short
//! challenge never asks for a crash cut or a dirty bulk.

use crate::model::Track;

const IDEAL_BMI: f64 = 22.0;
const IDEAL_WHTR: f64 = 0.45;
/// Average of the 0.5-1 kg/week range considered safe for a cut.
const SAFE_WEEKLY_LOSS_KG: f64 = 0.75;
/// Average of the 0.25-0.5 kg/week range considered safe for a bulk.
const SAFE_WEEKLY_GAIN_KG: f64 = 0.35;

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendedGoals {
    pub target_weight: f64,
    pub target_waist: f64,
    pub weight_reason: String,
    pub waist_reason: String,
}

/// Suggest goal targets from the participant's starting measurements.
/// `height` is in centimeters, weights in kilograms, waist in
/// centimeters.
pub fn recommended_goals(
    track: Track,
    start_weight: f64,
    start_waist: f64,
    height: f64,
    duration_months: i64,
) -> RecommendedGoals {
    let height_m = height / 100.0;
    let ideal_weight = (IDEAL_BMI * height_m * height_m).round();
    let ideal_waist = (height * IDEAL_WHTR).round();
    let weeks = (duration_months * 4) as f64;

    match track {
        Track::Cut => {
            // The healthier of "lose 10%" and "ideal plus 5%", but
            // never faster than the safe weekly rate allows.
            let ten_percent = (start_weight * 0.9).round();
            let ideal_plus = (ideal_weight * 1.05).round();
            let rate_floor = (start_weight - weeks * SAFE_WEEKLY_LOSS_KG).round();
            let target_weight = rate_floor.max(ten_percent.min(ideal_plus));
            let weekly_loss = (start_weight - target_weight) / weeks;
            RecommendedGoals {
                target_weight,
                target_waist: (start_waist - 5.0).min(ideal_waist),
                weight_reason: format!(
                    "healthy BMI ~{IDEAL_BMI:.0} for {height:.0} cm, losing ~{weekly_loss:.1} kg/week",
                ),
                waist_reason: format!("waist-to-height ratio of {IDEAL_WHTR}"),
            }
        }
        Track::Bulk => {
            let ideal_plus = (ideal_weight * 1.07).round();
            let rate_cap = (start_weight + weeks * SAFE_WEEKLY_GAIN_KG).round();
            let target_weight = ideal_plus.min(rate_cap);
            let weekly_gain = (target_weight - start_weight) / weeks;
            RecommendedGoals {
                target_weight,
                target_waist: (start_waist + 2.0).round(),
                weight_reason: format!("lean mass gain at ~{weekly_gain:.2} kg/week"),
                waist_reason: "slight increase from core muscle".to_string(),
            }
        }
    }
}

pub fn bmi(weight: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight / (height_m * height_m)
}

pub fn waist_height_ratio(waist: f64, height: f64) -> f64 {
    waist / height
}

pub fn bmi_category(bmi: f64) -> &'static str {
    if bmi < 18.5 {
        "underweight"
    } else if bmi < 25.0 {
        "healthy"
    } else if bmi < 30.0 {
        "overweight"
    } else {
        "obese"
    }
}

pub fn whtr_status(whtr: f64) -> &'static str {
    if whtr < 0.4 {
        "very low"
    } else if whtr < 0.5 {
        "healthy"
    } else if whtr < 0.6 {
        "elevated risk"
    } else {
        "high risk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cut_target_respects_safe_weekly_rate() {
        // 100 kg at 180 cm over 6 months: the ideal-anchored target
        // (75 kg) would need more than 1 kg/week, so the rate floor
        // (82 kg) wins.
        let rec = recommended_goals(Track::Cut, 100.0, 100.0, 180.0, 6);
        assert_eq!(rec.target_weight, 82.0);
        assert_eq!(rec.target_waist, 81.0);
        assert!(rec.weight_reason.contains("0.8 kg/week"));
    }

    #[test]
    fn cut_target_uses_ten_percent_when_already_close() {
        // 80 kg at 180 cm: 10% off (72) beats ideal+5% (75) and is
        // well within the safe rate.
        let rec = recommended_goals(Track::Cut, 80.0, 84.0, 180.0, 6);
        assert_eq!(rec.target_weight, 72.0);
        // Waist: start - 5 (79) is still below the 81 cm ideal.
        assert_eq!(rec.target_waist, 79.0);
    }

    #[test]
    fn bulk_target_is_capped_by_safe_gain() {
        // 60 kg at 180 cm over 3 months: ideal+7% (76) is out of
        // reach, the rate cap lands at 64.
        let rec = recommended_goals(Track::Bulk, 60.0, 75.0, 180.0, 3);
        assert_eq!(rec.target_weight, 64.0);
        assert_eq!(rec.target_waist, 77.0);
    }

    #[test]
    fn bulk_target_stops_at_ideal_for_long_challenges() {
        // 70 kg over 12 months: the rate cap (87) exceeds ideal+7%
        // (76), so the ideal anchor wins.
        let rec = recommended_goals(Track::Bulk, 70.0, 80.0, 180.0, 12);
        assert_eq!(rec.target_weight, 76.0);
    }

    #[test]
    fn bmi_and_whtr_categories() {
        assert!((bmi(71.28, 180.0) - 22.0).abs() < 1e-9);
        assert_eq!(bmi_category(21.6), "healthy");
        assert_eq!(bmi_category(27.0), "overweight");
        assert_eq!(bmi_category(17.0), "underweight");
        assert_eq!(bmi_category(31.0), "obese");
        assert!((waist_height_ratio(81.0, 180.0) - 0.45).abs() < 1e-9);
        assert_eq!(whtr_status(0.45), "healthy");
        assert_eq!(whtr_status(0.55), "elevated risk");
        assert_eq!(whtr_status(0.62), "high risk");
        assert_eq!(whtr_status(0.35), "very low");
    }
}
