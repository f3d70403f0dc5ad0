//! Mystery-shop sub-score.

use serde::{Deserialize, Serialize};

use super::{clamp_score, weighted_sum};

/// Six 0–100 sub-metrics from a mystery-shop visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MysteryMetrics {
    #[serde(default)]
    pub speed_to_lead: f64,
    #[serde(default)]
    pub quote_transparency: f64,
    #[serde(default)]
    pub phone_etiquette: f64,
    #[serde(default)]
    pub chat_responsiveness: f64,
    #[serde(default)]
    pub appointment_set_rate: f64,
    #[serde(default)]
    pub follow_up: f64,
}

const W_SPEED_TO_LEAD: f64 = 0.25;
const W_QUOTE_TRANSPARENCY: f64 = 0.20;
const W_PHONE_ETIQUETTE: f64 = 0.15;
const W_CHAT_RESPONSIVENESS: f64 = 0.15;
const W_APPOINTMENT_SET_RATE: f64 = 0.15;
const W_FOLLOW_UP: f64 = 0.10;

pub fn score_mystery(m: &MysteryMetrics) -> f64 {
    clamp_score(weighted_sum(&[
        (m.speed_to_lead, W_SPEED_TO_LEAD),
        (m.quote_transparency, W_QUOTE_TRANSPARENCY),
        (m.phone_etiquette, W_PHONE_ETIQUETTE),
        (m.chat_responsiveness, W_CHAT_RESPONSIVENESS),
        (m.appointment_set_rate, W_APPOINTMENT_SET_RATE),
        (m.follow_up, W_FOLLOW_UP),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let total = W_SPEED_TO_LEAD
            + W_QUOTE_TRANSPARENCY
            + W_PHONE_ETIQUETTE
            + W_CHAT_RESPONSIVENESS
            + W_APPOINTMENT_SET_RATE
            + W_FOLLOW_UP;
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn speed_to_lead_dominates() {
        let fast = score_mystery(&MysteryMetrics {
            speed_to_lead: 100.0,
            ..Default::default()
        });
        let follow = score_mystery(&MysteryMetrics {
            follow_up: 100.0,
            ..Default::default()
        });
        assert!(fast > follow);
    }

    #[test]
    fn clamps() {
        let hi = MysteryMetrics {
            speed_to_lead: 300.0,
            quote_transparency: 300.0,
            phone_etiquette: 300.0,
            chat_responsiveness: 300.0,
            appointment_set_rate: 300.0,
            follow_up: 300.0,
        };
        assert_eq!(score_mystery(&hi), 100.0);
        let lo = MysteryMetrics {
            speed_to_lead: -10.0,
            ..Default::default()
        };
        assert_eq!(score_mystery(&lo), 0.0);
    }
}
