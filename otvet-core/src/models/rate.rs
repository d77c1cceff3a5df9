//! The service's user rank ladder.
//!
//! Ranks are a fixed table published by the service: each rank has a
//! minimum points threshold and, for the two special high ranks, a minimum
//! kpd (best-answer percentage). The table is data; rank progression is
//! derived from it on demand.

use serde::Serialize;

/// A user rank on the service's ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rate {
    /// Display name of the rank, as the service spells it.
    pub name: &'static str,
    /// Points required to hold this rank.
    pub min_points: u32,
    /// Best-answer percentage required to hold this rank.
    pub min_kpd: f64,
}

/// The full ladder, ordered by (points, kpd) threshold.
pub const RATES: [Rate; 13] = [
    Rate { name: "Новичок", min_points: 0, min_kpd: 0.0 },
    Rate { name: "Ученик", min_points: 1, min_kpd: 0.0 },
    Rate { name: "Знаток", min_points: 250, min_kpd: 0.0 },
    Rate { name: "Профи", min_points: 500, min_kpd: 0.0 },
    Rate { name: "Мастер", min_points: 1000, min_kpd: 0.0 },
    Rate { name: "Гуру", min_points: 2500, min_kpd: 0.0 },
    Rate { name: "Мыслитель", min_points: 5000, min_kpd: 0.0 },
    Rate { name: "Мудрец", min_points: 10000, min_kpd: 0.0 },
    Rate { name: "Просветленный", min_points: 20000, min_kpd: 0.0 },
    Rate { name: "Оракул", min_points: 50000, min_kpd: 0.0 },
    Rate { name: "Гений", min_points: 50000, min_kpd: 25.0 },
    Rate { name: "Искусственный Интеллект", min_points: 100000, min_kpd: 0.0 },
    Rate { name: "Высший разум", min_points: 100000, min_kpd: 30.0 },
];

impl Rate {
    /// Sort key for ladder ordering.
    fn threshold(&self) -> (u32, f64) {
        (self.min_points, self.min_kpd)
    }

    /// The highest rank a user with the given stats holds.
    pub fn by_user_stats(points: u32, kpd: f64) -> Rate {
        RATES
            .iter()
            .filter(|r| r.min_points <= points && r.min_kpd <= kpd)
            .fold(RATES[0], |best, r| {
                if r.threshold() > best.threshold() { *r } else { best }
            })
    }

    /// Look a rank up by its display name, case-insensitively.
    pub fn by_name(name: &str) -> Option<Rate> {
        let wanted = name.to_lowercase();
        RATES.iter().find(|r| r.name.to_lowercase() == wanted).copied()
    }

    /// The next rank up the points ladder, if any.
    pub fn next(&self) -> Option<Rate> {
        RATES
            .iter()
            .filter(|r| r.min_points > self.min_points)
            .min_by(|a, b| {
                a.min_points
                    .cmp(&b.min_points)
                    .then(a.min_kpd.total_cmp(&b.min_kpd))
            })
            .copied()
    }

    /// The next rank reachable by raising kpd alone, if any.
    pub fn next_by_kpd(&self) -> Option<Rate> {
        RATES
            .iter()
            .filter(|r| r.min_points == self.min_points && r.min_kpd > self.min_kpd)
            .min_by(|a, b| a.min_kpd.total_cmp(&b.min_kpd))
            .copied()
    }
}
