//! Free-for-all Bayesian skill update.
//!
//! Each participant is a one-player team. Skills feed performances, adjacent
//! performances in rank order feed a difference, and each difference is
//! truncated by the observed outcome: a win when the ranks differ, a draw
//! when they are equal. Messages are passed over that chain until it settles,
//! then sent back to the skills.

use serde::{Deserialize, Serialize};

use super::gaussian::{Gaussian, cdf, pdf, ppf};

const MAX_ITERATIONS: usize = 10;
const MIN_DELTA: f64 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingConfig {
    /// Initial mean of a new player.
    pub mu: f64,
    /// Initial uncertainty of a new player.
    pub sigma: f64,
    /// Distance that guarantees about a 76% chance of winning.
    pub beta: f64,
    /// Dynamic factor added to sigma before each update.
    pub tau: f64,
    pub draw_probability: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        let mu = 25.0;
        let sigma = mu / 3.0;
        Self {
            mu,
            sigma,
            beta: sigma / 2.0,
            tau: sigma / 100.0,
            draw_probability: 0.10,
        }
    }
}

impl RatingConfig {
    pub fn baseline(&self) -> Rating {
        Rating {
            mu: self.mu,
            sigma: self.sigma,
        }
    }

    /// Margin inside which two one-player performances count as a draw.
    fn draw_margin(&self) -> f64 {
        ppf((self.draw_probability + 1.0) / 2.0) * 2f64.sqrt() * self.beta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub mu: f64,
    pub sigma: f64,
}

impl Rating {
    /// Conservative skill estimate.
    pub fn exposure(&self) -> f64 {
        self.mu - 3.0 * self.sigma
    }
}

/// A variable node: its marginal plus one incoming message per attached factor.
#[derive(Debug, Clone, Copy)]
struct Variable<const N: usize> {
    value: Gaussian,
    messages: [Gaussian; N],
}

impl<const N: usize> Default for Variable<N> {
    fn default() -> Self {
        Self {
            value: Gaussian::default(),
            messages: [Gaussian::default(); N],
        }
    }
}

impl<const N: usize> Variable<N> {
    fn set(&mut self, value: Gaussian) -> f64 {
        let delta = self.value.delta(&value);
        self.value = value;
        delta
    }

    /// Replaces one factor's message and folds it into the marginal.
    fn update_message(&mut self, slot: usize, message: Gaussian) -> f64 {
        let old = self.messages[slot];
        self.messages[slot] = message;
        self.set(self.value / old * message)
    }

    /// Sets the marginal directly and back-computes the factor's message.
    fn update_value(&mut self, slot: usize, value: Gaussian) -> f64 {
        let old = self.messages[slot];
        self.messages[slot] = value * old / self.value;
        self.set(value)
    }

    /// The marginal without this factor's own contribution.
    fn cavity(&self, slot: usize) -> Gaussian {
        self.value / self.messages[slot]
    }
}

// skill slots
const PRIOR: usize = 0;
const SKILL_LIKELIHOOD: usize = 1;
// performance slots: perf[i] feeds diff[i - 1] and diff[i]
const PERF_LIKELIHOOD: usize = 0;
const PREV_DIFF: usize = 1;
const NEXT_DIFF: usize = 2;
// difference slots
const SUM: usize = 0;
const TRUNCATE: usize = 1;

struct Chain<'a> {
    config: &'a RatingConfig,
    draw_margin: f64,
    draws: Vec<bool>,
    skills: Vec<Variable<2>>,
    perfs: Vec<Variable<3>>,
    diffs: Vec<Variable<2>>,
}

impl<'a> Chain<'a> {
    fn new(config: &'a RatingConfig, ordered: &[(Rating, u32)]) -> Self {
        let n = ordered.len();
        Self {
            config,
            draw_margin: config.draw_margin(),
            draws: ordered.windows(2).map(|w| w[0].1 == w[1].1).collect(),
            skills: vec![Variable::default(); n],
            perfs: vec![Variable::default(); n],
            diffs: vec![Variable::default(); n.saturating_sub(1)],
        }
    }

    fn likelihood_message(&self, from: Gaussian) -> Gaussian {
        let a = 1.0 / (1.0 + self.config.beta.powi(2) * from.pi);
        Gaussian::new(a * from.pi, a * from.tau)
    }

    /// Weighted sum of the operands' cavities, as a message.
    fn sum_message(operands: &[(Gaussian, f64)]) -> Gaussian {
        let mut mu = 0.0;
        let mut pi_inv = 0.0;
        for (cavity, coeff) in operands {
            mu += coeff * cavity.mu();
            if pi_inv == f64::INFINITY {
                continue;
            }
            if cavity.pi == 0.0 {
                pi_inv = f64::INFINITY;
            } else {
                pi_inv += coeff.powi(2) / cavity.pi;
            }
        }
        let pi = 1.0 / pi_inv;
        Gaussian::new(pi, pi * mu)
    }

    /// diff[i] = perf[i] - perf[i + 1]
    fn diff_down(&mut self, i: usize) {
        let message = Self::sum_message(&[
            (self.perfs[i].cavity(NEXT_DIFF), 1.0),
            (self.perfs[i + 1].cavity(PREV_DIFF), -1.0),
        ]);
        self.diffs[i].update_message(SUM, message);
    }

    /// perf[i] = diff[i] + perf[i + 1]
    fn diff_up_first(&mut self, i: usize) {
        let message = Self::sum_message(&[
            (self.diffs[i].cavity(SUM), 1.0),
            (self.perfs[i + 1].cavity(PREV_DIFF), 1.0),
        ]);
        self.perfs[i].update_message(NEXT_DIFF, message);
    }

    /// perf[i + 1] = perf[i] - diff[i]
    fn diff_up_second(&mut self, i: usize) {
        let message = Self::sum_message(&[
            (self.perfs[i].cavity(NEXT_DIFF), 1.0),
            (self.diffs[i].cavity(SUM), -1.0),
        ]);
        self.perfs[i + 1].update_message(PREV_DIFF, message);
    }

    fn truncate(&mut self, i: usize) -> f64 {
        let cavity = self.diffs[i].cavity(TRUNCATE);
        let sqrt_pi = cavity.pi.sqrt();
        let diff = cavity.tau / sqrt_pi;
        let margin = self.draw_margin * sqrt_pi;

        let (v, w) = if self.draws[i] {
            (v_draw(diff, margin), w_draw(diff, margin))
        } else {
            (v_win(diff, margin), w_win(diff, margin))
        };

        let denom = 1.0 - w;
        let value = Gaussian::new(cavity.pi / denom, (cavity.tau + sqrt_pi * v) / denom);
        self.diffs[i].update_value(TRUNCATE, value)
    }

    fn run(&mut self, ordered: &[(Rating, u32)]) {
        for (i, (rating, _)) in ordered.iter().enumerate() {
            let sigma = (rating.sigma.powi(2) + self.config.tau.powi(2)).sqrt();
            self.skills[i].update_value(PRIOR, Gaussian::from_mu_sigma(rating.mu, sigma));
        }

        for i in 0..self.skills.len() {
            let message = self.likelihood_message(self.skills[i].cavity(SKILL_LIKELIHOOD));
            self.perfs[i].update_message(PERF_LIKELIHOOD, message);
        }

        let last = self.diffs.len() - 1;
        if last == 0 {
            self.diff_down(0);
            self.truncate(0);
        } else {
            for _ in 0..MAX_ITERATIONS {
                let mut delta: f64 = 0.0;
                for i in 0..last {
                    self.diff_down(i);
                    delta = delta.max(self.truncate(i));
                    self.diff_up_second(i);
                }
                for i in (1..=last).rev() {
                    self.diff_down(i);
                    delta = delta.max(self.truncate(i));
                    self.diff_up_first(i);
                }
                if delta <= MIN_DELTA {
                    break;
                }
            }
        }
        self.diff_up_first(0);
        self.diff_up_second(last);

        for i in 0..self.perfs.len() {
            let message = self.likelihood_message(self.perfs[i].cavity(PERF_LIKELIHOOD));
            self.skills[i].update_message(SKILL_LIKELIHOOD, message);
        }
    }
}

/// Updates every participant's rating from one ranked outcome.
///
/// `ranked` pairs each prior rating with its rank (1 is best; equal ranks are
/// draws). The result is in the same order as the input. Fewer than two
/// participants carry no information and come back unchanged.
pub fn rate(config: &RatingConfig, ranked: &[(Rating, u32)]) -> Vec<Rating> {
    if ranked.len() < 2 {
        return ranked.iter().map(|(r, _)| *r).collect();
    }

    let mut order: Vec<usize> = (0..ranked.len()).collect();
    order.sort_by_key(|&i| ranked[i].1);
    let ordered: Vec<(Rating, u32)> = order.iter().map(|&i| ranked[i]).collect();

    let mut chain = Chain::new(config, &ordered);
    chain.run(&ordered);

    let mut result = vec![config.baseline(); ranked.len()];
    for (position, &original) in order.iter().enumerate() {
        let value = chain.skills[position].value;
        result[original] = Rating {
            mu: value.mu(),
            sigma: value.sigma(),
        };
    }
    result
}

fn v_win(diff: f64, margin: f64) -> f64 {
    let x = diff - margin;
    let denom = cdf(x);
    if denom > 0.0 { pdf(x) / denom } else { -x }
}

fn w_win(diff: f64, margin: f64) -> f64 {
    let x = diff - margin;
    let v = v_win(diff, margin);
    // Only leaves (0, 1) when the outcome is far outside the prior's reach.
    (v * (v + x)).clamp(f64::EPSILON, 1.0 - f64::EPSILON)
}

fn v_draw(diff: f64, margin: f64) -> f64 {
    let abs_diff = diff.abs();
    let a = margin - abs_diff;
    let b = -margin - abs_diff;
    let denom = cdf(a) - cdf(b);
    let numer = pdf(b) - pdf(a);
    let v = if denom > 0.0 { numer / denom } else { a };
    if diff < 0.0 { -v } else { v }
}

fn w_draw(diff: f64, margin: f64) -> f64 {
    let abs_diff = diff.abs();
    let a = margin - abs_diff;
    let b = -margin - abs_diff;
    let denom = cdf(a) - cdf(b);
    if denom <= 0.0 {
        return 1.0 - f64::EPSILON;
    }
    let v = v_draw(abs_diff, margin);
    (v * v + (a * pdf(a) - b * pdf(b)) / denom).clamp(f64::EPSILON, 1.0 - f64::EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    #[test]
    fn test_default_config() {
        let config = RatingConfig::default();
        assert!(close(config.sigma, 8.333, 0.001));
        assert!(close(config.beta, 4.1667, 0.001));
    }

    #[test]
    fn test_head_to_head_win() {
        let config = RatingConfig::default();
        let base = config.baseline();

        let rated = rate(&config, &[(base, 1), (base, 2)]);

        // Reference values for a 1v1 between two fresh players.
        assert!(close(rated[0].mu, 29.396, 0.01), "{:?}", rated[0]);
        assert!(close(rated[0].sigma, 7.171, 0.01), "{:?}", rated[0]);
        assert!(close(rated[1].mu, 20.604, 0.01), "{:?}", rated[1]);
        assert!(close(rated[1].sigma, 7.171, 0.01), "{:?}", rated[1]);
    }

    #[test]
    fn test_head_to_head_draw_keeps_means() {
        let config = RatingConfig::default();
        let base = config.baseline();

        let rated = rate(&config, &[(base, 1), (base, 1)]);

        assert!(close(rated[0].mu, 25.0, 0.001));
        assert!(close(rated[1].mu, 25.0, 0.001));
        assert!(rated[0].sigma < base.sigma);
    }

    #[test]
    fn test_free_for_all_orders_means_by_rank() {
        let config = RatingConfig::default();
        let base = config.baseline();

        let rated = rate(&config, &[(base, 3), (base, 1), (base, 2), (base, 4)]);

        assert!(rated[1].mu > rated[2].mu);
        assert!(rated[2].mu > rated[0].mu);
        assert!(rated[0].mu > rated[3].mu);
        assert!(rated[1].mu > base.mu);
        assert!(rated[3].mu < base.mu);
        for r in &rated {
            assert!(r.sigma < base.sigma);
        }
    }

    #[test]
    fn test_ties_share_the_update() {
        let config = RatingConfig::default();
        let base = config.baseline();

        let rated = rate(&config, &[(base, 1), (base, 2), (base, 2)]);

        let tied_gap = (rated[1].mu - rated[2].mu).abs();
        let lead = rated[0].mu - rated[1].mu.max(rated[2].mu);
        assert!(lead > 0.0);
        assert!(tied_gap < lead);
    }

    #[test]
    fn test_single_participant_is_unchanged() {
        let config = RatingConfig::default();
        let base = config.baseline();
        assert_eq!(rate(&config, &[(base, 1)]), vec![base]);
        assert!(rate(&config, &[]).is_empty());
    }

    #[test]
    fn test_upset_moves_more_than_expected_win() {
        let config = RatingConfig::default();
        let strong = Rating { mu: 35.0, sigma: 4.0 };
        let weak = Rating { mu: 15.0, sigma: 4.0 };

        let expected = rate(&config, &[(strong, 1), (weak, 2)]);
        let upset = rate(&config, &[(strong, 2), (weak, 1)]);

        let expected_gain = expected[0].mu - strong.mu;
        let upset_gain = upset[1].mu - weak.mu;
        assert!(upset_gain > expected_gain);
    }

    #[test]
    fn test_repeated_wins_never_lower_the_winner() {
        let config = RatingConfig::default();
        let mut winner = config.baseline();
        let mut others = [config.baseline(), config.baseline()];

        for _ in 0..30 {
            let rated = rate(&config, &[(winner, 1), (others[0], 2), (others[1], 3)]);
            assert!(rated[0].mu >= winner.mu);
            winner = rated[0];
            others = [rated[1], rated[2]];
        }
    }
}
