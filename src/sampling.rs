//! Stochastic sampling services used by the ward model.
//!
//! The model only depends on the [`ArrivalSampler`] and [`LosSampler`] traits. The default
//! implementations are a thinning sampler for the non-stationary arrival process and a lognormal
//! length-of-stay sampler. Each draws from its own seeded stream so that runs are reproducible.
use crate::arrivals::ArrivalRateTable;
use anyhow::{Result, ensure};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, LogNormal};
use std::error::Error;
use std::fmt;

/// Samples the time until the next arrival
pub trait ArrivalSampler {
    /// Sample the gap (hours) between `simulation_time` and the next arrival
    fn sample(&mut self, simulation_time: f64) -> f64;
}

/// Samples a length of stay
pub trait LosSampler {
    /// Sample a length of stay (hours)
    fn sample(&mut self) -> f64;
}

/// The independent random number streams used in a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Candidate arrival gaps
    Arrivals,
    /// Acceptance draws for thinning
    Thinning,
    /// Short-stay lengths of stay
    ShortLos,
    /// Long-stay lengths of stay
    LongLos,
    /// Pathway classification and overnight delays
    Routing,
}

/// Derive the seed for one stream of one run.
///
/// Seeds are spread with a SplitMix64 step so that neighbouring runs and streams do not start from
/// neighbouring states.
pub fn stream_seed(random_number_set: u64, run_number: u32, stream: Stream) -> u64 {
    let mut z = random_number_set
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(u64::from(run_number) << 8)
        .wrapping_add(stream as u64);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Create the random number generator for one stream of one run
pub fn stream_rng(random_number_set: u64, run_number: u32, stream: Stream) -> StdRng {
    StdRng::seed_from_u64(stream_seed(random_number_set, run_number, stream))
}

/// Non-stationary Poisson process sampler using the thinning method.
///
/// Candidate arrivals are generated at the table's maximum rate and each one is kept with
/// probability `rate(candidate) / max_rate`.
pub struct NsppThinning {
    table: ArrivalRateTable,
    max_rate: f64,
    exp: Exp<f64>,
    arrival_rng: StdRng,
    thinning_rng: StdRng,
}

impl NsppThinning {
    /// Create a new sampler for the given arrival-rate table
    pub fn new(table: ArrivalRateTable, arrival_rng: StdRng, thinning_rng: StdRng) -> Result<Self> {
        let max_rate = table.max_rate();
        ensure!(
            max_rate.is_finite() && max_rate > 0.0,
            "Arrival-rate table must have a positive maximum rate"
        );
        let exp = Exp::new(max_rate)?;

        Ok(Self {
            table,
            max_rate,
            exp,
            arrival_rng,
            thinning_rng,
        })
    }
}

impl ArrivalSampler for NsppThinning {
    fn sample(&mut self, simulation_time: f64) -> f64 {
        let mut candidate = simulation_time;
        loop {
            candidate += self.exp.sample(&mut self.arrival_rng);
            let u: f64 = self.thinning_rng.random();
            if u <= self.table.rate_at(candidate) / self.max_rate {
                return candidate - simulation_time;
            }
        }
    }
}

/// Lognormal distribution parameterised by the mean and standard deviation of the samples
pub struct Lognormal {
    dist: LogNormal<f64>,
    rng: StdRng,
}

impl Lognormal {
    /// Create a lognormal sampler with the given mean and standard deviation
    pub fn new(mean: f64, stdev: f64, rng: StdRng) -> Result<Self> {
        let (mu, sigma) = lognormal_moments(mean, stdev);
        let dist = LogNormal::new(mu, sigma)?;

        Ok(Self { dist, rng })
    }
}

/// Convert a mean and standard deviation into the parameters of the underlying normal
fn lognormal_moments(mean: f64, stdev: f64) -> (f64, f64) {
    let variance = stdev.powi(2);
    let mu = (mean.powi(2) / (variance + mean.powi(2)).sqrt()).ln();
    let sigma = (1.0 + variance / mean.powi(2)).ln().sqrt();

    (mu, sigma)
}

impl LosSampler for Lognormal {
    fn sample(&mut self) -> f64 {
        self.dist.sample(&mut self.rng)
    }
}

/// A sampled duration which the simulation cannot use.
///
/// The scheduler can only advance with strictly positive, finite delays, so this is fatal to the
/// run in which it occurs.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerError {
    /// Which sampler produced the value
    pub sampler: &'static str,
    /// The offending value
    pub value: f64,
    /// The simulation time at which it was sampled
    pub time: f64,
}

impl fmt::Display for SamplerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} sampler returned invalid duration {} at time {}",
            self.sampler, self.value, self.time
        )
    }
}

impl Error for SamplerError {}

/// Check that a sampled duration is finite and positive
pub fn check_duration(sampler: &'static str, value: f64, time: f64) -> Result<f64, SamplerError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SamplerError {
            sampler,
            value,
            time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrivals::ArrivalRateRow;
    use float_cmp::assert_approx_eq;
    use itertools::Itertools;
    use rstest::rstest;

    fn table(mean_iats: &[f64]) -> ArrivalRateTable {
        ArrivalRateTable::new(
            mean_iats
                .iter()
                .enumerate()
                .map(|(t, &mean_iat)| ArrivalRateRow {
                    t: t as f64,
                    mean_iat,
                })
                .collect(),
        )
    }

    fn thinning(table: ArrivalRateTable, run_number: u32) -> NsppThinning {
        NsppThinning::new(
            table,
            stream_rng(42, run_number, Stream::Arrivals),
            stream_rng(42, run_number, Stream::Thinning),
        )
        .unwrap()
    }

    #[test]
    fn test_stream_seeds_distinct() {
        let streams = [
            Stream::Arrivals,
            Stream::Thinning,
            Stream::ShortLos,
            Stream::LongLos,
            Stream::Routing,
        ];
        let seeds = (0..10)
            .cartesian_product(streams)
            .map(|(run, stream)| stream_seed(42, run, stream))
            .collect_vec();
        assert!(seeds.iter().all_unique());

        // Same inputs, same seed
        assert_eq!(
            stream_seed(42, 3, Stream::Routing),
            stream_seed(42, 3, Stream::Routing)
        );
    }

    #[test]
    fn test_thinning_positive_and_reproducible() {
        let mut a = thinning(table(&[2.0, 0.5, 1.0]), 1);
        let mut b = thinning(table(&[2.0, 0.5, 1.0]), 1);
        let mut now = 0.0;
        for _ in 0..1000 {
            let gap = a.sample(now);
            assert!(gap > 0.0);
            assert_approx_eq!(f64, gap, b.sample(now));
            now += gap;
        }
    }

    #[test]
    fn test_thinning_different_runs_differ() {
        let mut a = thinning(table(&[1.0]), 0);
        let mut b = thinning(table(&[1.0]), 1);
        let gaps_a = (0..10).map(|_| a.sample(0.0)).collect_vec();
        let gaps_b = (0..10).map(|_| b.sample(0.0)).collect_vec();
        assert_ne!(gaps_a, gaps_b);
    }

    #[rstest]
    #[case(&[0.5])]
    #[case(&[2.0, 0.5])]
    fn test_thinning_long_run_rate(#[case] mean_iats: &[f64]) {
        // Average rate over whole cycles should match the table
        let table = table(mean_iats);
        let expected_rate = table.iter().map(ArrivalRateRow::arrival_rate).sum::<f64>()
            / table.len() as f64;
        let horizon = 20_000.0 * table.len() as f64;
        let mut sampler = thinning(table, 7);

        let mut now = 0.0;
        let mut count = 0u32;
        loop {
            now += sampler.sample(now);
            if now >= horizon {
                break;
            }
            count += 1;
        }

        let observed_rate = f64::from(count) / horizon;
        assert!(
            (observed_rate - expected_rate).abs() / expected_rate < 0.03,
            "observed {observed_rate}, expected {expected_rate}"
        );
    }

    #[test]
    fn test_thinning_follows_table() {
        // Arrivals should cluster in the busy half of each cycle
        let mut sampler = thinning(table(&[10.0, 0.5]), 3);
        let mut now = 0.0;
        let (mut quiet, mut busy) = (0u32, 0u32);
        while now < 10_000.0 {
            now += sampler.sample(now);
            if now.rem_euclid(2.0) < 1.0 {
                quiet += 1;
            } else {
                busy += 1;
            }
        }
        assert!(busy > 10 * quiet);
    }

    #[rstest]
    #[case(18.0, 5.0)]
    #[case(30.0, 5.0)]
    #[case(1.0, 0.1)]
    fn test_lognormal_moments(#[case] mean: f64, #[case] stdev: f64) {
        let mut sampler = Lognormal::new(mean, stdev, stream_rng(42, 0, Stream::ShortLos)).unwrap();
        let n = 50_000;
        let samples = (0..n).map(|_| sampler.sample()).collect_vec();
        assert!(samples.iter().all(|&x| x > 0.0 && x.is_finite()));

        let sample_mean = samples.iter().sum::<f64>() / f64::from(n);
        let sample_var =
            samples.iter().map(|x| (x - sample_mean).powi(2)).sum::<f64>() / f64::from(n - 1);
        assert!((sample_mean - mean).abs() / mean < 0.02);
        assert!((sample_var.sqrt() - stdev).abs() / stdev < 0.05);
    }

    #[test]
    fn test_lognormal_invalid() {
        assert!(Lognormal::new(18.0, f64::NAN, stream_rng(42, 0, Stream::ShortLos)).is_err());
    }

    #[rstest]
    #[case(1.0, true)]
    #[case(1e-12, true)]
    #[case(0.0, false)]
    #[case(-3.0, false)]
    #[case(f64::NAN, false)]
    #[case(f64::INFINITY, false)]
    fn test_check_duration(#[case] value: f64, #[case] expected_valid: bool) {
        let result = check_duration("test", value, 5.0);
        assert_eq!(result.is_ok(), expected_valid);
        if let Err(err) = result {
            assert_eq!(err.sampler, "test");
            assert!(err.to_string().contains("test sampler returned invalid duration"));
        }
    }
}
