//! Policy statistics collection and reporting.
//!
//! This module tracks the outcome of a trace replay for one policy
//! instance. It provides:
//! 1. **Counters:** Operations, hits, misses, evictions, admissions, and
//!    their weighted variants.
//! 2. **Penalties:** Accumulated hit/miss service latencies, the average
//!    penalty per request, and the P99 hit penalty.
//! 3. **Estimation accuracy:** Aggregates over (real, estimated) miss
//!    penalty pairs (mean error, standard deviation, MSE, MAPE).
//! 4. **Adaption:** The net window-size movement of the adaptive policy.
//!
//! Output is either a human-readable section dump (`print_sections`) or a
//! serializable [`StatsSummary`].

use rustc_hash::FxHashMap;
use serde::Serialize;

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"penalties"`, `"admission"`,
/// `"accuracy"`. Pass an empty slice to `print_sections` for a full dump.
pub const STATS_SECTIONS: &[&str] = &["summary", "penalties", "admission", "accuracy"];

/// Running aggregates over (real, estimated) miss-penalty pairs.
#[derive(Clone, Debug, Default)]
struct AccuracyStats {
    count: u64,
    error_sum: f64,
    error_sq_sum: f64,
    ape_sum: f64,
    ape_count: u64,
}

/// Statistics gathered while one policy replays a trace.
#[derive(Clone, Debug)]
pub struct PolicyStats {
    name: String,
    /// Total record calls, including dropped events.
    pub operation_count: u64,
    /// Requests serviced from the cache.
    pub hit_count: u64,
    /// Requests that missed (or were discarded on touch).
    pub miss_count: u64,
    /// Total weight of hitting requests.
    pub hits_weight: u64,
    /// Total weight of missing requests.
    pub misses_weight: u64,
    /// Entries removed to make room.
    pub eviction_count: u64,
    /// Candidates the admittor preferred over the victim.
    pub admitted_count: u64,
    /// Candidates the admittor turned away.
    pub rejected_count: u64,
    /// Accumulated hit service latency.
    pub hit_penalty_sum: f64,
    /// Accumulated miss service latency.
    pub miss_penalty_sum: f64,
    /// Net window movement of the adaptive policy, as a fraction of
    /// capacity.
    pub percent_adaption: f64,
    // Hit-penalty histogram keyed by the f64 bit pattern; penalties in a
    // trace repeat, so this stays small.
    penalty_counts: FxHashMap<u64, u64>,
    accuracy: AccuracyStats,
}

/// Serializable snapshot of the derived statistics.
#[derive(Clone, Debug, Serialize)]
pub struct StatsSummary {
    pub policy: String,
    pub requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub weighted_hit_rate: f64,
    pub evictions: u64,
    pub admit_rate: f64,
    pub average_penalty: f64,
    pub average_hit_penalty: f64,
    pub average_miss_penalty: f64,
    pub p99_hit_penalty: f64,
    pub accuracy_mean: f64,
    pub accuracy_std: f64,
    pub mse: f64,
    pub mape: f64,
    pub percent_adaption: f64,
}

impl PolicyStats {
    /// Creates an empty collector labeled with the policy's display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operation_count: 0,
            hit_count: 0,
            miss_count: 0,
            hits_weight: 0,
            misses_weight: 0,
            eviction_count: 0,
            admitted_count: 0,
            rejected_count: 0,
            hit_penalty_sum: 0.0,
            miss_penalty_sum: 0.0,
            percent_adaption: 0.0,
            penalty_counts: FxHashMap::default(),
            accuracy: AccuracyStats::default(),
        }
    }

    /// The policy's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record_operation(&mut self) {
        self.operation_count += 1;
    }

    pub fn record_hit(&mut self) {
        self.hit_count += 1;
    }

    /// Records a hit carrying the entry's weight.
    pub fn record_weighted_hit(&mut self, weight: u32) {
        self.hits_weight += u64::from(weight);
        self.record_hit();
    }

    pub fn record_miss(&mut self) {
        self.miss_count += 1;
    }

    /// Records a miss carrying the entry's weight.
    pub fn record_weighted_miss(&mut self, weight: u32) {
        self.misses_weight += u64::from(weight);
        self.record_miss();
    }

    pub fn record_eviction(&mut self) {
        self.eviction_count += 1;
    }

    pub fn record_admission(&mut self) {
        self.admitted_count += 1;
    }

    pub fn record_rejection(&mut self) {
        self.rejected_count += 1;
    }

    /// Accumulates the latency of a serviced hit.
    pub fn record_hit_penalty(&mut self, penalty: f64) {
        self.hit_penalty_sum += penalty;
        *self.penalty_counts.entry(penalty.to_bits()).or_insert(0) += 1;
    }

    /// Accumulates the latency of a serviced miss.
    pub fn record_miss_penalty(&mut self, penalty: f64) {
        self.miss_penalty_sum += penalty;
    }

    /// Accumulates one (real, estimated) miss-penalty observation.
    pub fn record_approx_accuracy(&mut self, real: f64, estimated: f64) {
        let error = real - estimated;
        self.accuracy.count += 1;
        self.accuracy.error_sum += error;
        self.accuracy.error_sq_sum += error * error;
        if real != 0.0 {
            self.accuracy.ape_sum += (error / real).abs();
            self.accuracy.ape_count += 1;
        }
    }

    /// Records the adaptive policy's net window movement.
    pub fn set_percent_adaption(&mut self, percent: f64) {
        self.percent_adaption = percent;
    }

    /// Hits plus misses.
    pub fn request_count(&self) -> u64 {
        self.hit_count + self.miss_count
    }

    /// Fraction of requests serviced from the cache.
    pub fn hit_rate(&self) -> f64 {
        let requests = self.request_count();
        if requests == 0 {
            0.0
        } else {
            self.hit_count as f64 / requests as f64
        }
    }

    /// Weight-weighted hit fraction.
    pub fn weighted_hit_rate(&self) -> f64 {
        let total = self.hits_weight + self.misses_weight;
        if total == 0 {
            0.0
        } else {
            self.hits_weight as f64 / total as f64
        }
    }

    /// Fraction of arbitrated candidates that won admission.
    pub fn admission_rate(&self) -> f64 {
        let total = self.admitted_count + self.rejected_count;
        if total == 0 {
            0.0
        } else {
            self.admitted_count as f64 / total as f64
        }
    }

    /// Mean service latency across all requests.
    pub fn average_penalty(&self) -> f64 {
        let requests = self.request_count();
        if requests == 0 {
            0.0
        } else {
            (self.hit_penalty_sum + self.miss_penalty_sum) / requests as f64
        }
    }

    /// Mean service latency of hits.
    pub fn average_hit_penalty(&self) -> f64 {
        if self.hit_count == 0 {
            0.0
        } else {
            self.hit_penalty_sum / self.hit_count as f64
        }
    }

    /// Mean service latency of misses.
    pub fn average_miss_penalty(&self) -> f64 {
        if self.miss_count == 0 {
            0.0
        } else {
            self.miss_penalty_sum / self.miss_count as f64
        }
    }

    /// The 99th percentile of observed hit penalties.
    ///
    /// The percentile index is the truncated 99% of the observation
    /// count; the result is the smallest penalty whose running count
    /// reaches that index. With fewer than two observations the index
    /// truncates to zero and the percentile reports 0.
    pub fn p99_hit_penalty(&self) -> f64 {
        let total: u64 = self.penalty_counts.values().sum();
        if total == 0 {
            return 0.0;
        }
        let mut entries: Vec<(f64, u64)> = self
            .penalty_counts
            .iter()
            .map(|(&bits, &count)| (f64::from_bits(bits), count))
            .collect();
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));

        let threshold = (0.99 * total as f64) as u64;
        let mut cumulative = 0;
        for (penalty, count) in entries {
            if cumulative >= threshold {
                break;
            }
            cumulative += count;
            if cumulative >= threshold {
                return penalty;
            }
        }
        0.0
    }

    /// Mean signed error between real and estimated miss penalties.
    pub fn accuracy_mean(&self) -> f64 {
        if self.accuracy.count == 0 {
            0.0
        } else {
            self.accuracy.error_sum / self.accuracy.count as f64
        }
    }

    /// Standard deviation of the estimation error.
    pub fn accuracy_std(&self) -> f64 {
        if self.accuracy.count == 0 {
            return 0.0;
        }
        let mean = self.accuracy_mean();
        let variance = self.accuracy.error_sq_sum / self.accuracy.count as f64 - mean * mean;
        variance.max(0.0).sqrt()
    }

    /// Mean squared estimation error.
    pub fn mse(&self) -> f64 {
        if self.accuracy.count == 0 {
            0.0
        } else {
            self.accuracy.error_sq_sum / self.accuracy.count as f64
        }
    }

    /// Mean absolute percentage error of the miss-penalty estimate.
    pub fn mape(&self) -> f64 {
        if self.accuracy.ape_count == 0 {
            0.0
        } else {
            100.0 * self.accuracy.ape_sum / self.accuracy.ape_count as f64
        }
    }

    /// Builds a serializable snapshot of the derived statistics.
    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            policy: self.name.clone(),
            requests: self.request_count(),
            hits: self.hit_count,
            misses: self.miss_count,
            hit_rate: self.hit_rate(),
            weighted_hit_rate: self.weighted_hit_rate(),
            evictions: self.eviction_count,
            admit_rate: self.admission_rate(),
            average_penalty: self.average_penalty(),
            average_hit_penalty: self.average_hit_penalty(),
            average_miss_penalty: self.average_miss_penalty(),
            p99_hit_penalty: self.p99_hit_penalty(),
            accuracy_mean: self.accuracy_mean(),
            accuracy_std: self.accuracy_std(),
            mse: self.mse(),
            mape: self.mape(),
            percent_adaption: self.percent_adaption,
        }
    }

    /// Prints the full stats dump to stdout.
    pub fn print(&self) {
        self.print_sections(&[]);
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// Each element of `sections` should be one of the names in
    /// [`STATS_SECTIONS`]. Pass an empty slice to print everything.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);

        println!("\n==========================================================");
        println!("{}", self.name);
        println!("==========================================================");
        if want("summary") {
            println!("requests                 {}", self.request_count());
            println!("hits                     {}", self.hit_count);
            println!("misses                   {}", self.miss_count);
            println!("hit_rate                 {:.4}", self.hit_rate());
            println!("weighted_hit_rate        {:.4}", self.weighted_hit_rate());
            println!("evictions                {}", self.eviction_count);
            println!("operations               {}", self.operation_count);
            println!("----------------------------------------------------------");
        }
        if want("penalties") {
            println!("PENALTIES");
            println!("  avg_penalty            {:.4}", self.average_penalty());
            println!("  avg_hit_penalty        {:.4}", self.average_hit_penalty());
            println!("  avg_miss_penalty       {:.4}", self.average_miss_penalty());
            println!("  p99_hit_penalty        {:.4}", self.p99_hit_penalty());
            println!("----------------------------------------------------------");
        }
        if want("admission") {
            println!("ADMISSION");
            println!("  admitted               {}", self.admitted_count);
            println!("  rejected               {}", self.rejected_count);
            println!("  admit_rate             {:.4}", self.admission_rate());
            println!(
                "  adaption               {:.2}%",
                100.0 * self.percent_adaption
            );
            println!("----------------------------------------------------------");
        }
        if want("accuracy") && self.accuracy.count > 0 {
            println!("ESTIMATION ACCURACY");
            println!("  mean_error             {:.4}", self.accuracy_mean());
            println!("  std_error              {:.4}", self.accuracy_std());
            println!("  mse                    {:.4}", self.mse());
            println!("  mape                   {:.2}%", self.mape());
            println!("----------------------------------------------------------");
        }
    }
}
