//! PrimeRehashPolicy: maps element counts to bucket counts drawn from a
//! fixed prime progression and decides when an insert must grow the table.

use crate::config::{DEFAULT_GROWTH_FACTOR, DEFAULT_MAX_LOAD_FACTOR};

/// Ascending primes roughly 8% apart, ending at the largest prime below
/// `u32::MAX`. Growth steps skip ahead by `growth_factor`, so consecutive
/// automatic bucket counts are about twice as large as the previous one.
#[rustfmt::skip]
pub const PRIMES: [u32; 256] = [
    2, 3, 5, 7, 11, 13, 17, 19,
    23, 29, 31, 37, 41, 43, 47, 53,
    59, 61, 67, 71, 73, 79, 83, 89,
    97, 103, 109, 113, 127, 137, 139, 149,
    157, 167, 179, 193, 199, 211, 227, 241,
    257, 277, 293, 313, 337, 359, 383, 409,
    439, 467, 503, 541, 577, 619, 661, 709,
    761, 823, 887, 953, 1031, 1109, 1193, 1289,
    1381, 1493, 1613, 1741, 1879, 2029, 2179, 2357,
    2549, 2753, 2971, 3209, 3469, 3739, 4027, 4349,
    4703, 5087, 5503, 5953, 6427, 6949, 7517, 8123,
    8783, 9497, 10273, 11113, 12011, 12983, 14033, 15173,
    16411, 17749, 19183, 20753, 22447, 24281, 26267, 28411,
    30727, 33223, 35933, 38873, 42043, 45481, 49201, 53201,
    57557, 62233, 67307, 72817, 78779, 85229, 92203, 99733,
    107897, 116731, 126271, 136607, 147793, 159871, 172933, 187091,
    202409, 218971, 236897, 256279, 277261, 299951, 324503, 351061,
    379787, 410857, 444487, 480881, 520241, 562841, 608903, 658753,
    712697, 771049, 834181, 902483, 976369, 1056323, 1142821, 1236397,
    1337629, 1447153, 1565659, 1693859, 1832561, 1982627, 2144977, 2320627,
    2510653, 2716249, 2938679, 3179303, 3439651, 3721303, 4026031, 4355707,
    4712381, 5098259, 5515729, 5967347, 6456007, 6984629, 7556579, 8175383,
    8844859, 9569143, 10352717, 11200489, 12117689, 13109983, 14183539, 15345007,
    16601593, 17961079, 19431899, 21023161, 22744717, 24607243, 26622317, 28802401,
    31160981, 33712729, 36473443, 39460231, 42691603, 46187573, 49969847, 54061849,
    58488943, 63278561, 68460391, 74066549, 80131819, 86693767, 93793069, 101473717,
    109783337, 118773397, 128499677, 139022417, 150406843, 162723577, 176048909, 190465427,
    206062531, 222936881, 241193053, 260944219, 282312799, 305431229, 330442829, 357502601,
    386778277, 418451333, 452718089, 489790921, 529899637, 573292817, 620239453, 671030513,
    725980837, 785430967, 849749479, 919334987, 994618837, 1076067617, 1164186217, 1259520799,
    1362662261, 1474249943, 1594975441, 1725587117, 1866894511, 2019773507, 2185171673, 2364114217,
    2557710269, 2767159799, 2993761039, 3238918481, 3504151727, 3791104843, 4101556399, 4294967291,
];

/// Smallest prime in `PRIMES` that is `>= n`, saturating at the last entry.
fn prime_at_least(n: usize) -> usize {
    let idx = PRIMES.partition_point(|&p| (p as usize) < n);
    PRIMES[idx.min(PRIMES.len() - 1)] as usize
}

/// Load-factor driven growth policy. Holds no per-element state; every
/// method is a pure function of its arguments and the two factors.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PrimeRehashPolicy {
    max_load_factor: f32,
    growth_factor: f32,
}

impl PrimeRehashPolicy {
    pub fn new(max_load_factor: f32) -> Self {
        Self {
            max_load_factor,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }

    pub fn with_growth_factor(self, growth_factor: f32) -> Self {
        Self {
            growth_factor,
            ..self
        }
    }

    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    pub fn growth_factor(&self) -> f32 {
        self.growth_factor
    }

    /// Bucket count for an explicit size request: the minimum of one bucket
    /// for hints below two, otherwise the smallest prime `>= hint`.
    pub fn bucket_count_for_hint(&self, hint: usize) -> usize {
        if hint <= 1 {
            1
        } else {
            prime_at_least(hint)
        }
    }

    /// Smallest prime `p` such that `max(current, requested) <= p * max_load_factor`.
    pub fn next_bucket_count(
        &self,
        current_element_count: usize,
        requested_element_count: usize,
    ) -> usize {
        let needed = current_element_count.max(requested_element_count);
        prime_at_least(self.min_buckets_for(needed))
    }

    /// Returns the bucket count to grow to when `elements_to_add` more
    /// elements would push the load factor past its maximum, `None` otherwise.
    ///
    /// The result is always strictly larger than `bucket_count`; once the
    /// progression is exhausted the table stops growing and chains lengthen.
    pub fn needs_rehash(
        &self,
        bucket_count: usize,
        element_count: usize,
        elements_to_add: usize,
    ) -> Option<usize> {
        let needed = element_count.saturating_add(elements_to_add);
        if needed as f64 <= bucket_count as f64 * self.max_load_factor as f64 {
            return None;
        }
        let by_growth = (bucket_count as f64 * self.growth_factor as f64).ceil() as usize;
        let prime = prime_at_least(self.min_buckets_for(needed).max(by_growth));
        (prime > bucket_count).then_some(prime)
    }

    fn min_buckets_for(&self, elements: usize) -> usize {
        (elements as f64 / self.max_load_factor as f64).ceil() as usize
    }
}

impl Default for PrimeRehashPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOAD_FACTOR)
    }
}
