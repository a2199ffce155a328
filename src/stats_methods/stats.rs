//all the methods of calculating averages and variances etc.

use crate::seir_model::DayCounts;

/// Mean, sample standard deviation (n - 1) and standard error of a
/// sequence of outcomes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeanStd
{
    pub mean: f64,
    pub std_dev: f64,
    pub std_error: f64,
    pub samples: usize
}

impl MeanStd{

    /// `None` for an empty slice. A single sample has zero spread.
    pub fn from_slice(slice: &[f64]) -> Option<Self>
    {
        if slice.is_empty(){
            return None;
        }
        let mean = calc_average(slice);
        let n = slice.len();
        let std_dev = if n > 1 {
            calc_variance(slice, mean).sqrt()
        } else {
            0.0
        };
        Some(
            Self{
                mean,
                std_dev,
                std_error: std_dev / (n as f64).sqrt(),
                samples: n
            }
        )
    }

    pub fn mean(&self) -> f64
    {
        self.mean
    }
}

/// `mean std_dev std_error` for a data line, NaN if there was no sample
pub fn stats_columns(stats: Option<MeanStd>) -> String
{
    match stats
    {
        Some(s) => format!("{} {} {}", s.mean, s.std_dev, s.std_error),
        None => "NaN NaN NaN".to_owned()
    }
}

pub fn calc_average(slice: &[f64]) -> f64
{
    slice.iter().sum::<f64>() / slice.len() as f64
}

/// Bessel corrected variance
pub fn calc_variance(slice: &[f64], average: f64) -> f64
{
    let var_sum: f64 = slice.iter()
        .map(|val| {
            let dif = average - val;
            dif * dif
        }).sum();

    var_sum / (slice.len() - 1) as f64
}

/// Collects one scalar per trial (or per seed vertex).
#[derive(Clone, Debug, Default)]
pub struct TrialAggregator
{
    values: Vec<f64>
}

impl TrialAggregator{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn push(&mut self, value: f64)
    {
        self.values.push(value);
    }

    pub fn len(&self) -> usize
    {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64]
    {
        &self.values
    }

    pub fn stats(&self) -> Option<MeanStd>
    {
        MeanStd::from_slice(&self.values)
    }
}

/// Per-day S, E, I, R series of unequal length. Day `d` is averaged over
/// the trials that lasted at least until `d`.
#[derive(Clone, Debug, Default)]
pub struct DailyAggregator
{
    days: Vec<[TrialAggregator; 4]>
}

impl DailyAggregator{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn push_curve(&mut self, curve: &[DayCounts])
    {
        if self.days.len() < curve.len(){
            self.days.resize_with(curve.len(), Default::default);
        }
        for (day, counts) in self.days.iter_mut().zip(curve)
        {
            for (agg, val) in day.iter_mut().zip(counts.as_array())
            {
                agg.push(val);
            }
        }
    }

    /// number of days of the longest curve
    pub fn len(&self) -> usize
    {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.days.is_empty()
    }

    /// how many trials reached `day`
    pub fn reached(&self, day: usize) -> usize
    {
        self.days.get(day)
            .map(|d| d[0].len())
            .unwrap_or(0)
    }

    /// S, E, I, R statistics of one day
    pub fn day_stats(&self, day: usize) -> Option<[MeanStd; 4]>
    {
        let day = self.days.get(day)?;
        let [s, e, i, r] = day;
        Some([s.stats()?, e.stats()?, i.stats()?, r.stats()?])
    }

    pub fn iter_stats(&self) -> impl Iterator<Item = [MeanStd; 4]> + '_
    {
        (0..self.days.len()).filter_map(|day| self.day_stats(day))
    }

    /// mean curve, one entry per day
    pub fn mean_curve(&self) -> Vec<DayCounts>
    {
        self.iter_stats()
            .map(|[s, e, i, r]| DayCounts{
                s: s.mean,
                e: e.mean,
                i: i.mean,
                r: r.mean
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(s: f64, i: f64) -> DayCounts
    {
        DayCounts{s, e: 0.0, i, r: 0.0}
    }

    #[test]
    fn mean_std_error()
    {
        let stats = MeanStd::from_slice(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.mean, 5.0);
        // sum of squares 32, n - 1 = 7
        assert!((stats.std_dev - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert!((stats.std_error - stats.std_dev / 8.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.samples, 8);
    }

    #[test]
    fn degenerate_inputs()
    {
        assert_eq!(MeanStd::from_slice(&[]), None);
        let one = MeanStd::from_slice(&[3.5]).unwrap();
        assert_eq!((one.mean, one.std_dev, one.std_error), (3.5, 0.0, 0.0));
        assert!(TrialAggregator::new().stats().is_none());
        assert_eq!(stats_columns(None), "NaN NaN NaN");
        assert_eq!(stats_columns(Some(one)), "3.5 0 0");
    }

    #[test]
    fn unequal_curves_average_over_survivors()
    {
        let mut daily = DailyAggregator::new();
        daily.push_curve(&[counts(4.0, 1.0), counts(3.0, 2.0)]);
        daily.push_curve(&[counts(2.0, 1.0), counts(1.0, 1.0), counts(0.0, 4.0)]);

        assert_eq!(daily.len(), 3);
        assert_eq!(daily.reached(2), 1);
        assert_eq!(daily.reached(7), 0);

        let mean = daily.mean_curve();
        assert_eq!(mean[0].s, 3.0);
        assert_eq!(mean[1].i, 1.5);
        // only the longer trial reached day 2
        assert_eq!(mean[2].s, 0.0);
        assert_eq!(mean[2].i, 4.0);
        assert_eq!(daily.day_stats(2).unwrap()[2].std_dev, 0.0);
    }
}
