use serde::Serialize;

use super::{MetricAverages, MetricValues};

/// Rolling statistics over the most recent readings. Aggregates are `null` when
/// the window is empty.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct Summary {
    pub count: usize,
    pub rolling_average: Option<MetricAverages>,
    pub min: Option<MetricValues>,
    pub max: Option<MetricValues>,
}

impl Summary {
    pub fn empty() -> Self {
        Self {
            count: 0,
            rolling_average: None,
            min: None,
            max: None,
        }
    }
}

#[derive(Default)]
struct Totals {
    thermal: u64,
    battery: u64,
    memory: u64,
}

/// Reduces at most `window_size` readings, taken from the front of `readings`.
///
/// Callers supply readings newest first; anything past the window is never
/// consumed. Inputs are trusted to be validated already.
pub fn summarize<I>(readings: I, window_size: usize) -> Summary
where
    I: IntoIterator<Item = MetricValues>,
{
    let mut window = readings.into_iter().take(window_size);
    let Some(first) = window.next() else {
        return Summary::empty();
    };

    let mut min = first;
    let mut max = first;
    let mut totals = Totals::default();
    let mut count = 0usize;

    for reading in std::iter::once(first).chain(window) {
        totals.thermal += u64::from(reading.thermal);
        totals.battery += u64::from(reading.battery);
        totals.memory += u64::from(reading.memory);

        min.thermal = min.thermal.min(reading.thermal);
        min.battery = min.battery.min(reading.battery);
        min.memory = min.memory.min(reading.memory);

        max.thermal = max.thermal.max(reading.thermal);
        max.battery = max.battery.max(reading.battery);
        max.memory = max.memory.max(reading.memory);

        count += 1;
    }

    let divisor = count as f64;
    Summary {
        count,
        rolling_average: Some(MetricAverages {
            thermal: totals.thermal as f64 / divisor,
            battery: totals.battery as f64 / divisor,
            memory: totals.memory as f64 / divisor,
        }),
        min: Some(min),
        max: Some(max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(thermal: u8, battery: u8, memory: u8) -> MetricValues {
        MetricValues {
            thermal,
            battery,
            memory,
        }
    }

    #[test]
    fn empty_input_yields_null_aggregates() {
        let summary = summarize(Vec::new(), 10);
        assert_eq!(summary, Summary::empty());

        let json = serde_json::to_value(&summary).expect("json");
        assert_eq!(
            json,
            serde_json::json!({
                "count": 0,
                "rolling_average": null,
                "min": null,
                "max": null,
            })
        );
    }

    #[test]
    fn two_readings_average_and_extrema() {
        let summary = summarize(vec![reading(1, 50, 40), reading(3, 70, 60)], 10);

        assert_eq!(summary.count, 2);
        assert_eq!(
            summary.rolling_average,
            Some(MetricAverages {
                thermal: 2.0,
                battery: 60.0,
                memory: 50.0,
            })
        );
        assert_eq!(summary.min, Some(reading(1, 50, 40)));
        assert_eq!(summary.max, Some(reading(3, 70, 60)));
    }

    #[test]
    fn averages_use_real_division() {
        let summary = summarize(vec![reading(0, 1, 100), reading(1, 2, 99)], 10);
        let average = summary.rolling_average.expect("average");
        assert_eq!(average.thermal, 0.5);
        assert_eq!(average.battery, 1.5);
        assert_eq!(average.memory, 99.5);
    }

    #[test]
    fn extrema_are_tracked_per_metric() {
        let summary = summarize(
            vec![reading(3, 10, 80), reading(0, 90, 50), reading(2, 40, 20)],
            10,
        );
        assert_eq!(summary.min, Some(reading(0, 10, 20)));
        assert_eq!(summary.max, Some(reading(3, 90, 80)));
    }

    #[test]
    fn readings_past_the_window_are_ignored() {
        let recent = vec![reading(1, 50, 40), reading(2, 60, 50), reading(1, 55, 45)];
        let mut with_tail = recent.clone();
        with_tail.extend([reading(3, 0, 100), reading(0, 100, 0)]);

        let windowed = summarize(with_tail, 3);
        assert_eq!(windowed, summarize(recent, 3));
        assert_eq!(windowed.count, 3);
        assert_eq!(windowed.max.map(|max| max.thermal), Some(2));
    }

    #[test]
    fn window_larger_than_input_uses_everything() {
        let summary = summarize(vec![reading(2, 20, 30)], 10);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.min, summary.max);
        assert_eq!(
            summary.rolling_average,
            Some(MetricAverages {
                thermal: 2.0,
                battery: 20.0,
                memory: 30.0,
            })
        );
    }

    #[test]
    fn zero_window_is_empty() {
        assert_eq!(summarize(vec![reading(1, 1, 1)], 0), Summary::empty());
    }

    #[test]
    fn averages_stay_within_extrema() {
        let readings: Vec<MetricValues> = (0..25u32)
            .map(|i| reading((i % 4) as u8, ((i * 7) % 101) as u8, ((i * 13) % 101) as u8))
            .collect();
        let summary = summarize(readings.clone(), 10);
        let (avg, min, max) = (
            summary.rolling_average.expect("avg"),
            summary.min.expect("min"),
            summary.max.expect("max"),
        );

        assert_eq!(summary.count, 10);
        for r in &readings[..10] {
            assert!(min.thermal <= r.thermal && r.thermal <= max.thermal);
            assert!(min.battery <= r.battery && r.battery <= max.battery);
            assert!(min.memory <= r.memory && r.memory <= max.memory);
        }
        assert!(f64::from(min.thermal) <= avg.thermal && avg.thermal <= f64::from(max.thermal));
        assert!(f64::from(min.battery) <= avg.battery && avg.battery <= f64::from(max.battery));
        assert!(f64::from(min.memory) <= avg.memory && avg.memory <= f64::from(max.memory));

        assert_eq!(summarize(readings.clone(), 10), summary);
    }
}
