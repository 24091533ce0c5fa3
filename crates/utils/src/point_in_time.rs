//! Point-in-time mapping of release-dated data.

use ikaros_primitives::{Date, TimeSeries};

use crate::UtilsError;

/// Map release-dated values onto trading dates without look-ahead.
///
/// The value at trading date `d` is the latest release dated strictly before
/// `d`; a release becomes usable the day after it is published. Trading dates
/// before the first release are left out.
///
/// # Errors
/// Returns `UtilsError::Primitives` if `trading_dates` is not strictly
/// increasing.
pub fn point_in_time(
    releases: &TimeSeries,
    trading_dates: &[Date],
) -> Result<TimeSeries, UtilsError> {
    let release_dates = releases.dates();
    let values = releases.values();
    let mut next = 0;
    let mut pairs = Vec::with_capacity(trading_dates.len());
    for &date in trading_dates {
        while next < release_dates.len() && release_dates[next] < date {
            next += 1;
        }
        if next > 0 {
            pairs.push((date, values[next - 1]));
        }
    }
    Ok(TimeSeries::from_pairs(pairs)?)
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rstest::rstest;

    use super::*;

    fn day(m: u32, d: u32) -> Date {
        Date::from_ymd_opt(2024, m, d).unwrap()
    }

    fn quarterly() -> TimeSeries {
        TimeSeries::new(vec![day(2, 15), day(5, 10), day(8, 9)], array![100.0, 110.0, 125.0])
            .unwrap()
    }

    #[rstest]
    #[case(day(2, 14), None)]
    #[case(day(2, 15), None)]
    #[case(day(2, 16), Some(100.0))]
    #[case(day(5, 10), Some(100.0))]
    #[case(day(5, 13), Some(110.0))]
    #[case(day(12, 31), Some(125.0))]
    fn uses_latest_release_strictly_before(#[case] date: Date, #[case] expected: Option<f64>) {
        let mapped = point_in_time(&quarterly(), &[date]).unwrap();
        assert_eq!(mapped.get(date), expected);
    }

    #[test]
    fn maps_a_full_calendar() {
        let calendar: Vec<Date> = day(2, 1).iter_days().take(120).collect();
        let mapped = point_in_time(&quarterly(), &calendar).unwrap();
        // 2024-02-16 onward.
        assert_eq!(mapped.dates()[0], day(2, 16));
        assert_eq!(mapped.len(), 120 - 15);
        assert_eq!(mapped.get(day(5, 11)), Some(110.0));
    }

    #[test]
    fn empty_releases_give_empty_series() {
        assert!(point_in_time(&TimeSeries::empty(), &[day(1, 2)]).unwrap().is_empty());
    }

    #[test]
    fn unsorted_calendar_is_rejected() {
        let result = point_in_time(&quarterly(), &[day(6, 2), day(6, 1)]);
        assert!(matches!(result, Err(UtilsError::Primitives(_))));
    }
}
