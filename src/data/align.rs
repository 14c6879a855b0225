use super::model::{Batch, Channel};

// ---------------------------------------------------------------------------
// Curve aligner – selected batches → chart-ready (x, y) arrays
// ---------------------------------------------------------------------------

/// How the shared x-axis is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeAxisMode {
    /// Elapsed hours since each batch's own first reading in the chosen
    /// channel, so runs with different start dates overlay from zero.
    Relative,
    /// Raw wall-clock timestamps (Unix seconds); batches separate on the
    /// axis by real calendar time.
    Absolute,
}

impl TimeAxisMode {
    pub fn axis_label(&self) -> &'static str {
        match self {
            TimeAxisMode::Relative => "Hours since batch start",
            TimeAxisMode::Absolute => "Date / Time",
        }
    }
}

/// One batch's plot-ready curve. `y` is the untransformed channel values.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl AlignedSeries {
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Package the selected batches' series for plotting, in input order.
///
/// Reads the stored series, never mutates them. A batch whose chosen
/// channel has zero points contributes an empty series and leaves the
/// axis of the others untouched.
pub fn align(batches: &[&Batch], mode: TimeAxisMode, channel: Channel) -> Vec<AlignedSeries> {
    batches
        .iter()
        .map(|batch| {
            let series = batch.series(channel);
            let (x, y): (Vec<f64>, Vec<f64>) = match mode {
                TimeAxisMode::Absolute => series
                    .iter()
                    .map(|p| (p.timestamp.and_utc().timestamp() as f64, p.value))
                    .unzip(),
                TimeAxisMode::Relative => match series.first() {
                    // Series are sorted ascending, so the first point is
                    // the batch's own t-zero.
                    Some(first) => {
                        let start = first.timestamp;
                        series
                            .iter()
                            .map(|p| {
                                let hours =
                                    (p.timestamp - start).num_seconds() as f64 / 3600.0;
                                (hours, p.value)
                            })
                            .unzip()
                    }
                    None => (Vec::new(), Vec::new()),
                },
            };
            AlignedSeries {
                label: batch.label.clone(),
                x,
                y,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::SeriesPoint;
    use chrono::NaiveDate;

    fn point(h: u32, m: u32, value: f64) -> SeriesPoint {
        SeriesPoint {
            timestamp: NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap(),
            value,
        }
    }

    fn batch(label: &str, temperature: Vec<SeriesPoint>) -> Batch {
        Batch {
            label: label.to_string(),
            temperature,
            pressure: Vec::new(),
            source_filename: format!("{label}.csv"),
        }
    }

    #[test]
    fn relative_mode_counts_hours_from_each_batch_start() {
        let b = batch(
            "BA-01-25",
            vec![point(10, 0, 20.0), point(11, 0, 22.0), point(12, 0, 25.0)],
        );
        let aligned = align(&[&b], TimeAxisMode::Relative, Channel::Temperature);
        assert_eq!(aligned[0].x, vec![0.0, 1.0, 2.0]);
        assert_eq!(aligned[0].y, vec![20.0, 22.0, 25.0]);
    }

    #[test]
    fn relative_mode_overlays_batches_with_different_start_times() {
        let early = batch("EARLY", vec![point(8, 0, 1.0), point(8, 30, 2.0)]);
        let late = batch("LATE", vec![point(14, 0, 3.0), point(14, 30, 4.0)]);
        let aligned = align(&[&early, &late], TimeAxisMode::Relative, Channel::Temperature);
        assert_eq!(aligned[0].x, vec![0.0, 0.5]);
        assert_eq!(aligned[1].x, vec![0.0, 0.5]);
    }

    #[test]
    fn absolute_mode_keeps_raw_timestamps() {
        let b = batch("BA-01-25", vec![point(10, 0, 20.0), point(11, 0, 22.0)]);
        let aligned = align(&[&b], TimeAxisMode::Absolute, Channel::Temperature);
        assert_eq!(aligned[0].x[1] - aligned[0].x[0], 3600.0);
    }

    #[test]
    fn empty_channel_contributes_an_empty_series() {
        let full = batch("FULL", vec![point(10, 0, 20.0)]);
        let empty = batch("EMPTY", Vec::new());
        let aligned = align(&[&full, &empty], TimeAxisMode::Relative, Channel::Temperature);
        assert_eq!(aligned.len(), 2);
        assert!(!aligned[0].is_empty());
        assert!(aligned[1].is_empty());
        assert_eq!(aligned[1].label, "EMPTY");
    }

    #[test]
    fn pressure_channel_reads_the_pressure_series() {
        let mut b = batch("BA-01-25", vec![point(10, 0, 20.0)]);
        b.pressure = vec![point(10, 0, 1.1)];
        let aligned = align(&[&b], TimeAxisMode::Relative, Channel::Pressure);
        assert_eq!(aligned[0].y, vec![1.1]);
    }
}
