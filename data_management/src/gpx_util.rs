use std::{io::Read, path::Path};

use anyhow::Context;
use chrono::{DateTime, FixedOffset};
use distance_tracker_lib::{distance::distance_km, geo_point::Sample};

pub fn read_gpx(path: &Path) -> anyhow::Result<Vec<Vec<Sample>>> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    read_samples(std::io::BufReader::new(file)).with_context(|| format!("Failed to parse {:?}", path))
}

/// Location samples grouped per track segment, in file order. A segment break
/// is a pause in recording, so nothing is carried across it.
/// Speed comes from the waypoint's own speed when present, otherwise it is
/// derived from the distance and time since the previous waypoint.
pub fn read_samples(reader: impl Read) -> anyhow::Result<Vec<Vec<Sample>>> {
    let gpx = gpx::read(reader)?;

    let mut segments = Vec::new();

    for track in gpx.tracks {
        for segment in track.segments {
            let mut samples = Vec::with_capacity(segment.points.len());
            let mut previous: Option<(Sample, Option<DateTime<FixedOffset>>)> = None;

            for waypoint in segment.points {
                let point = waypoint.point();
                let time = match waypoint.time {
                    Some(time) => Some(DateTime::parse_from_rfc3339(&time.format()?)?),
                    None => None,
                };

                let mut sample = Sample::at(point.y(), point.x());
                let speed = waypoint.speed.or_else(|| {
                    let (prev, prev_time) = previous.as_ref()?;
                    derived_speed_mps(prev, (*prev_time)?, &sample, time?)
                });
                sample.speed_mps = speed;

                previous = Some((sample, time));
                samples.push(sample);
            }

            segments.push(samples);
        }
    }

    tracing::debug!(
        "Read {} samples in {} segments from GPX",
        segments.iter().map(Vec::len).sum::<usize>(),
        segments.len()
    );
    Ok(segments)
}

fn derived_speed_mps(
    from: &Sample,
    from_time: DateTime<FixedOffset>,
    to: &Sample,
    to_time: DateTime<FixedOffset>,
) -> Option<f64> {
    let elapsed_ms = (to_time - from_time).num_milliseconds();
    if elapsed_ms <= 0 {
        return None;
    }

    Some(distance_km(from.point, to.point) * 1000. / (elapsed_ms as f64 / 1000.))
}
