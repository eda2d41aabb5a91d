use crate::model::Target;
use crate::prelude::{TrackError, TrackResult};
use serde::{Deserialize, Serialize};

/// External representation of a reconstructed target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub start_time: f64,
    pub speed: f64,
    /// Waypoints as `[lat, lon]` pairs.
    pub path: Vec<[f64; 2]>,
}

impl From<&Target> for TargetRecord {
    fn from(target: &Target) -> Self {
        Self {
            start_time: target.start_time(),
            speed: target.speed(),
            path: target.path().iter().map(|&p| p.into()).collect(),
        }
    }
}

impl TryFrom<TargetRecord> for Target {
    type Error = TrackError;

    fn try_from(record: TargetRecord) -> TrackResult<Self> {
        Target::new(
            record.start_time,
            record.speed,
            record.path.into_iter().map(Into::into).collect(),
        )
    }
}

impl TargetRecord {
    pub fn to_json(&self) -> TrackResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> TrackResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::geo::GeoPoint;

    #[test]
    fn target_survives_wire_round_trip() {
        let target = Target::new(
            1_700_000_000.5,
            231.75,
            vec![
                GeoPoint::new(45.361285195897885, 33.90794799044153),
                GeoPoint::new(47.487079766379715, 33.081535775384715),
                GeoPoint::new(49.47728424495352, 27.901909920451157),
            ],
        )
        .unwrap();

        let json = TargetRecord::from(&target).to_json().unwrap();
        let decoded = Target::try_from(TargetRecord::from_json(&json).unwrap()).unwrap();

        assert_eq!(decoded.start_time(), target.start_time());
        assert_eq!(decoded.speed(), target.speed());
        assert_eq!(decoded.path(), target.path());
    }

    #[test]
    fn wire_shape_is_nested_pairs() {
        let json = r#"{"start_time": 10, "speed": 200.0, "path": [[1.0, 2.0], [3.0, 4.0]]}"#;
        let record = TargetRecord::from_json(json).unwrap();
        assert_eq!(record.path, vec![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(record.start_time, 10.0);
    }

    #[test]
    fn invalid_record_is_rejected() {
        let record = TargetRecord {
            start_time: 0.0,
            speed: -1.0,
            path: vec![[0.0, 0.0], [1.0, 1.0]],
        };
        assert!(matches!(
            Target::try_from(record),
            Err(TrackError::InvalidTarget(_))
        ));
    }
}
