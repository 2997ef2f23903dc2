use std::time::Duration;

use rand::Rng;

/// How strongly a silence was asked for, as reported by the action planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SilenceCase {
    Low,
    Medium,
    /// Explicitly asked to be quiet, optionally for a given number of seconds.
    Serious(Option<String>),
    Other,
}

impl SilenceCase {
    pub fn from_action(case: &str, time: Option<&str>) -> Self {
        match case {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "serious" => Self::Serious(
                time.map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
            ),
            _ => Self::Other,
        }
    }
}

/// Picks a silence duration for `case`; `None` means indefinite.
pub fn duration_for<R: Rng + ?Sized>(case: &SilenceCase, rng: &mut R) -> Option<Duration> {
    let secs = match case {
        SilenceCase::Low => rng.random_range(300..=600),
        SilenceCase::Medium => rng.random_range(600..=1800),
        SilenceCase::Serious(None) => return None,
        SilenceCase::Serious(Some(time)) => {
            match time.parse::<f64>().ok().and_then(|s| Duration::try_from_secs_f64(s).ok()) {
                Some(requested) => return Some(requested),
                None => rng.random_range(1800..=5400),
            }
        }
        SilenceCase::Other => rng.random_range(1800..=5400),
    };
    Some(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn secs(case: &SilenceCase, rng: &mut StdRng) -> u64 {
        duration_for(case, rng).map(|d| d.as_secs()).unwrap()
    }

    #[test]
    fn test_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            assert!((300..=600).contains(&secs(&SilenceCase::Low, &mut rng)));
            assert!((600..=1800).contains(&secs(&SilenceCase::Medium, &mut rng)));
            assert!((1800..=5400).contains(&secs(&SilenceCase::Other, &mut rng)));
        }
    }

    #[test]
    fn test_serious() {
        let mut rng = StdRng::seed_from_u64(7);
        let case = SilenceCase::from_action("serious", Some("120"));
        assert_eq!(duration_for(&case, &mut rng), Some(Duration::from_secs(120)));

        let case = SilenceCase::from_action("serious", None);
        assert_eq!(duration_for(&case, &mut rng), None);
        let case = SilenceCase::from_action("serious", Some("  "));
        assert_eq!(duration_for(&case, &mut rng), None);

        let case = SilenceCase::from_action("serious", Some("a while"));
        assert!((1800..=5400).contains(&secs(&case, &mut rng)));
        let case = SilenceCase::from_action("serious", Some("-5"));
        assert!((1800..=5400).contains(&secs(&case, &mut rng)));
    }

    #[test]
    fn test_from_action() {
        assert_eq!(SilenceCase::from_action("low", Some("10")), SilenceCase::Low);
        assert_eq!(SilenceCase::from_action("medium", None), SilenceCase::Medium);
        assert_eq!(SilenceCase::from_action("", None), SilenceCase::Other);
    }
}
