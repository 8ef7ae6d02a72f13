use std::fmt::Debug;
use std::hash::Hash;

use crate::config::*;

/// A vote schema: which choices are allowed, how they are named and scored,
/// and how a region summary is turned into a map color.
///
/// The two provided domains are [YesNo] and [SafetyRating]. They are separate
/// configurations of the same ledger and cannot be mixed in one ledger.
pub trait ChoiceDomain {
    type Choice: Copy + Eq + Hash + Ord + Debug;

    fn name() -> &'static str;

    /// All the allowed choices, in display order.
    fn choices() -> Vec<Self::Choice>;

    fn validate(choice: &Self::Choice) -> Result<(), RegionVotingError>;

    /// Parses a choice typed by a voter or read from a file.
    fn parse_choice(raw: &str) -> Result<Self::Choice, RegionVotingError>;

    fn label(choice: &Self::Choice) -> String;

    /// The numeric value of a choice when computing the regional mean.
    /// Domains that return `None` have no mean.
    fn score(choice: &Self::Choice) -> Option<u8>;

    fn classify(summary: &RegionSummary) -> ColorClass;

    fn fill_color(class: ColorClass) -> &'static str;
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum YesNoChoice {
    Yes,
    No,
}

/// Binary vote. A region is colored by strict majority of `Yes`.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct YesNo;

impl ChoiceDomain for YesNo {
    type Choice = YesNoChoice;

    fn name() -> &'static str {
        "yes-no"
    }

    fn choices() -> Vec<YesNoChoice> {
        vec![YesNoChoice::Yes, YesNoChoice::No]
    }

    fn validate(_choice: &YesNoChoice) -> Result<(), RegionVotingError> {
        Ok(())
    }

    fn parse_choice(raw: &str) -> Result<YesNoChoice, RegionVotingError> {
        match raw.trim().to_lowercase().as_str() {
            "yes" | "y" => Ok(YesNoChoice::Yes),
            "no" | "n" => Ok(YesNoChoice::No),
            _ => Err(RegionVotingError::InvalidChoice(raw.trim().to_string())),
        }
    }

    fn label(choice: &YesNoChoice) -> String {
        match choice {
            YesNoChoice::Yes => "Yes".to_string(),
            YesNoChoice::No => "No".to_string(),
        }
    }

    fn score(_choice: &YesNoChoice) -> Option<u8> {
        None
    }

    fn classify(summary: &RegionSummary) -> ColorClass {
        if summary.total == 0 {
            ColorClass::Neutral
        } else if summary.count("Yes") > summary.count("No") {
            ColorClass::YesMajority
        } else {
            ColorClass::NoMajority
        }
    }

    fn fill_color(class: ColorClass) -> &'static str {
        match class {
            ColorClass::YesMajority => "blue",
            ColorClass::NoMajority => "red",
            _ => "gray",
        }
    }
}

/// Safety rating from 1 (unsafe) to 5 (safe). A region is colored by the
/// mean of its ratings.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct SafetyRating;

impl SafetyRating {
    pub const MIN_RATING: u8 = 1;
    pub const MAX_RATING: u8 = 5;
    /// Regions rated strictly below this mean are flagged.
    pub const WARNING_BELOW: f64 = 3.0;
}

impl ChoiceDomain for SafetyRating {
    type Choice = u8;

    fn name() -> &'static str {
        "safety-rating"
    }

    fn choices() -> Vec<u8> {
        (Self::MIN_RATING..=Self::MAX_RATING).collect()
    }

    fn validate(choice: &u8) -> Result<(), RegionVotingError> {
        if (Self::MIN_RATING..=Self::MAX_RATING).contains(choice) {
            Ok(())
        } else {
            Err(RegionVotingError::InvalidChoice(choice.to_string()))
        }
    }

    fn parse_choice(raw: &str) -> Result<u8, RegionVotingError> {
        let choice = raw
            .trim()
            .parse::<u8>()
            .map_err(|_| RegionVotingError::InvalidChoice(raw.trim().to_string()))?;
        Self::validate(&choice)?;
        Ok(choice)
    }

    fn label(choice: &u8) -> String {
        choice.to_string()
    }

    fn score(choice: &u8) -> Option<u8> {
        Some(*choice)
    }

    fn classify(summary: &RegionSummary) -> ColorClass {
        match summary.average {
            Some(avg) if avg <= 0.0 => ColorClass::Neutral,
            Some(avg) if avg < Self::WARNING_BELOW => ColorClass::Warning,
            Some(_) => ColorClass::Safe,
            None => ColorClass::Neutral,
        }
    }

    fn fill_color(class: ColorClass) -> &'static str {
        match class {
            ColorClass::Warning => "yellow",
            ColorClass::Safe => "green",
            _ => "blue",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(counts: &[(&str, u64)], average: Option<f64>) -> RegionSummary {
        RegionSummary {
            region_id: RegionId::from("r"),
            counts: counts.iter().map(|(l, c)| (l.to_string(), *c)).collect(),
            total: counts.iter().map(|(_, c)| *c).sum(),
            average,
        }
    }

    #[test]
    fn yes_no_parsing() {
        assert_eq!(YesNo::parse_choice("Yes"), Ok(YesNoChoice::Yes));
        assert_eq!(YesNo::parse_choice(" no "), Ok(YesNoChoice::No));
        assert_eq!(
            YesNo::parse_choice("maybe"),
            Err(RegionVotingError::InvalidChoice("maybe".to_string()))
        );
    }

    #[test]
    fn yes_no_majority() {
        let s = summary(&[("Yes", 3), ("No", 1)], None);
        assert_eq!(YesNo::classify(&s), ColorClass::YesMajority);
        let s = summary(&[("Yes", 2), ("No", 2)], None);
        assert_eq!(YesNo::classify(&s), ColorClass::NoMajority);
        let s = summary(&[("Yes", 0), ("No", 0)], None);
        assert_eq!(YesNo::classify(&s), ColorClass::Neutral);
        assert_eq!(YesNo::fill_color(ColorClass::Neutral), "gray");
    }

    #[test]
    fn rating_range() {
        assert!(SafetyRating::validate(&1).is_ok());
        assert!(SafetyRating::validate(&5).is_ok());
        assert_eq!(
            SafetyRating::validate(&0),
            Err(RegionVotingError::InvalidChoice("0".to_string()))
        );
        assert_eq!(
            SafetyRating::parse_choice("6"),
            Err(RegionVotingError::InvalidChoice("6".to_string()))
        );
        assert!(SafetyRating::parse_choice("-1").is_err());
        assert!(SafetyRating::parse_choice("three").is_err());
        assert_eq!(SafetyRating::parse_choice(" 4"), Ok(4));
    }

    #[test]
    fn rating_thresholds() {
        assert_eq!(
            SafetyRating::classify(&summary(&[], Some(0.0))),
            ColorClass::Neutral
        );
        assert_eq!(
            SafetyRating::classify(&summary(&[("1", 1)], Some(1.0))),
            ColorClass::Warning
        );
        assert_eq!(
            SafetyRating::classify(&summary(&[("2", 1), ("3", 1)], Some(2.999))),
            ColorClass::Warning
        );
        assert_eq!(
            SafetyRating::classify(&summary(&[("3", 1)], Some(3.0))),
            ColorClass::Safe
        );
        assert_eq!(SafetyRating::fill_color(ColorClass::Neutral), "blue");
        assert_eq!(SafetyRating::fill_color(ColorClass::Warning), "yellow");
        assert_eq!(SafetyRating::fill_color(ColorClass::Safe), "green");
    }
}
