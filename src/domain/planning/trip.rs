//! TripAttributes - the caller-owned input to the planning pipeline.

use chrono::NaiveDate;

use crate::domain::foundation::ValidationError;

/// Structured attributes of a requested trip.
///
/// Immutable once constructed; all invariants are checked in [`TripAttributes::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripAttributes {
    destination: String,
    purpose: String,
    party_count: u32,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl TripAttributes {
    /// Creates validated trip attributes.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if destination or purpose is blank
    /// - `TooSmall` if the party count is below 1
    /// - `InvalidFormat` if the end date precedes the start date
    pub fn new(
        destination: impl Into<String>,
        purpose: impl Into<String>,
        party_count: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let destination = destination.into().trim().to_string();
        if destination.is_empty() {
            return Err(ValidationError::empty_field("destination"));
        }

        let purpose = purpose.into().trim().to_string();
        if purpose.is_empty() {
            return Err(ValidationError::empty_field("purpose"));
        }

        if party_count < 1 {
            return Err(ValidationError::too_small("people_count", 1, party_count));
        }
        let party_count = u32::try_from(party_count)
            .map_err(|_| ValidationError::invalid_format("people_count", "too large"))?;

        if end_date < start_date {
            return Err(ValidationError::invalid_format(
                "end_date",
                "must not be before start_date",
            ));
        }

        Ok(Self {
            destination,
            purpose,
            party_count,
            start_date,
            end_date,
        })
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn party_count(&self) -> u32 {
        self.party_count
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Number of calendar days covered, counting both ends.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Renders the stage-1 planning content.
    ///
    /// Field order is fixed: destination, purpose, party size, start date, end date.
    /// The output is a pure function of the attributes.
    pub fn planning_content(&self) -> String {
        format!(
            "[Destination] {}\n[Purpose] {}\n[Party size] {}\n[Start date] {}\n[End date] {}",
            self.destination,
            self.purpose,
            self.party_count,
            self.start_date.format("%Y-%m-%d"),
            self.end_date.format("%Y-%m-%d"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn busan() -> TripAttributes {
        TripAttributes::new("Busan", "family vacation", 4, date(2025, 5, 1), date(2025, 5, 4))
            .unwrap()
    }

    #[test]
    fn new_trims_text_fields() {
        let trip =
            TripAttributes::new("  Busan ", " family vacation\n", 4, date(2025, 5, 1), date(2025, 5, 4))
                .unwrap();
        assert_eq!(trip.destination(), "Busan");
        assert_eq!(trip.purpose(), "family vacation");
    }

    #[test]
    fn new_rejects_blank_destination() {
        let err = TripAttributes::new("   ", "rest", 1, date(2025, 5, 1), date(2025, 5, 1)).unwrap_err();
        assert_eq!(err, ValidationError::empty_field("destination"));
    }

    #[test]
    fn new_rejects_blank_purpose() {
        let err = TripAttributes::new("Jeju", "", 1, date(2025, 5, 1), date(2025, 5, 1)).unwrap_err();
        assert_eq!(err, ValidationError::empty_field("purpose"));
    }

    #[test]
    fn new_rejects_empty_party() {
        let err = TripAttributes::new("Jeju", "rest", 0, date(2025, 5, 1), date(2025, 5, 1)).unwrap_err();
        assert!(matches!(err, ValidationError::TooSmall { min: 1, actual: 0, .. }));
    }

    #[test]
    fn new_rejects_inverted_dates() {
        let err = TripAttributes::new("Jeju", "rest", 2, date(2025, 5, 4), date(2025, 5, 1)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { ref field, .. } if field == "end_date"));
    }

    #[test]
    fn single_day_trip_is_allowed() {
        let trip = TripAttributes::new("Jeju", "rest", 1, date(2025, 5, 1), date(2025, 5, 1)).unwrap();
        assert_eq!(trip.duration_days(), 1);
    }

    #[test]
    fn duration_counts_both_ends() {
        assert_eq!(busan().duration_days(), 4);
    }

    #[test]
    fn planning_content_uses_fixed_field_order() {
        assert_eq!(
            busan().planning_content(),
            "[Destination] Busan\n\
             [Purpose] family vacation\n\
             [Party size] 4\n\
             [Start date] 2025-05-01\n\
             [End date] 2025-05-04"
        );
    }

    proptest! {
        #[test]
        fn planning_content_is_a_pure_function_of_input(
            destination in "[A-Za-z][A-Za-z ]{0,20}",
            purpose in "[a-z][a-z ]{0,30}",
            party in 1i64..50,
            offset in 0i64..30,
        ) {
            let start = date(2025, 1, 1);
            let end = start + chrono::Duration::days(offset);
            let a = TripAttributes::new(destination.clone(), purpose.clone(), party, start, end).unwrap();
            let b = TripAttributes::new(destination, purpose, party, start, end).unwrap();

            prop_assert_eq!(a.planning_content(), a.planning_content());
            prop_assert_eq!(a.planning_content(), b.planning_content());
        }
    }
}
