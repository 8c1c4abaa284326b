use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Место в зале. Ряды и места нумеруются с 1, ряд 1 - первый ряд у экрана.
///
/// Порядок сравнения - построчный (сначала ряд, потом номер), поэтому
/// `BTreeSet<SeatId>` всегда отдает места в порядке рассадки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatId {
    pub row: u16,
    pub number: u16,
}

impl SeatId {
    pub const fn new(row: u16, number: u16) -> Self {
        Self { row, number }
    }

    pub fn is_front_row(&self) -> bool {
        self.row == 1
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}-S{}", self.row, self.number)
    }
}

/// Сеанс фильма: конкретное время, зал и фиксированная рассадка `rows x seats_per_row`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Showing {
    pub id: String,
    pub movie_id: String,
    pub starts_at: NaiveDateTime,
    pub auditorium: String,
    pub rows: u16,
    pub seats_per_row: u16,
}

impl Showing {
    pub fn capacity(&self) -> usize {
        usize::from(self.rows) * usize::from(self.seats_per_row)
    }

    pub fn contains(&self, seat: SeatId) -> bool {
        (1..=self.rows).contains(&seat.row) && (1..=self.seats_per_row).contains(&seat.number)
    }

    pub fn seats(&self) -> impl Iterator<Item = SeatId> + '_ {
        (1..=self.rows).flat_map(move |row| (1..=self.seats_per_row).map(move |number| SeatId::new(row, number)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn showing(rows: u16, seats_per_row: u16) -> Showing {
        Showing {
            id: "s1".to_string(),
            movie_id: "m1".to_string(),
            starts_at: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap().and_hms_opt(19, 0, 0).unwrap(),
            auditorium: "Hall 1".to_string(),
            rows,
            seats_per_row,
        }
    }

    #[test]
    fn seats_are_row_major() {
        let seats: Vec<_> = showing(2, 2).seats().collect();
        assert_eq!(
            seats,
            vec![SeatId::new(1, 1), SeatId::new(1, 2), SeatId::new(2, 1), SeatId::new(2, 2)]
        );
    }

    #[test]
    fn contains_rejects_zero_and_out_of_range() {
        let s = showing(5, 10);
        assert_eq!(s.capacity(), 50);
        assert!(s.contains(SeatId::new(5, 10)));
        assert!(!s.contains(SeatId::new(0, 1)));
        assert!(!s.contains(SeatId::new(1, 0)));
        assert!(!s.contains(SeatId::new(6, 1)));
        assert!(!s.contains(SeatId::new(1, 11)));
    }

    #[test]
    fn seat_display() {
        assert_eq!(SeatId::new(3, 7).to_string(), "R3-S7");
    }
}
