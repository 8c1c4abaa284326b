use serde::{Deserialize, Serialize};

use crate::models::SeatId;

/// Верхняя граница цены одного места (база + надбавка).
pub const MAX_SEAT_PRICE: i64 = 1_000_000_000;

/// Правила цены билета. Цены в целых денежных единицах.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub base_price: i64,
    /// Надбавка за первый ряд.
    pub front_row_surcharge: i64,
    pub student_discount_percent: u8,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            base_price: 100,
            front_row_surcharge: 50,
            student_discount_percent: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatPrice {
    pub seat: SeatId,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub showing_id: String,
    pub student: bool,
    pub seats: Vec<SeatPrice>,
    pub total: i64,
}

impl PricingPolicy {
    /// Цена одного места. Арифметика насыщающая: политика, собранная в обход
    /// конфигурации, не может переполнить `i64`.
    pub fn seat_price(&self, seat: SeatId, student: bool) -> i64 {
        let mut price = self.base_price;
        if seat.is_front_row() {
            price = price.saturating_add(self.front_row_surcharge);
        }
        if student {
            let percent = i64::from(100 - self.student_discount_percent.min(100));
            price = round_half_even(price.saturating_mul(percent), 100);
        }
        price
    }

    pub fn quote<'a>(&self, showing_id: &str, seats: impl IntoIterator<Item = &'a SeatId>, student: bool) -> Quote {
        let seats: Vec<SeatPrice> = seats
            .into_iter()
            .map(|&seat| SeatPrice {
                seat,
                price: self.seat_price(seat, student),
            })
            .collect();
        let total = seats.iter().fold(0i64, |acc, s| acc.saturating_add(s.price));
        Quote {
            showing_id: showing_id.to_string(),
            student,
            seats,
            total,
        }
    }
}

// Банковское округление: половина к чётному
fn round_half_even(value: i64, divisor: i64) -> i64 {
    let quotient = value.div_euclid(divisor);
    let remainder = value.rem_euclid(divisor) * 2;
    if remainder > divisor || (remainder == divisor && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    }
}
