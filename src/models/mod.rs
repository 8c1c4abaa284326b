pub mod movie;
pub mod showing;
pub mod reservation;

pub use movie::Movie;
pub use showing::{SeatId, Showing};
pub use reservation::{Reservation, ReservationStatus};
