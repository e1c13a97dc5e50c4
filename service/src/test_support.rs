//! Helpers shared by the test suites.

use std::{collections::HashMap, time::Duration};

use common::{DateTime, Money};

use crate::{
    command::{CreatePromotion, CreateShowtime},
    domain::{cinema, movie, promotion, seat, showtime, user, Seats},
    infra::Memory,
    task, Config, Service,
};

/// Creates a [`Service`] backed by a fresh [`Memory`] database.
pub(crate) fn service() -> (Service<Memory>, task::Background) {
    service_with(Config::default())
}

/// Creates a [`Service`] with the provided [`Config`], backed by a fresh
/// [`Memory`] database.
pub(crate) fn service_with(
    config: Config,
) -> (Service<Memory>, task::Background) {
    Service::new(config, Memory::new())
}

/// Parses a [`Money`] amount.
pub(crate) fn money(s: &str) -> Money {
    s.parse().unwrap()
}

/// Parses a set of [`Seats`].
pub(crate) fn seats(ids: &[&str]) -> Seats {
    ids.iter().map(|s| s.parse().unwrap()).collect()
}

/// Builds a [`CreateShowtime`] command for a hall of the provided seats.
///
/// Row `J` is VIP-priced; everything else is regular.
pub(crate) fn create_showtime(seat_ids: &[&str]) -> CreateShowtime {
    let now = DateTime::now();
    CreateShowtime {
        movie_id: movie::Id::new(),
        cinema_id: cinema::Id::new(),
        starts_at: (now + Duration::from_secs(3600)).coerce(),
        ends_at: (now + Duration::from_secs(3600 * 3)).coerce(),
        prices: showtime::Prices::new(
            money("150000IDR"),
            Some(money("250000IDR")),
            None,
        )
        .unwrap(),
        classes: HashMap::from([(
            "J1".parse::<seat::Seat>().unwrap().row(),
            seat::Class::Vip,
        )]),
        seats: seats(seat_ids),
        initiator_role: user::Role::Manager,
    }
}

/// Builds a [`CreatePromotion`] command active for an hour around now.
pub(crate) fn create_promotion(
    code: &str,
    benefit: promotion::Benefit,
) -> CreatePromotion {
    let now = DateTime::now();
    CreatePromotion {
        code: code.parse().unwrap(),
        benefit,
        min_purchase: None,
        movies: promotion::Filter::Unrestricted,
        cinemas: promotion::Filter::Unrestricted,
        weekdays: promotion::Filter::Unrestricted,
        starts_at: (now - Duration::from_secs(3600)).coerce(),
        ends_at: (now + Duration::from_secs(3600)).coerce(),
        usage_limit: 10,
        initiator_role: user::Role::Manager,
    }
}
