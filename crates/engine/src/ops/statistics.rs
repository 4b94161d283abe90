use std::collections::HashSet;

use sea_orm::{PaginatorTrait, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, RentStatus, ResultEngine, WaitingListStatus, cars, receipts, rents,
    waiting_list,
};

use super::{Engine, with_tx};

/// Dashboard aggregate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    pub cars_total: u64,
    pub cars_available: u64,
    pub cars_rented: u64,
    pub cars_deleted: u64,
    pub rents_pending: u64,
    pub rents_approved: u64,
    pub rents_rejected: u64,
    pub rents_handed_over: u64,
    pub rents_returned: u64,
    pub rents_invoiced: u64,
    pub waiting_list_open: u64,
    /// Sum of all receipt totals.
    pub revenue_total: MoneyCents,
    /// Kilometers driven over returned and invoiced rents.
    pub kilometers_driven: i64,
}

impl Statistics {
    fn count_rent(&mut self, status: RentStatus) {
        let slot = match status {
            RentStatus::Pending => &mut self.rents_pending,
            RentStatus::Approved => &mut self.rents_approved,
            RentStatus::Rejected => &mut self.rents_rejected,
            RentStatus::HandedOver => &mut self.rents_handed_over,
            RentStatus::Returned => &mut self.rents_returned,
            RentStatus::Invoiced => &mut self.rents_invoiced,
        };
        *slot += 1;
    }

    fn add_kilometers(&mut self, start: i64, end: i64) -> ResultEngine<()> {
        self.kilometers_driven = end
            .checked_sub(start)
            .and_then(|driven| self.kilometers_driven.checked_add(driven))
            .ok_or_else(|| EngineError::InvalidAmount("kilometer overflow".to_string()))?;
        Ok(())
    }
}

impl Engine {
    /// Authorization: staff.
    pub async fn statistics(&self, actor_id: Uuid) -> ResultEngine<Statistics> {
        with_tx!(self, |db_tx| {
            self.require_staff(&db_tx, actor_id).await?;
            let mut stats = Statistics::default();

            let rents = rents::Entity::find().all(&db_tx).await?;
            let mut rented_cars = HashSet::new();
            for rent in &rents {
                let status = RentStatus::try_from(rent.status.as_str())?;
                stats.count_rent(status);
                if status == RentStatus::HandedOver {
                    rented_cars.insert(rent.car_id.as_str());
                }
                if let (Some(start), Some(end)) = (rent.starting_kilometer, rent.ending_kilometer)
                {
                    stats.add_kilometers(start, end)?;
                }
            }

            for car in cars::Entity::find().all(&db_tx).await? {
                stats.cars_total += 1;
                if car.deleted {
                    stats.cars_deleted += 1;
                } else if rented_cars.contains(car.id.as_str()) {
                    stats.cars_rented += 1;
                } else {
                    stats.cars_available += 1;
                }
            }

            stats.waiting_list_open = waiting_list::Entity::find()
                .filter(waiting_list::Column::Status.is_in([
                    WaitingListStatus::Active.as_str(),
                    WaitingListStatus::Notified.as_str(),
                ]))
                .count(&db_tx)
                .await?;

            for receipt in receipts::Entity::find().all(&db_tx).await? {
                stats.revenue_total = stats
                    .revenue_total
                    .checked_add(MoneyCents::new(receipt.total_cost))
                    .ok_or_else(|| EngineError::InvalidAmount("revenue overflow".to_string()))?;
            }

            Ok(stats)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_rent_hits_matching_bucket() {
        let mut stats = Statistics::default();
        stats.count_rent(RentStatus::Pending);
        stats.count_rent(RentStatus::Pending);
        stats.count_rent(RentStatus::Invoiced);
        assert_eq!(stats.rents_pending, 2);
        assert_eq!(stats.rents_invoiced, 1);
        assert_eq!(stats.rents_approved, 0);
    }

    #[test]
    fn kilometers_sum_refuses_to_wrap() {
        let mut stats = Statistics::default();
        stats.add_kilometers(1000, 1200).unwrap();
        stats.add_kilometers(0, 50).unwrap();
        assert_eq!(stats.kilometers_driven, 250);

        assert_eq!(
            stats.add_kilometers(0, i64::MAX),
            Err(EngineError::InvalidAmount("kilometer overflow".to_string()))
        );
        assert_eq!(stats.kilometers_driven, 250);
        assert!(stats.add_kilometers(i64::MIN, 1).is_err());
    }
}
