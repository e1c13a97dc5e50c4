//! [`Promotion`] operations of the [`Memory`] database.

use common::operations::{By, Insert, Redeem, Refund, Select};
use dashmap::mapref::entry::Entry;
use tracerr::Traced;

use crate::{
    domain::{promotion, Promotion},
    infra::database::{
        self,
        memory::{Error, Memory},
        Database,
    },
};

impl Database<Insert<Promotion>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(promotion): Insert<Promotion>,
    ) -> Result<Self::Ok, Self::Err> {
        match self.0.promotions.entry(promotion.id) {
            Entry::Vacant(e) => {
                match self.0.promotion_codes.entry(promotion.code.clone()) {
                    Entry::Vacant(c) => {
                        let _ = c.insert(promotion.id);
                        let _ = e.insert(promotion);
                        Ok(())
                    }
                    Entry::Occupied(_) => Err(tracerr::new!(
                        database::Error::from(Error::AlreadyExists)
                    )),
                }
            }
            Entry::Occupied(_) => Err(tracerr::new!(database::Error::from(
                Error::AlreadyExists
            ))),
        }
    }
}

impl Database<Select<By<Option<Promotion>, promotion::Code>>> for Memory {
    type Ok = Option<Promotion>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Promotion>, promotion::Code>>,
    ) -> Result<Self::Ok, Self::Err> {
        // The ID is copied out before reading the promotions map, so no two
        // shard locks are ever held at once here.
        let Some(id) =
            self.0.promotion_codes.get(&by.into_inner()).map(|id| *id)
        else {
            return Ok(None);
        };
        Ok(self.0.promotions.get(&id).map(|p| p.value().clone()))
    }
}

impl Database<Redeem<By<Promotion, promotion::Id>>> for Memory {
    type Ok = Result<Promotion, promotion::RedeemError>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Redeem(by): Redeem<By<Promotion, promotion::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        use promotion::RedeemError as E;

        let id = by.into_inner();

        let Some(mut entry) = self.0.promotions.get_mut(&id) else {
            return Ok(Err(E::NotFound(id)));
        };
        let promotion = entry.value_mut();

        if promotion.usage_count >= promotion.usage_limit {
            return Ok(Err(E::UsageLimitReached(id)));
        }

        promotion.usage_count += 1;

        Ok(Ok(promotion.clone()))
    }
}

impl Database<Refund<By<Promotion, promotion::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Refund(by): Refund<By<Promotion, promotion::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Refunding a use of a missing promotion is a no-op.
        if let Some(mut entry) = self.0.promotions.get_mut(&by.into_inner()) {
            let promotion = entry.value_mut();
            promotion.usage_count = promotion.usage_count.saturating_sub(1);
        }
        Ok(())
    }
}
