//! [`Command`] for creating a new [`Promotion`].

use common::{
    datetime::Weekday,
    operations::{By, Insert, Select},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{cinema, movie, promotion, user, Promotion},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Promotion`].
#[derive(Clone, Debug)]
pub struct CreatePromotion {
    /// Unique [`promotion::Code`] customers redeem the [`Promotion`] by.
    pub code: promotion::Code,

    /// [`promotion::Benefit`] granted by the [`Promotion`].
    pub benefit: promotion::Benefit,

    /// Minimum order amount the [`Promotion`] applies from, if any.
    pub min_purchase: Option<Money>,

    /// Movies the [`Promotion`] applies to.
    pub movies: promotion::Filter<movie::Id>,

    /// Cinemas the [`Promotion`] applies to.
    pub cinemas: promotion::Filter<cinema::Id>,

    /// Days of the week the [`Promotion`] applies on.
    pub weekdays: promotion::Filter<Weekday>,

    /// [`DateTime`] the [`Promotion`] is valid from.
    pub starts_at: promotion::StartDateTime,

    /// [`DateTime`] the [`Promotion`] is valid until.
    pub ends_at: promotion::EndDateTime,

    /// Maximum number of redemptions of the [`Promotion`].
    pub usage_limit: promotion::UsageLimit,

    /// [`user::Role`] of the user creating the [`Promotion`].
    pub initiator_role: user::Role,
}

impl<Db> Command<CreatePromotion> for Service<Db>
where
    Db: Database<
            Select<By<Option<Promotion>, promotion::Code>>,
            Ok = Option<Promotion>,
            Err = Traced<database::Error>,
        > + Database<Insert<Promotion>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Promotion;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreatePromotion,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreatePromotion {
            code,
            benefit,
            min_purchase,
            movies,
            cinemas,
            weekdays,
            starts_at,
            ends_at,
            usage_limit,
            initiator_role,
        } = cmd;

        if !initiator_role.is_staff() {
            return Err(tracerr::new!(E::Forbidden(initiator_role)));
        }
        if ends_at.coerce::<()>() <= starts_at.coerce() {
            return Err(tracerr::new!(E::InvalidValidityWindow));
        }
        if usage_limit == 0 {
            return Err(tracerr::new!(E::InvalidUsageLimit));
        }

        self.database()
            .execute(Select(By::<Option<Promotion>, _>::new(code.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .map_or(Ok(()), |p| Err(E::DuplicateCode(p.code)))
            .map_err(tracerr::wrap!())?;

        let promotion = Promotion {
            id: promotion::Id::new(),
            code,
            benefit,
            min_purchase,
            movies,
            cinemas,
            weekdays,
            starts_at,
            ends_at,
            usage_limit,
            usage_count: 0,
            created_at: DateTime::now().coerce(),
        };

        self.database()
            .execute(Insert(promotion.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(promotion)
    }
}

/// Error of [`CreatePromotion`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Initiator is not allowed to create [`Promotion`]s.
    #[display("`{_0}` is not allowed to create promotions")]
    Forbidden(#[error(not(source))] user::Role),

    /// [`Promotion`] would end before it starts.
    #[display("promotion cannot end before it starts")]
    InvalidValidityWindow,

    /// [`Promotion`] usage limit must be positive.
    #[display("promotion usage limit must be positive")]
    InvalidUsageLimit,

    /// [`Promotion`] with the same [`promotion::Code`] exists already.
    #[display("`Promotion(code: {_0})` exists already")]
    DuplicateCode(#[error(not(source))] promotion::Code),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::Command as _,
        domain::promotion,
        test_support::{create_promotion, money, service},
    };

    use super::ExecutionError;

    #[tokio::test]
    async fn enforces_code_uniqueness() {
        let (service, _bg) = service();

        let benefit = promotion::Benefit::FixedAmount(money("10000IDR"));

        let created = service
            .execute(create_promotion("PAYDAY", benefit))
            .await
            .unwrap();
        assert_eq!(created.usage_count, 0);

        let err = service
            .execute(create_promotion("PAYDAY", benefit))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::DuplicateCode(_)));
    }

    #[tokio::test]
    async fn rejects_a_zero_usage_limit() {
        let (service, _bg) = service();

        let mut cmd = create_promotion(
            "PAYDAY",
            promotion::Benefit::FixedAmount(money("10000IDR")),
        );
        cmd.usage_limit = 0;

        let err = service.execute(cmd).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidUsageLimit,
        ));
    }
}
