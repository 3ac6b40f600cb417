//! Runs one operation against every DAO of a [`DaoSet`] and folds the results.

use async_trait::async_trait;
use tracing::{Level, event};

use crate::core::{FieldValues, Result, Value};
use crate::entity::Entity;

use super::combinator::{Combinator, Fold};
use super::dao_set::{DaoSet, DaoTarget};
use super::SingleTypeDao;

/// An operation that can be applied to any DAO of a hierarchy.
#[async_trait]
pub trait FanOutOperation<T: Entity>: Send + Sync {
    type Output: Send;

    /// Operation name used in log events.
    const NAME: &'static str;

    async fn apply(&self, dao: &dyn SingleTypeDao<T>) -> Result<Self::Output>;
}

pub struct QueryForAll;

#[async_trait]
impl<T: Entity> FanOutOperation<T> for QueryForAll {
    type Output = Vec<T>;
    const NAME: &'static str = "query_for_all";

    async fn apply(&self, dao: &dyn SingleTypeDao<T>) -> Result<Vec<T>> {
        dao.query_for_all().await
    }
}

pub struct QueryForEq<'a> {
    pub field: &'a str,
    pub value: &'a Value,
}

#[async_trait]
impl<'a, T: Entity> FanOutOperation<T> for QueryForEq<'a> {
    type Output = Vec<T>;
    const NAME: &'static str = "query_for_eq";

    async fn apply(&self, dao: &dyn SingleTypeDao<T>) -> Result<Vec<T>> {
        dao.query_for_eq(self.field, self.value).await
    }
}

pub struct QueryForFieldValues<'a> {
    pub values: &'a FieldValues,
    pub bind_args: bool,
}

#[async_trait]
impl<'a, T: Entity> FanOutOperation<T> for QueryForFieldValues<'a> {
    type Output = Vec<T>;
    const NAME: &'static str = "query_for_field_values";

    async fn apply(&self, dao: &dyn SingleTypeDao<T>) -> Result<Vec<T>> {
        if self.bind_args {
            dao.query_for_field_values_args(self.values).await
        } else {
            dao.query_for_field_values(self.values).await
        }
    }
}

pub struct CountOf;

#[async_trait]
impl<T: Entity> FanOutOperation<T> for CountOf {
    type Output = u64;
    const NAME: &'static str = "count_of";

    async fn apply(&self, dao: &dyn SingleTypeDao<T>) -> Result<u64> {
        dao.count_of().await
    }
}

pub struct CountOfMatching<'a> {
    pub values: &'a FieldValues,
}

#[async_trait]
impl<'a, T: Entity> FanOutOperation<T> for CountOfMatching<'a> {
    type Output = u64;
    const NAME: &'static str = "count_of_matching";

    async fn apply(&self, dao: &dyn SingleTypeDao<T>) -> Result<u64> {
        dao.count_of_matching(self.values).await
    }
}

pub struct TableExists;

#[async_trait]
impl<T: Entity> FanOutOperation<T> for TableExists {
    type Output = bool;
    const NAME: &'static str = "is_table_exists";

    async fn apply(&self, dao: &dyn SingleTypeDao<T>) -> Result<bool> {
        dao.is_table_exists().await
    }
}

/// Sequential fan-out over a [`DaoSet`].
///
/// Slots are visited strictly in set order. Local slots run against `local`,
/// delegate slots against their own DAO. The first error aborts the run and the
/// partial accumulator is dropped.
pub struct FanOutExecutor<'a, T: Entity> {
    dao_set: &'a DaoSet<T>,
    local: &'a dyn SingleTypeDao<T>,
}

impl<'a, T: Entity> FanOutExecutor<'a, T> {
    pub fn new(dao_set: &'a DaoSet<T>, local: &'a dyn SingleTypeDao<T>) -> Self {
        Self { dao_set, local }
    }

    pub async fn run<O, C, A>(&self, operation: &O, combinator: &C, initial: A) -> Result<A>
    where
        O: FanOutOperation<T>,
        C: Combinator<A, O::Output> + Sync,
        A: Send,
    {
        let mut acc = initial;

        for slot in self.dao_set.slots() {
            let dao: &dyn SingleTypeDao<T> = match slot.target() {
                DaoTarget::Local => self.local,
                DaoTarget::Delegate(dao) => dao.as_ref(),
            };

            let step = match operation.apply(dao).await {
                Ok(step) => step,
                Err(err) => {
                    event!(
                        Level::WARN,
                        operation = O::NAME,
                        entity_type = slot.entity_type(),
                        error = %err,
                        "fan-out aborted"
                    );
                    return Err(err);
                }
            };
            event!(
                Level::DEBUG,
                operation = O::NAME,
                entity_type = slot.entity_type(),
                "fan-out step"
            );

            match combinator.combine(acc, step) {
                Fold::Continue(next) => acc = next,
                Fold::Stop(last) => {
                    event!(
                        Level::DEBUG,
                        operation = O::NAME,
                        entity_type = slot.entity_type(),
                        "fan-out stopped early"
                    );
                    return Ok(last);
                }
            }
        }

        Ok(acc)
    }
}
