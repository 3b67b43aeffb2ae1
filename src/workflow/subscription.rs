use crate::domain::{NewSubscription, Subscription, Tier, DEFAULT_TIER_ID};
use crate::error::{Error, Result};
use crate::repo::{finish, SubscriptionStore, Transactional};

/// Subscription commands and tier lookups
#[derive(Debug, Clone)]
pub struct SubscriptionWorkflow<D> {
    store: D,
}

impl<D> SubscriptionWorkflow<D>
where
    D: Transactional,
    D::Work: SubscriptionStore,
{
    pub fn new(store: D) -> Self {
        Self { store }
    }

    /// Move `user_id` onto tier `sub_id`, replacing whatever tier they were on
    #[tracing::instrument(name = "Subscribe a user to a tier", skip(self))]
    pub async fn subscribe(&self, user_id: &str, sub_id: i32) -> Result<Subscription> {
        Tier::by_id(sub_id).ok_or(Error::SubTypeNotFound)?;

        let mut work = self.store.begin().await?;
        let outcome = subscribe_to(&mut work, user_id, sub_id).await;
        finish(work, outcome).await
    }

    /// Downgrade `user_id` to the default tier
    #[tracing::instrument(name = "Unsubscribe a user", skip(self))]
    pub async fn unsubscribe(&self, user_id: &str) -> Result<Subscription> {
        match self.subscribe(user_id, DEFAULT_TIER_ID).await {
            Err(Error::UserAlreadySubscribed) => Err(Error::UserNotSubscribed),
            outcome => outcome,
        }
    }

    /// Tier of the active subscription of `user_id`
    #[tracing::instrument(name = "Fetch the tier of a user", skip(self))]
    pub async fn current_tier(&self, user_id: &str) -> Result<Tier> {
        let mut work = self.store.begin().await?;
        let outcome = work.find_active_subscription(user_id).await;
        let subscription = finish(work, outcome)
            .await?
            .ok_or(Error::UserNotSubscribed)?;

        Tier::by_id(subscription.sub_id)
            .copied()
            .ok_or(Error::SubTypeNotFound)
    }

    /// Check that `user_id` may enroll in a course of `course_tier`, returning their tier
    #[tracing::instrument(name = "Check enrollment permission", skip(self))]
    pub async fn check_enrollment_permission(
        &self,
        course_tier: i32,
        user_id: &str,
    ) -> Result<Tier> {
        let tier = self.current_tier(user_id).await?;
        if !tier.permits(course_tier) {
            return Err(Error::NoEnrollmentPermission);
        }
        Ok(tier)
    }

    /// Total paid by `user_ids` for a course of `course_tier` listed at `price`
    #[tracing::instrument(name = "Compute course cancellation fee", skip(self, user_ids))]
    pub async fn cancellation_fee(
        &self,
        user_ids: &[String],
        price: f64,
        course_tier: i32,
    ) -> Result<f64> {
        let mut total = 0.0;
        for user_id in user_ids {
            let tier = self.current_tier(user_id).await?;
            total += tier.apply_discount(price, course_tier);
        }
        Ok(total)
    }
}

async fn subscribe_to<S>(store: &mut S, user_id: &str, sub_id: i32) -> Result<Subscription>
where
    S: SubscriptionStore,
{
    if store.has_active_subscription(user_id, sub_id).await? {
        return Err(Error::UserAlreadySubscribed);
    }
    if store.find_active_subscription(user_id).await?.is_some() {
        store.deactivate_subscription(user_id).await?;
    }

    let new_subscription = NewSubscription::new(user_id, sub_id);
    store.insert_subscription(&new_subscription).await?;

    store
        .find_subscription(&new_subscription.id)
        .await?
        .ok_or(Error::RecordNotFound(new_subscription.id))
}
