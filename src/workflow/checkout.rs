use crate::client::{Course, Deposit, PaymentClient};
use crate::domain::{Enrollment, Subscription, Tier};
use crate::error::{Error, Result};
use crate::repo::{EnrollmentStore, SubscriptionStore, Transactional};

use super::{EnrollmentWorkflow, SubscriptionWorkflow};

/// Paid enrollment and subscription.
///
/// The local write is committed first, then the payment is deposited. A failed payment is
/// compensated by undoing the write, and the payment failure is returned. A write that was
/// already undone by someone else counts as compensated. If the undo fails for any other
/// reason, the caller gets `Error::CompensationFailed` and nothing is retried.
pub struct Checkout<'a, D> {
    enrollments: &'a EnrollmentWorkflow<D>,
    subscriptions: &'a SubscriptionWorkflow<D>,
    payments: &'a PaymentClient,
}

impl<'a, D> Checkout<'a, D>
where
    D: Transactional,
    D::Work: EnrollmentStore + SubscriptionStore,
{
    pub fn new(
        enrollments: &'a EnrollmentWorkflow<D>,
        subscriptions: &'a SubscriptionWorkflow<D>,
        payments: &'a PaymentClient,
    ) -> Self {
        Self {
            enrollments,
            subscriptions,
            payments,
        }
    }

    /// Enroll `user_id` in `course`, charging the subscriber's discounted price to the creator
    #[tracing::instrument(
        name = "Checkout a course enrollment",
        skip(self, course),
        fields(course_id = %course.id)
    )]
    pub async fn enroll(&self, user_id: &str, course: &Course) -> Result<Enrollment> {
        let tier = self
            .subscriptions
            .check_enrollment_permission(course.subscription_id, user_id)
            .await?;

        let enrollment = self.enrollments.enroll(user_id, &course.id).await?;

        let price = tier.apply_discount(course.price, course.subscription_id);
        if price > 0.0 {
            let deposit = Deposit::new(user_id, price).to(&course.creator_id);
            if let Err(error) = self.payments.deposit(&deposit).await {
                tracing::error!(error.cause_chain = ?error, "Payment failed, reverting enrollment");
                match self.enrollments.unenroll(user_id, &course.id).await {
                    Ok(_) => {}
                    Err(Error::UserNotEnrolled) => {
                        tracing::warn!("Enrollment was already inactive");
                    }
                    Err(undo_error) => return Err(compensation_failed("unenroll", undo_error)),
                }
                return Err(error);
            }
        }

        Ok(enrollment)
    }

    /// Subscribe `user_id` to tier `sub_id`, charging the tier price
    #[tracing::instrument(name = "Checkout a subscription", skip(self))]
    pub async fn subscribe(&self, user_id: &str, sub_id: i32) -> Result<Subscription> {
        let tier = Tier::by_id(sub_id).ok_or(Error::SubTypeNotFound)?;

        let subscription = self.subscriptions.subscribe(user_id, sub_id).await?;

        if tier.price > 0.0 {
            let deposit = Deposit::new(user_id, tier.price);
            if let Err(error) = self.payments.deposit(&deposit).await {
                tracing::error!(
                    error.cause_chain = ?error,
                    "Payment failed, reverting subscription"
                );
                match self.subscriptions.unsubscribe(user_id).await {
                    Ok(_) => {}
                    Err(Error::UserNotSubscribed) => {
                        tracing::warn!("Subscription was already on the default tier");
                    }
                    Err(undo_error) => return Err(compensation_failed("unsubscribe", undo_error)),
                }
                return Err(error);
            }
        }

        Ok(subscription)
    }
}

fn compensation_failed(action: &'static str, error: Error) -> Error {
    tracing::error!(
        error.cause_chain = ?error,
        "Failed to {} after a failed payment, manual cleanup required", action
    );
    Error::CompensationFailed {
        action,
        source: Box::new(error),
    }
}
